//! Structured error types for the Panelcraft engine.
//!
//! Structural problems (splitting a non-leaf, removing a page that does not
//! exist) are not errors at all: those operations return their input
//! unchanged. The variants here cover the real failure sources: project
//! parsing, image decoding during export, and canvas/PDF generation.

/// Convenience result type used across Panelcraft.
pub type Result<T> = std::result::Result<T, PanelcraftError>;

/// The unified error type returned by all public Panelcraft API functions.
#[derive(Debug, thiserror::Error)]
pub enum PanelcraftError {
    /// JSON input failed to parse as a valid comic project.
    #[error("Failed to parse project: {source}{}", format_hint(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },

    /// A panel's artwork could not be fetched or decoded.
    #[error("Image error in panel {panel}: {message}")]
    Image { panel: usize, message: String },

    /// Canvas allocation or PDF assembly failed.
    #[error("Render error: {0}")]
    Render(String),

    /// Writing the finished document failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The export was stopped between pages by its hooks.
    #[error("Export aborted before page {page}")]
    Aborted { page: usize },
}

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl PanelcraftError {
    pub fn image(panel: usize, message: impl Into<String>) -> Self {
        Self::Image {
            panel,
            message: message.into(),
        }
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::Render(message.into())
    }

    /// Title for the user-facing notification raised by this failure.
    pub fn notification_title(&self) -> &'static str {
        match self {
            PanelcraftError::Parse { .. } => "Invalid Project",
            PanelcraftError::Image { .. } => "Failed to generate image",
            PanelcraftError::Render(_) | PanelcraftError::Io(_) | PanelcraftError::Aborted { .. } => {
                "Export Failed"
            }
        }
    }
}

impl From<serde_json::Error> for PanelcraftError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the comic project schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        PanelcraftError::Parse { source: e, hint }
    }
}
