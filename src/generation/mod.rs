//! # Generation
//!
//! The engine never talks to a language or image model itself. Hosts plug a
//! [`StoryGenerator`] in; this module defines the shapes it must return and
//! turns those shapes into panels. [`cache`] wraps any generator with an
//! explicitly owned response cache.

pub mod cache;

pub use cache::{CachingGenerator, ResponseCache};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::store::PanelStore;
use crate::model::{ComicPanel, PanelShape, TextBox};

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Failed to generate content: {0}")]
    Request(String),

    #[error("Failed to parse {what} response: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("No credentials configured for the generation service")]
    MissingCredentials,
}

pub type GenerationResult<T> = std::result::Result<T, GenerationError>;

/// Artwork returned by an image model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelPrompt {
    pub image_prompt: String,
    #[serde(default)]
    pub panel_shape: PanelShape,
}

/// A story broken into panels, plus one description per character so the
/// image prompts can stay visually consistent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PanelBreakdown {
    #[serde(default)]
    pub characters: BTreeMap<String, String>,
    pub panels: Vec<PanelPrompt>,
}

pub trait StoryGenerator {
    fn generate_story_outline(&self, prompt: &str) -> GenerationResult<String>;

    fn generate_comic_panels(&self, story: &str) -> GenerationResult<PanelBreakdown>;

    fn generate_speech_for_panel(&self, image_prompt: &str) -> GenerationResult<Vec<TextBox>>;

    fn generate_image(&self, prompt: &str, shape: PanelShape) -> GenerationResult<GeneratedImage>;
}

/// Whether a service key is available. Implementations answer yes or no
/// and never hand the key out.
pub trait CredentialSource {
    fn has_credentials(&self) -> bool;
}

/// Credentials held in an environment variable.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialSource for EnvCredentials {
    fn has_credentials(&self) -> bool {
        std::env::var_os(&self.var).is_some_and(|v| !v.is_empty())
    }
}

/// Refuses every call while `credentials` reports no key, so hosts get a
/// typed error before any request is attempted.
pub struct CredentialedGenerator<G, C> {
    inner: G,
    credentials: C,
}

impl<G: StoryGenerator, C: CredentialSource> CredentialedGenerator<G, C> {
    pub fn new(inner: G, credentials: C) -> Self {
        Self { inner, credentials }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    fn check(&self) -> GenerationResult<&G> {
        if self.credentials.has_credentials() {
            Ok(&self.inner)
        } else {
            tracing::warn!("generation requested without credentials");
            Err(GenerationError::MissingCredentials)
        }
    }
}

impl<G: StoryGenerator, C: CredentialSource> StoryGenerator for CredentialedGenerator<G, C> {
    fn generate_story_outline(&self, prompt: &str) -> GenerationResult<String> {
        self.check()?.generate_story_outline(prompt)
    }

    fn generate_comic_panels(&self, story: &str) -> GenerationResult<PanelBreakdown> {
        self.check()?.generate_comic_panels(story)
    }

    fn generate_speech_for_panel(&self, image_prompt: &str) -> GenerationResult<Vec<TextBox>> {
        self.check()?.generate_speech_for_panel(image_prompt)
    }

    fn generate_image(&self, prompt: &str, shape: PanelShape) -> GenerationResult<GeneratedImage> {
        self.check()?.generate_image(prompt, shape)
    }
}

/// Pixel size requested from the image model for a panel shape.
pub fn image_size_for_shape(shape: PanelShape) -> (u32, u32) {
    match shape {
        PanelShape::Square => (512, 512),
        PanelShape::Portrait => (512, 896),
        PanelShape::Landscape => (896, 512),
    }
}

/// Fresh panels, one per prompt, with no artwork or text yet.
pub fn panels_from_breakdown(breakdown: &PanelBreakdown) -> Vec<ComicPanel> {
    breakdown
        .panels
        .iter()
        .map(|p| ComicPanel::new(&p.image_prompt, p.panel_shape))
        .collect()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Scene {
    scene_prompt: String,
}

#[derive(Deserialize)]
struct Chapter {
    scenes: Vec<Scene>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BreakdownReply {
    Panels(PanelBreakdown),
    Chapters {
        #[serde(default)]
        characters: BTreeMap<String, String>,
        chapters: Vec<Chapter>,
    },
}

/// Parse a model reply describing the panels. Accepts either a flat
/// `{characters, panels}` object or `{chapters: [{scenes: [{scenePrompt}]}]}`,
/// whose scenes become square panels in reading order.
pub fn parse_panel_breakdown(reply: &str) -> GenerationResult<PanelBreakdown> {
    let parsed: BreakdownReply = serde_json::from_str(reply).map_err(|source| GenerationError::Parse {
        what: "comic panel",
        source,
    })?;
    Ok(match parsed {
        BreakdownReply::Panels(breakdown) => breakdown,
        BreakdownReply::Chapters { characters, chapters } => PanelBreakdown {
            characters,
            panels: chapters
                .into_iter()
                .flat_map(|c| c.scenes)
                .map(|s| PanelPrompt {
                    image_prompt: s.scene_prompt,
                    panel_shape: PanelShape::Square,
                })
                .collect(),
        },
    })
}

/// Parse a `{ "text": [...] }` speech reply.
pub fn parse_speech(reply: &str) -> GenerationResult<Vec<TextBox>> {
    #[derive(Deserialize)]
    struct SpeechReply {
        text: Vec<TextBox>,
    }
    serde_json::from_str::<SpeechReply>(reply)
        .map(|r| r.text)
        .map_err(|source| GenerationError::Parse {
            what: "speech box",
            source,
        })
}

/// Generate artwork for one panel, keeping its `is_generating` flag honest
/// on both outcomes.
pub fn generate_panel_image(
    store: &mut PanelStore,
    index: usize,
    generator: &dyn StoryGenerator,
) -> GenerationResult<()> {
    let Some(panel) = store.get(index) else {
        return Ok(());
    };
    let (prompt, shape) = (panel.image_prompt.clone(), panel.panel_shape);
    store.generate_image_start(index);
    match generator.generate_image(&prompt, shape) {
        Ok(image) => {
            store.generate_image_success(index, image.image_url, image.image_base64);
            Ok(())
        }
        Err(e) => {
            store.generate_image_error(index, &e.to_string());
            Err(e)
        }
    }
}

/// Ask for dialogue for one panel and append it with default positions.
pub fn generate_panel_speech(
    store: &mut PanelStore,
    index: usize,
    generator: &dyn StoryGenerator,
) -> GenerationResult<()> {
    let Some(panel) = store.get(index) else {
        return Ok(());
    };
    let text = generator.generate_speech_for_panel(&panel.image_prompt)?;
    store.append_text(index, text);
    Ok(())
}
