//! # Project Model
//!
//! The canonical data shapes shared by every component: generated panels,
//! their text overlays and crop anchors, layout templates, page assignments,
//! and the serialisable project snapshot the exporter consumes.
//!
//! There is exactly one `ComicPanel` type. The JSON field names follow the
//! host application (`imagePrompt`, `textPositions`, `startIndex`, ...) so a
//! project saved by the browser front end deserialises directly.

pub mod store;

pub use store::PanelStore;

use crate::geometry::{clamp_percent, clamp_unit, Orientation, Rect};
use serde::{Deserialize, Serialize};

/// Hint for the image generator's output aspect. The slot a panel finally
/// lands in may have a different aspect; cropping resolves the difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PanelShape {
    #[default]
    Square,
    Portrait,
    Landscape,
}

impl PanelShape {
    /// Width / height of the generated artwork for this shape.
    pub fn aspect_ratio(&self) -> f64 {
        match self {
            PanelShape::Square => 1.0,
            PanelShape::Portrait => 2.0 / 3.0,
            PanelShape::Landscape => 3.0 / 2.0,
        }
    }
}

/// Whether a text box is spoken (gets a tail) or narration (no tail).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TextKind {
    Speech,
    Narration,
}

/// One line of dialogue or narration attached to a panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    #[serde(rename = "type", alias = "kind")]
    pub kind: TextKind,
    #[serde(default)]
    pub character: String,
    pub text: String,
}

impl TextBox {
    pub fn speech(character: &str, text: &str) -> Self {
        Self {
            kind: TextKind::Speech,
            character: character.to_string(),
            text: text.to_string(),
        }
    }

    pub fn narration(text: &str) -> Self {
        Self {
            kind: TextKind::Narration,
            character: String::new(),
            text: text.to_string(),
        }
    }
}

/// Side of the bubble a speech tail leaves from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TailSide {
    Top,
    Right,
    #[default]
    Bottom,
    Left,
}

impl TailSide {
    pub const ALL: [TailSide; 4] = [TailSide::Top, TailSide::Right, TailSide::Bottom, TailSide::Left];
}

/// Where the tail sits: a side and a percentage (0–100) along it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TailPosition {
    pub side: TailSide,
    pub offset: f64,
}

impl Default for TailPosition {
    fn default() -> Self {
        Self {
            side: TailSide::Bottom,
            offset: 20.0,
        }
    }
}

/// Placement of one text box inside its panel. `x`/`y` are percentages of
/// the panel rectangle and mark the bubble's centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextPosition {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub is_flipped: bool,
    #[serde(default)]
    pub tail_position: TailPosition,
}

impl Default for TextPosition {
    fn default() -> Self {
        Self {
            x: 50.0,
            y: 50.0,
            is_flipped: false,
            tail_position: TailPosition::default(),
        }
    }
}

impl TextPosition {
    /// Copy with `x`/`y` clamped into the panel.
    pub fn clamped(&self) -> Self {
        Self {
            x: clamp_percent(self.x),
            y: clamp_percent(self.y),
            ..*self
        }
    }
}

/// A normalised point in [0,1]² selecting where the visible crop window sits
/// within the croppable excess of the source image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub x: f64,
    pub y: f64,
}

impl Anchor {
    pub const CENTER: Anchor = Anchor { x: 0.5, y: 0.5 };

    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: clamp_unit(x),
            y: clamp_unit(y),
        }
    }
}

impl Default for Anchor {
    fn default() -> Self {
        Anchor::CENTER
    }
}

/// Per-panel crop state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CropSettings {
    #[serde(alias = "position")]
    pub anchor: Anchor,
}

/// One generated story beat.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComicPanel {
    pub image_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub is_generating: bool,
    #[serde(default)]
    pub panel_shape: PanelShape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_settings: Option<CropSettings>,
    #[serde(default)]
    pub text: Vec<TextBox>,
    #[serde(default)]
    pub text_positions: Vec<TextPosition>,
}

impl ComicPanel {
    pub fn new(image_prompt: &str, panel_shape: PanelShape) -> Self {
        Self {
            image_prompt: image_prompt.to_string(),
            panel_shape,
            ..Default::default()
        }
    }

    pub fn has_image(&self) -> bool {
        self.image_base64.as_deref().is_some_and(|s| !s.is_empty())
            || self.image_url.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// The crop anchor, centred when the user never moved it.
    pub fn anchor(&self) -> Anchor {
        self.crop_settings.map(|c| c.anchor).unwrap_or_default()
    }

    /// Pair every text box with its position. Boxes without a stored
    /// position get the default one, so drawing never drops text.
    pub fn bubbles(&self) -> impl Iterator<Item = (&TextBox, TextPosition)> + '_ {
        self.text.iter().enumerate().map(move |(i, text_box)| {
            let position = self.text_positions.get(i).copied().unwrap_or_default();
            (text_box, position)
        })
    }

    /// Restore the `text_positions.len() == text.len()` invariant, keeping
    /// existing positions at their indices.
    pub(crate) fn align_text_positions(&mut self) {
        self.text_positions.resize(self.text.len(), TextPosition::default());
    }
}

/// One rectangle of a layout template, in percent of the page usable area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelSlot {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PanelSlot {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

impl From<Rect> for PanelSlot {
    fn from(r: Rect) -> Self {
        PanelSlot::new(r.x, r.y, r.width, r.height)
    }
}

/// A named, reusable page layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutTemplate {
    pub id: String,
    pub name: String,
    #[serde(alias = "panels")]
    pub slots: Vec<PanelSlot>,
}

impl LayoutTemplate {
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }
}

/// One printed page: a template plus the index of the panel that fills its
/// first slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAssignment {
    pub layout: LayoutTemplate,
    #[serde(default)]
    pub start_index: usize,
}

impl PageAssignment {
    /// Absolute panel index shown in `slot_index` of this page.
    pub fn panel_index(&self, slot_index: usize) -> usize {
        self.start_index + slot_index
    }
}

/// How the export canvas is serialised into the PDF.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PageEncoding {
    /// Lossy JPEG, embedded with DCTDecode.
    Jpeg { quality: u8 },
    /// Lossless RGB, embedded with FlateDecode.
    Flate,
}

impl Default for PageEncoding {
    fn default() -> Self {
        PageEncoding::Jpeg { quality: 92 }
    }
}

/// Export configuration. Every field has a default so a project file may
/// omit the whole block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    pub title: String,
    pub orientation: Orientation,
    /// Outer page margin in millimetres.
    pub margin_mm: f64,
    /// Inset applied to every slot, in millimetres.
    pub panel_padding_mm: f64,
    /// Canvas pixels per PDF point.
    pub supersample: f64,
    pub encoding: PageEncoding,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            title: "Comic".to_string(),
            orientation: Orientation::Portrait,
            margin_mm: 2.0,
            panel_padding_mm: 1.0,
            supersample: 2.0,
            encoding: PageEncoding::default(),
        }
    }
}

impl ExportOptions {
    /// Output file name for the finished document. Path separators are
    /// dropped so the name always lands in the working directory.
    pub fn file_name(&self) -> String {
        let stem: String = self.title.chars().filter(|c| !matches!(c, '/' | '\\')).collect();
        let stem = stem.trim();
        if stem.is_empty() || stem.chars().all(|c| c == '.') {
            return "Comic.pdf".to_string();
        }
        format!("{}.pdf", stem)
    }
}

/// A complete composition snapshot: everything the exporter needs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComicProject {
    #[serde(default)]
    pub pages: Vec<PageAssignment>,
    #[serde(default)]
    pub panels: Vec<ComicPanel>,
    #[serde(default)]
    pub options: ExportOptions,
}
