//! # Panel Store
//!
//! The single owner of the flat `ComicPanel` list. Preview, editor and
//! exporter all read and write panels through this store by absolute index;
//! nothing holds a private copy that could drift.
//!
//! Writes to an index that does not exist are ignored and reported with a
//! `false` return, matching the no-op treatment of structural errors
//! elsewhere in the engine.

use super::{Anchor, ComicPanel, CropSettings, TextBox, TextPosition};

#[derive(Debug, Clone, Default)]
pub struct PanelStore {
    panels: Vec<ComicPanel>,
    error: Option<String>,
}

impl PanelStore {
    pub fn new(panels: Vec<ComicPanel>) -> Self {
        let mut store = Self {
            panels: Vec::new(),
            error: None,
        };
        store.set_panels(panels);
        store
    }

    pub fn panels(&self) -> &[ComicPanel] {
        &self.panels
    }

    pub fn get(&self, index: usize) -> Option<&ComicPanel> {
        self.panels.get(index)
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    /// Last generation error, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Replace the whole list (story regeneration).
    pub fn set_panels(&mut self, panels: Vec<ComicPanel>) {
        self.panels = panels;
        for panel in &mut self.panels {
            panel.align_text_positions();
        }
    }

    /// Whether every panel has finished artwork; composition requires it.
    pub fn all_have_images(&self) -> bool {
        !self.panels.is_empty() && self.panels.iter().all(ComicPanel::has_image)
    }

    /// Apply an arbitrary edit to one panel. The text/position invariant is
    /// restored afterwards.
    pub fn update_panel(&mut self, index: usize, edit: impl FnOnce(&mut ComicPanel)) -> bool {
        match self.panels.get_mut(index) {
            Some(panel) => {
                edit(panel);
                panel.align_text_positions();
                true
            }
            None => false,
        }
    }

    pub fn set_crop_anchor(&mut self, index: usize, anchor: Anchor) -> bool {
        self.update_panel(index, |panel| {
            panel.crop_settings = Some(CropSettings {
                anchor: Anchor::new(anchor.x, anchor.y),
            });
        })
    }

    pub fn set_image_prompt(&mut self, index: usize, prompt: &str) -> bool {
        self.update_panel(index, |panel| panel.image_prompt = prompt.to_string())
    }

    pub fn update_text_position(&mut self, panel_index: usize, text_index: usize, position: TextPosition) -> bool {
        let Some(panel) = self.panels.get_mut(panel_index) else {
            return false;
        };
        match panel.text_positions.get_mut(text_index) {
            Some(slot) => {
                *slot = position.clamped();
                true
            }
            None => false,
        }
    }

    /// Replace a panel's text. Positions survive for indices that still
    /// exist; new entries get the default position.
    pub fn update_text(&mut self, panel_index: usize, text: Vec<TextBox>) -> bool {
        self.update_panel(panel_index, |panel| panel.text = text)
    }

    /// Append generated text. Existing `(text[i], position[i])` pairs stay
    /// untouched at their indices.
    pub fn append_text(&mut self, panel_index: usize, text: Vec<TextBox>) -> bool {
        self.update_panel(panel_index, |panel| panel.text.extend(text))
    }

    /// Remove one text box together with its position.
    pub fn remove_text(&mut self, panel_index: usize, text_index: usize) -> bool {
        let Some(panel) = self.panels.get_mut(panel_index) else {
            return false;
        };
        if text_index >= panel.text.len() {
            return false;
        }
        panel.text.remove(text_index);
        if text_index < panel.text_positions.len() {
            panel.text_positions.remove(text_index);
        }
        panel.align_text_positions();
        true
    }

    pub fn generate_image_start(&mut self, index: usize) -> bool {
        self.update_panel(index, |panel| panel.is_generating = true)
    }

    pub fn generate_image_success(&mut self, index: usize, image_url: String, image_base64: Option<String>) -> bool {
        self.update_panel(index, |panel| {
            panel.image_url = Some(image_url);
            panel.image_base64 = image_base64;
            panel.is_generating = false;
        })
    }

    pub fn generate_image_error(&mut self, index: usize, error: &str) -> bool {
        let updated = self.update_panel(index, |panel| panel.is_generating = false);
        if updated {
            tracing::warn!(panel = index, error, "image generation failed");
            self.error = Some(error.to_string());
        }
        updated
    }
}
