//! Panel editor state.
//!
//! Opened by clicking a slot that shows artwork. Every edit is written
//! straight into the [`PanelStore`] at the panel's absolute index
//! (`start_index + slot_index`), so nothing is lost when the editor closes
//! and the preview sees the change on its next frame.

use crate::bubble::{layout_bubble, snap_tail, BubbleLayout, BubbleStyle};
use crate::crop::{travel_axis, CropView};
use crate::geometry::{Point, Rect, Size};
use crate::interact::{BubbleDrag, CropDrag, PointerSession};
use crate::model::{ComicPanel, PanelStore, TailSide, TextBox};

use super::PreviewFrame;

/// Share of the editor viewport the enlarged panel may fill.
const PANEL_FILL: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorTab {
    #[default]
    Crop,
    Text,
    Prompt,
}

impl EditorTab {
    pub fn label(&self) -> &'static str {
        match self {
            EditorTab::Crop => "Crop",
            EditorTab::Text => "Speech & Text",
            EditorTab::Prompt => "Image Generation",
        }
    }
}

#[derive(Debug, Clone)]
enum ActiveDrag {
    Crop(CropDrag),
    Bubble { text_index: usize, drag: BubbleDrag },
}

#[derive(Debug, Clone)]
pub struct PanelEditor {
    panel_index: usize,
    /// Slot width / height on the page.
    slot_aspect: f64,
    /// Slot width in PDF points.
    slot_width_pt: f64,
    tab: EditorTab,
    drag: Option<ActiveDrag>,
}

impl PanelEditor {
    /// Open the editor for a clicked slot. `None` when the slot has no
    /// panel or the panel has no artwork yet.
    pub fn open(frame: &PreviewFrame, slot_index: usize, store: &PanelStore) -> Option<Self> {
        let slot = frame.slots.get(slot_index)?;
        let panel_index = slot.panel_index?;
        if !store.get(panel_index)?.has_image() || slot.bounds.size().is_empty() {
            return None;
        }
        Some(Self {
            panel_index,
            slot_aspect: slot.bounds.size().aspect(),
            slot_width_pt: slot.bounds.width / frame.scale,
            tab: EditorTab::default(),
            drag: None,
        })
    }

    pub fn panel_index(&self) -> usize {
        self.panel_index
    }

    pub fn slot_aspect(&self) -> f64 {
        self.slot_aspect
    }

    pub fn tab(&self) -> EditorTab {
        self.tab
    }

    /// Switching tabs abandons any drag in progress.
    pub fn set_tab(&mut self, tab: EditorTab) {
        self.tab = tab;
        self.drag = None;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn panel<'s>(&self, store: &'s PanelStore) -> Option<&'s ComicPanel> {
        store.get(self.panel_index)
    }

    // Crop tab

    /// Crop window and image placement for an image of natural size
    /// `image` shown in `viewport`.
    pub fn crop_view(&self, store: &PanelStore, image: Size, viewport: Size) -> Option<CropView> {
        let anchor = self.panel(store)?.anchor();
        CropView::compute(image, viewport, self.slot_aspect, anchor)
    }

    pub fn begin_crop_drag(&mut self, store: &PanelStore, image: Size, viewport: Size, pointer: Point) -> bool {
        if self.tab != EditorTab::Crop || self.drag.is_some() {
            return false;
        }
        let Some(panel) = self.panel(store) else {
            return false;
        };
        let Some(view) = CropView::compute(image, viewport, self.slot_aspect, panel.anchor()) else {
            return false;
        };
        let axis = travel_axis(image, view.crop_window.size());
        let mut drag = CropDrag::new(axis, view.crop_window, panel.anchor());
        if !drag.begin(pointer) {
            return false;
        }
        self.drag = Some(ActiveDrag::Crop(drag));
        true
    }

    // Text tab

    /// The enlarged panel box inside the editor viewport.
    pub fn panel_box(&self, viewport: Size) -> Rect {
        let (width, height) = if self.slot_aspect > viewport.aspect() {
            let w = viewport.width * PANEL_FILL;
            (w, w / self.slot_aspect)
        } else {
            let h = viewport.height * PANEL_FILL;
            (h * self.slot_aspect, h)
        };
        Rect::new(
            (viewport.width - width) / 2.0,
            (viewport.height - height) / 2.0,
            width,
            height,
        )
    }

    /// Bubbles as they appear on the enlarged panel.
    pub fn bubble_layouts(&self, store: &PanelStore, viewport: Size) -> Vec<BubbleLayout> {
        let Some(panel) = self.panel(store) else {
            return Vec::new();
        };
        let container = self.panel_box(viewport);
        let scale = container.width / self.slot_width_pt;
        let style = BubbleStyle::default();
        panel
            .bubbles()
            .map(|(text_box, position)| layout_bubble(text_box, &position, &container, &style, scale))
            .collect()
    }

    pub fn begin_bubble_drag(&mut self, store: &PanelStore, text_index: usize, viewport: Size, pointer: Point) -> bool {
        if self.tab != EditorTab::Text || self.drag.is_some() {
            return false;
        }
        let Some(position) = self.panel(store).and_then(|p| p.text_positions.get(text_index).copied()) else {
            return false;
        };
        let mut drag = BubbleDrag::new(self.panel_box(viewport), position);
        if !drag.begin(pointer) {
            return false;
        }
        self.drag = Some(ActiveDrag::Bubble { text_index, drag });
        true
    }

    /// Feed a pointer move to the active drag, writing the result through.
    pub fn pointer_move(&mut self, store: &mut PanelStore, pointer: Point) -> bool {
        let index = self.panel_index;
        match &mut self.drag {
            Some(ActiveDrag::Crop(drag)) => drag
                .move_to(pointer)
                .is_some_and(|anchor| store.set_crop_anchor(index, anchor)),
            Some(ActiveDrag::Bubble { text_index, drag }) => drag
                .move_to(pointer)
                .is_some_and(|position| store.update_text_position(index, *text_index, position)),
            None => false,
        }
    }

    pub fn pointer_up(&mut self, store: &mut PanelStore) -> bool {
        let index = self.panel_index;
        match self.drag.take() {
            Some(ActiveDrag::Crop(mut drag)) => drag.end().is_some_and(|anchor| store.set_crop_anchor(index, anchor)),
            Some(ActiveDrag::Bubble { text_index, mut drag }) => drag
                .end()
                .is_some_and(|position| store.update_text_position(index, text_index, position)),
            None => false,
        }
    }

    pub fn toggle_flip(&self, store: &mut PanelStore, text_index: usize) -> bool {
        let Some(mut position) = self.panel(store).and_then(|p| p.text_positions.get(text_index).copied()) else {
            return false;
        };
        position.is_flipped = !position.is_flipped;
        store.update_text_position(self.panel_index, text_index, position)
    }

    /// Move a tail, snapping the offset to the nearest allowed stop.
    pub fn set_tail(&self, store: &mut PanelStore, text_index: usize, side: TailSide, offset: f64) -> bool {
        let Some(mut position) = self.panel(store).and_then(|p| p.text_positions.get(text_index).copied()) else {
            return false;
        };
        position.tail_position = snap_tail(side, offset);
        store.update_text_position(self.panel_index, text_index, position)
    }

    pub fn append_text(&self, store: &mut PanelStore, text: Vec<TextBox>) -> bool {
        store.append_text(self.panel_index, text)
    }

    pub fn remove_text(&mut self, store: &mut PanelStore, text_index: usize) -> bool {
        if matches!(self.drag, Some(ActiveDrag::Bubble { .. })) {
            self.drag = None;
        }
        store.remove_text(self.panel_index, text_index)
    }

    // Prompt tab

    pub fn set_prompt(&self, store: &mut PanelStore, prompt: &str) -> bool {
        store.set_image_prompt(self.panel_index, prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::default_template;
    use crate::model::{Anchor, ExportOptions, PageAssignment, PanelShape};
    use crate::preview::PreviewRenderer;

    fn setup() -> (PanelStore, PreviewFrame) {
        let panels = (0..6)
            .map(|i| {
                let mut p = ComicPanel::new(&format!("p{}", i), PanelShape::Square);
                if i != 5 {
                    p.image_url = Some(format!("https://img/{}.png", i));
                }
                p
            })
            .collect();
        let store = PanelStore::new(panels);
        let page = PageAssignment {
            layout: default_template(),
            start_index: 2,
        };
        let renderer = PreviewRenderer::new(ExportOptions::default(), Size::new(800.0, 1000.0));
        let frame = renderer.frame(&page, &store);
        (store, frame)
    }

    #[test]
    fn test_open_maps_slot_to_absolute_index() {
        let (store, frame) = setup();
        let editor = PanelEditor::open(&frame, 1, &store).unwrap();
        assert_eq!(editor.panel_index(), 3);
        assert_eq!(editor.tab(), EditorTab::Crop);
        // Panel 5 has no artwork.
        assert!(PanelEditor::open(&frame, 3, &store).is_none());
        assert!(PanelEditor::open(&frame, 9, &store).is_none());
    }

    #[test]
    fn test_crop_drag_writes_through() {
        let (mut store, frame) = setup();
        let mut editor = PanelEditor::open(&frame, 0, &store).unwrap();
        let image = Size::new(2000.0, 1000.0);
        let viewport = Size::new(600.0, 400.0);
        let view = editor.crop_view(&store, image, viewport).unwrap();

        assert!(editor.begin_crop_drag(&store, image, viewport, Point { x: 300.0, y: 200.0 }));
        assert!(editor.is_dragging());
        let dx = view.crop_window.width / 4.0;
        assert!(editor.pointer_move(&mut store, Point { x: 300.0 - dx, y: 200.0 }));
        let anchor = store.get(2).unwrap().anchor();
        assert!((anchor.x - 0.25).abs() < 1e-9);
        assert_eq!(anchor.y, 0.5);

        assert!(editor.pointer_up(&mut store));
        assert!(!editor.is_dragging());
        assert!(!editor.pointer_move(&mut store, Point { x: 0.0, y: 0.0 }));
    }

    #[test]
    fn test_edits_survive_closing() {
        let (mut store, frame) = setup();
        {
            let editor = PanelEditor::open(&frame, 2, &store).unwrap();
            editor.set_prompt(&mut store, "A new prompt");
            editor.append_text(&mut store, vec![TextBox::speech("Rex", "Woof")]);
        }
        let panel = store.get(4).unwrap();
        assert_eq!(panel.image_prompt, "A new prompt");
        assert_eq!(panel.text.len(), 1);
        assert_eq!(panel.text_positions.len(), 1);
    }

    #[test]
    fn test_bubble_drag_only_on_text_tab() {
        let (mut store, frame) = setup();
        let mut editor = PanelEditor::open(&frame, 0, &store).unwrap();
        editor.append_text(&mut store, vec![TextBox::speech("A", "Hi")]);
        let viewport = Size::new(500.0, 500.0);
        assert!(!editor.begin_bubble_drag(&store, 0, viewport, Point { x: 250.0, y: 250.0 }));

        editor.set_tab(EditorTab::Text);
        assert!(!editor.begin_bubble_drag(&store, 3, viewport, Point { x: 250.0, y: 250.0 }));
        assert!(editor.begin_bubble_drag(&store, 0, viewport, Point { x: 250.0, y: 250.0 }));
        let panel_box = editor.panel_box(viewport);
        let target = Point {
            x: panel_box.x + panel_box.width * 0.1,
            y: panel_box.y + panel_box.height * 0.8,
        };
        assert!(editor.pointer_move(&mut store, target));
        editor.pointer_up(&mut store);
        let position = store.get(2).unwrap().text_positions[0];
        assert!((position.x - 10.0).abs() < 1e-9);
        assert!((position.y - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_flip_and_tail_snapping() {
        let (mut store, frame) = setup();
        let editor = PanelEditor::open(&frame, 0, &store).unwrap();
        editor.append_text(&mut store, vec![TextBox::speech("A", "Hi")]);
        assert!(editor.toggle_flip(&mut store, 0));
        assert!(editor.set_tail(&mut store, 0, TailSide::Right, 61.0));
        let position = store.get(2).unwrap().text_positions[0];
        assert!(position.is_flipped);
        assert_eq!(position.tail_position.side, TailSide::Right);
        assert_eq!(position.tail_position.offset, 50.0);
        assert!(!editor.toggle_flip(&mut store, 7));
    }

    #[test]
    fn test_remove_text_keeps_alignment() {
        let (mut store, frame) = setup();
        let mut editor = PanelEditor::open(&frame, 0, &store).unwrap();
        editor.append_text(&mut store, vec![TextBox::speech("A", "one"), TextBox::narration("two")]);
        assert!(editor.remove_text(&mut store, 0));
        let panel = store.get(2).unwrap();
        assert_eq!(panel.text, vec![TextBox::narration("two")]);
        assert_eq!(panel.text_positions.len(), 1);
    }

    #[test]
    fn test_editor_bubbles_scale_with_panel_box() {
        let (mut store, frame) = setup();
        let editor = PanelEditor::open(&frame, 0, &store).unwrap();
        editor.append_text(&mut store, vec![TextBox::speech("A", "Hi")]);
        let small = editor.bubble_layouts(&store, Size::new(300.0, 300.0));
        let large = editor.bubble_layouts(&store, Size::new(600.0, 600.0));
        assert_eq!(small.len(), 1);
        assert!((large[0].frame.width - 2.0 * small[0].frame.width).abs() < 1e-9);
        assert_eq!(store.get(2).unwrap().anchor(), Anchor::CENTER);
    }
}
