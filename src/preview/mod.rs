//! # Interactive Preview
//!
//! Positioned display lists for the on-screen page. The host toolkit draws
//! them; this module only decides where everything goes.
//!
//! The preview page box stands for the whole A4 sheet. Margins, slot
//! padding and bubble geometry are converted with the same points-to-pixels
//! factor, so the preview is the exported page shrunk to fit the viewport.

pub mod canvas;
pub mod editor;
pub mod listeners;

pub use canvas::{CanvasDivider, CanvasLeaf, LayoutCanvas, LayoutCanvasFrame};
pub use editor::{EditorTab, PanelEditor};
pub use listeners::{ResizeListeners, Subscription};

use std::collections::HashMap;

use crate::bubble::{layout_bubble, BubbleLayout, BubbleStyle};
use crate::crop::{object_position, resolve_cover, SourceRect};
use crate::geometry::{fit_page, mm_to_pt, Point, Rect, Size};
use crate::image_loader::panel_image_source;
use crate::layout::slot_panel_index;
use crate::model::{Anchor, ExportOptions, PageAssignment, PanelStore};
use crate::pdf::page_size;

/// Space kept free around the page box, in viewport pixels.
pub const VIEWPORT_PADDING: f64 = 48.0;

/// Label shown in slots without artwork.
pub const NO_IMAGE_LABEL: &str = "No image";

/// What a slot shows.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotContent {
    Image {
        src: String,
        anchor: Anchor,
        /// CSS `object-position` for hosts that let the browser crop.
        object_position: String,
        /// Exact source rectangle, once the image's natural size is known.
        crop: Option<SourceRect>,
    },
    Placeholder {
        label: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotView {
    pub slot_index: usize,
    /// Absolute panel index, `None` past the end of the panel list.
    pub panel_index: Option<usize>,
    /// Viewport pixels.
    pub bounds: Rect,
    pub content: SlotContent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BubbleView {
    pub panel_index: usize,
    pub text_index: usize,
    /// The bubble's panel box, which drags are measured against.
    pub container: Rect,
    pub layout: BubbleLayout,
}

/// Everything needed to draw one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewFrame {
    pub page: Rect,
    /// Viewport pixels per PDF point.
    pub scale: f64,
    pub slots: Vec<SlotView>,
    /// Drawn above every slot.
    pub bubbles: Vec<BubbleView>,
}

impl PreviewFrame {
    /// Topmost bubble under `point`.
    pub fn bubble_at(&self, point: Point) -> Option<&BubbleView> {
        self.bubbles.iter().rev().find(|b| b.layout.contains(point))
    }

    pub fn slot_at(&self, point: Point) -> Option<&SlotView> {
        self.slots.iter().find(|s| s.bounds.contains(point))
    }
}

/// Lays out preview pages for a viewport.
#[derive(Debug, Clone)]
pub struct PreviewRenderer {
    options: ExportOptions,
    viewport: Size,
    style: BubbleStyle,
    natural_sizes: HashMap<usize, (u32, u32)>,
}

impl PreviewRenderer {
    pub fn new(options: ExportOptions, viewport: Size) -> Self {
        Self {
            options,
            viewport,
            style: BubbleStyle::default(),
            natural_sizes: HashMap::new(),
        }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: ExportOptions) {
        self.options = options;
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// New viewport size. Returns the refitted page box.
    pub fn resize(&mut self, viewport: Size) -> Rect {
        self.viewport = viewport;
        self.page_box()
    }

    /// Record a panel image's natural size once the host has loaded it.
    pub fn set_image_size(&mut self, panel_index: usize, width: u32, height: u32) {
        self.natural_sizes.insert(panel_index, (width, height));
    }

    /// Forget cached image sizes, e.g. after panels were regenerated.
    pub fn clear_image_sizes(&mut self) {
        self.natural_sizes.clear();
    }

    /// The page box, centred in the viewport.
    pub fn page_box(&self) -> Rect {
        let size = fit_page(self.viewport, self.options.orientation, VIEWPORT_PADDING);
        Rect::new(
            (self.viewport.width - size.width) / 2.0,
            (self.viewport.height - size.height) / 2.0,
            size.width,
            size.height,
        )
    }

    /// Viewport pixels per PDF point.
    pub fn scale(&self) -> f64 {
        let page = page_size(self.options.orientation);
        self.page_box().width / page.width
    }

    /// Pixel bounds of every slot of `page`, padding applied.
    pub fn slot_bounds(&self, page: &PageAssignment) -> Vec<Rect> {
        let page_box = self.page_box();
        let scale = self.scale();
        let usable = page_box.inset(mm_to_pt(self.options.margin_mm.max(0.0)) * scale);
        let padding = mm_to_pt(self.options.panel_padding_mm.max(0.0)) * scale;
        page.layout
            .slots
            .iter()
            .map(|slot| slot.bounds().percent_of(&usable).inset(padding))
            .collect()
    }

    pub fn frame(&self, page: &PageAssignment, store: &PanelStore) -> PreviewFrame {
        let scale = self.scale();
        let panels = store.panels();

        let slots: Vec<SlotView> = self
            .slot_bounds(page)
            .into_iter()
            .enumerate()
            .map(|(slot_index, bounds)| {
                let panel_index = slot_panel_index(page, slot_index, panels.len());
                let content = panel_index
                    .and_then(|i| {
                        let panel = &panels[i];
                        panel_image_source(panel).map(|src| {
                            let anchor = panel.anchor();
                            let crop = self
                                .natural_sizes
                                .get(&i)
                                .map(|&(w, h)| resolve_cover(w, h, bounds.size(), anchor));
                            SlotContent::Image {
                                src: src.to_string(),
                                anchor,
                                object_position: object_position(anchor),
                                crop,
                            }
                        })
                    })
                    .unwrap_or(SlotContent::Placeholder {
                        label: NO_IMAGE_LABEL,
                    });
                SlotView {
                    slot_index,
                    panel_index,
                    bounds,
                    content,
                }
            })
            .collect();

        let mut bubbles = Vec::new();
        for slot in &slots {
            let Some(panel_index) = slot.panel_index else {
                continue;
            };
            for (text_index, (text_box, position)) in panels[panel_index].bubbles().enumerate() {
                bubbles.push(BubbleView {
                    panel_index,
                    text_index,
                    container: slot.bounds,
                    layout: layout_bubble(text_box, &position, &slot.bounds, &self.style, scale),
                });
            }
        }

        PreviewFrame {
            page: self.page_box(),
            scale,
            slots,
            bubbles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::PageGeometry;
    use crate::layout::default_template;
    use crate::model::{ComicPanel, CropSettings, PanelShape, TextBox, TextPosition};

    fn page() -> PageAssignment {
        PageAssignment {
            layout: default_template(),
            start_index: 0,
        }
    }

    fn store_with(count: usize) -> PanelStore {
        let panels = (0..count)
            .map(|i| {
                let mut p = ComicPanel::new(&format!("panel {}", i), PanelShape::Square);
                p.image_url = Some(format!("https://img/{}.png", i));
                p
            })
            .collect();
        PanelStore::new(panels)
    }

    #[test]
    fn test_page_box_is_centred_a4() {
        let renderer = PreviewRenderer::new(ExportOptions::default(), Size::new(1000.0, 800.0));
        let page = renderer.page_box();
        assert!((page.height - 752.0).abs() < 1e-9);
        assert!((page.height / page.width - 1.4142).abs() < 1e-9);
        assert!((page.center().x - 500.0).abs() < 1e-9);
        assert!((page.center().y - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_resize_refits() {
        let mut renderer = PreviewRenderer::new(ExportOptions::default(), Size::new(1000.0, 800.0));
        let before = renderer.page_box();
        let after = renderer.resize(Size::new(500.0, 800.0));
        assert!(after.width < before.width);
        assert_eq!(renderer.viewport(), Size::new(500.0, 800.0));
    }

    #[test]
    fn test_slots_match_export_proportions() {
        let renderer = PreviewRenderer::new(ExportOptions::default(), Size::new(1000.0, 1200.0));
        let geometry = PageGeometry::new(&ExportOptions::default()).unwrap();
        let preview = renderer.slot_bounds(&page());
        let page_box = renderer.page_box();

        // Same slots in export points, shifted onto the page and scaled down.
        let usable = geometry.usable;
        for (slot, bounds) in page().layout.slots.iter().zip(&preview) {
            let export = slot.bounds().percent_of(&usable).inset(geometry.panel_padding);
            let s = renderer.scale();
            let expected = Rect::new(
                page_box.x + export.x * s,
                page_box.y + export.y * s,
                export.width * s,
                export.height * s,
            );
            assert!(bounds.approx_eq(&expected, 0.1), "{:?} vs {:?}", bounds, expected);
        }
    }

    #[test]
    fn test_frame_images_and_placeholders() {
        let mut store = store_with(3);
        store.set_crop_anchor(1, Anchor::new(0.0, 0.5));
        let renderer = PreviewRenderer::new(ExportOptions::default(), Size::new(800.0, 1000.0));
        let frame = renderer.frame(&page(), &store);

        assert_eq!(frame.slots.len(), 4);
        match &frame.slots[1].content {
            SlotContent::Image {
                src, object_position, crop, ..
            } => {
                assert_eq!(src, "https://img/1.png");
                assert_eq!(object_position, "0% 50%");
                assert!(crop.is_none());
            }
            other => panic!("expected image, got {:?}", other),
        }
        assert_eq!(frame.slots[3].panel_index, None);
        assert_eq!(
            frame.slots[3].content,
            SlotContent::Placeholder { label: NO_IMAGE_LABEL }
        );
    }

    #[test]
    fn test_frame_crop_uses_shared_resolver() {
        let store = store_with(4);
        let mut renderer = PreviewRenderer::new(ExportOptions::default(), Size::new(800.0, 1000.0));
        renderer.set_image_size(0, 2000, 1000);
        let frame = renderer.frame(&page(), &store);
        let slot = &frame.slots[0];
        let SlotContent::Image { crop: Some(crop), .. } = &slot.content else {
            panic!("expected a resolved crop");
        };
        assert_eq!(*crop, resolve_cover(2000, 1000, slot.bounds.size(), Anchor::CENTER));
    }

    #[test]
    fn test_bubbles_follow_slot_and_hit_test() {
        let mut store = PanelStore::new(vec![ComicPanel::new("a", PanelShape::Square)]);
        store.append_text(0, vec![TextBox::speech("A", "Hi"), TextBox::narration("Later")]);
        store.update_text_position(
            0,
            1,
            TextPosition {
                x: 50.0,
                y: 90.0,
                ..Default::default()
            },
        );
        let renderer = PreviewRenderer::new(ExportOptions::default(), Size::new(800.0, 1000.0));
        let frame = renderer.frame(&page(), &store);

        assert_eq!(frame.bubbles.len(), 2);
        let first = &frame.bubbles[0];
        assert_eq!(first.container, frame.slots[0].bounds);
        let c = first.layout.frame.center();
        assert!((c.x - first.container.center().x).abs() < 1e-9);

        let hit = frame.bubble_at(frame.bubbles[1].layout.frame.center()).unwrap();
        assert_eq!(hit.text_index, 1);
        assert!(frame.slot_at(Point { x: 0.0, y: 0.0 }).is_none());
        assert_eq!(frame.slot_at(frame.slots[2].bounds.center()).unwrap().slot_index, 2);
    }

    #[test]
    fn test_preview_bubbles_scale_with_page() {
        let mut store = PanelStore::new(vec![ComicPanel::new("a", PanelShape::Square)]);
        store.append_text(0, vec![TextBox::speech("A", "Hello there")]);
        let renderer = PreviewRenderer::new(ExportOptions::default(), Size::new(400.0, 500.0));
        let frame = renderer.frame(&page(), &store);
        let bubble = &frame.bubbles[0].layout;
        assert!((bubble.frame.width - 200.0 * frame.scale).abs() < 1e-9);
        assert!((bubble.font_size - 14.0 * frame.scale).abs() < 1e-9);
    }

    #[test]
    fn test_anchor_from_store_reaches_frame() {
        let mut store = store_with(1);
        store.update_panel(0, |p| {
            p.crop_settings = Some(CropSettings {
                anchor: Anchor::new(1.0, 0.25),
            })
        });
        let renderer = PreviewRenderer::new(ExportOptions::default(), Size::new(800.0, 1000.0));
        let frame = renderer.frame(&page(), &store);
        let SlotContent::Image { anchor, .. } = &frame.slots[0].content else {
            panic!("expected image");
        };
        assert_eq!(*anchor, Anchor::new(1.0, 0.25));
    }
}
