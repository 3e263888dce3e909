//! # PDF Export Pipeline
//!
//! Turns a page/panel snapshot into a PDF. Pages are rendered strictly one
//! after another: each gets its own supersampled canvas, which is encoded
//! into the document and dropped before the next page starts.
//!
//! Geometry is the same as the preview's. Slots are percentages of the
//! usable area, artwork goes through [`resolve_cover`](crate::crop::resolve_cover),
//! and bubbles use [`layout_bubble`] with panel-relative positions. Only
//! the scale differs.

use std::borrow::Cow;

use crate::bubble::{layout_bubble, BubbleStyle};
use crate::error::{PanelcraftError, Result};
use crate::geometry::{mm_to_pt, Rect, Size};
use crate::image_loader::{load_image, panel_image_source, ImageFetcher};
use crate::layout::{indices_consistent, reindexed, slot_panel_index};
use crate::model::{ComicPanel, ComicProject, ExportOptions, PageAssignment};
use crate::pdf::{page_size, Metadata, PageImage, PdfPage, PdfWriter, TextRun};
use crate::raster::{pixmap_from_image, Canvas};
use crate::style::Color;

/// Lowest accepted canvas pixels per point.
pub const MIN_SUPERSAMPLE: f64 = 2.0;

/// Headline shown on the blocking overlay while an export runs.
pub const OVERLAY_TITLE: &str = "Generating PDF...";
/// Secondary overlay line.
pub const OVERLAY_DETAIL: &str = "This may take a few moments";

/// Fill for slots with no artwork.
pub const PLACEHOLDER_COLOR: Color = Color {
    r: 243.0 / 255.0,
    g: 244.0 / 255.0,
    b: 246.0 / 255.0,
    a: 1.0,
};

/// Host callbacks around an export. `begin` and `end` bracket the whole
/// run; `end` is called on every exit path, errors included.
pub trait ExportHooks {
    fn begin(&mut self, _title: &str, _detail: &str) {}

    fn end(&mut self) {}

    /// Checked before each page. Returning `true` stops the export.
    fn should_abort(&mut self, _page: usize) -> bool {
        false
    }

    fn page_rendered(&mut self, _page: usize, _total: usize) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl ExportHooks for NoHooks {}

struct OverlayGuard<'a> {
    hooks: &'a mut dyn ExportHooks,
}

impl<'a> OverlayGuard<'a> {
    fn show(hooks: &'a mut dyn ExportHooks) -> Self {
        hooks.begin(OVERLAY_TITLE, OVERLAY_DETAIL);
        Self { hooks }
    }
}

impl Drop for OverlayGuard<'_> {
    fn drop(&mut self) {
        self.hooks.end();
    }
}

/// Page dimensions derived from [`ExportOptions`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Full page in points.
    pub page: Size,
    /// Page minus margins, in points from the top-left corner.
    pub usable: Rect,
    /// Canvas pixels per point.
    pub scale: f64,
    /// Slot inset in points.
    pub panel_padding: f64,
}

impl PageGeometry {
    pub fn new(options: &ExportOptions) -> Result<Self> {
        if !options.supersample.is_finite() || options.supersample < MIN_SUPERSAMPLE {
            return Err(PanelcraftError::render(format!(
                "supersample must be at least {MIN_SUPERSAMPLE}, got {}",
                options.supersample
            )));
        }
        let page = page_size(options.orientation);
        let margin = mm_to_pt(options.margin_mm.max(0.0));
        let usable = Rect::new(margin, margin, page.width - 2.0 * margin, page.height - 2.0 * margin);
        if usable.width <= 0.0 || usable.height <= 0.0 {
            return Err(PanelcraftError::render(format!(
                "margin of {}mm leaves no printable area",
                options.margin_mm
            )));
        }
        Ok(Self {
            page,
            usable,
            scale: options.supersample,
            panel_padding: mm_to_pt(options.panel_padding_mm.max(0.0)),
        })
    }

    /// Canvas dimensions in pixels.
    pub fn canvas_size(&self) -> (u32, u32) {
        (
            (self.usable.width * self.scale).round().max(1.0) as u32,
            (self.usable.height * self.scale).round().max(1.0) as u32,
        )
    }
}

/// A rasterized page plus the text to set on top of it.
pub struct RenderedPage {
    pub canvas: Canvas,
    /// Overlay lines in page points.
    pub text: Vec<TextRun>,
}

/// Rasterize one page.
pub fn render_page(
    page: &PageAssignment,
    panels: &[ComicPanel],
    geometry: &PageGeometry,
    fetcher: &dyn ImageFetcher,
) -> Result<RenderedPage> {
    let (width, height) = geometry.canvas_size();
    let mut canvas = Canvas::new(width, height)?;
    canvas.fill(Color::WHITE);

    let scale = geometry.scale;
    let area = Rect::new(0.0, 0.0, width as f64, height as f64);
    let slots: Vec<(Rect, Option<usize>)> = page
        .layout
        .slots
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            let dest = slot.bounds().percent_of(&area).inset(geometry.panel_padding * scale);
            (dest, slot_panel_index(page, i, panels.len()))
        })
        .collect();

    for (slot_index, (dest, panel_index)) in slots.iter().enumerate() {
        let source = panel_index.and_then(|i| panel_image_source(&panels[i]).map(|src| (i, src)));
        match source {
            Some((index, src)) => {
                let image = load_image(src, fetcher).map_err(|e| PanelcraftError::image(index, e))?;
                let pixmap = pixmap_from_image(&image)?;
                let crop = canvas.draw_image_cover(&pixmap, dest, panels[index].anchor());
                tracing::debug!(slot = slot_index, panel = index, ?crop, "drew panel");
            }
            None => {
                if panel_index.is_none() {
                    tracing::warn!(slot = slot_index, start = page.start_index, "slot has no panel");
                }
                canvas.fill_rect(dest, PLACEHOLDER_COLOR);
            }
        }
        canvas.stroke_rect(dest, Color::BLACK, scale);
    }

    let style = BubbleStyle::default();
    let mut text = Vec::new();
    for (dest, panel_index) in &slots {
        let Some(panel) = panel_index.map(|i| &panels[i]) else {
            continue;
        };
        for (text_box, position) in panel.bubbles() {
            let bubble = layout_bubble(text_box, &position, dest, &style, scale);
            canvas.draw_bubble(&bubble, &style);
            text.extend(bubble.lines.iter().map(|line| TextRun {
                text: line.text.clone(),
                x: geometry.usable.x + line.x / scale,
                baseline: geometry.usable.y + line.baseline / scale,
                font_size: bubble.font_size / scale,
                color: style.text,
            }));
        }
    }

    Ok(RenderedPage { canvas, text })
}

/// Render every page and assemble the PDF. Nothing is returned unless every
/// page succeeds.
#[tracing::instrument(skip_all, fields(pages = pages.len(), panels = panels.len()))]
pub fn export_pdf(
    pages: &[PageAssignment],
    panels: &[ComicPanel],
    options: &ExportOptions,
    fetcher: &dyn ImageFetcher,
    hooks: &mut dyn ExportHooks,
) -> Result<Vec<u8>> {
    if pages.is_empty() {
        return Err(PanelcraftError::render("no pages to export"));
    }
    let geometry = PageGeometry::new(options)?;
    let pages: Cow<'_, [PageAssignment]> = if indices_consistent(pages) {
        Cow::Borrowed(pages)
    } else {
        tracing::warn!("page start indices out of sequence, re-deriving");
        Cow::Owned(reindexed(pages))
    };

    let mut overlay = OverlayGuard::show(hooks);
    let mut pdf_pages = Vec::with_capacity(pages.len());
    for (index, page) in pages.iter().enumerate() {
        if overlay.hooks.should_abort(index) {
            tracing::info!(page = index, "export aborted");
            return Err(PanelcraftError::Aborted { page: index });
        }

        let rendered = render_page(page, panels, &geometry, fetcher)?;
        let (width, height) = geometry.canvas_size();
        let image = PageImage::encode(rendered.canvas.to_rgb8(), width, height, options.encoding)?;
        pdf_pages.push(PdfPage {
            size: geometry.page,
            image,
            image_rect: geometry.usable,
            text: rendered.text,
        });
        tracing::debug!(page = index, width, height, "page rendered");
        overlay.hooks.page_rendered(index, pages.len());
    }

    let metadata = Metadata {
        title: Some(options.title.clone()),
    };
    let bytes = PdfWriter::new().write(&pdf_pages, &metadata);
    tracing::info!(bytes = bytes.len(), "export complete");
    Ok(bytes)
}

/// [`export_pdf`] over a whole project.
pub fn export_project(
    project: &ComicProject,
    fetcher: &dyn ImageFetcher,
    hooks: &mut dyn ExportHooks,
) -> Result<Vec<u8>> {
    export_pdf(&project.pages, &project.panels, &project.options, fetcher, hooks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_loader::NoFetcher;
    use crate::layout::default_template;
    use crate::model::{LayoutTemplate, PageEncoding, PanelShape, PanelSlot, TextBox, TextPosition};

    #[derive(Default)]
    struct Recorder {
        begun: Vec<(String, String)>,
        ended: usize,
        abort_at: Option<usize>,
        rendered: Vec<usize>,
    }

    impl ExportHooks for Recorder {
        fn begin(&mut self, title: &str, detail: &str) {
            self.begun.push((title.to_string(), detail.to_string()));
        }

        fn end(&mut self) {
            self.ended += 1;
        }

        fn should_abort(&mut self, page: usize) -> bool {
            self.abort_at == Some(page)
        }

        fn page_rendered(&mut self, page: usize, _total: usize) {
            self.rendered.push(page);
        }
    }

    fn one_slot_page(start_index: usize) -> PageAssignment {
        PageAssignment {
            layout: LayoutTemplate {
                id: "single".into(),
                name: "Single".into(),
                slots: vec![PanelSlot::new(0.0, 0.0, 100.0, 100.0)],
            },
            start_index,
        }
    }

    fn small_options() -> ExportOptions {
        ExportOptions {
            supersample: MIN_SUPERSAMPLE,
            encoding: PageEncoding::Flate,
            ..Default::default()
        }
    }

    fn png_data_uri(pixel: [u8; 4]) -> String {
        use base64::Engine;
        let img = image::RgbaImage::from_pixel(8, 8, image::Rgba(pixel));
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), 8, 8, image::ColorType::Rgba8).unwrap();
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(buf)
        )
    }

    #[test]
    fn test_missing_image_renders_placeholder_and_border() {
        let panels = vec![ComicPanel::new("empty", PanelShape::Square)];
        let options = ExportOptions {
            supersample: 2.0,
            ..small_options()
        };
        let geometry = PageGeometry::new(&options).unwrap();
        let rendered = render_page(&one_slot_page(0), &panels, &geometry, &NoFetcher).unwrap();
        let (w, h) = geometry.canvas_size();
        assert_eq!(rendered.canvas.pixel(w / 2, h / 2), Some(PLACEHOLDER_COLOR.to_rgba8()));

        // 1mm padding is ~5.67px at this scale; the 2px border straddles it.
        let edge = rendered.canvas.pixel(w / 2, 5).unwrap();
        assert!(edge[0] < 40, "expected a dark border pixel, got {:?}", edge);
        assert_eq!(rendered.canvas.pixel(0, 0), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_missing_image_export_succeeds() {
        let panels = vec![ComicPanel::new("empty", PanelShape::Square)];
        let mut hooks = Recorder::default();
        let bytes = export_pdf(&[one_slot_page(0)], &panels, &small_options(), &NoFetcher, &mut hooks).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert_eq!(hooks.begun, vec![(OVERLAY_TITLE.to_string(), OVERLAY_DETAIL.to_string())]);
        assert_eq!(hooks.ended, 1);
        assert_eq!(hooks.rendered, vec![0]);
    }

    #[test]
    fn test_out_of_range_slot_is_placeholder() {
        let geometry = PageGeometry::new(&small_options()).unwrap();
        let rendered = render_page(&one_slot_page(5), &[], &geometry, &NoFetcher).unwrap();
        let (w, h) = geometry.canvas_size();
        assert_eq!(rendered.canvas.pixel(w / 2, h / 2), Some(PLACEHOLDER_COLOR.to_rgba8()));
        assert!(rendered.text.is_empty());
    }

    #[test]
    fn test_image_is_drawn() {
        let mut panel = ComicPanel::new("red", PanelShape::Square);
        panel.image_base64 = Some(png_data_uri([200, 0, 0, 255]));
        let geometry = PageGeometry::new(&small_options()).unwrap();
        let rendered = render_page(&one_slot_page(0), &[panel], &geometry, &NoFetcher).unwrap();
        let (w, h) = geometry.canvas_size();
        let px = rendered.canvas.pixel(w / 2, h / 2).unwrap();
        assert!(px[0].abs_diff(200) <= 2 && px[1] <= 2 && px[2] <= 2, "got {:?}", px);
    }

    #[test]
    fn test_zero_pages_is_error() {
        let mut hooks = Recorder::default();
        let err = export_pdf(&[], &[], &ExportOptions::default(), &NoFetcher, &mut hooks).unwrap_err();
        assert!(matches!(err, PanelcraftError::Render(ref m) if m == "no pages to export"));
        assert!(hooks.begun.is_empty());
    }

    #[test]
    fn test_decode_failure_names_panel_and_tears_down_overlay() {
        let mut good = ComicPanel::new("a", PanelShape::Square);
        good.image_base64 = Some(png_data_uri([0, 0, 0, 255]));
        let mut bad = ComicPanel::new("b", PanelShape::Square);
        bad.image_base64 = Some("bm90IGFuIGltYWdl".into());
        let pages = vec![PageAssignment {
            layout: default_template(),
            start_index: 0,
        }];
        let mut hooks = Recorder::default();
        let err = export_pdf(&pages, &[good, bad], &small_options(), &NoFetcher, &mut hooks).unwrap_err();
        assert!(matches!(err, PanelcraftError::Image { panel: 1, .. }));
        assert_eq!(hooks.ended, 1);
        assert!(hooks.rendered.is_empty());
    }

    #[test]
    fn test_abort_between_pages() {
        let panels = vec![ComicPanel::new("a", PanelShape::Square); 2];
        let pages = vec![one_slot_page(0), one_slot_page(1)];
        let mut hooks = Recorder {
            abort_at: Some(1),
            ..Default::default()
        };
        let err = export_pdf(&pages, &panels, &small_options(), &NoFetcher, &mut hooks).unwrap_err();
        assert!(matches!(err, PanelcraftError::Aborted { page: 1 }));
        assert_eq!(hooks.rendered, vec![0]);
        assert_eq!(hooks.ended, 1);
    }

    #[test]
    fn test_bubble_text_is_in_page_points() {
        let mut panel = ComicPanel::new("talk", PanelShape::Square);
        panel.text = vec![TextBox::speech("A", "Hello")];
        panel.text_positions = vec![TextPosition::default()];
        let panels = vec![panel];

        let coarse = PageGeometry::new(&small_options()).unwrap();
        let fine = PageGeometry::new(&ExportOptions {
            supersample: 3.0,
            ..small_options()
        })
        .unwrap();
        let a = render_page(&one_slot_page(0), &panels, &coarse, &NoFetcher).unwrap();
        let b = render_page(&one_slot_page(0), &panels, &fine, &NoFetcher).unwrap();

        assert_eq!(a.text.len(), 1);
        assert_eq!(a.text[0].text, "Hello");
        assert!((a.text[0].font_size - 14.0).abs() < 1e-9);
        assert!((a.text[0].x - b.text[0].x).abs() < 1.0);
        assert!((a.text[0].baseline - b.text[0].baseline).abs() < 1.0);
        // Centred in the usable area.
        let center = coarse.usable.center();
        assert!((a.text[0].baseline - center.y).abs() < 14.0);
    }

    #[test]
    fn test_supersample_below_two_is_rejected() {
        for supersample in [0.0, 0.5, 1.0, 1.99, f64::NAN] {
            let options = ExportOptions {
                supersample,
                ..Default::default()
            };
            let err = PageGeometry::new(&options).unwrap_err();
            assert!(matches!(err, PanelcraftError::Render(_)), "{supersample} accepted");
        }
        let g = PageGeometry::new(&ExportOptions::default()).unwrap();
        assert_eq!(g.scale, MIN_SUPERSAMPLE);
    }

    struct StaticFetcher {
        url: &'static str,
        body: Vec<u8>,
    }

    impl ImageFetcher for StaticFetcher {
        fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, String> {
            if url == self.url {
                Ok(self.body.clone())
            } else {
                Err(format!("404 for {url}"))
            }
        }
    }

    #[test]
    fn test_url_only_panel_loads_through_fetcher() {
        use base64::Engine;
        let uri = png_data_uri([0, 0, 210, 255]);
        let encoded = uri.split_once(',').unwrap().1;
        let fetcher = StaticFetcher {
            url: "https://img.test/blue.png",
            body: base64::engine::general_purpose::STANDARD.decode(encoded).unwrap(),
        };
        let mut panel = ComicPanel::new("blue", PanelShape::Square);
        panel.image_url = Some(fetcher.url.to_string());

        let geometry = PageGeometry::new(&small_options()).unwrap();
        let rendered = render_page(&one_slot_page(0), &[panel.clone()], &geometry, &fetcher).unwrap();
        let (w, h) = geometry.canvas_size();
        let px = rendered.canvas.pixel(w / 2, h / 2).unwrap();
        assert!(px[2].abs_diff(210) <= 2 && px[0] <= 2, "got {:?}", px);

        panel.image_url = Some("https://img.test/missing.png".into());
        let err = render_page(&one_slot_page(0), &[panel], &geometry, &fetcher).err().unwrap();
        assert!(matches!(err, PanelcraftError::Image { panel: 0, .. }));
    }

    #[test]
    fn test_broken_start_index_chain_is_rederived() {
        let mut panels = vec![ComicPanel::new("a", PanelShape::Square); 2];
        panels[1].image_base64 = Some("bm90IGFuIGltYWdl".into());
        // Both pages claim panel 0; the chain puts panel 1 on page 2.
        let pages = vec![one_slot_page(0), one_slot_page(0)];
        let mut hooks = Recorder::default();
        let err = export_pdf(&pages, &panels, &small_options(), &NoFetcher, &mut hooks).unwrap_err();
        assert!(matches!(err, PanelcraftError::Image { panel: 1, .. }));
        assert_eq!(hooks.rendered, vec![0]);
    }

    #[test]
    fn test_landscape_geometry() {
        let options = ExportOptions {
            orientation: crate::geometry::Orientation::Landscape,
            ..Default::default()
        };
        let g = PageGeometry::new(&options).unwrap();
        assert!(g.page.width > g.page.height);
        assert!((g.usable.x - mm_to_pt(2.0)).abs() < 1e-9);
        assert_eq!(g.canvas_size().0, ((g.page.width - 2.0 * mm_to_pt(2.0)) * 2.0).round() as u32);
    }
}
