//! # Raster Canvas
//!
//! The off-screen page canvas the exporter paints into: flat fills, panel
//! borders, cover-fit artwork and bubble shapes. Coordinates are canvas
//! pixels with the origin at the top left.
//!
//! Bubble *text* is not rasterized. It goes into the PDF as real text on
//! top of the page image, so only the shapes are painted here.

use tiny_skia::{
    FillRule, FilterQuality, IntRect, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke,
    Transform,
};

use crate::bubble::{BubbleLayout, BubbleStyle};
use crate::crop::{resolve_cover, SourceRect};
use crate::error::{PanelcraftError, Result};
use crate::geometry::{Point, Rect};
use crate::image_loader::LoadedImage;
use crate::model::Anchor;
use crate::style::Color;

pub struct Canvas {
    pixmap: Pixmap,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            PanelcraftError::render(format!("invalid canvas size {}x{}", width, height))
        })?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn fill(&mut self, color: Color) {
        self.pixmap.fill(to_sk_color(color));
    }

    pub fn fill_rect(&mut self, rect: &Rect, color: Color) {
        let Some(sk_rect) = to_sk_rect(rect) else {
            return;
        };
        let path = PathBuilder::from_rect(sk_rect);
        self.pixmap
            .fill_path(&path, &paint(color), FillRule::Winding, Transform::identity(), None);
    }

    pub fn stroke_rect(&mut self, rect: &Rect, color: Color, width: f64) {
        let Some(sk_rect) = to_sk_rect(rect) else {
            return;
        };
        let path = PathBuilder::from_rect(sk_rect);
        let stroke = Stroke {
            width: width as f32,
            line_join: LineJoin::Miter,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint(color), &stroke, Transform::identity(), None);
    }

    /// Draw the cover-fit crop of `image` into `dest`. Returns the source
    /// rectangle used; an empty one means nothing was drawn.
    pub fn draw_image_cover(&mut self, image: &Pixmap, dest: &Rect, anchor: Anchor) -> SourceRect {
        let src = resolve_cover(image.width(), image.height(), dest.size(), anchor);
        if src.is_empty() {
            return src;
        }
        let Some(region) = IntRect::from_xywh(src.sx as i32, src.sy as i32, src.sw, src.sh) else {
            return SourceRect::default();
        };
        let Some(cropped) = image.clone_rect(region) else {
            return SourceRect::default();
        };

        let transform = Transform::from_row(
            (dest.width / src.sw as f64) as f32,
            0.0,
            0.0,
            (dest.height / src.sh as f64) as f32,
            dest.x as f32,
            dest.y as f32,
        );
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap
            .draw_pixmap(0, 0, cropped.as_ref(), &paint, transform, None);
        src
    }

    /// Paint a bubble's body and tail. The tail's two outer edges get the
    /// border; its base is covered by a fill-colored seam line wider than
    /// the border so the outline reads as one continuous shape.
    pub fn draw_bubble(&mut self, layout: &BubbleLayout, style: &BubbleStyle) {
        let fill = paint(style.fill);
        let border = paint(style.border);
        let border_stroke = Stroke {
            width: layout.border_width as f32,
            ..Stroke::default()
        };

        if let Some(body) = rounded_rect_path(&layout.frame, layout.corner_radius) {
            self.pixmap
                .fill_path(&body, &fill, FillRule::Winding, Transform::identity(), None);
            self.pixmap
                .stroke_path(&body, &border, &border_stroke, Transform::identity(), None);
        }

        let Some(tail) = layout.tail else {
            return;
        };
        let [a, apex, b] = tail.points();

        let mut pb = PathBuilder::new();
        move_to(&mut pb, a);
        line_to(&mut pb, apex);
        line_to(&mut pb, b);
        pb.close();
        if let Some(triangle) = pb.finish() {
            self.pixmap
                .fill_path(&triangle, &fill, FillRule::Winding, Transform::identity(), None);
        }

        let mut pb = PathBuilder::new();
        move_to(&mut pb, a);
        line_to(&mut pb, apex);
        line_to(&mut pb, b);
        if let Some(edges) = pb.finish() {
            self.pixmap
                .stroke_path(&edges, &border, &border_stroke, Transform::identity(), None);
        }

        let mut pb = PathBuilder::new();
        move_to(&mut pb, a);
        line_to(&mut pb, b);
        if let Some(seam) = pb.finish() {
            let seam_stroke = Stroke {
                width: layout.seam_width as f32,
                line_cap: LineCap::Butt,
                ..Stroke::default()
            };
            self.pixmap
                .stroke_path(&seam, &fill, &seam_stroke, Transform::identity(), None);
        }
    }

    /// Straight RGBA of one pixel, for inspection.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let p = self.pixmap.pixel(x, y)?.demultiply();
        Some([p.red(), p.green(), p.blue(), p.alpha()])
    }

    /// Packed RGB rows with alpha composited onto white.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let data = self.pixmap.data();
        let mut rgb = Vec::with_capacity(data.len() / 4 * 3);
        for px in data.chunks_exact(4) {
            // Premultiplied over white: c + (255 - a).
            let inv = 255 - px[3];
            rgb.push(px[0].saturating_add(inv));
            rgb.push(px[1].saturating_add(inv));
            rgb.push(px[2].saturating_add(inv));
        }
        rgb
    }
}

/// Convert decoded artwork into a premultiplied pixmap.
pub fn pixmap_from_image(image: &LoadedImage) -> Result<Pixmap> {
    let mut pixmap = Pixmap::new(image.width_px, image.height_px).ok_or_else(|| {
        PanelcraftError::render(format!("invalid image size {}x{}", image.width_px, image.height_px))
    })?;
    for (src, dst) in image.rgba.chunks_exact(4).zip(pixmap.data_mut().chunks_exact_mut(4)) {
        let a = src[3];
        dst[0] = premul_u8(src[0], a);
        dst[1] = premul_u8(src[1], a);
        dst[2] = premul_u8(src[2], a);
        dst[3] = a;
    }
    Ok(pixmap)
}

fn premul_u8(channel: u8, alpha: u8) -> u8 {
    let prod = (channel as u16) * (alpha as u16) + 127;
    ((prod + (prod >> 8)) >> 8) as u8
}

/// Rounded rectangle with quadratic corners.
fn rounded_rect_path(rect: &Rect, radius: f64) -> Option<tiny_skia::Path> {
    let r = radius.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0) as f32;
    let (x, y) = (rect.x as f32, rect.y as f32);
    let (w, h) = (rect.width as f32, rect.height as f32);

    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.quad_to(x + w, y, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.quad_to(x + w, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.quad_to(x, y + h, x, y + h - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    pb.finish()
}

fn move_to(pb: &mut PathBuilder, p: Point) {
    pb.move_to(p.x as f32, p.y as f32);
}

fn line_to(pb: &mut PathBuilder, p: Point) {
    pb.line_to(p.x as f32, p.y as f32);
}

fn to_sk_rect(rect: &Rect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_xywh(rect.x as f32, rect.y as f32, rect.width as f32, rect.height as f32)
}

fn paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(to_sk_color(color));
    paint.anti_alias = true;
    paint
}

fn to_sk_color(color: Color) -> tiny_skia::Color {
    let [r, g, b, a] = color.to_rgba8();
    tiny_skia::Color::from_rgba8(r, g, b, a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bubble::layout_bubble;
    use crate::model::{TextBox, TextPosition};

    fn solid(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 4]) -> Pixmap {
        let mut rgba = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                rgba.extend_from_slice(&f(x, y));
            }
        }
        pixmap_from_image(&LoadedImage {
            width_px: width,
            height_px: height,
            rgba,
        })
        .unwrap()
    }

    #[test]
    fn test_zero_size_canvas_is_error() {
        assert!(matches!(Canvas::new(0, 10), Err(PanelcraftError::Render(_))));
    }

    #[test]
    fn test_fill_rect_and_border() {
        let mut canvas = Canvas::new(40, 40).unwrap();
        canvas.fill(Color::WHITE);
        let dest = Rect::new(10.0, 10.0, 20.0, 20.0);
        canvas.fill_rect(&dest, Color::hex("#f3f4f6"));
        canvas.stroke_rect(&dest, Color::BLACK, 2.0);
        assert_eq!(canvas.pixel(20, 20), Some([0xf3, 0xf4, 0xf6, 255]));
        assert_eq!(canvas.pixel(10, 20), Some([0, 0, 0, 255]));
        assert_eq!(canvas.pixel(2, 2), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_draw_image_cover_uses_anchor() {
        // Left half red, right half blue; a square crop anchored left is red.
        let image = solid(20, 10, |x, _| if x < 10 { [255, 0, 0, 255] } else { [0, 0, 255, 255] });
        let mut canvas = Canvas::new(10, 10).unwrap();
        canvas.fill(Color::WHITE);
        let src = canvas.draw_image_cover(&image, &Rect::new(0.0, 0.0, 10.0, 10.0), Anchor::new(0.0, 0.5));
        assert_eq!(src, SourceRect { sx: 0, sy: 0, sw: 10, sh: 10 });
        let px = canvas.pixel(5, 5).unwrap();
        assert!(px[0] >= 250 && px[2] <= 5, "got {:?}", px);

        let src = canvas.draw_image_cover(&image, &Rect::new(0.0, 0.0, 10.0, 10.0), Anchor::new(1.0, 0.5));
        assert_eq!(src.sx, 10);
        let px = canvas.pixel(5, 5).unwrap();
        assert!(px[2] >= 250 && px[0] <= 5, "got {:?}", px);
    }

    #[test]
    fn test_bubble_seam_hides_border() {
        let mut canvas = Canvas::new(400, 300).unwrap();
        canvas.fill(Color::BLACK);
        let style = BubbleStyle::default();
        let panel = Rect::new(0.0, 0.0, 400.0, 300.0);
        let layout = layout_bubble(&TextBox::speech("A", "Hi"), &TextPosition::default(), &panel, &style, 1.0);
        canvas.draw_bubble(&layout, &style);

        let tail = layout.tail.unwrap();
        let seam_mid_x = ((tail.base[0].x + tail.base[1].x) / 2.0).round() as u32;
        let edge_y = tail.base[0].y.floor() as u32;
        // On the seam the edge is pure fill; away from the tail it carries the border tone.
        let seam_px = canvas.pixel(seam_mid_x, edge_y).unwrap();
        assert!(seam_px[..3].iter().all(|&c| c >= 250), "seam pixel {:?}", seam_px);
        let border_x = (layout.frame.center().x + 40.0).round() as u32;
        let border_px = canvas.pixel(border_x, edge_y).unwrap();
        assert_ne!(border_px, [255, 255, 255, 255]);

        let inside = layout.frame.center();
        assert_eq!(canvas.pixel(inside.x as u32, inside.y as u32), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_to_rgb8_composites_on_white() {
        let canvas = Canvas::new(2, 1).unwrap();
        assert_eq!(canvas.to_rgb8(), vec![255; 6]);
    }
}
