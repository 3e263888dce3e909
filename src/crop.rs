//! # Crop/Fill Resolver
//!
//! Cover-fit cropping: choose the sub-rectangle of a source image that,
//! scaled to the destination, fills it exactly without distortion. The
//! anchor picks where the crop window sits inside the excess dimension.
//!
//! [`resolve_cover`] is the only place this math lives. The preview's
//! display list and the PDF canvas both call it, so what the user framed in
//! the editor is what prints.

use crate::geometry::{clamp_unit, Rect, Size};
use crate::model::Anchor;

/// A crop window in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceRect {
    pub sx: u32,
    pub sy: u32,
    pub sw: u32,
    pub sh: u32,
}

impl SourceRect {
    pub fn is_empty(&self) -> bool {
        self.sw == 0 || self.sh == 0
    }
}

/// Compute the cover-fit source rectangle for a `src_w`×`src_h` image drawn
/// into a `dest` box. Any zero or non-finite dimension yields an empty
/// rectangle.
pub fn resolve_cover(src_w: u32, src_h: u32, dest: Size, anchor: Anchor) -> SourceRect {
    if src_w == 0 || src_h == 0 || !(dest.width > 0.0) || !(dest.height > 0.0) {
        return SourceRect::default();
    }
    if !dest.width.is_finite() || !dest.height.is_finite() {
        return SourceRect::default();
    }

    let ax = clamp_unit(anchor.x);
    let ay = clamp_unit(anchor.y);
    let (sw_f, sh_f) = (src_w as f64, src_h as f64);
    let dest_aspect = dest.width / dest.height;
    let src_aspect = sw_f / sh_f;

    let (sx, sy, sw, sh) = if src_aspect > dest_aspect {
        let sw = clamp_extent((sh_f * dest_aspect).round(), src_w);
        let sx = ((src_w - sw) as f64 * ax).round() as u32;
        (sx, 0, sw, src_h)
    } else if src_aspect < dest_aspect {
        let sh = clamp_extent((sw_f / dest_aspect).round(), src_h);
        let sy = ((src_h - sh) as f64 * ay).round() as u32;
        (0, sy, src_w, sh)
    } else {
        (0, 0, src_w, src_h)
    };

    SourceRect {
        sx: sx.min(src_w - sw),
        sy: sy.min(src_h - sh),
        sw,
        sh,
    }
}

fn clamp_extent(value: f64, max: u32) -> u32 {
    (value as u32).clamp(1, max)
}

/// The one axis a crop anchor can travel along for a given source and
/// destination. Cover-fit only ever leaves excess in one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropAxis {
    Horizontal,
    Vertical,
    None,
}

pub fn travel_axis(src: Size, dest: Size) -> CropAxis {
    if src.is_empty() || dest.is_empty() {
        return CropAxis::None;
    }
    let (src_aspect, dest_aspect) = (src.aspect(), dest.aspect());
    if (src_aspect - dest_aspect).abs() < 1e-9 {
        CropAxis::None
    } else if src_aspect > dest_aspect {
        CropAxis::Horizontal
    } else {
        CropAxis::Vertical
    }
}

/// CSS `object-position` equivalent of an anchor.
pub fn object_position(anchor: Anchor) -> String {
    format!("{}% {}%", clamp_unit(anchor.x) * 100.0, clamp_unit(anchor.y) * 100.0)
}

/// Placement of the crop editor: a window of the target aspect centred in
/// the viewport, and the image sized to cover that window, shifted by the
/// anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropView {
    pub crop_window: Rect,
    pub image: Rect,
}

impl CropView {
    /// `None` when any of the inputs has no area.
    pub fn compute(image: Size, viewport: Size, target_aspect: f64, anchor: Anchor) -> Option<CropView> {
        if image.is_empty() || viewport.is_empty() || !(target_aspect > 0.0) {
            return None;
        }

        let (crop_width, crop_height) = if viewport.aspect() > target_aspect {
            let h = viewport.height.min(viewport.width / target_aspect);
            (h * target_aspect, h)
        } else {
            let w = viewport.width.min(viewport.height * target_aspect);
            (w, w / target_aspect)
        };
        let crop_left = (viewport.width - crop_width) / 2.0;
        let crop_top = (viewport.height - crop_height) / 2.0;

        let image_aspect = image.aspect();
        let (display_width, display_height) = if image_aspect > target_aspect {
            (crop_height * image_aspect, crop_height)
        } else {
            (crop_width, crop_width / image_aspect)
        };

        // The anchor slides the image across its excess, so anchor 0 aligns
        // the leading edges and anchor 1 the trailing ones, as in resolve_cover.
        let travel_x = display_width - crop_width;
        let travel_y = display_height - crop_height;

        Some(CropView {
            crop_window: Rect::new(crop_left, crop_top, crop_width, crop_height),
            image: Rect::new(
                crop_left - travel_x * clamp_unit(anchor.x),
                crop_top - travel_y * clamp_unit(anchor.y),
                display_width,
                display_height,
            ),
        })
    }
}
