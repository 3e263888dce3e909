//! # Speech Bubble Layout
//!
//! Computes where a text box's bubble, tail and text lines go inside a
//! panel. The result is plain geometry: the raster canvas fills and strokes
//! it, the PDF writer sets its text, and the preview hands it to the host
//! UI. Nothing here draws.
//!
//! Wrapping always happens in reference units (one unit is one PDF point
//! at export scale 1). Only the finished geometry is multiplied by `scale`,
//! so the preview and the printed page break lines at exactly the same
//! words no matter how large either is rendered.
//!
//! Bubbles are centred on `(x%, y%)` of the *panel* rectangle. Only speech
//! gets a tail; narration is a plain box.

pub mod metrics;
pub mod wrap;

use crate::geometry::{Point, Rect};
use crate::model::{TailPosition, TailSide, TextBox, TextKind, TextPosition};
use crate::style::Color;

pub use wrap::{wrap_text, WrappedLine};

/// Offsets (percent along a side) a tail may snap to.
pub const TAIL_OFFSETS: [f64; 3] = [20.0, 50.0, 80.0];

/// Bubble dimensions and colors in reference units.
#[derive(Debug, Clone, PartialEq)]
pub struct BubbleStyle {
    pub width: f64,
    pub padding: f64,
    pub font_size: f64,
    /// Multiple of `font_size`.
    pub line_height: f64,
    pub corner_radius: f64,
    /// Length of the tail's base along the bubble edge.
    pub tail_size: f64,
    /// How far the apex falls short of `tail_size` from the edge.
    pub tail_offset: f64,
    pub border_width: f64,
    pub seam_width: f64,
    pub fill: Color,
    pub border: Color,
    pub text: Color,
}

impl Default for BubbleStyle {
    fn default() -> Self {
        Self {
            width: 200.0,
            padding: 12.0,
            font_size: 14.0,
            line_height: 1.4,
            corner_radius: 8.0,
            tail_size: 12.0,
            tail_offset: 6.0,
            border_width: 1.0,
            seam_width: 2.0,
            fill: Color::WHITE,
            border: Color::hex("#e5e7eb"),
            text: Color::BLACK,
        }
    }
}

impl BubbleStyle {
    fn line_advance(&self) -> f64 {
        self.font_size * self.line_height
    }

    fn text_width(&self) -> f64 {
        self.width - 2.0 * self.padding
    }
}

/// A positioned line of bubble text.
#[derive(Debug, Clone, PartialEq)]
pub struct BubbleLine {
    pub text: String,
    /// Left edge of the line.
    pub x: f64,
    /// Top of the line box.
    pub top: f64,
    /// Alphabetic baseline, centred in the line box the way CSS places it.
    pub baseline: f64,
    pub width: f64,
}

/// The tail triangle. `base` lies on the bubble edge; the straight segment
/// between its two points is the seam that gets overdrawn in the fill
/// color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tail {
    pub side: TailSide,
    pub base: [Point; 2],
    pub apex: Point,
}

impl Tail {
    pub fn points(&self) -> [Point; 3] {
        [self.base[0], self.apex, self.base[1]]
    }
}

/// Finished bubble geometry at some scale.
#[derive(Debug, Clone, PartialEq)]
pub struct BubbleLayout {
    pub frame: Rect,
    pub corner_radius: f64,
    pub tail: Option<Tail>,
    pub lines: Vec<BubbleLine>,
    pub font_size: f64,
    pub border_width: f64,
    pub seam_width: f64,
}

impl BubbleLayout {
    pub fn contains(&self, point: Point) -> bool {
        self.frame.contains(point)
    }
}

/// Lay out one bubble inside `panel`. `panel` and the result share units;
/// `scale` converts reference units into them.
pub fn layout_bubble(
    text_box: &TextBox,
    position: &TextPosition,
    panel: &Rect,
    style: &BubbleStyle,
    scale: f64,
) -> BubbleLayout {
    let wrapped = wrap_text(&text_box.text, style.text_width(), style.font_size);
    let advance = style.line_advance();
    let height = wrapped.len() as f64 * advance + 2.0 * style.padding;

    let position = position.clamped();
    let center_x = panel.x + position.x / 100.0 * panel.width;
    let center_y = panel.y + position.y / 100.0 * panel.height;
    let frame = Rect::new(
        center_x - style.width * scale / 2.0,
        center_y - height * scale / 2.0,
        style.width * scale,
        height * scale,
    );

    let content_height = (metrics::ASCENT + metrics::DESCENT) * style.font_size;
    let baseline_shift = (advance - content_height) / 2.0 + metrics::ASCENT * style.font_size;
    let lines = wrapped
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            let top = style.padding + i as f64 * advance;
            BubbleLine {
                text: line.text,
                x: frame.x + style.padding * scale,
                top: frame.y + top * scale,
                baseline: frame.y + (top + baseline_shift) * scale,
                width: line.width * scale,
            }
        })
        .collect();

    let tail = match text_box.kind {
        TextKind::Speech => Some(tail_geometry(
            &frame,
            effective_tail(&position),
            style,
            scale,
        )),
        TextKind::Narration => None,
    };

    BubbleLayout {
        frame,
        corner_radius: style.corner_radius * scale,
        tail,
        lines,
        font_size: style.font_size * scale,
        border_width: style.border_width * scale,
        seam_width: style.seam_width * scale,
    }
}

/// The tail as drawn, after applying the bubble's flip.
pub fn effective_tail(position: &TextPosition) -> TailPosition {
    if position.is_flipped {
        flip_tail(position.tail_position)
    } else {
        position.tail_position
    }
}

/// Mirror a tail about the bubble's vertical centre line.
pub fn flip_tail(tail: TailPosition) -> TailPosition {
    match tail.side {
        TailSide::Top | TailSide::Bottom => TailPosition {
            side: tail.side,
            offset: 100.0 - tail.offset,
        },
        TailSide::Left => TailPosition {
            side: TailSide::Right,
            offset: tail.offset,
        },
        TailSide::Right => TailPosition {
            side: TailSide::Left,
            offset: tail.offset,
        },
    }
}

fn tail_geometry(frame: &Rect, tail: TailPosition, style: &BubbleStyle, scale: f64) -> Tail {
    let half = style.tail_size * scale / 2.0;
    let depth = (style.tail_size - style.tail_offset) * scale;
    let t = tail.offset.clamp(0.0, 100.0) / 100.0;

    match tail.side {
        TailSide::Bottom | TailSide::Top => {
            let x = frame.x + t * frame.width;
            let (edge, apex_y) = if tail.side == TailSide::Bottom {
                (frame.bottom(), frame.bottom() + depth)
            } else {
                (frame.y, frame.y - depth)
            };
            Tail {
                side: tail.side,
                base: [Point { x: x - half, y: edge }, Point { x: x + half, y: edge }],
                apex: Point { x, y: apex_y },
            }
        }
        TailSide::Left | TailSide::Right => {
            let y = frame.y + t * frame.height;
            let (edge, apex_x) = if tail.side == TailSide::Right {
                (frame.right(), frame.right() + depth)
            } else {
                (frame.x, frame.x - depth)
            };
            Tail {
                side: tail.side,
                base: [Point { x: edge, y: y - half }, Point { x: edge, y: y + half }],
                apex: Point { x: apex_x, y },
            }
        }
    }
}

/// Snap an arbitrary offset to the nearest allowed tail offset.
pub fn snap_tail(side: TailSide, offset: f64) -> TailPosition {
    let offset = if offset.is_nan() { TAIL_OFFSETS[0] } else { offset };
    let snapped = TAIL_OFFSETS
        .iter()
        .copied()
        .min_by(|a, b| (a - offset).abs().total_cmp(&(b - offset).abs()))
        .unwrap_or(TAIL_OFFSETS[0]);
    TailPosition { side, offset: snapped }
}

/// Every discrete tail placement, side by side.
pub fn tail_choices() -> Vec<TailPosition> {
    TailSide::ALL
        .iter()
        .flat_map(|&side| TAIL_OFFSETS.iter().map(move |&offset| TailPosition { side, offset }))
        .collect()
}
