//! # Geometry
//!
//! Percentage-based rectangles and the handful of coordinate-space
//! conversions the rest of the engine shares: splitting bounds for the
//! layout tree, mapping slot percentages into pixels or points, fitting a
//! page box into an available area, and the page-aspect adjustment used for
//! square-based templates.
//!
//! Everything here is pure. Percent rectangles use the 0–100 range.

use serde::{Deserialize, Serialize};

/// ISO 216 page aspect ratio (long side / short side).
pub const A4_ASPECT_RATIO: f64 = 1.4142;

/// An axis-aligned rectangle. Units depend on context: percent of a parent
/// for layout bounds, pixels or points once mapped.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// A 2-D point.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Which way a bounds split divides its rectangle.
///
/// `Vertical` draws a vertical divider and so divides the *width*;
/// `Horizontal` divides the *height*.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn toggled(self) -> Self {
        match self {
            Orientation::Portrait => Orientation::Landscape,
            Orientation::Landscape => Orientation::Portrait,
        }
    }

    /// Orient a (short, long) pair of page dimensions.
    pub fn orient(self, short: f64, long: f64) -> (f64, f64) {
        match self {
            Orientation::Portrait => (short, long),
            Orientation::Landscape => (long, short),
        }
    }
}

impl Rect {
    pub const FULL: Rect = Rect {
        x: 0.0,
        y: 0.0,
        width: 100.0,
        height: 100.0,
    };

    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    pub fn size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Shrink the rectangle by `amount` on every side. Never produces a
    /// negative size.
    pub fn inset(&self, amount: f64) -> Rect {
        Rect {
            x: self.x + amount,
            y: self.y + amount,
            width: (self.width - 2.0 * amount).max(0.0),
            height: (self.height - 2.0 * amount).max(0.0),
        }
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Map a percent rectangle (0–100) onto a concrete `target` rectangle.
    pub fn percent_of(&self, target: &Rect) -> Rect {
        Rect {
            x: target.x + self.x / 100.0 * target.width,
            y: target.y + self.y / 100.0 * target.height,
            width: self.width / 100.0 * target.width,
            height: self.height / 100.0 * target.height,
        }
    }

    /// Express `point` as percentages of this rectangle, clamped to 0–100.
    pub fn percent_position(&self, point: Point) -> Point {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Point { x: 50.0, y: 50.0 };
        }
        Point {
            x: clamp_percent((point.x - self.x) / self.width * 100.0),
            y: clamp_percent((point.y - self.y) / self.height * 100.0),
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Overlap area with another rectangle (zero when disjoint).
    pub fn intersection_area(&self, other: &Rect) -> f64 {
        let w = self.right().min(other.right()) - self.x.max(other.x);
        let h = self.bottom().min(other.bottom()) - self.y.max(other.y);
        if w <= 0.0 || h <= 0.0 {
            0.0
        } else {
            w * h
        }
    }

    pub fn approx_eq(&self, other: &Rect, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.width - other.width).abs() <= tolerance
            && (self.height - other.height).abs() <= tolerance
    }
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f64 {
        if self.height == 0.0 {
            0.0
        } else {
            self.width / self.height
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Split `bounds` at `ratio` along `axis`. The first child starts at the
/// parent's origin; the second gets the remainder.
pub fn split_bounds(bounds: &Rect, axis: Axis, ratio: f64) -> (Rect, Rect) {
    match axis {
        Axis::Vertical => {
            let first_width = bounds.width * ratio;
            (
                Rect {
                    width: first_width,
                    ..*bounds
                },
                Rect {
                    x: bounds.x + first_width,
                    width: bounds.width * (1.0 - ratio),
                    ..*bounds
                },
            )
        }
        Axis::Horizontal => {
            let first_height = bounds.height * ratio;
            (
                Rect {
                    height: first_height,
                    ..*bounds
                },
                Rect {
                    y: bounds.y + first_height,
                    height: bounds.height * (1.0 - ratio),
                    ..*bounds
                },
            )
        }
    }
}

/// Fit an A4 page box into `available` after removing `padding`, keeping
/// the exact 1:1.4142 ratio. Whichever dimension binds first wins.
///
/// This is the single page-fitting algorithm: the comic preview and the
/// layout generator canvas both size their page with it.
pub fn fit_page(available: Size, orientation: Orientation, padding: f64) -> Size {
    let available_width = (available.width - padding).max(0.0);
    let available_height = (available.height - padding).max(0.0);

    match orientation {
        Orientation::Portrait => {
            if available_height < available_width * A4_ASPECT_RATIO {
                Size::new(available_height / A4_ASPECT_RATIO, available_height)
            } else {
                Size::new(available_width, available_width * A4_ASPECT_RATIO)
            }
        }
        Orientation::Landscape => {
            if available_width < available_height * A4_ASPECT_RATIO {
                Size::new(available_width, available_width / A4_ASPECT_RATIO)
            } else {
                Size::new(available_height * A4_ASPECT_RATIO, available_height)
            }
        }
    }
}

pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 50.0;
    }
    value.clamp(0.0, 100.0)
}

pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.5;
    }
    value.clamp(0.0, 1.0)
}

/// Millimetres to PDF points.
pub fn mm_to_pt(mm: f64) -> f64 {
    mm * 72.0 / 25.4
}
