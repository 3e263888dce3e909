//! # Pointer Sessions
//!
//! Drag gestures as small state machines fed by the host's pointer events.
//! A session is idle until `begin`, turns every `move_to` into a new value
//! for the thing being dragged, and returns to idle on `end`. A session that
//! is already active refuses a second `begin`, so one draggable element
//! never has two gestures in flight. Separate sessions own separate state
//! and may run at the same time.
//!
//! All coordinates are in the host's pointer space (usually CSS pixels).

use crate::crop::CropAxis;
use crate::geometry::{Axis, Point, Rect};
use crate::layout::tree::{clamp_ratio, Divider, NodeId};
use crate::model::{Anchor, TextPosition};

pub trait PointerSession {
    type Output;

    /// Start a gesture at `pointer`. Returns `false` if one is already
    /// running.
    fn begin(&mut self, pointer: Point) -> bool;

    /// Pointer moved. Returns the updated value, or `None` when idle.
    fn move_to(&mut self, pointer: Point) -> Option<Self::Output>;

    /// Pointer released. Returns the final value, or `None` when idle.
    fn end(&mut self) -> Option<Self::Output>;

    fn is_active(&self) -> bool;
}

/// Drags a crop anchor along the one axis cover-fit leaves free. Motion is
/// measured against the crop window, so dragging across the whole window
/// sweeps the anchor from 0 to 1.
#[derive(Debug, Clone)]
pub struct CropDrag {
    axis: CropAxis,
    window: Rect,
    anchor: Anchor,
    start: Option<(Point, Anchor)>,
}

impl CropDrag {
    pub fn new(axis: CropAxis, window: Rect, anchor: Anchor) -> Self {
        Self {
            axis,
            window,
            anchor,
            start: None,
        }
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }
}

impl PointerSession for CropDrag {
    type Output = Anchor;

    fn begin(&mut self, pointer: Point) -> bool {
        if self.start.is_some() {
            return false;
        }
        self.start = Some((pointer, self.anchor));
        true
    }

    fn move_to(&mut self, pointer: Point) -> Option<Anchor> {
        let (origin, from) = self.start?;
        self.anchor = match self.axis {
            CropAxis::Horizontal if self.window.width > 0.0 => {
                Anchor::new(from.x + (pointer.x - origin.x) / self.window.width, 0.5)
            }
            CropAxis::Vertical if self.window.height > 0.0 => {
                Anchor::new(0.5, from.y + (pointer.y - origin.y) / self.window.height)
            }
            _ => from,
        };
        Some(self.anchor)
    }

    fn end(&mut self) -> Option<Anchor> {
        self.start.take().map(|_| self.anchor)
    }

    fn is_active(&self) -> bool {
        self.start.is_some()
    }
}

/// Moves a bubble: its centre follows the pointer as a percentage of the
/// panel box, clamped to the panel.
#[derive(Debug, Clone)]
pub struct BubbleDrag {
    container: Rect,
    position: TextPosition,
    active: bool,
}

impl BubbleDrag {
    pub fn new(container: Rect, position: TextPosition) -> Self {
        Self {
            container,
            position,
            active: false,
        }
    }

    pub fn position(&self) -> TextPosition {
        self.position
    }
}

impl PointerSession for BubbleDrag {
    type Output = TextPosition;

    fn begin(&mut self, _pointer: Point) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        true
    }

    fn move_to(&mut self, pointer: Point) -> Option<TextPosition> {
        if !self.active {
            return None;
        }
        let p = self.container.percent_position(pointer);
        self.position = TextPosition {
            x: p.x,
            y: p.y,
            ..self.position
        };
        Some(self.position)
    }

    fn end(&mut self) -> Option<TextPosition> {
        if !self.active {
            return None;
        }
        self.active = false;
        Some(self.position)
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Resizes a split by dragging its divider. The ratio is the pointer's
/// position across the split node's own bounds.
#[derive(Debug, Clone)]
pub struct DividerDrag {
    node_id: NodeId,
    axis: Axis,
    parent: Rect,
    ratio: f64,
    active: bool,
}

impl DividerDrag {
    /// `canvas` is the page box in pointer space; the divider's percent
    /// bounds are mapped onto it.
    pub fn new(divider: &Divider, canvas: &Rect) -> Self {
        Self {
            node_id: divider.node_id.clone(),
            axis: divider.axis,
            parent: divider.parent.percent_of(canvas),
            ratio: divider.ratio,
            active: false,
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }
}

impl PointerSession for DividerDrag {
    type Output = (NodeId, f64);

    fn begin(&mut self, _pointer: Point) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        true
    }

    fn move_to(&mut self, pointer: Point) -> Option<(NodeId, f64)> {
        if !self.active {
            return None;
        }
        let raw = match self.axis {
            Axis::Vertical => (pointer.x - self.parent.x) / self.parent.width,
            Axis::Horizontal => (pointer.y - self.parent.y) / self.parent.height,
        };
        self.ratio = clamp_ratio(raw);
        Some((self.node_id.clone(), self.ratio))
    }

    fn end(&mut self) -> Option<(NodeId, f64)> {
        if !self.active {
            return None;
        }
        self.active = false;
        Some((self.node_id.clone(), self.ratio))
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutTree;

    #[test]
    fn test_crop_drag_horizontal() {
        let mut drag = CropDrag::new(CropAxis::Horizontal, Rect::new(0.0, 0.0, 200.0, 200.0), Anchor::CENTER);
        assert!(drag.move_to(Point { x: 10.0, y: 0.0 }).is_none());
        assert!(drag.begin(Point { x: 100.0, y: 100.0 }));
        assert!(!drag.begin(Point { x: 0.0, y: 0.0 }));
        let a = drag.move_to(Point { x: 150.0, y: 190.0 }).unwrap();
        assert!((a.x - 0.75).abs() < 1e-9);
        assert_eq!(a.y, 0.5);
        let a = drag.move_to(Point { x: 900.0, y: 0.0 }).unwrap();
        assert_eq!(a.x, 1.0);
        assert_eq!(drag.end(), Some(Anchor::new(1.0, 0.5)));
        assert!(!drag.is_active());
        assert!(drag.end().is_none());
    }

    #[test]
    fn test_crop_drag_without_travel_keeps_anchor() {
        let mut drag = CropDrag::new(CropAxis::None, Rect::new(0.0, 0.0, 50.0, 50.0), Anchor::new(0.2, 0.3));
        drag.begin(Point::default());
        assert_eq!(drag.move_to(Point { x: 40.0, y: 40.0 }), Some(Anchor::new(0.2, 0.3)));
    }

    #[test]
    fn test_bubble_drag_clamps_to_container() {
        let container = Rect::new(100.0, 100.0, 200.0, 100.0);
        let start = TextPosition {
            is_flipped: true,
            ..Default::default()
        };
        let mut drag = BubbleDrag::new(container, start);
        assert!(drag.begin(Point { x: 200.0, y: 150.0 }));
        let p = drag.move_to(Point { x: 150.0, y: 175.0 }).unwrap();
        assert_eq!((p.x, p.y), (25.0, 75.0));
        assert!(p.is_flipped);
        let p = drag.move_to(Point { x: -40.0, y: 900.0 }).unwrap();
        assert_eq!((p.x, p.y), (0.0, 100.0));
        assert_eq!(drag.end().map(|p| (p.x, p.y)), Some((0.0, 100.0)));
        assert!(drag.move_to(Point { x: 150.0, y: 150.0 }).is_none());
    }

    #[test]
    fn test_divider_drag_uses_parent_bounds() {
        let tree = LayoutTree::new()
            .split_leaf("root", Axis::Vertical)
            .split_leaf("n2", Axis::Horizontal);
        let dividers = tree.dividers(Rect::FULL);
        let nested = dividers.iter().find(|d| d.node_id == "n2").unwrap();
        let canvas = Rect::new(0.0, 0.0, 400.0, 600.0);
        let mut drag = DividerDrag::new(nested, &canvas);
        assert!(drag.begin(Point { x: 300.0, y: 300.0 }));
        let (id, ratio) = drag.move_to(Point { x: 300.0, y: 150.0 }).unwrap();
        assert_eq!(id, "n2");
        assert!((ratio - 0.25).abs() < 1e-9);
        let (_, ratio) = drag.move_to(Point { x: 300.0, y: 5000.0 }).unwrap();
        assert_eq!(ratio, 0.9);
        let (id, ratio) = drag.end().unwrap();
        let resized = tree.update_ratio(&id, ratio);
        assert!(matches!(resized.find("n2"), Some(crate::layout::LayoutNode::Split { ratio, .. }) if *ratio == 0.9));
    }
}
