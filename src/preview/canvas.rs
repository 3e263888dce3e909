//! Display list for the free-form layout generator: one box per leaf and a
//! handle per divider, on a page box fitted exactly like the comic preview.

use crate::geometry::{fit_page, Axis, Point, Rect, Size};
use crate::interact::{DividerDrag, PointerSession};
use crate::layout::tree::NodeId;
use crate::layout::LayoutEditor;

use super::VIEWPORT_PADDING;

#[derive(Debug, Clone, PartialEq)]
pub struct CanvasLeaf {
    pub id: NodeId,
    pub bounds: Rect,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanvasDivider {
    pub node_id: NodeId,
    pub axis: Axis,
    pub handle: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutCanvasFrame {
    pub page: Rect,
    pub leaves: Vec<CanvasLeaf>,
    /// Drawn above the leaves, outermost split first.
    pub dividers: Vec<CanvasDivider>,
}

impl LayoutCanvasFrame {
    pub fn leaf_at(&self, point: Point) -> Option<&CanvasLeaf> {
        self.leaves.iter().find(|l| l.bounds.contains(point))
    }

    /// Innermost divider handle under `point`.
    pub fn divider_at(&self, point: Point) -> Option<&CanvasDivider> {
        self.dividers.iter().rev().find(|d| d.handle.contains(point))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCanvas {
    viewport: Size,
}

impl LayoutCanvas {
    pub fn new(viewport: Size) -> Self {
        Self { viewport }
    }

    pub fn resize(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    pub fn page_box(&self, editor: &LayoutEditor) -> Rect {
        let size = fit_page(self.viewport, editor.orientation(), VIEWPORT_PADDING);
        Rect::new(
            (self.viewport.width - size.width) / 2.0,
            (self.viewport.height - size.height) / 2.0,
            size.width,
            size.height,
        )
    }

    pub fn frame(&self, editor: &LayoutEditor) -> LayoutCanvasFrame {
        let page = self.page_box(editor);
        let tree = editor.tree();
        let bounds = tree.compute_bounds(Rect::FULL);

        let leaves = tree
            .leaf_ids()
            .into_iter()
            .filter_map(|id| {
                bounds.get(id).map(|b| CanvasLeaf {
                    id: id.to_string(),
                    bounds: b.percent_of(&page),
                    selected: editor.selected() == Some(id),
                })
            })
            .collect();

        let dividers = tree
            .dividers(Rect::FULL)
            .into_iter()
            .map(|d| CanvasDivider {
                node_id: d.node_id,
                axis: d.axis,
                handle: d.handle.percent_of(&page),
            })
            .collect();

        LayoutCanvasFrame { page, leaves, dividers }
    }

    /// Start dragging the divider under `pointer`, if any.
    pub fn begin_divider_drag(&self, editor: &LayoutEditor, pointer: Point) -> Option<DividerDrag> {
        let page = self.page_box(editor);
        let divider = editor
            .tree()
            .dividers(Rect::FULL)
            .into_iter()
            .rev()
            .find(|d| d.handle.percent_of(&page).contains(pointer))?;
        let mut drag = DividerDrag::new(&divider, &page);
        drag.begin(pointer).then_some(drag)
    }
}
