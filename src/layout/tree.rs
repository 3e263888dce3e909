//! # Layout Tree
//!
//! A page described as a recursive binary split. Each node is either a leaf
//! (one panel cell) or a split that divides its rectangle between exactly
//! two children at `ratio` along an axis.
//!
//! The tree is a plain value. Every operation returns a new tree and leaves
//! the receiver untouched; the owner swaps its current tree wholesale.
//! Operations that would break the tree's shape (splitting a split, resizing
//! a leaf, unknown ids) return an identical copy.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geometry::{split_bounds, Axis, Orientation, Rect};
use crate::model::{LayoutTemplate, PanelSlot};

pub const MIN_RATIO: f64 = 0.1;
pub const MAX_RATIO: f64 = 0.9;
pub const ROOT_ID: &str = "root";

/// Width of a divider handle, in percent of its parent's extent.
const DIVIDER_THICKNESS: f64 = 1.0;

pub type NodeId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayoutNode {
    Leaf {
        id: NodeId,
    },
    Split {
        id: NodeId,
        #[serde(alias = "splitType")]
        axis: Axis,
        ratio: f64,
        children: Box<[LayoutNode; 2]>,
    },
}

impl LayoutNode {
    pub fn leaf(id: impl Into<NodeId>) -> Self {
        LayoutNode::Leaf { id: id.into() }
    }

    pub fn id(&self) -> &str {
        match self {
            LayoutNode::Leaf { id } | LayoutNode::Split { id, .. } => id,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, LayoutNode::Leaf { .. })
    }
}

/// Clamp a requested split ratio into the allowed range.
pub fn clamp_ratio(ratio: f64) -> f64 {
    if ratio.is_nan() {
        return 0.5;
    }
    ratio.clamp(MIN_RATIO, MAX_RATIO)
}

/// A draggable boundary between the two children of a split.
#[derive(Debug, Clone, PartialEq)]
pub struct Divider {
    pub node_id: NodeId,
    pub axis: Axis,
    pub ratio: f64,
    /// Bounds of the split node the divider belongs to.
    pub parent: Rect,
    /// Hit area of the handle, centred on the boundary.
    pub handle: Rect,
}

/// The binary layout tree plus the counter that mints fresh node ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutTree {
    root: LayoutNode,
    next_id: u64,
}

impl Default for LayoutTree {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutTree {
    /// A tree holding one leaf covering the whole page.
    pub fn new() -> Self {
        Self {
            root: LayoutNode::leaf(ROOT_ID),
            next_id: 1,
        }
    }

    pub fn root(&self) -> &LayoutNode {
        &self.root
    }

    /// Replace leaf `node_id` with a 50/50 split along `axis`. The split
    /// keeps the leaf's id; the two new leaves get fresh ids.
    pub fn split_leaf(&self, node_id: &str, axis: Axis) -> LayoutTree {
        let mut next_id = self.next_id;
        let root = split_node(&self.root, node_id, axis, &mut next_id);
        LayoutTree { root, next_id }
    }

    /// Set the ratio of split `node_id`, clamped to [0.1, 0.9].
    pub fn update_ratio(&self, node_id: &str, ratio: f64) -> LayoutTree {
        LayoutTree {
            root: update_node_ratio(&self.root, node_id, clamp_ratio(ratio)),
            next_id: self.next_id,
        }
    }

    /// Absolute bounds of every node, splits included.
    pub fn compute_bounds(&self, root_bounds: Rect) -> HashMap<NodeId, Rect> {
        let mut out = HashMap::new();
        collect_bounds(&self.root, root_bounds, &mut out);
        out
    }

    pub fn find(&self, node_id: &str) -> Option<&LayoutNode> {
        find_node(&self.root, node_id)
    }

    /// Leaf ids in depth-first, first-child-first order.
    pub fn leaf_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        collect_leaves(&self.root, &mut ids);
        ids
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_ids().len()
    }

    /// Divider handles for every split node.
    pub fn dividers(&self, root_bounds: Rect) -> Vec<Divider> {
        let mut out = Vec::new();
        collect_dividers(&self.root, root_bounds, &mut out);
        out
    }

    /// Flatten the leaves into a page template over the full page.
    pub fn to_template(&self, id: &str, name: &str) -> LayoutTemplate {
        let bounds = self.compute_bounds(Rect::FULL);
        let slots = self
            .leaf_ids()
            .into_iter()
            .filter_map(|leaf| bounds.get(leaf).copied().map(PanelSlot::from))
            .collect();
        LayoutTemplate {
            id: id.to_string(),
            name: name.to_string(),
            slots,
        }
    }
}

fn split_node(node: &LayoutNode, target: &str, axis: Axis, next_id: &mut u64) -> LayoutNode {
    match node {
        LayoutNode::Leaf { id } if id == target => {
            let first = fresh_id(next_id);
            let second = fresh_id(next_id);
            LayoutNode::Split {
                id: id.clone(),
                axis,
                ratio: 0.5,
                children: Box::new([LayoutNode::leaf(first), LayoutNode::leaf(second)]),
            }
        }
        LayoutNode::Leaf { .. } => node.clone(),
        LayoutNode::Split {
            id,
            axis: split_axis,
            ratio,
            children,
        } => {
            let [a, b] = &**children;
            LayoutNode::Split {
                id: id.clone(),
                axis: *split_axis,
                ratio: *ratio,
                children: Box::new([
                    split_node(a, target, axis, next_id),
                    split_node(b, target, axis, next_id),
                ]),
            }
        }
    }
}

fn fresh_id(next_id: &mut u64) -> NodeId {
    let id = format!("n{}", *next_id);
    *next_id += 1;
    id
}

fn update_node_ratio(node: &LayoutNode, target: &str, new_ratio: f64) -> LayoutNode {
    match node {
        LayoutNode::Leaf { .. } => node.clone(),
        LayoutNode::Split {
            id,
            axis,
            ratio,
            children,
        } => {
            let [a, b] = &**children;
            LayoutNode::Split {
                id: id.clone(),
                axis: *axis,
                ratio: if id == target { new_ratio } else { *ratio },
                children: Box::new([
                    update_node_ratio(a, target, new_ratio),
                    update_node_ratio(b, target, new_ratio),
                ]),
            }
        }
    }
}

fn collect_bounds(node: &LayoutNode, bounds: Rect, out: &mut HashMap<NodeId, Rect>) {
    out.insert(node.id().to_string(), bounds);
    if let LayoutNode::Split {
        axis,
        ratio,
        children,
        ..
    } = node
    {
        let (first, second) = split_bounds(&bounds, *axis, *ratio);
        collect_bounds(&children[0], first, out);
        collect_bounds(&children[1], second, out);
    }
}

fn find_node<'a>(node: &'a LayoutNode, target: &str) -> Option<&'a LayoutNode> {
    if node.id() == target {
        return Some(node);
    }
    match node {
        LayoutNode::Leaf { .. } => None,
        LayoutNode::Split { children, .. } => {
            find_node(&children[0], target).or_else(|| find_node(&children[1], target))
        }
    }
}

fn collect_leaves<'a>(node: &'a LayoutNode, out: &mut Vec<&'a str>) {
    match node {
        LayoutNode::Leaf { id } => out.push(id),
        LayoutNode::Split { children, .. } => {
            collect_leaves(&children[0], out);
            collect_leaves(&children[1], out);
        }
    }
}

fn collect_dividers(node: &LayoutNode, bounds: Rect, out: &mut Vec<Divider>) {
    if let LayoutNode::Split {
        id,
        axis,
        ratio,
        children,
    } = node
    {
        let handle = match axis {
            Axis::Vertical => Rect::new(
                bounds.x + bounds.width * ratio - DIVIDER_THICKNESS / 2.0,
                bounds.y,
                DIVIDER_THICKNESS,
                bounds.height,
            ),
            Axis::Horizontal => Rect::new(
                bounds.x,
                bounds.y + bounds.height * ratio - DIVIDER_THICKNESS / 2.0,
                bounds.width,
                DIVIDER_THICKNESS,
            ),
        };
        out.push(Divider {
            node_id: id.clone(),
            axis: *axis,
            ratio: *ratio,
            parent: bounds,
            handle,
        });
        let (first, second) = split_bounds(&bounds, *axis, *ratio);
        collect_dividers(&children[0], first, out);
        collect_dividers(&children[1], second, out);
    }
}

/// State of the free-form layout generator: the current tree, the selected
/// cell, page orientation, and whether a divider is being dragged.
#[derive(Debug, Clone, Default)]
pub struct LayoutEditor {
    tree: LayoutTree,
    selected: Option<NodeId>,
    orientation: Orientation,
    dragging: bool,
}

impl LayoutEditor {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            ..Default::default()
        }
    }

    pub fn tree(&self) -> &LayoutTree {
        &self.tree
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    pub fn select(&mut self, node_id: Option<&str>) {
        self.selected = node_id.map(str::to_string);
    }

    pub fn toggle_orientation(&mut self) {
        self.orientation = self.orientation.toggled();
    }

    pub fn split(&mut self, node_id: &str, axis: Axis) {
        self.tree = self.tree.split_leaf(node_id, axis);
    }

    /// Split the selected cell. The selection is cleared because the
    /// selected id now names a split rather than a cell.
    pub fn split_selected(&mut self, axis: Axis) {
        if let Some(id) = self.selected.take() {
            self.split(&id, axis);
        }
    }

    pub fn update_ratio(&mut self, node_id: &str, ratio: f64) {
        self.tree = self.tree.update_ratio(node_id, ratio);
    }

    pub fn reset(&mut self) {
        self.tree = LayoutTree::new();
        self.selected = None;
    }
}
