//! # Layout
//!
//! Where panels go on a page. The split tree builds custom templates, the
//! template library holds the built-ins, and page assignment maps the flat
//! panel list onto a sequence of templated pages.

pub mod pages;
pub mod templates;
pub mod tree;

pub use pages::{
    add_page, can_add_page, indices_consistent, reindexed, remove_page, set_page_layout, slot_panel_index, unused_panel_count, PageBook,
    PlacementStatus,
};
pub use templates::{builtin_templates, default_template, find_template};
pub use tree::{LayoutEditor, LayoutNode, LayoutTree};
