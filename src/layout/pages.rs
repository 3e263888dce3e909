//! # Page Assignment
//!
//! Pages map the flat panel list onto templates. Page `i` shows panels
//! `start_index .. start_index + slot_count`, and start indices always
//! chain: the first page starts at 0 and each later page starts where the
//! previous one ends. Every operation here rebuilds that chain before
//! returning.
//!
//! More slots than panels is allowed. The surplus is reported through
//! [`PlacementStatus`], never rejected.

use std::fmt;

use crate::model::{LayoutTemplate, PageAssignment};

use super::templates::default_template;

/// Sum of slot counts over `pages`.
pub fn assigned_slot_count(pages: &[PageAssignment]) -> usize {
    pages.iter().map(|p| p.layout.slot_count()).sum()
}

/// Panels not yet placed on any page. Negative when the pages ask for more
/// panels than exist.
pub fn unused_panel_count(pages: &[PageAssignment], panel_count: usize) -> isize {
    panel_count as isize - assigned_slot_count(pages) as isize
}

/// Whether another page may be added.
pub fn can_add_page(pages: &[PageAssignment], panel_count: usize) -> bool {
    unused_panel_count(pages, panel_count) > 0
}

/// Append a page after the last one.
pub fn add_page(pages: &[PageAssignment], template: LayoutTemplate) -> Vec<PageAssignment> {
    let mut out = pages.to_vec();
    out.push(PageAssignment {
        layout: template,
        start_index: assigned_slot_count(pages),
    });
    out
}

/// Remove the page at `index`. Out-of-range indices leave the list as is.
pub fn remove_page(pages: &[PageAssignment], index: usize) -> Vec<PageAssignment> {
    let mut out = pages.to_vec();
    if index < out.len() {
        out.remove(index);
        reindex_from(&mut out, index);
    }
    out
}

/// Swap the template of page `index`.
pub fn set_page_layout(pages: &[PageAssignment], index: usize, template: LayoutTemplate) -> Vec<PageAssignment> {
    let mut out = pages.to_vec();
    if let Some(page) = out.get_mut(index) {
        page.layout = template;
        reindex_from(&mut out, index + 1);
    }
    out
}

/// Recompute start indices for `pages[from..]` from their predecessors.
fn reindex_from(pages: &mut [PageAssignment], from: usize) {
    for i in from..pages.len() {
        pages[i].start_index = if i == 0 {
            0
        } else {
            pages[i - 1].start_index + pages[i - 1].layout.slot_count()
        };
    }
}

/// A copy of `pages` with the start-index chain re-derived from the
/// templates, for input that was not built through [`add_page`].
pub fn reindexed(pages: &[PageAssignment]) -> Vec<PageAssignment> {
    let mut out = pages.to_vec();
    reindex_from(&mut out, 0);
    out
}

/// Absolute panel index for `slot` on `page`, or `None` when the slot runs
/// past the end of the panel list.
pub fn slot_panel_index(page: &PageAssignment, slot: usize, panel_count: usize) -> Option<usize> {
    let index = page.panel_index(slot);
    (slot < page.layout.slot_count() && index < panel_count).then_some(index)
}

/// Check the start-index chain.
pub fn indices_consistent(pages: &[PageAssignment]) -> bool {
    pages.iter().enumerate().all(|(i, page)| {
        if i == 0 {
            page.start_index == 0
        } else {
            page.start_index == pages[i - 1].start_index + pages[i - 1].layout.slot_count()
        }
    })
}

/// How the panel list fits onto the pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementStatus {
    Remaining(usize),
    AllPlaced,
    OverAssigned(usize),
}

impl PlacementStatus {
    pub fn from_unused(unused: isize) -> Self {
        match unused {
            n if n > 0 => PlacementStatus::Remaining(n as usize),
            0 => PlacementStatus::AllPlaced,
            n => PlacementStatus::OverAssigned(n.unsigned_abs()),
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, PlacementStatus::OverAssigned(_))
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

impl fmt::Display for PlacementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementStatus::Remaining(n) => write!(f, "{} panel{} remaining to be placed", n, plural(*n)),
            PlacementStatus::AllPlaced => write!(f, "All panels have been placed"),
            PlacementStatus::OverAssigned(n) => write!(
                f,
                "Warning: Current layout requires {} more panel{} than available",
                n,
                plural(*n)
            ),
        }
    }
}

/// The page list together with the page currently selected in the editor.
#[derive(Debug, Clone, Default)]
pub struct PageBook {
    pages: Vec<PageAssignment>,
    current: usize,
}

impl PageBook {
    /// A book with one page using the default template, the way a
    /// composition session starts.
    pub fn new() -> Self {
        Self {
            pages: add_page(&[], default_template()),
            current: 0,
        }
    }

    pub fn from_pages(pages: Vec<PageAssignment>) -> Self {
        let mut pages = pages;
        reindex_from(&mut pages, 0);
        Self { pages, current: 0 }
    }

    pub fn pages(&self) -> &[PageAssignment] {
        &self.pages
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> Option<&PageAssignment> {
        self.pages.get(self.current)
    }

    pub fn select(&mut self, index: usize) {
        if index < self.pages.len() {
            self.current = index;
        }
    }

    /// Add a page and select it. Returns `false` when no panels are left
    /// to place.
    pub fn add_page(&mut self, template: LayoutTemplate, panel_count: usize) -> bool {
        if !can_add_page(&self.pages, panel_count) {
            return false;
        }
        self.pages = add_page(&self.pages, template);
        self.current = self.pages.len() - 1;
        true
    }

    /// Remove the page at `index`. The last remaining page cannot be
    /// removed.
    pub fn remove_page(&mut self, index: usize) -> bool {
        if self.pages.len() <= 1 || index >= self.pages.len() {
            return false;
        }
        self.pages = remove_page(&self.pages, index);
        self.current = self.current.min(self.pages.len() - 1);
        true
    }

    pub fn set_layout(&mut self, index: usize, template: LayoutTemplate) {
        self.pages = set_page_layout(&self.pages, index, template);
    }

    pub fn status(&self, panel_count: usize) -> PlacementStatus {
        PlacementStatus::from_unused(unused_panel_count(&self.pages, panel_count))
    }
}
