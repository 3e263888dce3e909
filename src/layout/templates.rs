//! Built-in page templates.

use crate::model::{LayoutTemplate, PanelSlot};

/// The predefined template library, in display order.
pub fn builtin_templates() -> Vec<LayoutTemplate> {
    vec![
        LayoutTemplate {
            id: "grid2x2".to_string(),
            name: "2x2 Grid".to_string(),
            slots: vec![
                PanelSlot::new(0.0, 0.0, 50.0, 50.0),
                PanelSlot::new(50.0, 0.0, 50.0, 50.0),
                PanelSlot::new(0.0, 50.0, 50.0, 50.0),
                PanelSlot::new(50.0, 50.0, 50.0, 50.0),
            ],
        },
        LayoutTemplate {
            id: "threeTop".to_string(),
            name: "Three Top".to_string(),
            slots: vec![
                PanelSlot::new(0.0, 0.0, 33.33, 50.0),
                PanelSlot::new(33.33, 0.0, 33.33, 50.0),
                PanelSlot::new(66.66, 0.0, 33.33, 50.0),
                PanelSlot::new(0.0, 50.0, 100.0, 50.0),
            ],
        },
        LayoutTemplate {
            id: "spotlight".to_string(),
            name: "Spotlight".to_string(),
            slots: vec![
                PanelSlot::new(0.0, 0.0, 100.0, 50.0),
                PanelSlot::new(0.0, 50.0, 33.33, 50.0),
                PanelSlot::new(33.33, 50.0, 33.33, 50.0),
                PanelSlot::new(66.66, 50.0, 33.33, 50.0),
            ],
        },
    ]
}

/// Look up a built-in template by id.
pub fn find_template(id: &str) -> Option<LayoutTemplate> {
    builtin_templates().into_iter().find(|t| t.id == id)
}

/// The template new pages start with.
pub fn default_template() -> LayoutTemplate {
    let mut templates = builtin_templates();
    templates.swap_remove(0)
}
