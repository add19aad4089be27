use crate::score::{Rgb, palette};
use crate::view::{AuditView, format_number};

/// At most this many actions are listed.
pub const MAX_ACTIONS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::Critical => "CRITICAL",
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }

    pub fn color(self) -> Rgb {
        match self {
            Priority::Critical => palette::RED,
            Priority::High => palette::AMBER,
            Priority::Medium => palette::CYAN,
            Priority::Low => palette::SLATE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionItem {
    pub priority: Priority,
    pub task: String,
    pub impact: &'static str,
}

impl ActionItem {
    fn new(priority: Priority, task: impl Into<String>, impact: &'static str) -> Self {
        Self {
            priority,
            task: task.into(),
            impact,
        }
    }
}

/// Prioritized fixes, in rule order, truncated to [`MAX_ACTIONS`].
pub fn derive_action_plan(view: &AuditView) -> Vec<ActionItem> {
    let mut actions = Vec::new();
    if !view.security.https {
        actions.push(ActionItem::new(
            Priority::Critical,
            "Enable HTTPS / SSL certificate",
            "Security",
        ));
    }
    if view.broken_links.broken_count > 0.0 {
        actions.push(ActionItem::new(
            Priority::High,
            format!(
                "Fix {} broken link(s)",
                format_number(view.broken_links.broken_count)
            ),
            "SEO + UX",
        ));
    }
    if view.images.missing_alt > 0.0 {
        actions.push(ActionItem::new(
            Priority::High,
            "Add alt text to images",
            "Accessibility + SEO",
        ));
    }
    if !view.technical_seo.meta_description_present {
        actions.push(ActionItem::new(
            Priority::High,
            "Write a meta description",
            "SEO",
        ));
    }
    if !view.structured_data.has_json_ld {
        actions.push(ActionItem::new(
            Priority::Medium,
            "Implement JSON-LD structured data",
            "SEO visibility",
        ));
    }
    if !view.structured_data.has_open_graph {
        actions.push(ActionItem::new(
            Priority::Medium,
            "Add Open Graph meta tags",
            "Social sharing",
        ));
    }
    if view.images.old_format > 0.0 {
        actions.push(ActionItem::new(
            Priority::Low,
            "Convert images to WebP/AVIF",
            "Performance",
        ));
    }
    actions.truncate(MAX_ACTIONS);
    actions
}
