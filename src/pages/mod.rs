//! The five fixed report pages.
//!
//! Every composer is a pure function of [`ComposeContext`] producing one
//! [`Page`] of content. Header and footer are not drawn here: the branded page
//! template adds them after composition.

pub mod action_plan;
mod content;
mod cover;
mod performance;
mod security;
mod seo;

use crate::brand::BrandConfig;
use crate::canvas::{Canvas, Page};
use crate::config::ReportConfig;
use crate::doc_template::META_PAGE_NAME_KEY;
use crate::layout::LayoutCursor;
use crate::score::Rgb;
use crate::types::Size;
use crate::view::AuditView;

pub use action_plan::{ActionItem, Priority, derive_action_plan};

/// Page names in report order; also recorded as page metadata.
pub const PAGE_NAMES: [&str; 5] = ["cover", "performance", "seo", "content", "security"];

/// Everything a page composer reads.
#[derive(Debug, Clone, Copy)]
pub struct ComposeContext<'a> {
    pub view: &'a AuditView,
    pub brand: &'a BrandConfig,
    pub config: &'a ReportConfig,
    /// Human-readable audit date, "dd MMM yyyy, HH:mm".
    pub date_label: &'a str,
}

impl<'a> ComposeContext<'a> {
    pub fn new(
        view: &'a AuditView,
        brand: &'a BrandConfig,
        config: &'a ReportConfig,
        date_label: &'a str,
    ) -> Self {
        Self {
            view,
            brand,
            config,
            date_label,
        }
    }

    pub fn accent(&self) -> Rgb {
        self.brand.accent()
    }

    pub(crate) fn cursor(&self, page_number: usize) -> LayoutCursor {
        LayoutCursor::new(page_number, self.config.bottom_safety_margin_mm)
    }
}

/// Composes all five pages in order.
pub fn compose_all(ctx: &ComposeContext<'_>) -> Vec<Page> {
    vec![
        cover::compose(ctx),
        performance::compose(ctx),
        seo::compose(ctx),
        content::compose(ctx),
        security::compose(ctx),
    ]
}

pub(crate) fn page_canvas(page_number: usize) -> Canvas {
    let mut canvas = Canvas::new(Size::a4());
    canvas.meta(META_PAGE_NAME_KEY, PAGE_NAMES[page_number - 1]);
    canvas
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::model::AuditResult;

    pub fn view(raw: &str) -> AuditView {
        AuditView::from(&AuditResult::from_json(raw).expect("audit json"))
    }

    pub fn compose_with(
        raw: &str,
        compose: fn(&ComposeContext<'_>) -> Page,
        config: &ReportConfig,
    ) -> Page {
        let view = view(raw);
        let brand = BrandConfig::default();
        let ctx = ComposeContext::new(&view, &brand, config, "05 Jan 2024, 09:30");
        compose(&ctx)
    }

    pub fn compose(raw: &str, compose: fn(&ComposeContext<'_>) -> Page) -> Page {
        compose_with(raw, compose, &ReportConfig::default())
    }

    pub fn has_text(page: &Page, needle: &str) -> bool {
        page.texts().iter().any(|t| *t == needle)
    }
}
