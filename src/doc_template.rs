use crate::canvas::{Canvas, Command, Document, Page};
use crate::doc_context::DocContext;
use crate::error::{ReportError, Result};
use crate::metrics::{DocumentMetrics, PageMetrics};
use crate::page_template::PageTemplate;
use std::time::Instant;
use tracing::debug;

pub const META_PAGE_NAME_KEY: &str = "report.page";

/// Collects composed pages and applies the page template's chrome to each.
pub struct DocTemplate {
    page_template: PageTemplate,
    expected_pages: usize,
    pages: Vec<Page>,
    images: Vec<(String, Vec<u8>)>,
}

impl DocTemplate {
    pub fn new(page_template: PageTemplate, expected_pages: usize) -> Self {
        Self {
            page_template,
            expected_pages,
            pages: Vec::new(),
            images: Vec::new(),
        }
    }

    pub fn add_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    pub fn add_image(&mut self, resource_id: impl Into<String>, bytes: Vec<u8>) {
        self.images.push((resource_id.into(), bytes));
    }

    pub fn build(self) -> Result<Document> {
        Ok(self.build_with_metrics()?.0)
    }

    /// Content is wrapped in a save/restore pair and the chrome is drawn on top
    /// from the default graphics state, so full-bleed content never hides it.
    pub fn build_with_metrics(self) -> Result<(Document, DocumentMetrics)> {
        if self.pages.len() != self.expected_pages {
            return Err(ReportError::PageCount {
                expected: self.expected_pages,
                actual: self.pages.len(),
            });
        }

        let total_pages = self.pages.len();
        let page_size = self.page_template.page_size;
        let mut metrics = DocumentMetrics::default();
        let mut pages = Vec::with_capacity(total_pages);

        for (index, content) in self.pages.into_iter().enumerate() {
            let started = Instant::now();
            let page_number = index + 1;
            let page_name = content
                .meta_value(META_PAGE_NAME_KEY)
                .unwrap_or("page")
                .to_string();
            let ctx = DocContext::new(page_number, total_pages, page_name.clone());

            let mut chrome = Canvas::new(page_size);
            if let Some(on_page) = self.page_template.on_page() {
                on_page(&mut chrome, &ctx);
            }
            let chrome = chrome.finish();

            let mut commands =
                Vec::with_capacity(content.commands.len() + chrome.commands.len() + 2);
            commands.push(Command::SaveState);
            commands.extend(content.commands);
            commands.push(Command::RestoreState);
            commands.extend(chrome.commands);

            let elapsed = started.elapsed().as_secs_f64() * 1000.0;
            debug!(page_number, page = %page_name, commands = commands.len(), "page assembled");
            metrics.pages.push(PageMetrics {
                page_number,
                page_name,
                render_ms: elapsed,
                command_count: commands.len(),
                content_bytes: 0,
            });
            metrics.total_render_ms += elapsed;
            pages.push(Page { commands });
        }

        Ok((
            Document {
                page_size,
                pages,
                images: self.images,
            },
            metrics,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Size;

    fn named_page(name: &str) -> Page {
        let mut canvas = Canvas::new(Size::a4());
        canvas.meta(META_PAGE_NAME_KEY, name);
        canvas.finish()
    }

    #[test]
    fn chrome_follows_wrapped_content() {
        let template = PageTemplate::new("t", Size::a4()).set_on_page(|canvas, ctx| {
            canvas.meta("chrome", ctx.page_label());
        });
        let mut doc = DocTemplate::new(template, 2);
        doc.add_page(named_page("cover"));
        doc.add_page(named_page("performance"));
        let (document, metrics) = doc.build_with_metrics().expect("build");

        assert_eq!(document.pages.len(), 2);
        let second = &document.pages[1];
        assert_eq!(second.commands.first(), Some(&Command::SaveState));
        assert_eq!(second.meta_value("chrome"), Some("Page 2 of 2"));
        let restore = second
            .commands
            .iter()
            .position(|c| *c == Command::RestoreState)
            .expect("restore");
        let chrome = second
            .commands
            .iter()
            .position(|c| matches!(c, Command::Meta { key, .. } if key == "chrome"))
            .expect("chrome");
        assert!(restore < chrome);
        assert_eq!(metrics.pages[0].page_name, "cover");
        assert_eq!(metrics.pages[1].page_number, 2);
    }

    #[test]
    fn wrong_page_count_is_fatal() {
        let mut doc = DocTemplate::new(PageTemplate::new("t", Size::a4()), 5);
        doc.add_page(named_page("cover"));
        assert!(matches!(
            doc.build(),
            Err(ReportError::PageCount {
                expected: 5,
                actual: 1
            })
        ));
    }
}
