mod assets;
mod brand;
mod canvas;
mod config;
mod doc_context;
mod doc_template;
mod error;
mod font;
pub mod layout;
mod metrics;
mod model;
mod page_template;
pub mod pages;
mod pdf;
pub mod score;
mod types;
mod view;

pub use assets::{LOGO_MAX_WIDTH_MM, LogoAsset, LogoSource, decode_logo, fit_logo, load_logo};
pub use brand::{BrandConfig, DEFAULT_ACCENT, DEFAULT_AGENCY_NAME, DEFAULT_FOOTER};
pub use canvas::{Canvas, Command, Document, Page};
pub use config::ReportConfig;
pub use doc_context::DocContext;
pub use doc_template::{DocTemplate, META_PAGE_NAME_KEY};
pub use error::{ReportError, Result};
pub use font::{Font, measure_text_width, wrap_text};
pub use metrics::{DocumentMetrics, PageMetrics};
pub use model::AuditResult;
pub use page_template::{LOGO_RESOURCE_ID, PageTemplate};
pub use pages::{ActionItem, ComposeContext, Priority, compose_all, derive_action_plan};
pub use score::{Rgb, ScoreTier, classify, tier};
pub use types::{Color, Pt, Size};
pub use view::{AuditView, format_number, parse_audit_date};

use chrono::{NaiveDateTime, Utc};
use layout::TOTAL_PAGES;
use pdf::PdfOptions;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// chrono pattern for "dd MMM yyyy, HH:mm".
pub const DATE_LABEL_FORMAT: &str = "%d %b %Y, %H:%M";

/// A finished report.
#[derive(Debug, Clone)]
pub struct ReportArtifact {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub page_count: usize,
    pub metrics: DocumentMetrics,
}

impl ReportArtifact {
    /// Writes the PDF. A directory target receives the generated filename;
    /// anything else is used as the file path. Returns the path written.
    pub fn save(&self, target: &Path) -> Result<PathBuf> {
        let path = if target.is_dir() {
            target.join(&self.filename)
        } else {
            target.to_path_buf()
        };
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Renders audit results into branded five-page PDF reports.
#[derive(Debug, Clone, Default)]
pub struct ReportGenerator {
    config: ReportConfig,
}

pub struct ReportGeneratorBuilder {
    config: ReportConfig,
}

impl ReportGenerator {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    pub fn builder() -> ReportGeneratorBuilder {
        ReportGeneratorBuilder::new()
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Resolves the brand logo, then renders. Logo failures only cost the logo.
    pub async fn generate(
        &self,
        audit: &AuditResult,
        brand: &BrandConfig,
    ) -> Result<ReportArtifact> {
        self.config.validate()?;
        let logo = load_logo(brand.logo_reference(), self.config.logo_timeout()).await;
        debug!(
            requested = brand.logo_reference().is_some(),
            resolved = logo.is_some(),
            "logo resolution finished"
        );
        self.generate_with_logo(audit, brand, logo.as_ref())
    }

    /// Synchronous core for callers that already hold the logo.
    pub fn generate_with_logo(
        &self,
        audit: &AuditResult,
        brand: &BrandConfig,
        logo: Option<&LogoAsset>,
    ) -> Result<ReportArtifact> {
        self.config.validate()?;
        let started = Instant::now();
        let view = AuditView::from(audit);
        let stamp = report_timestamp(&view);

        let (document, mut metrics) = self.build_document(&view, brand, logo, stamp)?;
        let options = PdfOptions {
            document_title: Some(self.document_title(&view)),
            author: Some(brand.agency_name().to_string()),
            subject: Some(view.url.clone()).filter(|url| !url.is_empty()),
            ..PdfOptions::default()
        };
        let bytes = pdf::document_to_pdf(&document, &options, Some(&mut metrics))?;
        let filename = brand.report_filename(stamp.date());

        info!(
            filename = %filename,
            pages = document.pages.len(),
            bytes = bytes.len(),
            logo = logo.is_some(),
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            "report generated"
        );
        Ok(ReportArtifact {
            bytes,
            filename,
            page_count: document.pages.len(),
            metrics,
        })
    }

    fn build_document(
        &self,
        view: &AuditView,
        brand: &BrandConfig,
        logo: Option<&LogoAsset>,
        stamp: NaiveDateTime,
    ) -> Result<(Document, DocumentMetrics)> {
        let date_label = stamp.format(DATE_LABEL_FORMAT).to_string();
        let ctx = ComposeContext::new(view, brand, &self.config, &date_label);
        let template = PageTemplate::branded(brand, logo, format!("Generated {date_label}"));

        let mut doc = DocTemplate::new(template, TOTAL_PAGES);
        for page in compose_all(&ctx) {
            doc.add_page(page);
        }
        if let Some(logo) = logo {
            doc.add_image(LOGO_RESOURCE_ID, logo.bytes.clone());
        }
        doc.build_with_metrics()
    }

    fn document_title(&self, view: &AuditView) -> String {
        if let Some(title) = self.config.document_title.as_deref() {
            return title.to_string();
        }
        if view.url.is_empty() {
            "Website Audit Report".to_string()
        } else {
            format!("Website Audit Report - {}", view.url)
        }
    }
}

impl ReportGeneratorBuilder {
    pub fn new() -> Self {
        Self {
            config: ReportConfig::default(),
        }
    }

    pub fn config(mut self, config: ReportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn bottom_safety_margin(mut self, margin_mm: f32) -> Self {
        self.config = self.config.with_bottom_safety_margin(margin_mm);
        self
    }

    pub fn logo_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_logo_timeout(timeout);
        self
    }

    pub fn overflow_marker(mut self, enabled: bool) -> Self {
        self.config = self.config.with_overflow_marker(enabled);
        self
    }

    pub fn document_title(mut self, title: impl Into<String>) -> Self {
        self.config = self.config.with_document_title(title);
        self
    }

    pub fn build(self) -> Result<ReportGenerator> {
        self.config.validate()?;
        Ok(ReportGenerator::new(self.config))
    }
}

impl Default for ReportGeneratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders with the default configuration, fetching the brand logo first.
pub async fn generate_report(audit: &AuditResult, brand: &BrandConfig) -> Result<ReportArtifact> {
    ReportGenerator::default().generate(audit, brand).await
}

/// Renders with the default configuration and an already-resolved logo.
pub fn generate_report_with_logo(
    audit: &AuditResult,
    brand: &BrandConfig,
    logo: Option<&LogoAsset>,
) -> Result<ReportArtifact> {
    ReportGenerator::default().generate_with_logo(audit, brand, logo)
}

// Audit date when the backend sent one, otherwise the current UTC time.
fn report_timestamp(view: &AuditView) -> NaiveDateTime {
    view.audit_date.unwrap_or_else(|| Utc::now().naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use image::{ImageBuffer, ImageFormat, Rgba};
    use lopdf::Document as LoDocument;
    use std::io::Cursor;

    const DATED: &str = r#"{"url": "https://example.com", "audit_date": "2024-01-05T09:30:00Z", "overall_score": 83}"#;

    fn audit(raw: &str) -> AuditResult {
        AuditResult::from_json(raw).expect("audit json")
    }

    fn acme() -> BrandConfig {
        BrandConfig {
            agency_name: "Acme Digital".to_string(),
            client_name: "Client Co".to_string(),
            accent_color: "#FF5500".to_string(),
            ..BrandConfig::default()
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgba([255u8, 255, 255, 255]));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .expect("encode");
        out
    }

    #[test]
    fn empty_audit_renders_five_pages() {
        let artifact = generate_report_with_logo(&AuditResult::default(), &BrandConfig::default(), None)
            .expect("report");
        assert_eq!(artifact.page_count, TOTAL_PAGES);
        assert_eq!(artifact.metrics.pages.len(), TOTAL_PAGES);
        assert_eq!(artifact.metrics.total_bytes, artifact.bytes.len());
        let loaded = LoDocument::load_mem(&artifact.bytes).expect("reload");
        assert_eq!(loaded.get_pages().len(), TOTAL_PAGES);
        assert!(artifact.filename.starts_with("auditflow_audit_audit_"));
    }

    #[test]
    fn filename_uses_audit_date_and_brand() {
        let artifact = generate_report_with_logo(&audit(DATED), &acme(), None).expect("report");
        assert_eq!(artifact.filename, "acme_digital_audit_client_co_2024-01-05.pdf");
    }

    #[test]
    fn identical_inputs_give_identical_bytes() {
        let a = generate_report_with_logo(&audit(DATED), &acme(), None).expect("a");
        let b = generate_report_with_logo(&audit(DATED), &acme(), None).expect("b");
        assert_eq!(a.bytes, b.bytes);
    }

    #[test]
    fn every_page_carries_header_and_footer() {
        let generator = ReportGenerator::default();
        let view = AuditView::from(&audit(DATED));
        let stamp = report_timestamp(&view);
        let (document, metrics) = generator
            .build_document(&view, &acme(), None, stamp)
            .expect("document");
        for (index, page) in document.pages.iter().enumerate() {
            let texts = page.texts();
            assert!(texts.contains(&"Acme Digital"));
            assert!(texts.contains(&format!("Page {} of 5", index + 1).as_str()));
            assert!(texts.contains(&"Generated 05 Jan 2024, 09:30"));
            assert_eq!(page.commands.first(), Some(&Command::SaveState));
        }
        let names: Vec<&str> = metrics.pages.iter().map(|p| p.page_name.as_str()).collect();
        assert_eq!(names, pages::PAGE_NAMES);
    }

    #[test]
    fn logo_is_embedded_once_and_drawn_on_every_page() {
        let logo = decode_logo(&png_bytes(120, 40), LogoSource::File).expect("logo");
        let generator = ReportGenerator::default();
        let view = AuditView::from(&audit(DATED));
        let (document, _) = generator
            .build_document(&view, &acme(), Some(&logo), report_timestamp(&view))
            .expect("document");
        assert_eq!(document.images.len(), 1);
        for page in &document.pages {
            assert!(page
                .commands
                .iter()
                .any(|c| matches!(c, Command::DrawImage { resource_id, .. } if resource_id == LOGO_RESOURCE_ID)));
        }

        let artifact = generator
            .generate_with_logo(&audit(DATED), &acme(), Some(&logo))
            .expect("report");
        let loaded = LoDocument::load_mem(&artifact.bytes).expect("reload");
        let images = loaded
            .objects
            .values()
            .filter_map(|obj| obj.as_stream().ok())
            .filter(|stream| {
                stream
                    .dict
                    .get(b"Subtype")
                    .and_then(|s| s.as_name())
                    .map(|name| name == b"Image")
                    .unwrap_or(false)
            })
            .count();
        assert_eq!(images, 1);
    }

    #[test]
    fn builder_rejects_negative_safety_margin() {
        let err = match ReportGenerator::builder().bottom_safety_margin(-1.0).build() {
            Ok(_) => panic!("negative margin should be rejected"),
            Err(err) => err,
        };
        assert!(matches!(err, ReportError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("bottom_safety_margin_mm"));
    }

    #[test]
    fn invalid_config_fails_before_rendering() {
        let generator = ReportGenerator::new(ReportConfig::default().with_bottom_safety_margin(f32::NAN));
        let result = generator.generate_with_logo(&AuditResult::default(), &BrandConfig::default(), None);
        assert!(matches!(result, Err(ReportError::InvalidConfiguration(_))));
    }

    #[test]
    fn document_title_defaults_to_url() {
        let generator = ReportGenerator::default();
        let view = AuditView::from(&audit(DATED));
        assert_eq!(
            generator.document_title(&view),
            "Website Audit Report - https://example.com"
        );
        let generator = ReportGenerator::builder()
            .document_title("Q1 audit")
            .build()
            .expect("generator");
        assert_eq!(generator.document_title(&view), "Q1 audit");
    }

    #[tokio::test]
    async fn data_uri_logo_flows_through_async_generation() {
        let brand = BrandConfig {
            agency_logo: Some(format!(
                "data:image/png;base64,{}",
                base64::engine::general_purpose::STANDARD.encode(png_bytes(32, 32))
            )),
            ..acme()
        };
        let artifact = generate_report(&audit(DATED), &brand).await.expect("report");
        assert_eq!(artifact.page_count, 5);
        let plain = generate_report_with_logo(&audit(DATED), &brand, None).expect("plain");
        assert_ne!(artifact.bytes, plain.bytes);
    }

    #[tokio::test]
    async fn unreachable_logo_still_renders() {
        let brand = BrandConfig {
            agency_logo: Some("http://127.0.0.1:9/logo.png".to_string()),
            ..acme()
        };
        let generator = ReportGenerator::builder()
            .logo_timeout(Duration::from_millis(200))
            .build()
            .expect("generator");
        let artifact = generator.generate(&audit(DATED), &brand).await.expect("report");
        let plain = generate_report_with_logo(&audit(DATED), &brand, None).expect("plain");
        assert_eq!(artifact.bytes, plain.bytes);
    }

    #[test]
    fn save_into_directory_uses_filename() {
        let artifact = generate_report_with_logo(&audit(DATED), &acme(), None).expect("report");
        let dir = std::env::temp_dir().join(format!("auditflow-report-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("tmp dir");
        let path = artifact.save(&dir).expect("save");
        assert_eq!(path, dir.join("acme_digital_audit_client_co_2024-01-05.pdf"));
        assert_eq!(std::fs::read(&path).expect("read back"), artifact.bytes);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
