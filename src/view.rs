//! Fully-defaulted view over an [`AuditResult`].
//!
//! The view is built once per report. Page composers only ever read the view,
//! so none of them branch on whether the backend sent a field.

use crate::model::{AuditResult, BrokenLink, MetricValue};
use crate::score::clamp_score;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditView {
    pub url: String,
    pub audit_date: Option<NaiveDateTime>,
    pub overall_score: f64,
    pub categories: Vec<CategoryScore>,
    pub core_web_vitals: CoreWebVitals,
    pub secondary_metrics: SecondaryMetrics,
    pub opportunities: Vec<OpportunityView>,
    pub broken_links: BrokenLinksView,
    pub images: ImagesView,
    pub structured_data: StructuredDataView,
    pub content: ContentView,
    pub technical_seo: TechnicalSeoView,
    pub security: SecurityView,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryScore {
    pub key: String,
    pub title: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub display_value: String,
    /// 0..=100, scaled from the 0..1 Lighthouse score and rounded.
    pub score: f64,
    pub rating: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoreWebVitals {
    pub lcp: Option<Metric>,
    pub cls: Option<Metric>,
    pub tbt: Option<Metric>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecondaryMetrics {
    pub first_contentful_paint: Option<String>,
    pub speed_index: Option<String>,
    pub time_to_interactive: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpportunityView {
    pub title: String,
    pub description: String,
    pub savings_ms: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Pass,
    Warning,
    Fail,
    Unknown,
}

impl LinkStatus {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("pass") => LinkStatus::Pass,
            Some("warning") => LinkStatus::Warning,
            Some("fail") => LinkStatus::Fail,
            _ => LinkStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrokenLinkView {
    pub url: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrokenLinksView {
    pub status: LinkStatus,
    pub total_checked: f64,
    pub broken_count: f64,
    pub links: Vec<BrokenLinkView>,
}

impl Default for BrokenLinksView {
    fn default() -> Self {
        Self {
            status: LinkStatus::Unknown,
            total_checked: 0.0,
            broken_count: 0.0,
            links: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImagesView {
    pub score: f64,
    pub total_images: f64,
    pub missing_alt: f64,
    pub missing_dimensions: f64,
    pub old_format: f64,
    pub no_lazy_loading: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredDataView {
    pub score: f64,
    pub status: Option<String>,
    pub has_json_ld: bool,
    pub has_open_graph: bool,
    pub has_twitter_card: bool,
    pub has_microdata: bool,
    pub json_ld_types: Vec<String>,
    pub open_graph_properties: Vec<String>,
    pub twitter_card_type: String,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentView {
    pub score: f64,
    pub word_count: f64,
    pub sentence_count: f64,
    pub avg_sentence_length: f64,
    pub avg_paragraph_length: f64,
    pub content_to_code_ratio: f64,
    pub reading_ease_score: f64,
    pub reading_level: Option<String>,
    pub h1_count: f64,
    pub h2_count: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TechnicalSeoView {
    pub title_present: bool,
    pub title_content: String,
    pub meta_description_present: bool,
    pub meta_description_length: f64,
    pub canonical_present: bool,
    pub robots_txt: bool,
    pub sitemap_xml: bool,
    pub h1_count: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecurityView {
    pub https: bool,
    pub hsts: bool,
    pub x_frame_options: bool,
    pub x_content_type_options: bool,
    pub content_security_policy: bool,
}

impl From<&AuditResult> for AuditView {
    fn from(result: &AuditResult) -> Self {
        let lighthouse = result.lighthouse.clone().unwrap_or_default();
        let metrics = lighthouse.metrics.unwrap_or_default();
        let cwv = metrics.core_web_vitals.unwrap_or_default();
        let perf = metrics.performance.unwrap_or_default();

        let categories = lighthouse
            .categories
            .into_iter()
            .map(|(key, cat)| CategoryScore {
                title: cat.title.unwrap_or_else(|| key.clone()),
                score: clamp_score(cat.score.unwrap_or(0.0)),
                key,
            })
            .collect();

        let opportunities = lighthouse
            .opportunities
            .unwrap_or_default()
            .into_iter()
            .map(|opp| OpportunityView {
                title: opp.title.unwrap_or_default(),
                description: opp.description.unwrap_or_default(),
                savings_ms: opp.savings.and_then(|s| s.ms).filter(|ms| finite(*ms) > 0.0),
            })
            .collect();

        let bl = result.broken_links.clone().unwrap_or_default();
        let broken_links = BrokenLinksView {
            status: LinkStatus::parse(bl.status.as_deref()),
            total_checked: count(bl.total_checked),
            broken_count: count(bl.broken_count),
            links: bl
                .broken_links
                .unwrap_or_default()
                .iter()
                .map(broken_link_view)
                .collect(),
        };

        let img = result.image_optimization.clone().unwrap_or_default();
        let issues = img.issues.unwrap_or_default();
        let images = ImagesView {
            score: clamp_score(img.score.unwrap_or(0.0)),
            total_images: count(img.total_images),
            missing_alt: count(issues.missing_alt_count),
            missing_dimensions: count(issues.missing_dimensions_count),
            old_format: count(issues.old_format_count),
            no_lazy_loading: count(issues.no_lazy_loading_count),
        };

        let sd = result.structured_data.clone().unwrap_or_default();
        let structured_data = StructuredDataView {
            score: clamp_score(sd.score.unwrap_or(0.0)),
            status: sd.status.filter(|s| !s.is_empty()),
            has_json_ld: sd.has_json_ld.unwrap_or(false),
            has_open_graph: sd.has_open_graph.unwrap_or(false),
            has_twitter_card: sd.has_twitter_card.unwrap_or(false),
            has_microdata: sd.has_microdata.unwrap_or(false),
            json_ld_types: sd.json_ld_types.unwrap_or_default(),
            open_graph_properties: sd.open_graph_properties.unwrap_or_default(),
            twitter_card_type: sd.twitter_card_type.unwrap_or_default(),
            recommendations: sd.recommendations.unwrap_or_default(),
        };

        let cq = result.content_quality.clone().unwrap_or_default();
        let headings = cq.heading_structure.unwrap_or_default();
        let content = ContentView {
            score: clamp_score(cq.score.unwrap_or(0.0)),
            word_count: count(cq.word_count),
            sentence_count: count(cq.sentence_count),
            avg_sentence_length: value(cq.avg_sentence_length),
            avg_paragraph_length: value(cq.avg_paragraph_length),
            content_to_code_ratio: value(cq.content_to_code_ratio),
            reading_ease_score: value(cq.reading_ease_score),
            reading_level: cq.reading_level.filter(|s| !s.is_empty()),
            h1_count: heading(&headings, "h1"),
            h2_count: heading(&headings, "h2"),
        };

        let seo = result.technical_seo.clone().unwrap_or_default();
        let title = seo.title.unwrap_or_default();
        let meta = seo.meta_description.unwrap_or_default();
        let technical_seo = TechnicalSeoView {
            title_present: title.present.unwrap_or(false),
            title_content: title.content.unwrap_or_default(),
            meta_description_present: meta.present.unwrap_or(false),
            meta_description_length: count(meta.length),
            canonical_present: seo.canonical.and_then(|c| c.present).unwrap_or(false),
            robots_txt: seo.robots_txt.unwrap_or(false),
            sitemap_xml: seo.sitemap_xml.unwrap_or(false),
            h1_count: heading(&seo.headings.unwrap_or_default(), "h1"),
        };

        let sec = result.security.clone().unwrap_or_default();
        let headers = sec.security_headers.unwrap_or_default();
        let security = SecurityView {
            https: sec.https.unwrap_or(false),
            hsts: headers.strict_transport_security.unwrap_or(false),
            x_frame_options: headers.x_frame_options.unwrap_or(false),
            x_content_type_options: headers.x_content_type_options.unwrap_or(false),
            content_security_policy: headers.content_security_policy.unwrap_or(false),
        };

        AuditView {
            url: result.url.clone().unwrap_or_default(),
            audit_date: result.audit_date.as_deref().and_then(parse_audit_date),
            overall_score: clamp_score(result.overall_score.unwrap_or(0.0)),
            categories,
            core_web_vitals: CoreWebVitals {
                lcp: metric(&cwv, "lcp"),
                cls: metric(&cwv, "cls"),
                tbt: metric(&cwv, "tbt"),
            },
            secondary_metrics: SecondaryMetrics {
                first_contentful_paint: display_value(&perf, "fcp"),
                speed_index: display_value(&perf, "speedIndex"),
                time_to_interactive: display_value(&perf, "tti"),
            },
            opportunities,
            broken_links,
            images,
            structured_data,
            content,
            technical_seo,
            security,
        }
    }
}

/// Accepts RFC 3339 timestamps, naive ISO timestamps, and bare dates. Offsets
/// are dropped: the report prints the wall-clock time the backend recorded.
pub fn parse_audit_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamp.naive_local());
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(stamp) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Some(stamp);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Renders a number the way the dashboard does: integers without a fraction.
pub fn format_number(value: f64) -> String {
    format!("{}", finite(value))
}

fn finite(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

fn value(raw: Option<f64>) -> f64 {
    finite(raw.unwrap_or(0.0))
}

fn count(raw: Option<f64>) -> f64 {
    value(raw).max(0.0)
}

fn heading(headings: &BTreeMap<String, Option<f64>>, level: &str) -> f64 {
    count(headings.get(level).copied().flatten())
}

fn metric(map: &BTreeMap<String, Option<MetricValue>>, key: &str) -> Option<Metric> {
    let raw = map.get(key)?.as_ref()?;
    Some(Metric {
        display_value: raw
            .display_value
            .clone()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "\u{2014}".to_string()),
        score: clamp_score((value(raw.score) * 100.0).round()),
        rating: raw.rating.clone().unwrap_or_default(),
    })
}

fn display_value(map: &BTreeMap<String, Option<MetricValue>>, key: &str) -> Option<String> {
    map.get(key)?
        .as_ref()?
        .display_value
        .clone()
        .filter(|v| !v.is_empty())
}

fn broken_link_view(link: &BrokenLink) -> BrokenLinkView {
    let status = match &link.status_code {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => "Error".to_string(),
    };
    BrokenLinkView {
        url: link.url.clone().unwrap_or_default(),
        status,
    }
}
