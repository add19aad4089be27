//! Audit result records as delivered by the audit backend.
//!
//! Every field is optional: the backend omits sections it could not compute and
//! sends `null` for values it did not measure. Consumers should go through
//! [`crate::view::AuditView`], which resolves all of this to concrete defaults.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuditResult {
    pub url: Option<String>,
    pub audit_date: Option<String>,
    pub overall_score: Option<f64>,
    pub lighthouse: Option<Lighthouse>,
    pub broken_links: Option<BrokenLinks>,
    pub image_optimization: Option<ImageOptimization>,
    pub structured_data: Option<StructuredData>,
    pub content_quality: Option<ContentQuality>,
    pub technical_seo: Option<TechnicalSeo>,
    pub security: Option<Security>,
}

impl AuditResult {
    pub fn from_json(raw: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Lighthouse {
    #[serde(deserialize_with = "ordered_entries")]
    pub categories: Vec<(String, LighthouseCategory)>,
    pub metrics: Option<LighthouseMetrics>,
    pub opportunities: Option<Vec<Opportunity>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LighthouseCategory {
    pub title: Option<String>,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LighthouseMetrics {
    #[serde(rename = "coreWebVitals")]
    pub core_web_vitals: Option<BTreeMap<String, Option<MetricValue>>>,
    pub performance: Option<BTreeMap<String, Option<MetricValue>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricValue {
    #[serde(rename = "displayValue")]
    pub display_value: Option<String>,
    pub score: Option<f64>,
    pub rating: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Opportunity {
    pub title: Option<String>,
    pub description: Option<String>,
    pub savings: Option<Savings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Savings {
    pub ms: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BrokenLinks {
    pub status: Option<String>,
    pub total_checked: Option<f64>,
    pub broken_count: Option<f64>,
    pub broken_links: Option<Vec<BrokenLink>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BrokenLink {
    pub url: Option<String>,
    /// Numeric HTTP status, or a string such as `"timeout"` when the check failed.
    pub status_code: Option<Value>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImageOptimization {
    pub score: Option<f64>,
    pub total_images: Option<f64>,
    pub issues: Option<ImageIssues>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImageIssues {
    pub missing_alt_count: Option<f64>,
    pub missing_dimensions_count: Option<f64>,
    pub old_format_count: Option<f64>,
    pub no_lazy_loading_count: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StructuredData {
    pub score: Option<f64>,
    pub status: Option<String>,
    pub has_json_ld: Option<bool>,
    pub has_open_graph: Option<bool>,
    pub has_twitter_card: Option<bool>,
    pub has_microdata: Option<bool>,
    pub json_ld_types: Option<Vec<String>>,
    pub open_graph_properties: Option<Vec<String>>,
    pub twitter_card_type: Option<String>,
    pub recommendations: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContentQuality {
    pub score: Option<f64>,
    pub word_count: Option<f64>,
    pub sentence_count: Option<f64>,
    pub avg_sentence_length: Option<f64>,
    pub avg_paragraph_length: Option<f64>,
    pub content_to_code_ratio: Option<f64>,
    pub reading_ease_score: Option<f64>,
    pub reading_level: Option<String>,
    pub heading_structure: Option<BTreeMap<String, Option<f64>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TechnicalSeo {
    pub title: Option<TitleTag>,
    pub meta_description: Option<MetaDescription>,
    pub canonical: Option<Presence>,
    pub robots_txt: Option<bool>,
    pub sitemap_xml: Option<bool>,
    pub headings: Option<BTreeMap<String, Option<f64>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TitleTag {
    pub present: Option<bool>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetaDescription {
    pub present: Option<bool>,
    pub length: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Presence {
    pub present: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Security {
    pub https: Option<bool>,
    pub security_headers: Option<SecurityHeaders>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SecurityHeaders {
    pub strict_transport_security: Option<bool>,
    pub x_frame_options: Option<bool>,
    pub x_content_type_options: Option<bool>,
    pub content_security_policy: Option<bool>,
}

// Lighthouse categories are rendered in the order the backend sent them, so the
// map is read as an ordered list of entries. `null` reads as empty.
fn ordered_entries<'de, D>(deserializer: D) -> Result<Vec<(String, LighthouseCategory)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct EntriesVisitor;

    impl<'de> Visitor<'de> for EntriesVisitor {
        type Value = Vec<(String, LighthouseCategory)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of lighthouse categories")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_map(self)
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, Option<LighthouseCategory>>()? {
                entries.push((key, value.unwrap_or_default()));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_option(EntriesVisitor)
}
