use crate::score::Rgb;
use chrono::NaiveDate;
use serde::Deserialize;

pub const DEFAULT_AGENCY_NAME: &str = "AuditFlow";
pub const DEFAULT_ACCENT: Rgb = Rgb::new(0, 117, 255);
pub const DEFAULT_FOOTER: &str = "Confidential \u{2014} prepared exclusively for the client named above.";

/// White-label settings chosen by the agency. Keys are camelCase because the
/// record is persisted by the dashboard in that shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BrandConfig {
    pub agency_name: String,
    /// Remote URL, `data:` URI, or local file path.
    pub agency_logo: Option<String>,
    pub agency_url: String,
    pub accent_color: String,
    pub report_footer: String,
    pub prepared_by: String,
    pub client_name: String,
}

impl Default for BrandConfig {
    fn default() -> Self {
        Self {
            agency_name: DEFAULT_AGENCY_NAME.to_string(),
            agency_logo: None,
            agency_url: "https://auditflow.io".to_string(),
            accent_color: "#0075FF".to_string(),
            report_footer: DEFAULT_FOOTER.to_string(),
            prepared_by: String::new(),
            client_name: String::new(),
        }
    }
}

impl BrandConfig {
    pub fn from_json(raw: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Accent color, or the default accent when the stored value is not `#RRGGBB`.
    pub fn accent(&self) -> Rgb {
        Rgb::from_hex(&self.accent_color).unwrap_or(DEFAULT_ACCENT)
    }

    pub fn agency_name(&self) -> &str {
        let name = self.agency_name.trim();
        if name.is_empty() { DEFAULT_AGENCY_NAME } else { name }
    }

    pub fn logo_reference(&self) -> Option<&str> {
        self.agency_logo
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// `{agency}_audit_{client}_{yyyy-MM-dd}.pdf`, lower-cased, whitespace
    /// runs collapsed to `_`. An empty client name becomes `audit`.
    pub fn report_filename(&self, date: NaiveDate) -> String {
        let client = if self.client_name.trim().is_empty() {
            "audit"
        } else {
            self.client_name.as_str()
        };
        format!(
            "{}_audit_{}_{}.pdf",
            filename_segment(self.agency_name()),
            filename_segment(client),
            date.format("%Y-%m-%d")
        )
    }
}

fn filename_segment(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn filename_is_lowercased_and_underscored() {
        let brand = BrandConfig {
            agency_name: "Acme Digital".to_string(),
            client_name: "Client Co".to_string(),
            ..BrandConfig::default()
        };
        assert_eq!(
            brand.report_filename(date(2024, 1, 5)),
            "acme_digital_audit_client_co_2024-01-05.pdf"
        );
    }

    #[test]
    fn empty_client_falls_back_to_audit() {
        let brand = BrandConfig {
            agency_name: "  Big   Agency\tLtd ".to_string(),
            ..BrandConfig::default()
        };
        assert_eq!(
            brand.report_filename(date(2025, 12, 31)),
            "big_agency_ltd_audit_audit_2025-12-31.pdf"
        );
    }

    #[test]
    fn persisted_camel_case_record_parses() {
        let brand = BrandConfig::from_json(
            r##"{ "agencyName": "Northwind", "accentColor": "#10B981", "clientName": "Contoso", "agencyLogo": null }"##,
        )
        .expect("parse");
        assert_eq!(brand.agency_name, "Northwind");
        assert_eq!(brand.accent(), Rgb::new(16, 185, 129));
        assert!(brand.logo_reference().is_none());
        assert_eq!(brand.report_footer, DEFAULT_FOOTER);
    }

    #[test]
    fn bad_accent_uses_default() {
        let brand = BrandConfig {
            accent_color: "teal".to_string(),
            ..BrandConfig::default()
        };
        assert_eq!(brand.accent(), DEFAULT_ACCENT);
    }
}
