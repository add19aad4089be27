use crate::error::{ReportError, Result};
use crate::layout::{CONTENT_TOP_MM, PAGE_HEIGHT_MM};
use serde::Deserialize;
use std::time::Duration;

/// Tunables for report generation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// List rows whose top would start inside this many millimetres from the
    /// bottom edge are dropped.
    pub bottom_safety_margin_mm: f32,
    /// Upper bound on fetching a remote logo. On expiry the header renders without one.
    pub logo_timeout_ms: u64,
    /// Print a "+N more not shown" line when list rows are dropped.
    pub overflow_marker: bool,
    /// PDF `/Title`. Defaults to "Website Audit Report - {url}".
    pub document_title: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            bottom_safety_margin_mm: 30.0,
            logo_timeout_ms: 10_000,
            overflow_marker: true,
            document_title: None,
        }
    }
}

impl ReportConfig {
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: ReportConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_bottom_safety_margin(mut self, margin_mm: f32) -> Self {
        self.bottom_safety_margin_mm = margin_mm;
        self
    }

    pub fn with_logo_timeout(mut self, timeout: Duration) -> Self {
        self.logo_timeout_ms = timeout.as_millis().min(u64::MAX as u128) as u64;
        self
    }

    pub fn with_overflow_marker(mut self, enabled: bool) -> Self {
        self.overflow_marker = enabled;
        self
    }

    pub fn with_document_title(mut self, title: impl Into<String>) -> Self {
        self.document_title = Some(title.into());
        self
    }

    pub fn logo_timeout(&self) -> Duration {
        Duration::from_millis(self.logo_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        let max = PAGE_HEIGHT_MM - CONTENT_TOP_MM;
        let margin = self.bottom_safety_margin_mm;
        if !margin.is_finite() || margin < 0.0 || margin > max {
            return Err(ReportError::InvalidConfiguration(format!(
                "bottom_safety_margin_mm must be within 0..={max}, got {margin}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = ReportConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.logo_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ReportConfig::from_json(r#"{ "overflow_marker": false }"#).expect("parse");
        assert!(!config.overflow_marker);
        assert_eq!(config.bottom_safety_margin_mm, 30.0);
    }

    #[test]
    fn margin_outside_page_is_rejected() {
        let err = ReportConfig::from_json(r#"{ "bottom_safety_margin_mm": 500 }"#).unwrap_err();
        assert!(matches!(err, ReportError::InvalidConfiguration(_)));
        let config = ReportConfig::default().with_bottom_safety_margin(-1.0);
        assert!(config.validate().is_err());
    }
}
