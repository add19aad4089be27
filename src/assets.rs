use base64::Engine;
use image::{GenericImageView, ImageFormat};
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Widest a logo may be drawn in the header, in millimetres.
pub const LOGO_MAX_WIDTH_MM: f32 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoSource {
    DataUri,
    Remote,
    File,
}

impl LogoSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogoSource::DataUri => "data-uri",
            LogoSource::Remote => "remote",
            LogoSource::File => "file",
        }
    }

    fn detect(reference: &str) -> Self {
        let lower = reference.trim_start().to_ascii_lowercase();
        if lower.starts_with("data:") {
            LogoSource::DataUri
        } else if lower.starts_with("http://") || lower.starts_with("https://") {
            LogoSource::Remote
        } else {
            LogoSource::File
        }
    }
}

/// A decoded logo, re-encoded as PNG at native resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct LogoAsset {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub source: LogoSource,
}

impl LogoAsset {
    /// Drawn size inside a header band of `band_height_mm`; see [`fit_logo`].
    pub fn fitted_size(&self, band_height_mm: f32) -> (f32, f32) {
        fit_logo(
            self.width,
            self.height,
            LOGO_MAX_WIDTH_MM,
            band_height_mm - 6.0,
        )
    }
}

/// Resolves an optional logo reference. Every failure mode (absent reference,
/// network error, non-success status, timeout, undecodable bytes) yields `None`.
pub async fn load_logo(reference: Option<&str>, timeout: Duration) -> Option<LogoAsset> {
    let reference = reference.map(str::trim).filter(|r| !r.is_empty())?;
    let source = LogoSource::detect(reference);
    let bytes = match source {
        LogoSource::DataUri => parse_data_uri(reference).map(|(_, data)| data),
        LogoSource::Remote => fetch_remote(reference, timeout).await,
        LogoSource::File => match tokio::fs::read(Path::new(reference)).await {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                warn!(path = reference, error = %err, "logo: file unreadable");
                None
            }
        },
    }?;
    let logo = decode_logo(&bytes, source);
    if logo.is_none() {
        warn!(source = source.as_str(), bytes = bytes.len(), "logo: decode failed");
    }
    logo
}

async fn fetch_remote(url: &str, timeout: Duration) -> Option<Vec<u8>> {
    let client = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(err) => {
            warn!(error = %err, "logo: http client unavailable");
            return None;
        }
    };
    let request = async {
        let response = client.get(url).send().await?.error_for_status()?;
        Ok::<_, reqwest::Error>(response.bytes().await?)
    };
    match tokio::time::timeout(timeout, request).await {
        Ok(Ok(bytes)) => {
            debug!(url, bytes = bytes.len(), "logo: fetched");
            Some(bytes.to_vec())
        }
        Ok(Err(err)) => {
            warn!(url, error = %err, "logo: fetch failed");
            None
        }
        Err(_) => {
            warn!(url, timeout_ms = timeout.as_millis() as u64, "logo: fetch timed out");
            None
        }
    }
}

pub fn decode_logo(data: &[u8], source: LogoSource) -> Option<LogoAsset> {
    let decoded = image::load_from_memory(data).ok()?;
    let (width, height) = decoded.dimensions();
    if width == 0 || height == 0 {
        return None;
    }
    let mut bytes = Vec::new();
    decoded
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .ok()?;
    Some(LogoAsset {
        bytes,
        width,
        height,
        source,
    })
}

/// Scales a `width_px` x `height_px` image into a `max_w` x `max_h` box,
/// treating one pixel as one millimetre. Aspect ratio is preserved and the
/// scale never exceeds 1.
pub fn fit_logo(width_px: u32, height_px: u32, max_w: f32, max_h: f32) -> (f32, f32) {
    if width_px == 0 || height_px == 0 {
        return (0.0, 0.0);
    }
    let (w, h) = (width_px as f32, height_px as f32);
    let ratio = (max_w / w).min(max_h / h).min(1.0).max(0.0);
    (w * ratio, h * ratio)
}

pub(crate) fn parse_data_uri(uri: &str) -> Option<(String, Vec<u8>)> {
    let uri = uri.trim();
    if !uri.get(..5)?.eq_ignore_ascii_case("data:") {
        return None;
    }
    let (header, data_part) = uri.split_once(',')?;
    let mime = header[5..]
        .split(';')
        .next()
        .filter(|m| !m.is_empty())
        .unwrap_or("application/octet-stream")
        .to_string();
    let data = if header.contains(";base64") {
        let compact: String = data_part.chars().filter(|c| !c.is_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact)
            .ok()?
    } else {
        data_part.as_bytes().to_vec()
    };
    Some((mime, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, Rgba([0u8, 117, 255, 200]));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .expect("encode");
        out
    }

    fn data_uri(bytes: &[u8]) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        )
    }

    #[test]
    fn fit_never_upscales() {
        assert_eq!(fit_logo(20, 10, 40.0, 16.0), (20.0, 10.0));
    }

    #[test]
    fn fit_preserves_aspect_ratio() {
        let (w, h) = fit_logo(400, 100, 40.0, 16.0);
        assert!((w - 40.0).abs() < 1e-4 && (h - 10.0).abs() < 1e-4);
        let (w, h) = fit_logo(100, 400, 40.0, 16.0);
        assert!((w - 4.0).abs() < 1e-4 && (h - 16.0).abs() < 1e-4);
        for (pw, ph) in [(640u32, 480u32), (17, 230), (1200, 90)] {
            let (w, h) = fit_logo(pw, ph, 40.0, 16.0);
            assert!(w <= 40.0 + f32::EPSILON && h <= 16.0 + f32::EPSILON);
            assert!(((w / h) - (pw as f32 / ph as f32)).abs() < 1e-3);
        }
    }

    #[test]
    fn fit_handles_degenerate_sizes() {
        assert_eq!(fit_logo(0, 10, 40.0, 16.0), (0.0, 0.0));
    }

    #[test]
    fn data_uri_parses_base64_and_plain() {
        let (mime, data) = parse_data_uri("data:text/plain,hello").expect("plain");
        assert_eq!(mime, "text/plain");
        assert_eq!(data, b"hello");
        let (mime, data) = parse_data_uri("data:image/png;base64,aGk=").expect("b64");
        assert_eq!(mime, "image/png");
        assert_eq!(data, b"hi");
        assert!(parse_data_uri("https://example.com/logo.png").is_none());
        assert!(parse_data_uri("data:image/png;base64,@@@").is_none());
    }

    #[tokio::test]
    async fn absent_reference_yields_none() {
        assert!(load_logo(None, Duration::from_millis(50)).await.is_none());
        assert!(load_logo(Some("   "), Duration::from_millis(50)).await.is_none());
    }

    #[tokio::test]
    async fn data_uri_logo_decodes_with_native_size() {
        let uri = data_uri(&png_bytes(64, 32));
        let logo = load_logo(Some(&uri), Duration::from_millis(50))
            .await
            .expect("logo");
        assert_eq!((logo.width, logo.height), (64, 32));
        assert_eq!(logo.source, LogoSource::DataUri);
        let (w, h) = logo.fitted_size(22.0);
        assert!((w - 32.0).abs() < 1e-4 && (h - 16.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn undecodable_or_missing_logo_degrades_to_none() {
        let uri = data_uri(b"definitely not an image");
        assert!(load_logo(Some(&uri), Duration::from_millis(50)).await.is_none());
        assert!(
            load_logo(Some("/nonexistent/dir/logo.png"), Duration::from_millis(50))
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn unreachable_host_degrades_to_none() {
        let logo = load_logo(
            Some("http://127.0.0.1:9/logo.png"),
            Duration::from_millis(200),
        )
        .await;
        assert!(logo.is_none());
    }
}
