//! QR code rendering for short links.

use base64::Engine as _;
use qrcode::QrCode;
use qrcode::render::svg;

/// Renders `content` as an SVG QR code wrapped in a `data:` URI.
///
/// # Errors
///
/// Returns [`qrcode::types::QrError`] if the content does not fit a QR code.
pub fn svg_data_uri(content: &str) -> Result<String, qrcode::types::QrError> {
    let code = QrCode::new(content.as_bytes())?;

    let image = code
        .render::<svg::Color<'_>>()
        .min_dimensions(200, 200)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build();

    let encoded = base64::engine::general_purpose::STANDARD.encode(image);
    Ok(format!("data:image/svg+xml;base64,{encoded}"))
}

/// Like [`svg_data_uri`] but logs failures and yields `None`.
pub fn try_svg_data_uri(content: &str) -> Option<String> {
    match svg_data_uri(content) {
        Ok(uri) => Some(uri),
        Err(e) => {
            tracing::warn!(error = %e, "QR rendering failed, omitting image");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_svg_data_uri_prefix() {
        let uri = svg_data_uri("https://s.example.com/s/1").unwrap();
        assert!(uri.starts_with("data:image/svg+xml;base64,"));
    }

    #[test]
    fn test_svg_payload_is_svg() {
        let uri = svg_data_uri("https://s.example.com/s/abc").unwrap();
        let payload = uri.trim_start_matches("data:image/svg+xml;base64,");
        let svg = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .unwrap();
        let svg = String::from_utf8(svg).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn test_oversized_content_degrades_to_none() {
        let huge = "x".repeat(8_000);
        assert!(svg_data_uri(&huge).is_err());
        assert!(try_svg_data_uri(&huge).is_none());
    }
}
