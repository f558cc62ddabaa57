use scraper::ElementRef;
use tracing::warn;

use crate::error::CoercionError;

/// Concatenated text of an element, trimmed.
pub fn cell_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Coerce stat cell text to a number.
///
/// Empty text is `0.0`. Clock text joins its two halves with a decimal point, so
/// `"34:12"` is `34.12` rather than a seconds conversion.
pub fn coerce(text: &str) -> Result<f64, CoercionError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0.0);
    }

    let candidate = match text.split_once(':') {
        Some((whole, frac)) => format!("{}.{}", whole, frac),
        None => text.to_string(),
    };

    candidate
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CoercionError { text: text.to_string() })
}

/// Like [`coerce`], but logs and returns `None` for text that is not a number.
pub fn coerce_or_skip(stat: &str, text: &str) -> Option<f64> {
    match coerce(text) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(stat, text, "skipping cell: {}", e);
            None
        }
    }
}
