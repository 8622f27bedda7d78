/// Format a number for display.
///
/// Finite values use the shortest string that parses back to the same
/// `f64` (`14`, `0.5`, `0.0000001`). Non-finite values are spelled out.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        n.to_string()
    }
}

/// Read a referenced cell's value as a number.
///
/// Accepts anything `format_number` produces plus ordinary numeric text.
/// Returns None for empty or non-numeric values.
pub fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}
