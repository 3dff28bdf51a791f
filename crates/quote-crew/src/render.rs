use serde_json::Value;

/// Prepares a team's final text for display.
///
/// JSON text is pretty-printed with two-space indentation, anything else is
/// returned verbatim.
pub fn render_result(text: &str) -> String {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| text.to_owned())
}
