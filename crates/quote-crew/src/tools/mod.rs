//! The tools the quote teams call.
//!
//! Every tool is a pure function of its input. Text inputs that are meant
//! to be JSON are parsed leniently: anything unreadable falls back to a
//! fixed default instead of an error.

mod approval;
mod lead_capture;
mod proposal;
mod rate;
mod valuation;

use serde_json::{Map, Value};

pub use approval::{ApprovalTool, Decision, review_estimate};
pub use lead_capture::{Lead, LeadCaptureTool, capture_lead};
pub use proposal::{Proposal, ProposalTool, write_proposal};
pub use rate::{RateLookupTool, RateQuote, rate_per_sqft};
pub use valuation::{Estimate, EstimatedValue, ValuationTool, estimate_value};

/// Parses `text` as a JSON object. Repeated keys keep their last value.
fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str(text) {
        Ok(Value::Object(object)) => Some(object),
        Ok(_) => {
            debug!("JSON input is not an object");
            None
        }
        Err(err) => {
            debug!("unreadable JSON input: {err}");
            None
        }
    }
}

/// Parses `text` as a JSON object, or returns an empty one.
fn parse_context(text: &str) -> Map<String, Value> {
    parse_object(text).unwrap_or_default()
}

/// Returns the object stored under `key`, or an empty one.
fn object_field(object: &Map<String, Value>, key: &str) -> Map<String, Value> {
    match object.get(key) {
        Some(Value::Object(inner)) => inner.clone(),
        _ => Map::new(),
    }
}

/// Formats a JSON value for use inside prose.
///
/// Strings are shown without quotes, `null` and booleans as `None`, `True`
/// and `False`, anything else as JSON text.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "None".to_owned(),
        Value::Bool(true) => "True".to_owned(),
        Value::Bool(false) => "False".to_owned(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_object() {
        let object = parse_object(r#"{"size":"1 km","size":"2 km"}"#).unwrap();
        assert_eq!(object.get("size"), Some(&json!("2 km")));
        assert!(parse_object("[1, 2]").is_none());
        assert!(parse_object("not json").is_none());
        assert!(parse_context("\"text\"").is_empty());
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("road")), "road");
        assert_eq!(display_value(&json!(7)), "7");
        assert_eq!(display_value(&Value::Null), "None");
        assert_eq!(display_value(&json!(false)), "False");
        assert_eq!(display_value(&json!(["a", 1])), r#"["a",1]"#);
    }
}
