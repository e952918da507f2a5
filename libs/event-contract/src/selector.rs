//! Predicate query documents for timestamp ranges.
//!
//! Selectors are built as typed values and serialized once, so a device
//! id never reaches the query text without JSON escaping.

use serde::Serialize;

use ledger_api::LedgerError;

/// Bounds on the `timestamp` field. Both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TimestampPredicate {
    #[serde(rename = "$gte", skip_serializing_if = "Option::is_none")]
    pub gte: Option<i64>,
    #[serde(rename = "$lte", skip_serializing_if = "Option::is_none")]
    pub lte: Option<i64>,
}

/// Conjunction of a timestamp predicate and an optional device equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeSelector {
    pub timestamp: TimestampPredicate,
    #[serde(rename = "id", skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
}

/// `{"selector": {...}}` as the ledger's predicate query engine expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryDocument {
    pub selector: RangeSelector,
}

impl QueryDocument {
    pub fn to_json(&self) -> Result<String, LedgerError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Parse a range bound. Empty text means the bound is absent.
pub fn parse_bound(text: &str, name: &str) -> Result<Option<i64>, LedgerError> {
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<i64>()
        .map(Some)
        .map_err(|e| LedgerError::query_syntax(format!("{name} bound '{text}' is not an integer: {e}")))
}

/// Translate a `[start, end]` lookup into a predicate query document.
///
/// | start  | end     | selects                  |
/// |--------|---------|--------------------------|
/// | absent | absent  | timestamp >= 0           |
/// | absent | present | timestamp <= end         |
/// | present| absent  | timestamp >= start       |
/// | present| present | start <= timestamp <= end|
///
/// `device_id`, when given, is ANDed in as an equality on the `id` field.
/// `start > end` is not an error; it selects nothing.
pub fn build_range_selector(
    start: &str,
    end: &str,
    device_id: Option<&str>,
) -> Result<QueryDocument, LedgerError> {
    let start = parse_bound(start, "start")?;
    let end = parse_bound(end, "end")?;

    let timestamp = match (start, end) {
        (None, None) => TimestampPredicate { gte: Some(0), lte: None },
        (gte, lte) => TimestampPredicate { gte, lte },
    };

    Ok(QueryDocument {
        selector: RangeSelector {
            timestamp,
            device_id: device_id.map(str::to_string),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_api::ErrorKind;
    use ledger_api::record::{FIELD_DEVICE_ID, FIELD_TIMESTAMP};

    fn json(start: &str, end: &str, device: Option<&str>) -> serde_json::Value {
        let doc = build_range_selector(start, end, device).unwrap();
        serde_json::from_str(&doc.to_json().unwrap()).unwrap()
    }

    #[test]
    fn no_bounds_selects_non_negative() {
        assert_eq!(
            json("", "", None),
            serde_json::json!({"selector": {"timestamp": {"$gte": 0}}})
        );
    }

    #[test]
    fn upper_bound_only() {
        assert_eq!(
            json("", "2000", None),
            serde_json::json!({"selector": {"timestamp": {"$lte": 2000}}})
        );
    }

    #[test]
    fn lower_bound_only() {
        assert_eq!(
            json("41", "", None),
            serde_json::json!({"selector": {"timestamp": {"$gte": 41}}})
        );
    }

    #[test]
    fn closed_range_with_device() {
        assert_eq!(
            json("41", "2000", Some("fauci")),
            serde_json::json!({"selector": {"timestamp": {"$gte": 41, "$lte": 2000}, "id": "fauci"}})
        );
    }

    #[test]
    fn field_names_follow_record() {
        let value = json("1", "2", Some("d"));
        assert!(value["selector"].get(FIELD_TIMESTAMP).is_some());
        assert!(value["selector"].get(FIELD_DEVICE_ID).is_some());
    }

    #[test]
    fn device_id_is_escaped() {
        let value = json("", "", Some(r#"x", "timestamp": {"$gte": -1}"#));
        assert_eq!(value["selector"]["id"], r#"x", "timestamp": {"$gte": -1}"#);
        assert_eq!(value["selector"]["timestamp"]["$gte"], 0);
    }

    #[test]
    fn malformed_bounds_are_rejected() {
        for (start, end) in [("abc", ""), ("", "12x"), (" 5", ""), ("1.5", "2")] {
            let err = build_range_selector(start, end, None).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::QuerySyntax, "{start:?}..{end:?}");
        }
    }

    #[test]
    fn inverted_range_is_accepted() {
        let doc = build_range_selector("10", "5", None).unwrap();
        assert_eq!(doc.selector.timestamp, TimestampPredicate { gte: Some(10), lte: Some(5) });
    }
}
