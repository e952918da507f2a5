//! Composite keys for exact-match point access.
//!
//! A key is `U+0000 objectType U+0000 attr1 U+0000 attr2 ... U+0000`.
//! Attributes may not contain `U+0000` (the separator) or `U+10FFFF`, so
//! distinct attribute tuples always encode to distinct keys.
//!
//! These keys address single records only. Nothing here supports ordered
//! range iteration over timestamps: the timestamp segment is decimal text,
//! which does not sort numerically. Range lookups go through
//! [`crate::selector`] instead.

use ledger_api::LedgerError;

/// Object type of event keys: attributes are (device id, timestamp).
pub const INDEX_NAME: &str = "id~timestamp";

const SEPARATOR: char = '\u{0}';
const MAX_UNICODE_RUNE: char = '\u{10FFFF}';

fn validate_segment(segment: &str) -> Result<(), LedgerError> {
    if segment.contains(SEPARATOR) || segment.contains(MAX_UNICODE_RUNE) {
        return Err(LedgerError::key_construction(format!(
            "composite key segment {segment:?} contains U+0000 or U+10FFFF"
        )));
    }
    Ok(())
}

/// Build a composite key from an object type and ordered attributes.
pub fn create_composite_key(object_type: &str, attributes: &[&str]) -> Result<String, LedgerError> {
    validate_segment(object_type)?;
    let mut key = String::with_capacity(
        2 + object_type.len() + attributes.iter().map(|a| a.len() + 1).sum::<usize>(),
    );
    key.push(SEPARATOR);
    key.push_str(object_type);
    key.push(SEPARATOR);
    for attr in attributes {
        validate_segment(attr)?;
        key.push_str(attr);
        key.push(SEPARATOR);
    }
    Ok(key)
}

/// Inverse of [`create_composite_key`].
pub fn split_composite_key(key: &str) -> Result<(String, Vec<String>), LedgerError> {
    let body = key
        .strip_prefix(SEPARATOR)
        .and_then(|k| k.strip_suffix(SEPARATOR))
        .ok_or_else(|| LedgerError::key_construction(format!("{key:?} is not a composite key")))?;
    let mut parts = body.split(SEPARATOR).map(str::to_string);
    let object_type = parts.next().unwrap_or_default();
    Ok((object_type, parts.collect()))
}

/// Key of the event logged by `device_id` at `timestamp`.
///
/// The timestamp is written in canonical decimal form, so `"0012"` and
/// `"12"` address the same record.
pub fn event_key(device_id: &str, timestamp: i64) -> Result<String, LedgerError> {
    create_composite_key(INDEX_NAME, &[device_id, &timestamp.to_string()])
}
