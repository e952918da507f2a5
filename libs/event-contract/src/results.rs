use ledger_api::{LedgerError, QueryResults};

/// Drain a predicate query cursor into a JSON array of
/// `{"Key": <key>, "Record": <stored value>}`.
///
/// Stored values are spliced in verbatim; they are valid JSON because the
/// writer serialized them. Keys are escaped since composite keys contain
/// `U+0000`. The cursor is consumed, so it is closed on every return path.
pub fn build_result_set(results: QueryResults<'_>) -> Result<String, LedgerError> {
    let mut buffer = String::from("[");
    let mut written = false;

    for item in results {
        let kv = item?;
        let record = std::str::from_utf8(&kv.value).map_err(|e| {
            LedgerError::serialization(format!("stored value under {:?} is not UTF-8: {e}", kv.key))
        })?;

        if written {
            buffer.push(',');
        }
        buffer.push_str("{\"Key\":");
        buffer.push_str(&serde_json::to_string(&kv.key)?);
        buffer.push_str(",\"Record\":");
        buffer.push_str(record);
        buffer.push('}');
        written = true;
    }

    buffer.push(']');
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use ledger_api::{ErrorKind, KeyValue, StateQueryIterator};

    use super::*;

    struct Scripted {
        items: std::vec::IntoIter<Result<KeyValue, LedgerError>>,
        closed: Arc<AtomicBool>,
    }

    impl StateQueryIterator for Scripted {
        fn next_result(&mut self) -> Option<Result<KeyValue, LedgerError>> {
            self.items.next()
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    fn cursor(
        items: Vec<Result<KeyValue, LedgerError>>,
    ) -> (QueryResults<'static>, Arc<AtomicBool>) {
        let closed = Arc::new(AtomicBool::new(false));
        let it = Scripted { items: items.into_iter(), closed: closed.clone() };
        (QueryResults::new(Box::new(it)), closed)
    }

    fn kv(key: &str, value: &str) -> Result<KeyValue, LedgerError> {
        Ok(KeyValue { key: key.into(), value: value.as_bytes().to_vec() })
    }

    #[test]
    fn empty_cursor_is_empty_array() {
        let (results, closed) = cursor(vec![]);
        assert_eq!(build_result_set(results).unwrap(), "[]");
        assert!(closed.load(Ordering::SeqCst));
    }

    #[test]
    fn records_are_spliced_verbatim() {
        let (results, _) = cursor(vec![
            kv("a", r#"{"timestamp":1,"id":"a","message":"00"}"#),
            kv("b", r#"{"timestamp":2,"id":"b","message":"ff"}"#),
        ]);
        let text = build_result_set(results).unwrap();
        assert_eq!(
            text,
            r#"[{"Key":"a","Record":{"timestamp":1,"id":"a","message":"00"}},{"Key":"b","Record":{"timestamp":2,"id":"b","message":"ff"}}]"#
        );
    }

    #[test]
    fn composite_keys_are_escaped() {
        let (results, _) = cursor(vec![kv("\u{0}id~timestamp\u{0}a\u{0}1\u{0}", "{}")]);
        let text = build_result_set(results).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["Key"], "\u{0}id~timestamp\u{0}a\u{0}1\u{0}");
    }

    #[test]
    fn cursor_error_propagates_and_closes() {
        let (results, closed) = cursor(vec![
            kv("a", "{}"),
            Err(LedgerError::communication("cursor expired")),
            kv("b", "{}"),
        ]);
        let err = build_result_set(results).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LedgerCommunication);
        assert!(closed.load(Ordering::SeqCst));
    }
}
