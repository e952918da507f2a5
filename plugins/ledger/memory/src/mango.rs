//! Evaluation of `{"selector": {...}}` predicate documents over JSON values.
//!
//! Supported: implicit equality (`"field": literal`), the comparison
//! operators `$eq $ne $gt $gte $lt $lte`, dot-separated field paths and
//! `$and` over nested selectors. All clauses of a selector are ANDed.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use ledger_api::LedgerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Op {
    fn parse(name: &str) -> Option<Op> {
        match name {
            "$eq" => Some(Op::Eq),
            "$ne" => Some(Op::Ne),
            "$gt" => Some(Op::Gt),
            "$gte" => Some(Op::Gte),
            "$lt" => Some(Op::Lt),
            "$lte" => Some(Op::Lte),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
enum Clause {
    Field { path: String, op: Op, operand: Value },
    And(Vec<Selector>),
}

/// A parsed selector.
#[derive(Debug, Clone, Default)]
pub struct Selector {
    clauses: Vec<Clause>,
}

impl Selector {
    /// Parse a full query document.
    pub fn parse(query: &str) -> Result<Selector, LedgerError> {
        let doc: Value = serde_json::from_str(query)
            .map_err(|e| LedgerError::query_syntax(format!("query is not JSON: {e}")))?;
        let Value::Object(root) = doc else {
            return Err(LedgerError::query_syntax("query must be a JSON object"));
        };
        if let Some(other) = root.keys().find(|k| k.as_str() != "selector") {
            return Err(LedgerError::query_syntax(format!("unsupported query field '{other}'")));
        }
        match root.get("selector") {
            Some(Value::Object(selector)) => Self::from_map(selector),
            Some(_) => Err(LedgerError::query_syntax("selector must be an object")),
            None => Err(LedgerError::query_syntax("query has no selector")),
        }
    }

    fn from_map(map: &Map<String, Value>) -> Result<Selector, LedgerError> {
        let mut clauses = Vec::new();
        for (field, condition) in map {
            if field == "$and" {
                let Value::Array(items) = condition else {
                    return Err(LedgerError::query_syntax("$and expects an array"));
                };
                let nested = items
                    .iter()
                    .map(|item| match item {
                        Value::Object(m) => Self::from_map(m),
                        _ => Err(LedgerError::query_syntax("$and items must be objects")),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                clauses.push(Clause::And(nested));
                continue;
            }
            if field.starts_with('$') {
                return Err(LedgerError::query_syntax(format!("unsupported combinator '{field}'")));
            }

            match condition {
                Value::Object(ops) if !ops.is_empty() && ops.keys().all(|k| k.starts_with('$')) => {
                    for (name, operand) in ops {
                        let op = Op::parse(name).ok_or_else(|| {
                            LedgerError::query_syntax(format!("unsupported operator '{name}'"))
                        })?;
                        clauses.push(Clause::Field { path: field.clone(), op, operand: operand.clone() });
                    }
                }
                literal => clauses.push(Clause::Field {
                    path: field.clone(),
                    op: Op::Eq,
                    operand: literal.clone(),
                }),
            }
        }
        Ok(Selector { clauses })
    }

    pub fn matches(&self, doc: &Value) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::And(nested) => nested.iter().all(|s| s.matches(doc)),
            Clause::Field { path, op, operand } => match resolve_path(doc, path) {
                // A missing field satisfies nothing, not even $ne.
                None => false,
                Some(value) => compare(value, *op, operand),
            },
        })
    }
}

/// Resolve a dot-notation path in a `serde_json::Value`.
fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

fn compare(value: &Value, op: Op, operand: &Value) -> bool {
    match op {
        Op::Eq => equal(value, operand),
        Op::Ne => !equal(value, operand),
        Op::Gt => order(value, operand) == Some(Ordering::Greater),
        Op::Gte => matches!(order(value, operand), Some(Ordering::Greater | Ordering::Equal)),
        Op::Lt => order(value, operand) == Some(Ordering::Less),
        Op::Lte => matches!(order(value, operand), Some(Ordering::Less | Ordering::Equal)),
    }
}

fn equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => order(a, b) == Some(Ordering::Equal),
        _ => a == b,
    }
}

/// Ordering between two scalars of the same type; mixed types never match.
fn order(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?),
        },
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn matches(query: &str, doc: Value) -> bool {
        Selector::parse(query).unwrap().matches(&doc)
    }

    #[test]
    fn inclusive_range() {
        let q = r#"{"selector":{"timestamp":{"$gte":41,"$lte":2000}}}"#;
        assert!(matches(q, json!({"timestamp": 41})));
        assert!(matches(q, json!({"timestamp": 2000})));
        assert!(!matches(q, json!({"timestamp": 40})));
        assert!(!matches(q, json!({"timestamp": 2001})));
    }

    #[test]
    fn implicit_equality_is_anded() {
        let q = r#"{"selector":{"timestamp":{"$gte":0},"id":"fauci"}}"#;
        assert!(matches(q, json!({"timestamp": 1234, "id": "fauci"})));
        assert!(!matches(q, json!({"timestamp": 1234, "id": "faucet"})));
    }

    #[test]
    fn missing_field_never_matches() {
        assert!(!matches(r#"{"selector":{"timestamp":{"$ne":5}}}"#, json!({"id": "x"})));
    }

    #[test]
    fn mixed_types_do_not_compare() {
        assert!(!matches(r#"{"selector":{"timestamp":{"$gte":0}}}"#, json!({"timestamp": "10"})));
    }

    #[test]
    fn nested_paths_and_and() {
        let q = r#"{"selector":{"$and":[{"meta.site":"north"},{"meta.rack":{"$lt":3}}]}}"#;
        assert!(matches(q, json!({"meta": {"site": "north", "rack": 2}})));
        assert!(!matches(q, json!({"meta": {"site": "north", "rack": 3}})));
    }

    #[test]
    fn float_and_int_compare() {
        assert!(matches(r#"{"selector":{"v":{"$eq":2}}}"#, json!({"v": 2.0})));
    }

    #[test]
    fn unsupported_syntax_is_rejected() {
        for q in [
            "not json",
            "[]",
            r#"{"selector":{"a":{"$regex":"x"}}}"#,
            r#"{"selector":{"$or":[]}}"#,
            r#"{"selector":{},"sort":["a"]}"#,
            r#"{"fields":["a"]}"#,
        ] {
            let err = Selector::parse(q).unwrap_err();
            assert_eq!(err.kind(), ledger_api::ErrorKind::QuerySyntax, "{q}");
        }
    }
}
