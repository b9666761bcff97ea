//! Evaluation of filter documents against stored documents.
//!
//! Top-level filter keys are field paths. A clause value whose keys are all
//! operators (`$`-prefixed) is an operator set; any other value is matched
//! by equality. When the field holds an array, equality and comparisons also
//! match if any single element does.

use std::cmp::Ordering;

use log::warn;

use crate::condition::Operator;
use crate::value::{Document, Value};

/// Whether `document` satisfies every clause of `filter`.
pub fn matches(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(path, condition)| {
        let actual = document.get_path(path);
        match operator_set(condition) {
            Some(ops) => matches_operators(actual, ops),
            None => matches_eq(actual, condition),
        }
    })
}

/// Total order over values, used for sorting.
///
/// Types order as null < numbers < strings < documents < arrays < booleans.
/// Ints and floats compare numerically.
pub fn canonical_cmp(a: &Value, b: &Value) -> Ordering {
    let by_type = type_rank(a).cmp(&type_rank(b));
    if by_type != Ordering::Equal {
        return by_type;
    }

    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let x = a.as_f64().unwrap_or_default();
            let y = b.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or_else(|| x.total_cmp(&y))
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y)
            .map(|(l, r)| canonical_cmp(l, r))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (Value::Document(x), Value::Document(y)) => x
            .iter()
            .zip(y.iter())
            .map(|((lk, lv), (rk, rv))| lk.cmp(rk).then_with(|| canonical_cmp(lv, rv)))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => Ordering::Equal,
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Int(_) | Value::Float(_) => 1,
        Value::String(_) => 2,
        Value::Document(_) => 3,
        Value::Array(_) => 4,
        Value::Bool(_) => 5,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    canonical_cmp(a, b) == Ordering::Equal
}

/// The clause value as an operator set, if every key is an operator.
fn operator_set(value: &Value) -> Option<&Document> {
    match value {
        Value::Document(doc) if !doc.is_empty() && doc.keys().all(|k| k.starts_with('$')) => {
            Some(doc)
        }
        _ => None,
    }
}

fn matches_operators(actual: Option<&Value>, ops: &Document) -> bool {
    ops.iter()
        .all(|(symbol, operand)| match Operator::from_symbol(symbol) {
            Some(op) => apply(op, actual, operand),
            None => {
                warn!("unsupported operator {} never matches", symbol);
                false
            }
        })
}

fn apply(op: Operator, actual: Option<&Value>, operand: &Value) -> bool {
    match op {
        Operator::Eq => matches_eq(actual, operand),
        Operator::Ne => !matches_eq(actual, operand),
        Operator::Gt => matches_cmp(actual, operand, |o| o == Ordering::Greater),
        Operator::Gte => matches_cmp(actual, operand, |o| o != Ordering::Less),
        Operator::Lt => matches_cmp(actual, operand, |o| o == Ordering::Less),
        Operator::Lte => matches_cmp(actual, operand, |o| o != Ordering::Greater),
        Operator::In => candidates(operand).iter().any(|c| matches_eq(actual, c)),
        Operator::Nin => !candidates(operand).iter().any(|c| matches_eq(actual, c)),
        Operator::Exists => actual.is_some() == operand.as_bool().unwrap_or(true),
        Operator::All => {
            let wanted = candidates(operand);
            let Some(value) = actual else {
                return false;
            };
            !wanted.is_empty() && wanted.iter().all(|w| matches_eq(Some(value), w))
        }
        Operator::Size => match (actual, operand.as_i64()) {
            (Some(Value::Array(items)), Some(n)) => i64::try_from(items.len()) == Ok(n),
            _ => false,
        },
        Operator::ElemMatch => match actual {
            Some(Value::Array(items)) => items.iter().any(|item| element_matches(item, operand)),
            _ => false,
        },
    }
}

/// Equality, with array fields matching when any element is equal.
fn matches_eq(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        // A missing field equals null.
        None => expected.is_null(),
        Some(value) => {
            values_equal(value, expected)
                || matches!(value, Value::Array(items) if items.iter().any(|i| values_equal(i, expected)))
        }
    }
}

/// Comparison within one type class, with array fields matching when any
/// element satisfies it.
fn matches_cmp(actual: Option<&Value>, operand: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    let check = |v: &Value| type_rank(v) == type_rank(operand) && accept(canonical_cmp(v, operand));
    match actual {
        None => false,
        Some(Value::Array(items)) if !matches!(operand, Value::Array(_)) => {
            items.iter().any(|item| check(item))
        }
        Some(value) => check(value),
    }
}

fn candidates(operand: &Value) -> &[Value] {
    match operand {
        Value::Array(items) => items,
        other => std::slice::from_ref(other),
    }
}

fn element_matches(element: &Value, condition: &Value) -> bool {
    match (operator_set(condition), element, condition) {
        (Some(ops), _, _) => matches_operators(Some(element), ops),
        (None, Value::Document(doc), Value::Document(filter)) => matches(doc, filter),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{field, Condition, Filter};

    fn doc(json: &str) -> Document {
        serde_json::from_str(json).unwrap()
    }

    fn person() -> Document {
        doc(r#"{
            "name": "ada",
            "age": 36,
            "tags": ["math", "code"],
            "scores": [72, 88, 95],
            "address": {"city": "london"},
            "results": [{"product": "x", "score": 8}, {"product": "y", "score": 3}]
        }"#)
    }

    #[test]
    fn test_empty_filter_matches() {
        assert!(matches(&person(), &Document::new()));
    }

    #[test]
    fn test_comparisons() {
        let p = person();
        assert!(matches(&p, &field("age").gte(36).lt(40).to_document()));
        assert!(!matches(&p, &field("age").gt(36).to_document()));
        assert!(matches(&p, &field("age").lte(36.5).to_document()));
        // No cross-type comparison.
        assert!(!matches(&p, &field("age").gt("a").to_document()));
    }

    #[test]
    fn test_equality_and_not_equal() {
        let p = person();
        assert!(matches(&p, &field("name").eq("ada").to_document()));
        assert!(matches(&p, &field("name").neq("bob").to_document()));
        assert!(matches(&p, &field("tags").eq("code").to_document()));
        assert!(matches(&p, &field("address.city").eq("london").to_document()));
        assert!(matches(&p, &field("missing").eq(Value::Null).to_document()));
    }

    #[test]
    fn test_in_and_nin() {
        let p = person();
        assert!(matches(&p, &field("name").is_in(["bob", "ada"]).to_document()));
        assert!(!matches(&p, &field("name").not_in(["ada"]).to_document()));
        assert!(matches(&p, &field("tags").is_in(["art", "math"]).to_document()));
    }

    #[test]
    fn test_exists() {
        let p = person();
        assert!(matches(&p, &field("name").exists(true).to_document()));
        assert!(matches(&p, &field("email").exists(false).to_document()));
        assert!(!matches(&p, &field("email").exists(true).to_document()));
    }

    #[test]
    fn test_all_is_order_independent() {
        let p = person();
        assert!(matches(&p, &field("tags").all(["code", "math"]).to_document()));
        assert!(!matches(&p, &field("tags").all(["code", "art"]).to_document()));
        assert!(!matches(&p, &field("tags").all(Vec::<Value>::new()).to_document()));
    }

    #[test]
    fn test_size() {
        let p = person();
        assert!(matches(&p, &field("tags").size(2).to_document()));
        assert!(!matches(&p, &field("tags").size(-2).to_document()));
        assert!(!matches(&p, &field("name").size(3).to_document()));
    }

    #[test]
    fn test_exact_array_match_is_order_sensitive() {
        let p = person();
        assert!(matches(&p, &field("tags").array_match(vec!["math", "code"]).to_document()));
        assert!(!matches(&p, &field("tags").array_match(vec!["code", "math"]).to_document()));
    }

    #[test]
    fn test_elem_match_on_scalars() {
        let p = person();
        let hit = field("scores").elem_match().gte(80).lt(90).end_elem_match();
        assert!(matches(&p, &hit.to_document()));

        let miss = field("scores").elem_match().gte(90).lt(95).end_elem_match();
        assert!(!matches(&p, &miss.to_document()));
    }

    #[test]
    fn test_elem_match_on_subdocuments() {
        let p = person();
        let filter = doc(r#"{"results": {"$elemMatch": {"product": "x", "score": {"$gte": 8}}}}"#);
        assert!(matches(&p, &filter));

        let filter = doc(r#"{"results": {"$elemMatch": {"product": "y", "score": {"$gte": 8}}}}"#);
        assert!(!matches(&p, &filter));
    }

    #[test]
    fn test_nested_elem_match() {
        let grid = doc(r#"{"grid": [[0, 0], [1, 2]]}"#);
        let hit = field("grid")
            .elem_match()
            .size(2)
            .elem_match()
            .gt(1)
            .end_elem_match();
        assert!(matches(&grid, &hit.to_document()));
    }

    #[test]
    fn test_unknown_operator_never_matches() {
        assert!(!matches(&person(), &doc(r#"{"name": {"$regex": "a"}}"#)));
    }

    #[test]
    fn test_filter_is_conjunction() {
        let p = person();
        let filter = Filter::new()
            .and(field("age").gt(30))
            .and(field("name").eq("bob"));
        assert!(!matches(&p, &filter.to_document()));
    }

    #[test]
    fn test_canonical_order() {
        let mut values = vec![
            Value::Bool(false),
            Value::from("b"),
            Value::Float(1.5),
            Value::Null,
            Value::Int(1),
            Value::from(vec![1]),
        ];
        values.sort_by(canonical_cmp);
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Int(1),
                Value::Float(1.5),
                Value::from("b"),
                Value::from(vec![1]),
                Value::Bool(false),
            ]
        );
        assert_eq!(canonical_cmp(&Value::Int(2), &Value::Float(2.0)), Ordering::Equal);
    }
}
