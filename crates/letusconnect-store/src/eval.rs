//! Filter matching and ordering over JSON documents.
//!
//! Values compare numerically when both are numbers, chronologically when
//! both parse as RFC 3339 timestamps, and lexically when both are strings.
//! Values of different kinds do not compare, so range filters over them
//! never match.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::Value;

use letusconnect_core::traits::store::StoredDocument;
use letusconnect_core::types::filter::{FilterField, FilterOp};
use letusconnect_core::types::sorting::{SortDirection, SortField};

/// Resolve a dotted path such as `readStatus.u1` inside `doc`.
pub fn resolve<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(doc, |current, segment| current.as_object()?.get(segment))
}

/// Compare two JSON scalars.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => match (parse_instant(x), parse_instant(y)) {
            (Some(tx), Some(ty)) => Some(tx.cmp(&ty)),
            _ => Some(x.cmp(y)),
        },
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn equals(a: &Value, b: &Value) -> bool {
    compare(a, b).map_or(a == b, Ordering::is_eq)
}

/// Whether `doc` satisfies `filter`.
pub fn matches(doc: &Value, filter: &FilterField) -> bool {
    let field = resolve(doc, &filter.field);
    match filter.op {
        FilterOp::Eq => field.is_some_and(|v| equals(v, &filter.value)),
        FilterOp::Ne => field.is_none_or(|v| !equals(v, &filter.value)),
        FilterOp::Gt => cmp_is(field, &filter.value, Ordering::is_gt),
        FilterOp::Gte => cmp_is(field, &filter.value, Ordering::is_ge),
        FilterOp::Lt => cmp_is(field, &filter.value, Ordering::is_lt),
        FilterOp::Lte => cmp_is(field, &filter.value, Ordering::is_le),
        FilterOp::ArrayContains => field
            .and_then(Value::as_array)
            .is_some_and(|items| items.iter().any(|item| equals(item, &filter.value))),
        FilterOp::In => match (field, filter.value.as_array()) {
            (Some(v), Some(options)) => options.iter().any(|option| equals(v, option)),
            _ => false,
        },
    }
}

fn cmp_is(field: Option<&Value>, value: &Value, pred: fn(Ordering) -> bool) -> bool {
    field.and_then(|v| compare(v, value)).is_some_and(pred)
}

/// Whether `doc` satisfies every filter.
pub fn matches_all(doc: &Value, filters: &[FilterField]) -> bool {
    filters.iter().all(|f| matches(doc, f))
}

/// Total order over documents for the given sort fields.
///
/// Missing values sort before present ones. The document id breaks ties in
/// the direction of the last sort field.
pub fn order(a: &StoredDocument, b: &StoredDocument, sort: &[SortField]) -> Ordering {
    for field in sort {
        let ordering = match (resolve(&a.data, &field.field), resolve(&b.data, &field.field)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
        };
        let ordering = directed(ordering, field.direction);
        if ordering.is_ne() {
            return ordering;
        }
    }
    let tie_direction = sort.last().map(|f| f.direction).unwrap_or_default();
    directed(a.id.cmp(&b.id), tie_direction)
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}
