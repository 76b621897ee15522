//! Query execution over JSON documents: filter matching, sorting,
//! and pagination for the in-memory backend.

use reelhub_storage::{Filter, Query, QueryResult, Sort, SortOrder, StoredDocument};
use serde_json::Value;
use std::cmp::Ordering;

/// Resolve a possibly dotted field path (`"meta.source"`) in a document.
pub(crate) fn value_at_path<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = document;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Whether a document satisfies a single filter condition.
pub(crate) fn matches_filter(document: &Value, filter: &Filter) -> bool {
    match filter {
        Filter::Eq { field, value } => value_at_path(document, field) == Some(value),
        Filter::Contains { field, value } => value_at_path(document, field)
            .and_then(Value::as_str)
            .is_some_and(|s| s.to_lowercase().contains(&value.to_lowercase())),
        Filter::Range { field, min, max } => {
            let Some(n) = value_at_path(document, field).and_then(Value::as_f64) else {
                return false;
            };
            min.is_none_or(|lo| n >= lo) && max.is_none_or(|hi| n <= hi)
        }
        Filter::In { field, values } => value_at_path(document, field)
            .is_some_and(|v| values.iter().any(|candidate| candidate == v)),
        Filter::Bool { field, value } => {
            value_at_path(document, field).and_then(Value::as_bool) == Some(*value)
        }
    }
}

/// Whether a document satisfies every filter (AND semantics).
pub(crate) fn matches_all(document: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|f| matches_filter(document, f))
}

/// Total order over JSON values for sorting: numbers first, then strings,
/// then booleans; documents missing the field sort last.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Number(x), Value::Number(y)) => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            (Value::Number(_), _) => Ordering::Less,
            (_, Value::Number(_)) => Ordering::Greater,
            (Value::String(_), _) => Ordering::Less,
            (_, Value::String(_)) => Ordering::Greater,
            _ => Ordering::Equal,
        },
    }
}

fn apply_sort(entries: &mut [StoredDocument], sort: &Sort) {
    entries.sort_by(|a, b| {
        let ord = compare_values(
            value_at_path(&a.document, &sort.field),
            value_at_path(&b.document, &sort.field),
        );
        match sort.order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    });
}

/// Run a full query over the candidate documents of one collection.
pub(crate) fn execute(mut candidates: Vec<StoredDocument>, query: &Query) -> QueryResult {
    candidates.retain(|doc| matches_all(&doc.document, &query.filters));

    if let Some(sort) = &query.sort {
        apply_sort(&mut candidates, sort);
    }

    let total = candidates.len();
    let offset = query.offset.min(total);
    let end = match query.limit {
        Some(limit) => (offset + limit).min(total),
        None => total,
    };
    let entries: Vec<StoredDocument> = candidates
        .into_iter()
        .skip(offset)
        .take(end - offset)
        .collect();
    let has_more = end < total;

    QueryResult {
        entries,
        total,
        has_more,
    }
}
