//! Retrieval options for list queries.
//!
//! Sorting and paging run in memory after the bucket scan; storage order is
//! always primary-key order.

use crate::error::CoreResult;
use confdb_codec::{map_field, to_value, Value};
use serde::Serialize;
use std::cmp::Ordering;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

/// Options recognized by `get_all`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrieveQueryParams {
    /// Serialized field name to sort by. Primary-key order when `None`.
    pub sort_by: Option<String>,
    /// Sort direction.
    pub sort_direction: SortDirection,
    /// Number of leading results to skip.
    pub offset: usize,
    /// Maximum number of results; `0` means no limit.
    pub limit: usize,
}

impl RetrieveQueryParams {
    /// Creates default parameters: key order, everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorts by the named field.
    #[must_use]
    pub fn sort_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_by = Some(field.into());
        self.sort_direction = direction;
        self
    }

    /// Skips the first `offset` results.
    #[must_use]
    pub const fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Returns at most `limit` results.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Applies sorting and paging to records already in key order.
    pub fn apply<R: Serialize>(&self, mut records: Vec<R>) -> CoreResult<Vec<R>> {
        match &self.sort_by {
            Some(field) => {
                let mut keyed = records
                    .into_iter()
                    .map(|record| {
                        let value = to_value(&record)?;
                        let sort_key = map_field(&value, field).cloned();
                        Ok((sort_key, record))
                    })
                    .collect::<CoreResult<Vec<_>>>()?;

                keyed.sort_by(|(a, _), (b, _)| {
                    let ord = compare_values(a.as_ref(), b.as_ref());
                    match self.sort_direction {
                        SortDirection::Ascending => ord,
                        SortDirection::Descending => ord.reverse(),
                    }
                });
                records = keyed.into_iter().map(|(_, record)| record).collect();
            }
            None => {
                if self.sort_direction == SortDirection::Descending {
                    records.reverse();
                }
            }
        }

        let limit = if self.limit == 0 { usize::MAX } else { self.limit };
        Ok(records.into_iter().skip(self.offset).take(limit).collect())
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Integer(_) | Value::Float(_)) => 2,
        Some(Value::Text(_)) => 3,
        Some(Value::Bytes(_)) => 4,
        Some(_) => 5,
    }
}

/// Orders two field values. Missing and null sort first; values of
/// different kinds order by kind.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Integer(x)), Some(Value::Integer(y))) => i128::from(*x).cmp(&i128::from(*y)),
        (Some(Value::Float(x)), Some(Value::Float(y))) => x.total_cmp(y),
        (Some(Value::Integer(x)), Some(Value::Float(y))) => {
            (i128::from(*x) as f64).total_cmp(y)
        }
        (Some(Value::Float(x)), Some(Value::Integer(y))) => {
            x.total_cmp(&(i128::from(*y) as f64))
        }
        (Some(Value::Text(x)), Some(Value::Text(y))) => x.cmp(y),
        (Some(Value::Bytes(x)), Some(Value::Bytes(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Row {
        id: u64,
        name: String,
        priority: Option<i64>,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { id: 1, name: "gamma".into(), priority: Some(2) },
            Row { id: 2, name: "alpha".into(), priority: None },
            Row { id: 3, name: "beta".into(), priority: Some(-1) },
        ]
    }

    fn ids(rows: &[Row]) -> Vec<u64> {
        rows.iter().map(|r| r.id).collect()
    }

    #[test]
    fn defaults_keep_key_order() {
        let out = RetrieveQueryParams::new().apply(rows()).unwrap();
        assert_eq!(ids(&out), vec![1, 2, 3]);
    }

    #[test]
    fn sorts_by_text_field() {
        let params = RetrieveQueryParams::new().sort_by("name", SortDirection::Ascending);
        assert_eq!(ids(&params.apply(rows()).unwrap()), vec![2, 3, 1]);

        let params = RetrieveQueryParams::new().sort_by("name", SortDirection::Descending);
        assert_eq!(ids(&params.apply(rows()).unwrap()), vec![1, 3, 2]);
    }

    #[test]
    fn nulls_sort_first() {
        let params = RetrieveQueryParams::new().sort_by("priority", SortDirection::Ascending);
        assert_eq!(ids(&params.apply(rows()).unwrap()), vec![2, 3, 1]);
    }

    #[test]
    fn descending_without_field_reverses_key_order() {
        let params = RetrieveQueryParams {
            sort_direction: SortDirection::Descending,
            ..RetrieveQueryParams::default()
        };
        assert_eq!(ids(&params.apply(rows()).unwrap()), vec![3, 2, 1]);
    }

    #[test]
    fn paging_after_sorting() {
        let params = RetrieveQueryParams::new()
            .sort_by("name", SortDirection::Ascending)
            .offset(1)
            .limit(1);
        assert_eq!(ids(&params.apply(rows()).unwrap()), vec![3]);
    }

    #[test]
    fn zero_limit_means_everything() {
        let params = RetrieveQueryParams::new().offset(1).limit(0);
        assert_eq!(ids(&params.apply(rows()).unwrap()), vec![2, 3]);
    }

    #[test]
    fn offset_past_end_is_empty() {
        let params = RetrieveQueryParams::new().offset(10);
        assert!(params.apply(rows()).unwrap().is_empty());
    }

    #[test]
    fn unknown_field_keeps_key_order() {
        let params = RetrieveQueryParams::new().sort_by("nope", SortDirection::Ascending);
        assert_eq!(ids(&params.apply(rows()).unwrap()), vec![1, 2, 3]);
    }
}
