//! Snapshot materialization — the frozen, queryable result set.
//!
//! A snapshot is built once, after every pipeline stage has run, and is
//! never mutated afterwards. Records keep the source row order. A `user_id`
//! index maps each identifier to its row positions in ascending order, so
//! lookups through it return the same records, in the same order, as a
//! full scan would.

use crate::{
    error::{ServiceError, ServiceResult},
    schema::FieldValue,
    table::Table,
    types::USER_ID_COLUMN,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// One materialized result row: field name → value.
///
/// Serializes as a JSON object with keys in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn user_id(&self) -> Option<&FieldValue> {
        self.get(USER_ID_COLUMN)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, FieldValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    records: Vec<Record>,
    by_user: HashMap<String, Vec<usize>>,
}

impl Snapshot {
    /// Freeze a fully transformed table. Every cell must be present; a
    /// missing one means a stage was skipped.
    pub fn materialize(table: &Table) -> ServiceResult<Self> {
        let rows = table.row_count();
        let mut records = Vec::with_capacity(rows);
        for row in 0..rows {
            let record = table
                .columns()
                .iter()
                .map(|column| {
                    column
                        .value(row)
                        .map(|value| (column.name().to_string(), value))
                        .ok_or_else(|| {
                            ServiceError::transform(
                                column.name(),
                                format!("row {row} is missing a value at materialization"),
                            )
                        })
                })
                .collect::<ServiceResult<Record>>()?;
            records.push(record);
        }
        Ok(Self::from_records(records))
    }

    pub fn from_records(records: Vec<Record>) -> Self {
        let mut by_user: HashMap<String, Vec<usize>> = HashMap::new();
        for (pos, record) in records.iter().enumerate() {
            if let Some(id) = record.user_id() {
                by_user.entry(id.identifier().into_owned()).or_default().push(pos);
            }
        }
        Self { records, by_user }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Row positions holding `user_id`, ascending.
    pub(crate) fn positions_of(&self, user_id: &str) -> &[usize] {
        self.by_user.get(user_id).map(Vec::as_slice).unwrap_or(&[])
    }
}
