//! Columnar in-memory table the pipeline stages transform.
//!
//! Cells are `Option`s until the sanitizer runs; after that every cell of
//! every column is `Some`. Column kinds are fixed at construction.

use crate::{
    error::{ServiceError, ServiceResult},
    schema::{ColumnKind, FieldValue, StorageWidth},
};
use rusqlite::types::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Text(Vec<Option<String>>),
    Integer(Vec<Option<i64>>),
    Real(Vec<Option<f64>>),
}

impl ColumnData {
    fn empty(kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::Text => Self::Text(Vec::new()),
            ColumnKind::Integer => Self::Integer(Vec::new()),
            ColumnKind::Real => Self::Real(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Text(v) => v.len(),
            Self::Integer(v) => v.len(),
            Self::Real(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
    width: Option<StorageWidth>,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        let width = match &data {
            ColumnData::Text(_) => None,
            ColumnData::Integer(_) => StorageWidth::declared(ColumnKind::Integer),
            ColumnData::Real(_) => StorageWidth::declared(ColumnKind::Real),
        };
        Self {
            name: name.into(),
            data,
            width,
        }
    }

    pub fn text(name: impl Into<String>, cells: Vec<Option<&str>>) -> Self {
        let cells = cells.into_iter().map(|c| c.map(str::to_string)).collect();
        Self::new(name, ColumnData::Text(cells))
    }

    pub fn integer(name: impl Into<String>, cells: Vec<Option<i64>>) -> Self {
        Self::new(name, ColumnData::Integer(cells))
    }

    pub fn real(name: impl Into<String>, cells: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnData::Real(cells))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        match self.data {
            ColumnData::Text(_) => ColumnKind::Text,
            ColumnData::Integer(_) => ColumnKind::Integer,
            ColumnData::Real(_) => ColumnKind::Real,
        }
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut ColumnData {
        &mut self.data
    }

    /// Replace the cells, keeping the recorded width. Used by the formatter,
    /// whose output is presentation-only.
    pub(crate) fn replace_data(&mut self, data: ColumnData) {
        self.data = data;
    }

    /// Width the column is recorded at; `None` for text.
    pub fn width(&self) -> Option<StorageWidth> {
        self.width
    }

    pub(crate) fn set_width(&mut self, width: StorageWidth) {
        self.width = Some(width);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        match &self.data {
            ColumnData::Text(v) => v.iter().filter(|c| c.is_none()).count(),
            ColumnData::Integer(v) => v.iter().filter(|c| c.is_none()).count(),
            ColumnData::Real(v) => v
                .iter()
                .filter(|c| c.map_or(true, |v| !v.is_finite()))
                .count(),
        }
    }

    pub fn value(&self, row: usize) -> Option<FieldValue> {
        match &self.data {
            ColumnData::Text(v) => v.get(row)?.clone().map(FieldValue::Text),
            ColumnData::Integer(v) => v.get(row)?.map(FieldValue::Integer),
            ColumnData::Real(v) => v.get(row)?.map(FieldValue::Real),
        }
    }

    /// Append one raw store value, checking it against the column's kind.
    pub fn push(&mut self, value: Value) -> ServiceResult<()> {
        let name = &self.name;
        match (&mut self.data, value) {
            (ColumnData::Text(v), Value::Null) => v.push(None),
            (ColumnData::Integer(v), Value::Null) => v.push(None),
            (ColumnData::Real(v), Value::Null) => v.push(None),
            (ColumnData::Text(v), Value::Text(s)) => v.push(Some(s)),
            (ColumnData::Integer(v), Value::Integer(n)) => v.push(Some(n)),
            (ColumnData::Real(v), Value::Integer(n)) => v.push(Some(n as f64)),
            (ColumnData::Real(v), Value::Real(x)) => v.push(Some(x)),
            (data, other) => {
                let kind = match data {
                    ColumnData::Text(_) => ColumnKind::Text,
                    ColumnData::Integer(_) => ColumnKind::Integer,
                    ColumnData::Real(_) => ColumnKind::Real,
                };
                return Err(ServiceError::transform(
                    name,
                    format!("{kind} column holds a {} value", value_type_name(&other)),
                ));
            }
        }
        Ok(())
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Integer(_) => "integer",
        Value::Real(_) => "real",
        Value::Text(_) => "text",
        Value::Blob(_) => "blob",
    }
}

/// Kind for a column whose declaration did not decide it.
fn infer_kind<'a>(values: impl Iterator<Item = &'a Value>) -> ColumnKind {
    let mut seen_integer = false;
    let mut seen_real = false;
    for value in values {
        match value {
            Value::Text(_) => return ColumnKind::Text,
            Value::Real(_) => seen_real = true,
            Value::Integer(_) => seen_integer = true,
            Value::Null | Value::Blob(_) => {}
        }
    }
    if seen_real {
        ColumnKind::Real
    } else if seen_integer {
        ColumnKind::Integer
    } else {
        ColumnKind::Text
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> ServiceResult<Self> {
        let mut table = Self::default();
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// Build a table from row-major store output. `headers` pairs each
    /// column name with its declared kind, if the declaration settled it.
    pub fn from_rows(
        headers: Vec<(String, Option<ColumnKind>)>,
        rows: Vec<Vec<Value>>,
    ) -> ServiceResult<Self> {
        let mut columns = Vec::with_capacity(headers.len());
        for (idx, (name, declared)) in headers.into_iter().enumerate() {
            let kind = declared
                .unwrap_or_else(|| infer_kind(rows.iter().filter_map(|r| r.get(idx))));
            columns.push(Column::new(name, ColumnData::empty(kind)));
        }
        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(ServiceError::Other(anyhow::anyhow!(
                    "row {row_idx} has {} values, expected {}",
                    row.len(),
                    columns.len()
                )));
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value)?;
            }
        }
        Self::new(columns)
    }

    pub fn push_column(&mut self, column: Column) -> ServiceResult<()> {
        if self.has_column(column.name()) {
            return Err(ServiceError::transform(column.name(), "duplicate column name"));
        }
        if let Some(first) = self.columns.first() {
            if first.len() != column.len() {
                return Err(ServiceError::transform(
                    column.name(),
                    format!("has {} rows, table has {}", column.len(), first.len()),
                ));
            }
        }
        self.columns.push(column);
        Ok(())
    }

    /// Remove a column by name; returns whether it was present.
    pub fn drop_column(&mut self, name: &str) -> bool {
        let before = self.columns.len();
        self.columns.retain(|c| c.name() != name);
        before != self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub(crate) fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name() == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn missing_count(&self) -> usize {
        self.columns.iter().map(Column::missing_count).sum()
    }
}
