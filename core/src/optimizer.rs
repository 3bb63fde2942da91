//! Memory optimizer.
//!
//! For every numeric column the optimizer finds the observed [min, max] and
//! records the first width on the ladder whose range strictly contains it:
//!
//!   integers: int8 → int16 → int32 → int64
//!   reals:    float16 → float32 → float64
//!
//! Selection is by range only, never by precision. Cell values are left
//! exactly as they are; the recorded width drives the footprint accounting
//! reported back to the pipeline.
//!
//! RULE: runs after the null sanitizer. A numeric column that still has a
//! missing cell is a transformation error.

use crate::{
    error::{ServiceError, ServiceResult},
    schema::StorageWidth,
    stage::{StageSummary, TableStage},
    table::{Column, ColumnData, Table},
};
use serde::Serialize;
use std::mem::size_of;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Estimated table footprint before and after width selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoryReport {
    pub before_bytes: usize,
    pub after_bytes:  usize,
}

impl MemoryReport {
    pub fn saved_bytes(&self) -> usize {
        self.before_bytes.saturating_sub(self.after_bytes)
    }

    /// Percentage reduction; zero for an empty table.
    pub fn reduction_pct(&self) -> f64 {
        if self.before_bytes == 0 {
            return 0.0;
        }
        100.0 * (self.before_bytes as f64 - self.after_bytes as f64) / self.before_bytes as f64
    }

    pub fn after_mb(&self) -> f64 {
        self.after_bytes as f64 / BYTES_PER_MB
    }
}

/// Narrowest integer width whose range strictly contains [min, max].
/// Columns touching the int64 limits stay int64.
pub fn integer_width(min: i64, max: i64) -> StorageWidth {
    StorageWidth::INTEGER_LADDER
        .into_iter()
        .find(|w| w.strictly_contains_integers(min, max))
        .unwrap_or(StorageWidth::Int64)
}

/// Narrowest float width whose range strictly contains [min, max].
pub fn real_width(min: f64, max: f64) -> StorageWidth {
    StorageWidth::REAL_LADDER
        .into_iter()
        .find(|w| w.strictly_contains_reals(min, max))
        .unwrap_or(StorageWidth::Float64)
}

fn integer_bounds(column: &str, cells: &[Option<i64>]) -> ServiceResult<Option<(i64, i64)>> {
    let mut bounds: Option<(i64, i64)> = None;
    for cell in cells {
        let v = cell.ok_or_else(|| unsanitized(column))?;
        bounds = Some(match bounds {
            None => (v, v),
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
        });
    }
    Ok(bounds)
}

fn real_bounds(column: &str, cells: &[Option<f64>]) -> ServiceResult<Option<(f64, f64)>> {
    let mut bounds: Option<(f64, f64)> = None;
    for cell in cells {
        let v = match cell {
            Some(v) if v.is_finite() => *v,
            _ => return Err(unsanitized(column)),
        };
        bounds = Some(match bounds {
            None => (v, v),
            Some((lo, hi)) => (lo.min(v), hi.max(v)),
        });
    }
    Ok(bounds)
}

fn unsanitized(column: &str) -> ServiceError {
    ServiceError::transform(column, "missing value found; sanitize before optimizing")
}

/// Estimated bytes held by one column at its currently recorded width.
fn column_bytes(column: &Column) -> usize {
    match (column.data(), column.width()) {
        (ColumnData::Text(cells), _) => cells
            .iter()
            .map(|c| size_of::<Option<String>>() + c.as_ref().map_or(0, String::len))
            .sum(),
        (data, Some(width)) => data.len() * width.bytes(),
        (data, None) => data.len() * size_of::<u64>(),
    }
}

pub fn table_bytes(table: &Table) -> usize {
    table.columns().iter().map(column_bytes).sum()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryOptimizer;

impl MemoryOptimizer {
    pub fn new() -> Self {
        Self
    }

    /// Select and record a width for every numeric column.
    pub fn optimize(&self, table: &mut Table) -> ServiceResult<MemoryReport> {
        if table.is_empty() {
            return Ok(MemoryReport::default());
        }
        let before_bytes = table_bytes(table);

        for column in table.columns_mut() {
            let width = match column.data() {
                ColumnData::Text(_) => continue,
                ColumnData::Integer(cells) => integer_bounds(column.name(), cells)?
                    .map(|(min, max)| integer_width(min, max)),
                ColumnData::Real(cells) => {
                    real_bounds(column.name(), cells)?.map(|(min, max)| real_width(min, max))
                }
            };
            if let Some(width) = width {
                log::debug!("optimizer: '{}' recorded as {width}", column.name());
                column.set_width(width);
            }
        }

        let report = MemoryReport {
            before_bytes,
            after_bytes: table_bytes(table),
        };
        log::info!(
            "Mem. usage decreased to {:5.2} Mb ({:.1}% reduction)",
            report.after_mb(),
            report.reduction_pct()
        );
        Ok(report)
    }
}

impl TableStage for MemoryOptimizer {
    fn name(&self) -> &'static str {
        "memory_optimizer"
    }

    fn apply(&self, table: &mut Table) -> ServiceResult<StageSummary> {
        let report = self.optimize(table)?;
        Ok(StageSummary::new(
            self.name(),
            format!(
                "{} -> {} bytes ({:.1}% reduction)",
                report.before_bytes,
                report.after_bytes,
                report.reduction_pct()
            ),
        )
        .with_memory(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::F16_MAX;

    fn width_of(table: &Table, name: &str) -> StorageWidth {
        table.column(name).unwrap().width().unwrap()
    }

    #[test]
    fn integer_ladder_picks_first_strictly_containing_width() {
        assert_eq!(integer_width(0, 99), StorageWidth::Int8);
        assert_eq!(integer_width(-127, 126), StorageWidth::Int8);
        assert_eq!(integer_width(0, 127), StorageWidth::Int16);
        assert_eq!(integer_width(-128, 0), StorageWidth::Int16);
        assert_eq!(integer_width(0, 999_999), StorageWidth::Int32);
        assert_eq!(integer_width(0, i32::MAX as i64), StorageWidth::Int64);
        assert_eq!(integer_width(i64::MIN, 0), StorageWidth::Int64);
    }

    #[test]
    fn real_ladder_selects_by_range_not_precision() {
        assert_eq!(real_width(0.0, 1.0), StorageWidth::Float16);
        assert_eq!(real_width(1e-9, 1e-5), StorageWidth::Float16);
        assert_eq!(real_width(0.0, F16_MAX), StorageWidth::Float32);
        assert_eq!(real_width(-1e30, 1e30), StorageWidth::Float32);
        assert_eq!(real_width(0.0, 1e300), StorageWidth::Float64);
    }

    #[test]
    fn identical_values_select_narrowest_containing_width() {
        let mut table = Table::new(vec![
            Column::integer("small", vec![Some(5); 4]),
            Column::integer("large", vec![Some(40_000); 4]),
            Column::real("flat", vec![Some(2.5); 4]),
        ])
        .unwrap();
        MemoryOptimizer::new().optimize(&mut table).unwrap();
        assert_eq!(width_of(&table, "small"), StorageWidth::Int8);
        assert_eq!(width_of(&table, "large"), StorageWidth::Int32);
        assert_eq!(width_of(&table, "flat"), StorageWidth::Float16);
    }

    #[test]
    fn optimizing_reduces_footprint_and_keeps_values() {
        let ints: Vec<Option<i64>> = (0..1000).map(|i| Some(i % 100)).collect();
        let large: Vec<Option<i64>> = (0..1000).map(|i| Some(i * 997)).collect();
        let reals: Vec<Option<f64>> = (0..1000).map(|i| Some(i as f64 * 0.1)).collect();
        let mut table = Table::new(vec![
            Column::integer("int_column", ints),
            Column::integer("large_int_column", large),
            Column::real("float_column", reals),
        ])
        .unwrap();
        let original = table.clone();

        let report = MemoryOptimizer::new().optimize(&mut table).unwrap();
        assert!(report.after_bytes < report.before_bytes);
        assert!(report.reduction_pct() > 0.0);
        assert_eq!(width_of(&table, "int_column"), StorageWidth::Int8);
        assert_eq!(width_of(&table, "large_int_column"), StorageWidth::Int32);
        assert_eq!(width_of(&table, "float_column"), StorageWidth::Float16);

        for (a, b) in original.columns().iter().zip(table.columns()) {
            assert_eq!(a.data(), b.data(), "values of '{}' changed", a.name());
        }
    }

    #[test]
    fn selected_width_contains_the_column_range() {
        let cells = vec![Some(-300), Some(12), Some(32_000)];
        let mut table = Table::new(vec![Column::integer("x", cells)]).unwrap();
        MemoryOptimizer::new().optimize(&mut table).unwrap();
        let (lo, hi) = width_of(&table, "x").integer_range().unwrap();
        assert!(lo < -300 && 32_000 < hi);
        assert_eq!(width_of(&table, "x"), StorageWidth::Int16);
    }

    #[test]
    fn text_columns_are_not_given_a_width() {
        let mut table = Table::new(vec![Column::text("name", vec![Some("a")])]).unwrap();
        MemoryOptimizer::new().optimize(&mut table).unwrap();
        assert_eq!(table.column("name").unwrap().width(), None);
    }

    #[test]
    fn empty_table_reports_no_change() {
        let mut table = Table::new(vec![Column::integer("x", vec![])]).unwrap();
        let report = MemoryOptimizer::new().optimize(&mut table).unwrap();
        assert_eq!(report, MemoryReport::default());
        assert_eq!(report.reduction_pct(), 0.0);
        assert_eq!(width_of(&table, "x"), StorageWidth::Int64);
    }

    #[test]
    fn missing_values_are_rejected() {
        let mut table = Table::new(vec![Column::real("p", vec![Some(0.5), None])]).unwrap();
        let err = MemoryOptimizer::new().optimize(&mut table).unwrap_err();
        assert!(matches!(err, ServiceError::Transform { ref column, .. } if column == "p"));
    }
}
