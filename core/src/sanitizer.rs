//! Null sanitizer.
//!
//! Replaces every missing cell with the default for its column kind:
//! text gets `"unknown"`, integers and reals get `0`. A real `NaN` or
//! infinity is treated as missing, since JSON has no encoding for either. Running it twice changes nothing.

use crate::{
    error::ServiceResult,
    stage::{StageSummary, TableStage},
    table::{ColumnData, Table},
};

pub const TEXT_DEFAULT: &str = "unknown";
pub const INTEGER_DEFAULT: i64 = 0;
pub const REAL_DEFAULT: f64 = 0.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct NullSanitizer;

impl NullSanitizer {
    pub fn new() -> Self {
        Self
    }

    /// Fill every missing cell, column by column. Returns the number of
    /// cells that were filled.
    pub fn sanitize(&self, table: &mut Table) -> usize {
        let mut filled = 0;
        for column in table.columns_mut() {
            let before = column.missing_count();
            match column.data_mut() {
                ColumnData::Text(cells) => {
                    for cell in cells.iter_mut().filter(|c| c.is_none()) {
                        *cell = Some(TEXT_DEFAULT.to_string());
                    }
                }
                ColumnData::Integer(cells) => {
                    for cell in cells.iter_mut().filter(|c| c.is_none()) {
                        *cell = Some(INTEGER_DEFAULT);
                    }
                }
                ColumnData::Real(cells) => {
                    for cell in cells.iter_mut() {
                        if cell.map_or(true, |v| !v.is_finite()) {
                            *cell = Some(REAL_DEFAULT);
                        }
                    }
                }
            }
            if before > 0 {
                log::debug!("sanitizer: filled {before} missing cells in '{}'", column.name());
            }
            filled += before;
        }
        filled
    }
}

impl TableStage for NullSanitizer {
    fn name(&self) -> &'static str {
        "null_sanitizer"
    }

    fn apply(&self, table: &mut Table) -> ServiceResult<StageSummary> {
        let filled = self.sanitize(table);
        Ok(StageSummary::new(
            self.name(),
            format!("filled {filled} missing cells"),
        ))
    }
}
