//! Precision formatter.
//!
//! Renders the designated probability and score fields as fixed-precision
//! decimal strings for the API. Formatting is presentation-only: it runs
//! after the optimizer and the recorded widths are left as they were.

use crate::{
    error::{ServiceError, ServiceResult},
    schema::{ColumnKind, PROBABILITY_COLUMNS},
    stage::{StageSummary, TableStage},
    table::{ColumnData, Table},
};

pub const PROBABILITY_DECIMALS: usize = 3;
pub const SCORE_DECIMALS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPrecision {
    pub column: String,
    pub decimals: usize,
}

impl FieldPrecision {
    pub fn new(column: impl Into<String>, decimals: usize) -> Self {
        Self {
            column: column.into(),
            decimals,
        }
    }
}

/// The four designated fields: three probabilities and the score.
pub fn designated_fields(score_column: &str) -> Vec<FieldPrecision> {
    PROBABILITY_COLUMNS
        .iter()
        .map(|c| FieldPrecision::new(*c, PROBABILITY_DECIMALS))
        .chain(std::iter::once(FieldPrecision::new(score_column, SCORE_DECIMALS)))
        .collect()
}

/// Format one value with a fixed number of decimals.
pub fn format_fixed(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}")
}

#[derive(Debug, Clone)]
pub struct PrecisionFormatter {
    fields: Vec<FieldPrecision>,
}

impl PrecisionFormatter {
    /// Build a formatter for `fields`, checking every one of them against
    /// the table it will run on. A field that is absent or text-typed is a
    /// configuration error.
    pub fn new(fields: Vec<FieldPrecision>, table: &Table) -> ServiceResult<Self> {
        for field in &fields {
            let column = table
                .column(&field.column)
                .ok_or_else(|| ServiceError::MissingColumn {
                    column: field.column.clone(),
                })?;
            if column.kind() == ColumnKind::Text {
                return Err(ServiceError::InvalidFormatColumn {
                    column: field.column.clone(),
                });
            }
        }
        Ok(Self { fields })
    }

    pub fn format(&self, table: &mut Table) -> ServiceResult<usize> {
        let mut formatted = 0;
        for field in &self.fields {
            let column = table
                .column_mut(&field.column)
                .ok_or_else(|| ServiceError::MissingColumn {
                    column: field.column.clone(),
                })?;
            let rendered: Option<Vec<Option<String>>> = match column.data() {
                ColumnData::Integer(cells) => cells
                    .iter()
                    .map(|c| c.map(|v| Some(format_fixed(v as f64, field.decimals))))
                    .collect(),
                ColumnData::Real(cells) => cells
                    .iter()
                    .map(|c| c.map(|v| Some(format_fixed(v, field.decimals))))
                    .collect(),
                ColumnData::Text(_) => {
                    return Err(ServiceError::InvalidFormatColumn {
                        column: field.column.clone(),
                    })
                }
            };
            let rendered = rendered.ok_or_else(|| {
                ServiceError::transform(&field.column, "missing value found; sanitize before formatting")
            })?;
            formatted += rendered.len();
            column.replace_data(ColumnData::Text(rendered));
        }
        Ok(formatted)
    }
}

impl TableStage for PrecisionFormatter {
    fn name(&self) -> &'static str {
        "precision_formatter"
    }

    fn apply(&self, table: &mut Table) -> ServiceResult<StageSummary> {
        let formatted = self.format(table)?;
        Ok(StageSummary::new(
            self.name(),
            format!("formatted {formatted} cells in {} fields", self.fields.len()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        schema::{FieldValue, StorageWidth, DEFAULT_SCORE_COLUMN},
        table::Column,
    };

    fn results() -> Table {
        Table::new(vec![
            Column::text("user_id", vec![Some("u1")]),
            Column::real("random_for_probability", vec![Some(0.12345)]),
            Column::real("naive_bias_probability", vec![Some(1.0)]),
            Column::real("cal_naive_bias_probability", vec![Some(0.0)]),
            Column::integer(DEFAULT_SCORE_COLUMN, vec![Some(7)]),
        ])
        .unwrap()
    }

    #[test]
    fn fixed_precision_rendering() {
        assert_eq!(format_fixed(0.12345, 3), "0.123");
        assert_eq!(format_fixed(7.0, 2), "7.00");
        assert_eq!(format_fixed(0.0, 3), "0.000");
        assert_eq!(format_fixed(-3.14159, 2), "-3.14");
    }

    #[test]
    fn designated_fields_are_formatted_as_text() {
        let mut table = results();
        let formatter =
            PrecisionFormatter::new(designated_fields(DEFAULT_SCORE_COLUMN), &table).unwrap();
        assert_eq!(formatter.format(&mut table).unwrap(), 4);

        let text = |name: &str| table.column(name).unwrap().value(0).unwrap();
        assert_eq!(text("random_for_probability"), FieldValue::Text("0.123".into()));
        assert_eq!(text("naive_bias_probability"), FieldValue::Text("1.000".into()));
        assert_eq!(text(DEFAULT_SCORE_COLUMN), FieldValue::Text("7.00".into()));
        assert_eq!(text("user_id"), FieldValue::Text("u1".into()));
    }

    #[test]
    fn recorded_width_survives_formatting() {
        let mut table = results();
        let formatter =
            PrecisionFormatter::new(designated_fields(DEFAULT_SCORE_COLUMN), &table).unwrap();
        formatter.format(&mut table).unwrap();
        assert_eq!(
            table.column(DEFAULT_SCORE_COLUMN).unwrap().width(),
            Some(StorageWidth::Int64)
        );
    }

    #[test]
    fn missing_field_fails_at_construction() {
        let table = results();
        let err = PrecisionFormatter::new(designated_fields("Suspention_Score"), &table)
            .unwrap_err();
        assert!(err.is_config());
        assert!(
            matches!(err, ServiceError::MissingColumn { ref column } if column == "Suspention_Score")
        );
    }

    #[test]
    fn text_field_fails_at_construction() {
        let table = results();
        let err = PrecisionFormatter::new(vec![FieldPrecision::new("user_id", 2)], &table)
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidFormatColumn { .. }));
    }
}
