//! Country enricher.
//!
//! Result tables exported with a dialling-code column get a derived
//! `country_abbr` text column next to it. Codes outside the known set map
//! to `Unknown`.

use crate::{
    error::{ServiceError, ServiceResult},
    stage::{StageSummary, TableStage},
    table::{Column, ColumnData, Table},
};

pub const COUNTRY_CODE_COLUMN: &str = "country_code";
pub const COUNTRY_ABBR_COLUMN: &str = "country_abbr";
pub const UNKNOWN_COUNTRY: &str = "Unknown";

/// Map an international dialling code to a country abbreviation.
pub fn abbreviation(code: i64) -> &'static str {
    match code {
        1 => "US",
        33 => "FR",
        34 => "ES",
        39 => "IT",
        40 => "RO",
        44 => "GB",
        262 => "RE",
        351 => "PT",
        590 => "GP",
        687 => "NC",
        689 => "PF",
        _ => UNKNOWN_COUNTRY,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CountryEnricher;

impl CountryEnricher {
    pub fn new() -> Self {
        Self
    }

    /// Append `country_abbr` if the table has a numeric `country_code`
    /// column and no abbreviation column yet. Returns whether a column was
    /// added.
    pub fn enrich(&self, table: &mut Table) -> ServiceResult<bool> {
        if table.has_column(COUNTRY_ABBR_COLUMN) {
            return Ok(false);
        }
        let Some(codes) = table.column(COUNTRY_CODE_COLUMN) else {
            return Ok(false);
        };
        let abbrs: Vec<Option<&str>> = match codes.data() {
            ColumnData::Integer(cells) => cells
                .iter()
                .map(|c| c.map(|code| Some(abbreviation(code))).ok_or_else(unsanitized))
                .collect::<ServiceResult<_>>()?,
            ColumnData::Real(cells) => cells
                .iter()
                .map(|c| match c {
                    Some(v) if v.is_finite() => Ok(Some(real_abbreviation(*v))),
                    _ => Err(unsanitized()),
                })
                .collect::<ServiceResult<_>>()?,
            ColumnData::Text(_) => {
                log::warn!("country: '{COUNTRY_CODE_COLUMN}' is text, not numeric; skipping");
                return Ok(false);
            }
        };
        table.push_column(Column::text(COUNTRY_ABBR_COLUMN, abbrs))?;
        Ok(true)
    }
}

/// Codes stored as reals match only when they are whole numbers.
fn real_abbreviation(code: f64) -> &'static str {
    if code.fract() == 0.0 && code.abs() < i64::MAX as f64 {
        abbreviation(code as i64)
    } else {
        UNKNOWN_COUNTRY
    }
}

fn unsanitized() -> ServiceError {
    ServiceError::transform(
        COUNTRY_CODE_COLUMN,
        "missing values must be sanitized before enrichment",
    )
}

impl TableStage for CountryEnricher {
    fn name(&self) -> &'static str {
        "country_enricher"
    }

    fn apply(&self, table: &mut Table) -> ServiceResult<StageSummary> {
        let detail = if self.enrich(table)? {
            format!("derived '{COUNTRY_ABBR_COLUMN}'")
        } else {
            "nothing to derive".to_string()
        };
        Ok(StageSummary::new(self.name(), detail))
    }
}
