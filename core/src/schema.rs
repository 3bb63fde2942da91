//! Record schema: typed column descriptors and the storage-width ladder.
//!
//! Every column is tagged with a `ColumnKind` once, when the table is loaded.
//! Later stages dispatch on that tag; nothing probes values to guess a type.

use serde::Serialize;
use std::borrow::Cow;
use std::fmt;

pub const RANDOM_FOREST_PROBABILITY: &str = "random_for_probability";
pub const NAIVE_BAYES_PROBABILITY: &str = "naive_bias_probability";
pub const CALIBRATED_NAIVE_BAYES_PROBABILITY: &str = "cal_naive_bias_probability";
pub const DEFAULT_SCORE_COLUMN: &str = "suspicion_score";

/// The three probability fields every result row carries.
pub const PROBABILITY_COLUMNS: [&str; 3] = [
    RANDOM_FOREST_PROBABILITY,
    NAIVE_BAYES_PROBABILITY,
    CALIBRATED_NAIVE_BAYES_PROBABILITY,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Integer,
    Real,
}

impl ColumnKind {
    /// Resolve a kind from an SQLite declared column type using SQLite's
    /// affinity rules. `None` means the declaration does not decide it
    /// (empty, NUMERIC, BLOB) and the kind must be inferred from the values.
    pub fn from_declared_type(decl: &str) -> Option<Self> {
        let decl = decl.to_ascii_uppercase();
        if decl.contains("INT") {
            Some(Self::Integer)
        } else if decl.contains("CHAR") || decl.contains("CLOB") || decl.contains("TEXT") {
            Some(Self::Text)
        } else if decl.contains("REAL") || decl.contains("FLOA") || decl.contains("DOUB") {
            Some(Self::Real)
        } else {
            None
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Integer => f.write_str("integer"),
            Self::Real => f.write_str("real"),
        }
    }
}

/// Storage widths a numeric column can be recorded at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageWidth {
    Int8,
    Int16,
    Int32,
    Int64,
    Float16,
    Float32,
    Float64,
}

/// Largest finite value of an IEEE 754 half-precision float.
pub const F16_MAX: f64 = 65504.0;

impl StorageWidth {
    pub const INTEGER_LADDER: [StorageWidth; 4] =
        [Self::Int8, Self::Int16, Self::Int32, Self::Int64];
    pub const REAL_LADDER: [StorageWidth; 3] = [Self::Float16, Self::Float32, Self::Float64];

    /// Width a column of `kind` is declared at before optimization.
    pub fn declared(kind: ColumnKind) -> Option<Self> {
        match kind {
            ColumnKind::Integer => Some(Self::Int64),
            ColumnKind::Real => Some(Self::Float64),
            ColumnKind::Text => None,
        }
    }

    pub fn bytes(self) -> usize {
        match self {
            Self::Int8 => 1,
            Self::Int16 | Self::Float16 => 2,
            Self::Int32 | Self::Float32 => 4,
            Self::Int64 | Self::Float64 => 8,
        }
    }

    /// Inclusive representable range of an integer width.
    pub fn integer_range(self) -> Option<(i64, i64)> {
        match self {
            Self::Int8 => Some((i8::MIN as i64, i8::MAX as i64)),
            Self::Int16 => Some((i16::MIN as i64, i16::MAX as i64)),
            Self::Int32 => Some((i32::MIN as i64, i32::MAX as i64)),
            Self::Int64 => Some((i64::MIN, i64::MAX)),
            _ => None,
        }
    }

    /// Largest finite magnitude of a floating-point width.
    pub fn real_limit(self) -> Option<f64> {
        match self {
            Self::Float16 => Some(F16_MAX),
            Self::Float32 => Some(f32::MAX as f64),
            Self::Float64 => Some(f64::MAX),
            _ => None,
        }
    }

    /// Strict containment: both bounds must lie inside the open range.
    pub fn strictly_contains_integers(self, min: i64, max: i64) -> bool {
        self.integer_range()
            .is_some_and(|(lo, hi)| min > lo && max < hi)
    }

    pub fn strictly_contains_reals(self, min: f64, max: f64) -> bool {
        self.real_limit()
            .is_some_and(|limit| min > -limit && max < limit)
    }
}

impl fmt::Display for StorageWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float16 => "float16",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        };
        f.write_str(name)
    }
}

/// One cell of a materialized record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Real(f64),
}

impl FieldValue {
    /// Canonical string form used for identifier comparison.
    pub fn identifier(&self) -> Cow<'_, str> {
        match self {
            Self::Text(s) => Cow::Borrowed(s.as_str()),
            Self::Integer(n) => Cow::Owned(n.to_string()),
            Self::Real(x) => Cow::Owned(x.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier())
    }
}
