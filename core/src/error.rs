use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Column '{column}' is required but not present in the result table")]
    MissingColumn { column: String },

    #[error("Column '{column}' cannot be formatted: it is not numeric")]
    InvalidFormatColumn { column: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Transformation error in column '{column}': {reason}")]
    Transform { column: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn transform(column: &str, reason: impl Into<String>) -> Self {
        Self::Transform {
            column: column.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by bad configuration rather than bad data or I/O.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::MissingColumn { .. } | Self::InvalidFormatColumn { .. }
        )
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
