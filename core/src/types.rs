//! Column names shared across the service.

/// Column holding the user identifier.
pub const USER_ID_COLUMN: &str = "user_id";

/// Dataframe-export artefact dropped at load time.
pub const INDEX_COLUMN: &str = "index";
