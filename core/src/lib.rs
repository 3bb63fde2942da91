//! Suspicion results service core.
//!
//! Loads a precomputed table of per-user suspicion scores from SQLite,
//! runs it through a fixed pipeline (sanitize → enrich → optimize →
//! format), freezes it into an immutable snapshot, and serves it over HTTP.

pub mod api;
pub mod config;
pub mod country;
pub mod error;
pub mod formatter;
pub mod optimizer;
pub mod pipeline;
pub mod query;
pub mod sanitizer;
pub mod schema;
pub mod snapshot;
pub mod stage;
pub mod store;
pub mod table;
pub mod types;
