//! The load-time pipeline: raw table in, frozen snapshot out.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Null sanitizer
//!   2. Country enricher
//!   3. Memory optimizer
//!   4. Precision formatter
//!   then materialization into a `Snapshot`.
//!
//! RULES:
//!   - Stages run in registration order, exactly once.
//!   - Every stage is built before any stage runs, so configuration
//!     errors surface before the table is touched.
//!   - The optimizer sees pre-format numeric values only.

use crate::{
    config::PipelineConfig,
    country::CountryEnricher,
    error::{ServiceError, ServiceResult},
    formatter::{designated_fields, PrecisionFormatter},
    optimizer::{MemoryOptimizer, MemoryReport},
    sanitizer::NullSanitizer,
    snapshot::Snapshot,
    stage::{StageSummary, TableStage},
    table::Table,
    types::USER_ID_COLUMN,
};

/// What the pipeline did, stage by stage.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub rows:   usize,
    pub stages: Vec<StageSummary>,
    pub memory: MemoryReport,
}

pub struct Pipeline {
    stages: Vec<Box<dyn TableStage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Build the standard stage list for `table`.
    /// Call this instead of new() + manual register() calls.
    /// The table must carry `user_id` and every designated field.
    pub fn standard(config: &PipelineConfig, table: &Table) -> ServiceResult<Self> {
        if !table.has_column(USER_ID_COLUMN) {
            return Err(ServiceError::MissingColumn {
                column: USER_ID_COLUMN.to_string(),
            });
        }
        let formatter = PrecisionFormatter::new(designated_fields(&config.score_column), table)?;

        let mut pipeline = Self::new();
        pipeline.register(Box::new(NullSanitizer::new()));
        pipeline.register(Box::new(CountryEnricher::new()));
        pipeline.register(Box::new(MemoryOptimizer::new()));
        pipeline.register(Box::new(formatter));
        Ok(pipeline)
    }

    /// Register a stage. Call in the documented execution order.
    pub fn register(&mut self, stage: Box<dyn TableStage>) {
        self.stages.push(stage);
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage over `table`, then freeze it.
    pub fn run(&self, mut table: Table) -> ServiceResult<(Snapshot, PipelineReport)> {
        let mut report = PipelineReport {
            rows: table.row_count(),
            ..PipelineReport::default()
        };
        log::info!(
            "pipeline: starting with {} rows x {} columns",
            report.rows,
            table.columns().len()
        );

        for stage in &self.stages {
            log::info!("pipeline: running {}", stage.name());
            let summary = stage.apply(&mut table).map_err(|e| {
                log::error!("pipeline: {} failed: {e}", stage.name());
                e
            })?;
            log::info!("pipeline: {} done ({})", summary.stage, summary.detail);
            if let Some(memory) = summary.memory {
                report.memory = memory;
            }
            report.stages.push(summary);
        }

        let snapshot = Snapshot::materialize(&table)?;
        log::info!("pipeline: snapshot materialized with {} records", snapshot.len());
        Ok((snapshot, report))
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

