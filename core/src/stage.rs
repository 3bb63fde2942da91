//! Table stage trait.
//!
//! RULE: Every transformation between load and materialization implements
//! TableStage. The pipeline calls apply() on each registered stage in
//! registration order, exactly once. Execution order is fixed and
//! documented in pipeline.rs.

use crate::{error::ServiceResult, optimizer::MemoryReport, table::Table};

/// What a stage reports back after running.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSummary {
    pub stage:  &'static str,
    pub detail: String,
    /// Set only by stages that change recorded storage widths.
    pub memory: Option<MemoryReport>,
}

impl StageSummary {
    pub fn new(stage: &'static str, detail: impl Into<String>) -> Self {
        Self {
            stage,
            detail: detail.into(),
            memory: None,
        }
    }

    pub fn with_memory(mut self, report: MemoryReport) -> Self {
        self.memory = Some(report);
        self
    }
}

/// The contract every pipeline stage must fulfill.
pub trait TableStage: Send + Sync {
    /// Unique stable name for this stage.
    fn name(&self) -> &'static str;

    /// Transform the table in place.
    fn apply(&self, table: &mut Table) -> ServiceResult<StageSummary>;
}
