//! Read-only queries over the snapshot.

use crate::snapshot::{Record, Snapshot};
use std::sync::Arc;

/// Default size of the head slice served by the listing endpoint.
pub const DEFAULT_HEAD_LIMIT: usize = 100;

/// Outcome of an identifier lookup. Not finding anything is a normal
/// result, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<'a> {
    Found(Vec<&'a Record>),
    NotFound,
}

impl<'a> Lookup<'a> {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn records(&self) -> &[&'a Record] {
        match self {
            Self::Found(records) => records,
            Self::NotFound => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryService {
    snapshot: Arc<Snapshot>,
}

impl QueryService {
    pub fn new(snapshot: Arc<Snapshot>) -> Self {
        Self { snapshot }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// The first `n` records in snapshot order, or all of them if there
    /// are fewer.
    pub fn list_head(&self, n: usize) -> &[Record] {
        let records = self.snapshot.records();
        &records[..n.min(records.len())]
    }

    /// Every record whose `user_id` equals `id` exactly, in snapshot order.
    pub fn find_by_user_id(&self, id: &str) -> Lookup<'_> {
        let records = self.snapshot.records();
        let matches: Vec<&Record> = self
            .snapshot
            .positions_of(id)
            .iter()
            .filter_map(|&pos| records.get(pos))
            .collect();
        if matches.is_empty() {
            Lookup::NotFound
        } else {
            Lookup::Found(matches)
        }
    }
}

