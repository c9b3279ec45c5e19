//! Terminal result of one candidate's trip through the pipeline.

use crate::enrich::EnrichError;
use crate::store::ThreatRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStage {
    /// The discovered link failed normalization.
    Discovered,
    /// The redirect destination failed normalization.
    Redirected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateKind {
    /// Already in the record store from an earlier run.
    Historical,
    /// Claimed by another candidate earlier in this run.
    Runtime,
}

/// Exactly one per submitted candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Record(ThreatRecord),
    Filtered(FilterStage),
    Duplicate(DuplicateKind),
    Allowed,
    Failed(EnrichError),
}

impl Outcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Outcome::Duplicate(_))
    }

    pub fn record(&self) -> Option<&ThreatRecord> {
        match self {
            Outcome::Record(r) => Some(r),
            _ => None,
        }
    }
}
