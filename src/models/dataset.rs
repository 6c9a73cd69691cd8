use std::fmt;

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::models::PriceRecord;

// ---------------------------------------------------------------------------
// StopReason — why an aggregation run ended
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Every page up to the page cap returned records.
    PageLimit { pages: u32 },
    /// The page came back without a `list` or with an empty one.
    EmptyPage { page: u32 },
    /// The page could not be fetched or decoded.
    Failed { page: u32, message: String },
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::PageLimit { pages } => write!(f, "reached page limit ({})", pages),
            StopReason::EmptyPage { page } => write!(f, "page {} returned no records", page),
            StopReason::Failed { page, message } => {
                write!(f, "page {} failed: {}", page, message)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// AggregatedDataset — records accumulated across pages
// ---------------------------------------------------------------------------

/// Records accumulated across the pages of one aggregation run, in page order.
///
/// The record count is always derived from the records themselves. Serializes
/// as `{"count": n, "list": [...]}`.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedDataset {
    records: Vec<PriceRecord>,
    pages_fetched: u32,
    stop_reason: StopReason,
}

impl AggregatedDataset {
    pub fn new(records: Vec<PriceRecord>, pages_fetched: u32, stop_reason: StopReason) -> Self {
        Self {
            records,
            pages_fetched,
            stop_reason,
        }
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of fetch calls issued during the run, including a failed one.
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    pub fn stop_reason(&self) -> &StopReason {
        &self.stop_reason
    }

    pub fn into_records(self) -> Vec<PriceRecord> {
        self.records
    }
}

impl Serialize for AggregatedDataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AggregatedDataset", 2)?;
        state.serialize_field("count", &self.count())?;
        state.serialize_field("list", &self.records)?;
        state.end()
    }
}
