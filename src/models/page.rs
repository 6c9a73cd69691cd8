use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::CrawlerError;
use crate::models::PriceRecord;

// ---------------------------------------------------------------------------
// RawPage — one decoded response body
// ---------------------------------------------------------------------------

/// One page of the price service's response.
///
/// `count` and `current` are whatever the service declared; they are
/// informational and never used for the final tally.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawPage {
    #[serde(default)]
    pub list: Option<Vec<PriceRecord>>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub current: Option<u64>,
}

impl RawPage {
    /// Records on this page, or an empty slice when `list` was absent.
    pub fn records(&self) -> &[PriceRecord] {
        self.list.as_deref().unwrap_or(&[])
    }

    /// Whether this page carries at least one record.
    pub fn has_records(&self) -> bool {
        !self.records().is_empty()
    }
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// PageResult — outcome of a single fetch
// ---------------------------------------------------------------------------

/// Outcome of fetching a single page.
///
/// Fetchers never return `Err`; any network, status, or decoding problem is
/// reported as [`PageResult::Failure`] and the caller decides what to do.
#[derive(Debug)]
pub enum PageResult {
    Success(RawPage),
    Failure(CrawlerError),
}

impl PageResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PageResult::Success(_))
    }

    /// The decoded page, if the fetch succeeded.
    pub fn page(&self) -> Option<&RawPage> {
        match self {
            PageResult::Success(page) => Some(page),
            PageResult::Failure(_) => None,
        }
    }
}

impl From<RawPage> for PageResult {
    fn from(page: RawPage) -> Self {
        PageResult::Success(page)
    }
}

impl From<CrawlerError> for PageResult {
    fn from(err: CrawlerError) -> Self {
        PageResult::Failure(err)
    }
}
