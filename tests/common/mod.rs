//! Shared test fixtures for the crawler integration tests.
//!
//! Provides sample records and page bodies, a scripted [`PageFetcher`] that
//! replays a fixed sequence of page outcomes, and a pacer that records its
//! pauses instead of sleeping.

#![allow(dead_code)]

use std::cell::RefCell;
use std::time::Duration;

use agri_price_crawler::{
    AggregatedDataset, CrawlerError, PageFetcher, PageResult, Pacer, Price, PriceRecord,
    QueryFilter, RawPage, StopReason,
};
use serde_json::{json, Value};

/// A fully populated record.
pub fn sample_record(name: &str, avg: f64) -> PriceRecord {
    PriceRecord {
        prod_cat: Some("水果".to_string()),
        prod_pcat: Some("苹果类".to_string()),
        prod_name: Some(name.to_string()),
        low_price: Some(Price::from(avg - 1.0)),
        avg_price: Some(Price::from(avg)),
        high_price: Some(Price::from(avg + 1.0)),
        spec_info: Some("大".to_string()),
        place: Some("山东".to_string()),
        unit_info: Some("斤".to_string()),
        pub_date: Some("2024-05-01 00:00:00".to_string()),
        ..Default::default()
    }
}

pub fn dataset_of(records: Vec<PriceRecord>) -> AggregatedDataset {
    AggregatedDataset::new(records, 1, StopReason::PageLimit { pages: 1 })
}

/// JSON object shaped like one record from the price service.
pub fn record_json(name: &str, avg: f64) -> Value {
    json!({
        "id": 1001,
        "prodCat": "水果",
        "prodPcat": "苹果类",
        "prodName": name,
        "lowPrice": avg - 1.0,
        "avgPrice": avg,
        "highPrice": avg + 1.0,
        "specInfo": "大",
        "place": "山东",
        "unitInfo": "斤",
        "pubDate": "2024-05-01 00:00:00"
    })
}

/// JSON body of a page holding the given records.
pub fn page_body(records: Vec<Value>) -> Value {
    json!({
        "current": 1,
        "limit": records.len(),
        "count": 2000,
        "list": records
    })
}

// ---------------------------------------------------------------------------
// ScriptedFetcher
// ---------------------------------------------------------------------------

/// Outcome of one scripted page.
#[derive(Debug, Clone, Copy)]
pub enum Step {
    Records(usize),
    Empty,
    MissingList,
    Fail,
}

/// Replays `steps[page - 1]` for each request; pages past the script fail.
pub struct ScriptedFetcher {
    steps: Vec<Step>,
    calls: RefCell<Vec<(u32, u32)>>,
}

impl ScriptedFetcher {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// `(page, page_size)` of every request, in order.
    pub fn calls(&self) -> Vec<(u32, u32)> {
        self.calls.borrow().clone()
    }
}

/// Records named `p{page}-r{index}`.
pub fn page_records(page: u32, n: usize) -> Vec<PriceRecord> {
    (0..n)
        .map(|i| PriceRecord {
            prod_name: Some(format!("p{}-r{}", page, i)),
            ..Default::default()
        })
        .collect()
}

impl PageFetcher for ScriptedFetcher {
    fn fetch(&self, _filter: &QueryFilter, page: u32, page_size: u32) -> PageResult {
        self.calls.borrow_mut().push((page, page_size));
        let step = self.steps.get(page as usize - 1).copied().unwrap_or(Step::Fail);
        match step {
            Step::Records(n) => PageResult::Success(RawPage {
                list: Some(page_records(page, n)),
                count: Some(9999),
                current: Some(page as u64),
            }),
            Step::Empty => PageResult::Success(RawPage {
                list: Some(Vec::new()),
                count: Some(0),
                current: Some(page as u64),
            }),
            Step::MissingList => PageResult::Success(RawPage::default()),
            Step::Fail => PageResult::Failure(CrawlerError::Parse("scripted failure".to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingPacer
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct RecordingPacer {
    pub pauses: Vec<Duration>,
}

impl Pacer for RecordingPacer {
    fn pause(&mut self, delay: Duration) {
        self.pauses.push(delay);
    }
}
