//! Multi-page aggregation over a [`PageFetcher`].
//!
//! Pages are requested strictly one after another, starting at page 1. The
//! first failed or empty page ends the run; whatever was collected up to that
//! point is the result.

use std::time::Duration;

use crate::fetcher::PageFetcher;
use crate::models::{AggregatedDataset, PageResult, QueryFilter, StopReason};

// ---------------------------------------------------------------------------
// Pacer
// ---------------------------------------------------------------------------

/// Waits between successive page requests.
pub trait Pacer {
    fn pause(&mut self, delay: Duration);
}

/// Pacer that blocks the current thread for the full delay.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleepPacer;

impl Pacer for ThreadSleepPacer {
    fn pause(&mut self, delay: Duration) {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

impl<P: Pacer + ?Sized> Pacer for &mut P {
    fn pause(&mut self, delay: Duration) {
        (**self).pause(delay)
    }
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Drives a fetcher across pages `1..=max_pages`, concatenating records.
pub struct Aggregator<'a, F: PageFetcher + ?Sized, P: Pacer> {
    fetcher: &'a F,
    pacer: P,
    delay: Duration,
}

impl<'a, F: PageFetcher + ?Sized> Aggregator<'a, F, ThreadSleepPacer> {
    /// Create an aggregator that sleeps `delay` between page requests.
    pub fn new(fetcher: &'a F, delay: Duration) -> Self {
        Self::with_pacer(fetcher, ThreadSleepPacer, delay)
    }
}

impl<'a, F: PageFetcher + ?Sized, P: Pacer> Aggregator<'a, F, P> {
    pub fn with_pacer(fetcher: &'a F, pacer: P, delay: Duration) -> Self {
        Self {
            fetcher,
            pacer,
            delay,
        }
    }

    /// Fetch up to `max_pages` pages of `page_size` records and merge them.
    ///
    /// Never fails. A failed first page yields an empty dataset; the stop
    /// reason on the dataset says why the run ended. A `max_pages` of 0
    /// issues no requests.
    pub fn aggregate(
        &mut self,
        filter: &QueryFilter,
        max_pages: u32,
        page_size: u32,
    ) -> AggregatedDataset {
        tracing::info!(max_pages, page_size, "starting price aggregation");

        let mut records = Vec::new();
        let mut fetched = 0;
        let mut stop = StopReason::PageLimit { pages: max_pages };

        for page in 1..=max_pages {
            if page > 1 {
                self.pacer.pause(self.delay);
            }
            tracing::info!(page, "fetching page");
            fetched += 1;

            match self.fetcher.fetch(filter, page, page_size) {
                PageResult::Success(raw) => match raw.list {
                    Some(list) if !list.is_empty() => {
                        tracing::info!(
                            page,
                            records = list.len(),
                            declared_count = ?raw.count,
                            "page fetched"
                        );
                        records.extend(list);
                    }
                    _ => {
                        tracing::info!(page, "page returned no records, stopping");
                        stop = StopReason::EmptyPage { page };
                        break;
                    }
                },
                PageResult::Failure(e) => {
                    tracing::warn!(page, error = %e, "page fetch failed, stopping");
                    stop = StopReason::Failed {
                        page,
                        message: e.to_string(),
                    };
                    break;
                }
            }
        }

        tracing::info!(total = records.len(), pages = fetched, "aggregation finished");
        AggregatedDataset::new(records, fetched, stop)
    }
}
