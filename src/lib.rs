//! Agricultural price crawler for the Xinfadi wholesale market price service.
//!
//! Fetches paginated price records with a blocking HTTP client, merges the
//! pages into one dataset, and writes CSV/JSON files for downstream tools.
//!
//! # Quick start
//!
//! ```no_run
//! use agri_price_crawler::{PriceCrawler, QueryFilter};
//!
//! let crawler = PriceCrawler::builder().result_dir("result").build().unwrap();
//!
//! let filter = QueryFilter::new()
//!     .start_date("2024-01-01")
//!     .end_date("2024-12-31")
//!     .product_name("苹果");
//!
//! let dataset = crawler.aggregate(&filter);
//! let file_name = crawler.exporter().export_csv(&dataset, "apple").unwrap();
//! println!("{} records -> {}", dataset.count(), file_name);
//! ```

pub mod aggregator;
#[cfg(feature = "async")]
pub mod async_client;
pub mod cli;
pub mod config;
pub mod error;
pub mod exporter;
pub mod fetcher;
pub mod models;

pub use aggregator::{Aggregator, Pacer, ThreadSleepPacer};
#[cfg(feature = "async")]
pub use async_client::AsyncPriceCrawler;
pub use error::{CrawlerError, Result};
pub use exporter::Exporter;
pub use fetcher::{HttpFetcher, PageFetcher};
pub use models::{AggregatedDataset, PageResult, Price, PriceRecord, QueryFilter, RawPage, StopReason};

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// PriceCrawlerBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`PriceCrawler`].
///
/// Use [`PriceCrawler::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](PriceCrawlerBuilder::build).
#[derive(Debug, Clone)]
pub struct PriceCrawlerBuilder {
    endpoint: String,
    result_dir: PathBuf,
    timeout: Duration,
    page_delay: Duration,
    max_pages: u32,
    page_size: u32,
}

impl Default for PriceCrawlerBuilder {
    fn default() -> Self {
        Self {
            endpoint: config::PRICE_ENDPOINT.to_string(),
            result_dir: config::default_result_dir(),
            timeout: config::DEFAULT_TIMEOUT,
            page_delay: config::DEFAULT_PAGE_DELAY,
            max_pages: config::DEFAULT_MAX_PAGES,
            page_size: config::DEFAULT_PAGE_SIZE,
        }
    }
}

impl PriceCrawlerBuilder {
    /// Override the price service URL.
    pub fn endpoint(mut self, url: &str) -> Self {
        self.endpoint = url.to_string();
        self
    }

    /// Directory receiving CSV/JSON artifacts. Defaults to `./result`.
    pub fn result_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.result_dir = path.as_ref().to_path_buf();
        self
    }

    /// Per-request HTTP timeout. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Pause between successive page requests. Defaults to 500 ms;
    /// `Duration::ZERO` disables pacing.
    pub fn page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Upper bound on pages fetched per run. Defaults to 10.
    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Records requested per page. Defaults to 100.
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Build the crawler, creating the result directory and HTTP client.
    pub fn build(self) -> Result<PriceCrawler> {
        if self.page_size == 0 {
            return Err(CrawlerError::InvalidArgument(
                "page size must be positive".to_string(),
            ));
        }
        let fetcher = HttpFetcher::new(&self.endpoint, self.timeout)?;
        let exporter = Exporter::new(&self.result_dir)?;
        Ok(PriceCrawler {
            fetcher,
            exporter,
            page_delay: self.page_delay,
            max_pages: self.max_pages,
            page_size: self.page_size,
        })
    }
}

// ---------------------------------------------------------------------------
// PriceCrawler
// ---------------------------------------------------------------------------

/// The main entry point: an HTTP fetcher, pacing policy and exporter bound
/// together with the run defaults.
///
/// Created via [`PriceCrawler::builder()`].
#[derive(Debug, Clone)]
pub struct PriceCrawler {
    fetcher: HttpFetcher,
    exporter: Exporter,
    page_delay: Duration,
    max_pages: u32,
    page_size: u32,
}

/// Result of [`PriceCrawler::crawl_to_csv`].
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub dataset: AggregatedDataset,
    /// Generated CSV file name, relative to the result directory.
    pub file_name: String,
}

impl PriceCrawler {
    /// Create a new builder for configuring the crawler.
    pub fn builder() -> PriceCrawlerBuilder {
        PriceCrawlerBuilder::default()
    }

    pub fn fetcher(&self) -> &HttpFetcher {
        &self.fetcher
    }

    pub fn exporter(&self) -> &Exporter {
        &self.exporter
    }

    pub fn page_delay(&self) -> Duration {
        self.page_delay
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Fetch a single page.
    pub fn fetch_page(&self, filter: &QueryFilter, page: u32) -> PageResult {
        self.fetcher.fetch(filter, page, self.page_size)
    }

    /// Aggregate up to [`max_pages`](Self::max_pages) pages with the
    /// configured page size and pacing delay.
    pub fn aggregate(&self, filter: &QueryFilter) -> AggregatedDataset {
        Aggregator::new(&self.fetcher, self.page_delay).aggregate(
            filter,
            self.max_pages,
            self.page_size,
        )
    }

    /// Aggregate and write the result as one CSV named after
    /// `product_name_hint`.
    pub fn crawl_to_csv(&self, filter: &QueryFilter, product_name_hint: &str) -> Result<CrawlReport> {
        let dataset = self.aggregate(filter);
        let file_name = self.exporter.export_csv(&dataset, product_name_hint)?;
        Ok(CrawlReport { dataset, file_name })
    }
}

impl fmt::Display for PriceCrawler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PriceCrawler(endpoint={}, result_dir={}, max_pages={}, page_size={}, page_delay={:?})",
            self.fetcher.endpoint(),
            self.exporter.result_dir().display(),
            self.max_pages,
            self.page_size,
            self.page_delay
        )
    }
}
