//! Async wrapper around [`PriceCrawler`] for use in async runtimes (Tokio, etc.).
//!
//! The crawler uses a blocking HTTP client and sleeps between pages, so every
//! operation runs on Tokio's blocking thread pool via
//! [`tokio::task::spawn_blocking`], keeping the async event loop free.
//!
//! # Example
//!
//! ```no_run
//! use agri_price_crawler::{AsyncPriceCrawler, QueryFilter};
//!
//! #[tokio::main]
//! async fn main() {
//!     let crawler = AsyncPriceCrawler::builder().build().await.unwrap();
//!
//!     let filter = QueryFilter::new().product_name("苹果");
//!     let dataset = crawler.aggregate(filter).await.unwrap();
//!     println!("{} records", dataset.count());
//!
//!     crawler.close().await.unwrap();
//! }
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{CrawlerError, Result};
use crate::models::{AggregatedDataset, QueryFilter};
use crate::{CrawlReport, PriceCrawler, PriceCrawlerBuilder};

// ---------------------------------------------------------------------------
// AsyncPriceCrawlerBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AsyncPriceCrawler`].
#[derive(Debug, Clone, Default)]
pub struct AsyncPriceCrawlerBuilder {
    inner: PriceCrawlerBuilder,
}

impl AsyncPriceCrawlerBuilder {
    pub fn endpoint(mut self, url: &str) -> Self {
        self.inner = self.inner.endpoint(url);
        self
    }

    pub fn result_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.inner = self.inner.result_dir(path);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.timeout(timeout);
        self
    }

    pub fn page_delay(mut self, delay: Duration) -> Self {
        self.inner = self.inner.page_delay(delay);
        self
    }

    pub fn max_pages(mut self, max_pages: u32) -> Self {
        self.inner = self.inner.max_pages(max_pages);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.inner = self.inner.page_size(page_size);
        self
    }

    /// Build the crawler on the blocking thread pool (the blocking HTTP
    /// client must not be created on an async worker thread).
    pub async fn build(self) -> Result<AsyncPriceCrawler> {
        tokio::task::spawn_blocking(move || {
            let crawler = self.inner.build()?;
            Ok(AsyncPriceCrawler {
                inner: Arc::new(crawler),
            })
        })
        .await
        .map_err(|e| CrawlerError::Task(format!("Task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// AsyncPriceCrawler
// ---------------------------------------------------------------------------

/// Async wrapper around [`PriceCrawler`].
///
/// All operations are dispatched to a blocking thread pool via
/// [`tokio::task::spawn_blocking`]. Release it with [`close()`](Self::close)
/// so the blocking client is dropped off the async worker threads.
pub struct AsyncPriceCrawler {
    inner: Arc<PriceCrawler>,
}

impl AsyncPriceCrawler {
    pub fn builder() -> AsyncPriceCrawlerBuilder {
        AsyncPriceCrawlerBuilder::default()
    }

    /// Run a sync crawler operation on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&PriceCrawler) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let crawler = self.inner.clone();
        tokio::task::spawn_blocking(move || f(&crawler))
            .await
            .map_err(|e| CrawlerError::Task(format!("Task join error: {e}")))?
    }

    /// Aggregate pages for `filter` asynchronously.
    pub async fn aggregate(&self, filter: QueryFilter) -> Result<AggregatedDataset> {
        self.run(move |c| Ok(c.aggregate(&filter))).await
    }

    /// Aggregate and write one CSV asynchronously.
    pub async fn crawl_to_csv(&self, filter: QueryFilter, product_name_hint: &str) -> Result<CrawlReport> {
        let hint = product_name_hint.to_string();
        self.run(move |c| c.crawl_to_csv(&filter, &hint)).await
    }

    /// Release the crawler on the blocking thread pool.
    pub async fn close(self) -> Result<()> {
        let inner = self.inner;
        tokio::task::spawn_blocking(move || drop(inner))
            .await
            .map_err(|e| CrawlerError::Task(format!("Task join error: {e}")))
    }
}
