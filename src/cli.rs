//! The two command-line operations: the argument-less demo run and the
//! argument-driven service run.
//!
//! Both share [`PriceCrawler`]; they differ only in how they report. The demo
//! run prints a human-readable summary and always exits 0. The service run
//! prints exactly one JSON line (`{"file_name": ...}` or `{"error": ...}`)
//! for an orchestrating process and exits 0 or 1 accordingly. [`Cli`] holds
//! the binary's flags.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{NaiveDate, TimeDelta};
use clap::Parser;
use serde::Serialize;

use crate::config;
use crate::error::{CrawlerError, Result};
use crate::models::{AggregatedDataset, QueryFilter};
use crate::PriceCrawler;

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        CrawlerError::InvalidArgument(format!("invalid date '{}' (expected YYYY-MM-DD): {}", value, e))
    })
}

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// Command-line arguments of the `agri-price-crawler` binary.
///
/// The three service flags go together: supplying only some of them, or a
/// malformed date, is a usage error reported by clap before any request.
#[derive(Debug, Parser)]
#[command(name = "agri-price-crawler", about = "Agricultural price data crawler")]
pub struct Cli {
    /// Query start date, YYYY-MM-DD
    #[arg(
        long = "start_time",
        visible_alias = "start-time",
        value_parser = validate_date,
        requires_all = ["end_time", "product_name"]
    )]
    pub start_time: Option<String>,
    /// Query end date, YYYY-MM-DD
    #[arg(
        long = "end_time",
        visible_alias = "end-time",
        value_parser = validate_date,
        requires_all = ["start_time", "product_name"]
    )]
    pub end_time: Option<String>,
    /// Product name to search for
    #[arg(
        long = "product_name",
        visible_alias = "product-name",
        requires_all = ["start_time", "end_time"]
    )]
    pub product_name: Option<String>,
    /// First-level category name (e.g. "水果")
    #[arg(long)]
    pub category: Option<String>,
    /// Directory for generated files
    #[arg(long, default_value = "result")]
    pub result_dir: PathBuf,
    /// Maximum number of pages to fetch
    #[arg(long, default_value_t = config::DEFAULT_MAX_PAGES)]
    pub max_pages: u32,
    /// Records per page
    #[arg(long, default_value_t = config::DEFAULT_PAGE_SIZE, value_parser = clap::value_parser!(u32).range(1..))]
    pub page_size: u32,
    /// Pause between page requests, in milliseconds
    #[arg(long, default_value_t = 500)]
    pub delay_ms: u64,
    /// HTTP request timeout, in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
    /// Price service URL
    #[arg(long, default_value = config::PRICE_ENDPOINT)]
    pub endpoint: String,
    /// Also write the dataset as JSON next to the CSV
    #[arg(long)]
    pub json: bool,
    /// Also write one CSV per product name under <result-dir>/split
    #[arg(long)]
    pub split: bool,
}

fn validate_date(value: &str) -> std::result::Result<String, String> {
    parse_date(value)
        .map(|d| d.to_string())
        .map_err(|e| e.to_string())
}

impl Cli {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            category: self.category.clone(),
            write_json: self.json,
            split: self.split,
        }
    }

    /// Service-run arguments, when all three service flags were given.
    pub fn service_args(&self) -> Option<ServiceArgs> {
        match (&self.start_time, &self.end_time, &self.product_name) {
            (Some(start), Some(end), Some(product)) => Some(ServiceArgs {
                start_date: start.clone(),
                end_date: end.clone(),
                product_name: product.clone(),
                options: self.run_options(),
            }),
            _ => None,
        }
    }

    /// Build a crawler from the connection and paging flags.
    pub fn crawler(&self) -> Result<PriceCrawler> {
        PriceCrawler::builder()
            .endpoint(&self.endpoint)
            .result_dir(&self.result_dir)
            .max_pages(self.max_pages)
            .page_size(self.page_size)
            .page_delay(Duration::from_millis(self.delay_ms))
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
    }
}

/// Extra artifacts and filters shared by both runs.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// First-level category name (see [`config::categories`]).
    pub category: Option<String>,
    /// Also write `{csv stem}.json` next to the CSV.
    pub write_json: bool,
    /// Also write per-product split files.
    pub split: bool,
}

impl RunOptions {
    fn apply(&self, filter: QueryFilter) -> Result<QueryFilter> {
        match &self.category {
            Some(name) => filter.category(name),
            None => Ok(filter),
        }
    }

    fn write_extras(&self, crawler: &PriceCrawler, dataset: &AggregatedDataset, csv_name: &str) -> Result<()> {
        if self.write_json {
            let stem = Path::new(csv_name)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| csv_name.to_string());
            crawler.exporter().export_json(dataset, &format!("{}.json", stem))?;
        }
        if self.split {
            crawler.exporter().split_by_product(dataset)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Demo run
// ---------------------------------------------------------------------------

/// Filter of the demo run: the [`DEMO_LOOKBACK_DAYS`](config::DEMO_LOOKBACK_DAYS)
/// days up to `today`, product [`DEMO_PRODUCT`](config::DEMO_PRODUCT).
pub fn demo_filter(today: NaiveDate) -> QueryFilter {
    let start = today - TimeDelta::days(config::DEMO_LOOKBACK_DAYS);
    QueryFilter::new()
        .start_date(&start.to_string())
        .end_date(&today.to_string())
        .product_name(config::DEMO_PRODUCT)
}

/// Run the built-in demo scenario and print a summary to `out`.
///
/// Returns the process exit code, which is always 0: failures are printed,
/// not signalled.
pub fn run_demo<W: Write>(
    crawler: &PriceCrawler,
    today: NaiveDate,
    options: &RunOptions,
    out: &mut W,
) -> i32 {
    if let Err(e) = demo(crawler, today, options, out) {
        tracing::error!(error = %e, "demo run failed");
        let _ = writeln!(out, "Error: {}", e);
    }
    0
}

fn demo<W: Write>(
    crawler: &PriceCrawler,
    today: NaiveDate,
    options: &RunOptions,
    out: &mut W,
) -> Result<Option<String>> {
    let filter = options.apply(demo_filter(today))?;
    writeln!(
        out,
        "Search: {} to {}, product {}",
        filter.start_date.as_deref().unwrap_or(""),
        filter.end_date.as_deref().unwrap_or(""),
        config::DEMO_PRODUCT
    )?;

    let dataset = crawler.aggregate(&filter);
    let file_name = if dataset.is_empty() {
        writeln!(out, "No records fetched ({})", dataset.stop_reason())?;
        None
    } else {
        let name = crawler.exporter().export_csv(&dataset, config::DEMO_FILE_HINT)?;
        options.write_extras(crawler, &dataset, &name)?;
        writeln!(
            out,
            "Saved to {}",
            crawler.exporter().result_dir().join(&name).display()
        )?;
        Some(name)
    };

    writeln!(out)?;
    writeln!(out, "Summary:")?;
    writeln!(out, "Total records: {}", dataset.count())?;
    if !dataset.is_empty() {
        writeln!(out, "First 3 records:")?;
        for record in dataset.records().iter().take(3) {
            let row = record.csv_row();
            writeln!(
                out,
                "  product: {}, avg price: {}, origin: {}",
                row[2], row[4], row[7]
            )?;
        }
    }
    Ok(file_name)
}

// ---------------------------------------------------------------------------
// Service run
// ---------------------------------------------------------------------------

/// Arguments of the service run.
#[derive(Debug, Clone)]
pub struct ServiceArgs {
    pub start_date: String,
    pub end_date: String,
    pub product_name: String,
    pub options: RunOptions,
}

/// The single JSON line printed by the service run.
///
/// Serializes as `{"file_name": "..."}` or `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceOutcome {
    FileName(String),
    Error(String),
}

impl ServiceOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            ServiceOutcome::FileName(_) => 0,
            ServiceOutcome::Error(_) => 1,
        }
    }

    pub fn to_line(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"error":"failed to encode result"}"#.to_string())
    }
}

/// Run the pipeline for the given arguments and print one JSON line to
/// `out`. Returns the process exit code.
///
/// A run that collects no records at all is reported as an error.
pub fn run_service<W: Write>(crawler: &PriceCrawler, args: &ServiceArgs, out: &mut W) -> i32 {
    let outcome = match service(crawler, args) {
        Ok(file_name) => ServiceOutcome::FileName(file_name),
        Err(e) => {
            tracing::error!(error = %e, "service run failed");
            ServiceOutcome::Error(e.to_string())
        }
    };
    if let Err(e) = writeln!(out, "{}", outcome.to_line()).and_then(|_| out.flush()) {
        tracing::error!(error = %e, "failed to write result line");
        return 1;
    }
    outcome.exit_code()
}

fn service(crawler: &PriceCrawler, args: &ServiceArgs) -> Result<String> {
    let start = parse_date(&args.start_date)?;
    let end = parse_date(&args.end_date)?;
    if args.product_name.trim().is_empty() {
        return Err(CrawlerError::InvalidArgument(
            "product name must not be empty".to_string(),
        ));
    }

    let filter = args.options.apply(
        QueryFilter::new()
            .start_date(&start.to_string())
            .end_date(&end.to_string())
            .product_name(&args.product_name),
    )?;

    let dataset = crawler.aggregate(&filter);
    if dataset.is_empty() {
        return Err(CrawlerError::NoData(format!(
            "{} between {} and {} ({})",
            args.product_name,
            start,
            end,
            dataset.stop_reason()
        )));
    }

    let file_name = crawler.exporter().export_csv(&dataset, &args.product_name)?;
    args.options.write_extras(crawler, &dataset, &file_name)?;
    Ok(file_name)
}
