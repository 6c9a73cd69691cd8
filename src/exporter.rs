//! CSV and JSON export of aggregated price data.
//!
//! All artifacts land under a single result directory, created on demand.
//! CSV files start with a UTF-8 byte-order mark so spreadsheet tools open the
//! Chinese column headers correctly.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{Local, NaiveDateTime};

use crate::config;
use crate::error::Result;
use crate::models::{AggregatedDataset, PriceRecord};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Keep alphanumerics, spaces, `-` and `_`; drop everything else and any
/// trailing whitespace.
///
/// Applying it twice gives the same result as applying it once.
///
/// ```rust
/// use agri_price_crawler::exporter::sanitize_file_stem;
///
/// assert_eq!(sanitize_file_stem("苹果/test"), "苹果test");
/// assert_eq!(sanitize_file_stem("red apple "), "red apple");
/// ```
pub fn sanitize_file_stem(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    kept.trim_end().to_string()
}

/// `{sanitized hint}_price_data_{YYYYmmdd_HHMMSS}.csv`
pub fn csv_file_name(product_name_hint: &str, at: NaiveDateTime) -> String {
    format!(
        "{}_price_data_{}.csv",
        sanitize_file_stem(product_name_hint),
        at.format(config::FILE_TIMESTAMP_FORMAT)
    )
}

/// Replace characters that are not allowed in file names on common
/// platforms with `_`.
fn split_file_stem(product_name: &str) -> String {
    product_name
        .chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// SplitFile
// ---------------------------------------------------------------------------

/// A per-product CSV found in the split directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitFile {
    pub file_name: String,
    pub path: PathBuf,
    /// Product name the file belongs to.
    pub variety: String,
    /// `YYYYmmdd_HHMMSS` part of the file name, when present.
    pub timestamp: Option<String>,
    pub size: u64,
    pub modified: SystemTime,
}

/// Split `{variety}_{date}_{time}` into variety and timestamp.
fn parse_split_stem(stem: &str) -> (String, Option<String>) {
    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() >= 3 {
        let n = parts.len();
        (
            parts[..n - 2].join("_"),
            Some(format!("{}_{}", parts[n - 2], parts[n - 1])),
        )
    } else {
        (stem.to_string(), None)
    }
}

// ---------------------------------------------------------------------------
// Exporter
// ---------------------------------------------------------------------------

/// Writes aggregated datasets into a result directory.
#[derive(Debug, Clone)]
pub struct Exporter {
    result_dir: PathBuf,
}

impl Exporter {
    /// Create an exporter, creating `result_dir` if it does not exist.
    pub fn new<P: AsRef<Path>>(result_dir: P) -> Result<Self> {
        let dir = result_dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { result_dir: dir })
    }

    pub fn result_dir(&self) -> &Path {
        &self.result_dir
    }

    pub fn split_dir(&self) -> PathBuf {
        self.result_dir.join(config::SPLIT_DIR)
    }

    /// Write the dataset as indented UTF-8 JSON to `file_name` inside the
    /// result directory. Non-ASCII text is written as-is.
    pub fn export_json(&self, dataset: &AggregatedDataset, file_name: &str) -> Result<PathBuf> {
        let path = self.result_dir.join(file_name);
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, dataset)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        tracing::info!(path = %path.display(), records = dataset.count(), "saved JSON export");
        Ok(path)
    }

    /// Write the dataset as CSV named after `product_name_hint` and the
    /// current local time. Returns the generated file name.
    pub fn export_csv(&self, dataset: &AggregatedDataset, product_name_hint: &str) -> Result<String> {
        self.export_csv_at(dataset, product_name_hint, Local::now().naive_local())
    }

    /// Like [`export_csv`](Self::export_csv) with an explicit timestamp.
    ///
    /// An empty dataset produces a header-only file.
    pub fn export_csv_at(
        &self,
        dataset: &AggregatedDataset,
        product_name_hint: &str,
        at: NaiveDateTime,
    ) -> Result<String> {
        let file_name = csv_file_name(product_name_hint, at);
        let path = self.result_dir.join(&file_name);
        write_csv(&path, &config::CSV_HEADER, dataset.records().iter().map(PriceRecord::csv_row))?;
        tracing::info!(path = %path.display(), records = dataset.count(), "saved CSV export");
        Ok(file_name)
    }

    /// Write one CSV per product name into the split directory, using the
    /// current local time in the file names.
    pub fn split_by_product(&self, dataset: &AggregatedDataset) -> Result<Vec<PathBuf>> {
        self.split_by_product_at(dataset, Local::now().naive_local())
    }

    /// Write one CSV per product name into the split directory.
    ///
    /// Each file is named `{product}_{YYYYmmdd_HHMMSS}.csv` and holds the
    /// specification, average price and publish date (without time of day)
    /// of that product's records, in dataset order. Records without a product
    /// name are skipped. Names that map to the same file stem (`红/星` and
    /// `红:星`) share one file.
    pub fn split_by_product_at(
        &self,
        dataset: &AggregatedDataset,
        at: NaiveDateTime,
    ) -> Result<Vec<PathBuf>> {
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<&PriceRecord>> = HashMap::new();
        for record in dataset.records() {
            let name = record.prod_name.as_deref().unwrap_or("").trim();
            if name.is_empty() {
                continue;
            }
            let stem = split_file_stem(name);
            groups
                .entry(stem.clone())
                .or_insert_with(|| {
                    order.push(stem);
                    Vec::new()
                })
                .push(record);
        }

        let split_dir = self.split_dir();
        fs::create_dir_all(&split_dir)?;
        let timestamp = at.format(config::FILE_TIMESTAMP_FORMAT).to_string();

        let mut written = Vec::with_capacity(order.len());
        for stem in &order {
            let path = split_dir.join(format!("{}_{}.csv", stem, timestamp));
            let rows = groups[stem].iter().map(|r| {
                let row = r.csv_row();
                [
                    row[6].trim().to_string(),
                    row[4].trim().to_string(),
                    r.pub_date_only().to_string(),
                ]
            });
            write_csv(&path, &config::SPLIT_CSV_HEADER, rows)?;
            written.push(path);
        }

        tracing::info!(files = written.len(), dir = %split_dir.display(), "split export by product");
        Ok(written)
    }

    /// List split CSVs, newest first. A missing split directory yields an
    /// empty list.
    pub fn list_split_files(&self) -> Result<Vec<SplitFile>> {
        let split_dir = self.split_dir();
        if !split_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&split_dir)? {
            let entry = entry?;
            let path = entry.path();
            let meta = entry.metadata()?;
            if !meta.is_file() || path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let (variety, timestamp) = parse_split_stem(&stem);
            files.push(SplitFile {
                file_name,
                path,
                variety,
                timestamp,
                size: meta.len(),
                modified: meta.modified()?,
            });
        }

        files.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| b.file_name.cmp(&a.file_name))
        });
        Ok(files)
    }
}

fn write_csv<H, I, R>(path: &Path, header: &[H], rows: I) -> Result<()>
where
    H: AsRef<[u8]>,
    I: IntoIterator<Item = R>,
    R: IntoIterator,
    R::Item: AsRef<[u8]>,
{
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(UTF8_BOM)?;
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(file);
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}
