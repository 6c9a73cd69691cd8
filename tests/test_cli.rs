//! End-to-end tests of the demo and service runs against a local mock server.

mod common;

use std::path::PathBuf;
use std::time::Duration;

use agri_price_crawler::cli::{self, Cli, RunOptions, ServiceArgs, ServiceOutcome};
use clap::error::ErrorKind;
use clap::Parser;
use agri_price_crawler::PriceCrawler;
use chrono::NaiveDate;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRICE_PATH: &str = "/getPriceData.html";
const UNREACHABLE: &str = "http://127.0.0.1:1/getPriceData.html";

fn crawler(endpoint: &str, result_dir: &std::path::Path) -> PriceCrawler {
    PriceCrawler::builder()
        .endpoint(endpoint)
        .result_dir(result_dir)
        .max_pages(5)
        .page_size(2)
        .page_delay(Duration::ZERO)
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap()
}

/// Page 1 holds two records, page 2 is empty.
async fn mount_two_pages(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(PRICE_PATH))
        .and(body_string_contains("current=1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::page_body(vec![
            common::record_json("富士苹果", 5.0),
            common::record_json("红星苹果", 4.0),
        ])))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path(PRICE_PATH))
        .and(body_string_contains("current=2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::page_body(vec![])))
        .mount(server)
        .await;
}

fn service_args(options: RunOptions) -> ServiceArgs {
    ServiceArgs {
        start_date: "2023-01-01".to_string(),
        end_date: "2023-12-31".to_string(),
        product_name: "apple".to_string(),
        options,
    }
}

fn single_line_json(out: &[u8]) -> serde_json::Map<String, serde_json::Value> {
    let text = String::from_utf8(out.to_vec()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 1, "expected exactly one line, got {:?}", text);
    serde_json::from_str::<serde_json::Value>(lines[0])
        .unwrap()
        .as_object()
        .cloned()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Argument parsing
// ---------------------------------------------------------------------------

#[test]
fn no_arguments_selects_the_demo_run() {
    let args = Cli::try_parse_from(["agri-price-crawler"]).unwrap();
    assert!(args.service_args().is_none());
    assert_eq!(args.page_size, 100);
    assert_eq!(args.max_pages, 10);
}

#[test]
fn all_three_service_flags_select_the_service_run() {
    let args = Cli::try_parse_from([
        "agri-price-crawler",
        "--start_time",
        "2023-01-01",
        "--end-time",
        "2023-12-31",
        "--product_name",
        "苹果",
        "--category",
        "水果",
        "--json",
    ])
    .unwrap();

    let service = args.service_args().unwrap();
    assert_eq!(service.start_date, "2023-01-01");
    assert_eq!(service.end_date, "2023-12-31");
    assert_eq!(service.product_name, "苹果");
    assert_eq!(service.options.category.as_deref(), Some("水果"));
    assert!(service.options.write_json);
    assert!(!service.options.split);
}

#[test]
fn partial_service_flags_are_a_usage_error() {
    let err = Cli::try_parse_from(["agri-price-crawler", "--start_time", "2023-01-01"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    assert_eq!(err.exit_code(), 2);

    let err = Cli::try_parse_from([
        "agri-price-crawler",
        "--end_time",
        "2023-12-31",
        "--product_name",
        "苹果",
    ])
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
}

#[test]
fn malformed_date_is_a_usage_error() {
    let err = Cli::try_parse_from([
        "agri-price-crawler",
        "--start_time",
        "2023/01/01",
        "--end_time",
        "2023-12-31",
        "--product_name",
        "苹果",
    ])
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValueValidation);
    assert_eq!(err.exit_code(), 2);
    assert!(err.to_string().contains("invalid date"));
}

#[test]
fn zero_page_size_is_a_usage_error() {
    let err = Cli::try_parse_from(["agri-price-crawler", "--page-size", "0"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValueValidation);
}

// ---------------------------------------------------------------------------
// Service run
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread")]
async fn service_success_prints_file_name_line() {
    let server = MockServer::start().await;
    mount_two_pages(&server).await;
    let endpoint = format!("{}{}", server.uri(), PRICE_PATH);
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().to_path_buf();

    let (code, out) = tokio::task::spawn_blocking(move || {
        let crawler = crawler(&endpoint, &dir);
        let mut out = Vec::new();
        let code = cli::run_service(&crawler, &service_args(RunOptions::default()), &mut out);
        (code, out)
    })
    .await
    .unwrap();

    assert_eq!(code, 0);
    let obj = single_line_json(&out);
    assert_eq!(obj.len(), 1);
    let file_name = obj["file_name"].as_str().unwrap();
    assert!(file_name.starts_with("apple_price_data_"));
    assert!(file_name.ends_with(".csv"));

    let csv_path = tmp.path().join(file_name);
    let content = std::fs::read_to_string(csv_path).unwrap();
    assert_eq!(content.lines().count(), 3);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    let body = String::from_utf8(requests[0].body.clone()).unwrap();
    assert!(body.contains("pubDateStartTime=2023-01-01"));
    assert!(body.contains("pubDateEndTime=2023-12-31"));
    assert!(body.contains("prodName=apple"));
}

#[tokio::test(flavor = "multi_thread")]
async fn service_writes_requested_extras() {
    let server = MockServer::start().await;
    mount_two_pages(&server).await;
    let endpoint = format!("{}{}", server.uri(), PRICE_PATH);
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().to_path_buf();

    let (code, out) = tokio::task::spawn_blocking(move || {
        let crawler = crawler(&endpoint, &dir);
        let options = RunOptions {
            category: Some("水果".to_string()),
            write_json: true,
            split: true,
        };
        let mut out = Vec::new();
        let code = cli::run_service(&crawler, &service_args(options), &mut out);
        (code, out)
    })
    .await
    .unwrap();

    assert_eq!(code, 0);
    let obj = single_line_json(&out);
    let file_name = obj["file_name"].as_str().unwrap();
    let json_name = file_name.replace(".csv", ".json");
    assert!(tmp.path().join(json_name).is_file());

    let split: Vec<PathBuf> = std::fs::read_dir(tmp.path().join("split"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(split.len(), 2);

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8(requests[0].body.clone()).unwrap();
    assert!(body.contains("prodPcatid=1187"));
}

#[test]
fn service_unreachable_endpoint_prints_error_line() {
    let tmp = tempfile::tempdir().unwrap();
    let crawler = crawler(UNREACHABLE, tmp.path());
    let mut out = Vec::new();

    let code = cli::run_service(&crawler, &service_args(RunOptions::default()), &mut out);

    assert_eq!(code, 1);
    let obj = single_line_json(&out);
    assert_eq!(obj.len(), 1);
    assert!(!obj["error"].as_str().unwrap().is_empty());
    // Nothing was written.
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[test]
fn service_rejects_malformed_dates_before_fetching() {
    let tmp = tempfile::tempdir().unwrap();
    let crawler = crawler(UNREACHABLE, tmp.path());
    let mut args = service_args(RunOptions::default());
    args.start_date = "2023/01/01".to_string();
    let mut out = Vec::new();

    let code = cli::run_service(&crawler, &args, &mut out);

    assert_eq!(code, 1);
    let obj = single_line_json(&out);
    assert!(obj["error"].as_str().unwrap().contains("invalid date"));
}

#[test]
fn service_outcome_serializes_to_contract_keys() {
    let ok = ServiceOutcome::FileName("苹果_price_data_20240101_000000.csv".to_string());
    assert_eq!(
        ok.to_line(),
        r#"{"file_name":"苹果_price_data_20240101_000000.csv"}"#
    );
    assert_eq!(ok.exit_code(), 0);

    let err = ServiceOutcome::Error("boom".to_string());
    assert_eq!(err.to_line(), r#"{"error":"boom"}"#);
    assert_eq!(err.exit_code(), 1);
}

// ---------------------------------------------------------------------------
// Demo run
// ---------------------------------------------------------------------------

#[test]
fn demo_filter_covers_the_last_year() {
    let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
    let filter = cli::demo_filter(today);

    assert_eq!(filter.start_date.as_deref(), Some("2023-07-01"));
    assert_eq!(filter.end_date.as_deref(), Some("2024-06-30"));
    assert_eq!(filter.product_name.as_deref(), Some("苹果"));
}

#[tokio::test(flavor = "multi_thread")]
async fn demo_prints_summary_and_writes_csv() {
    let server = MockServer::start().await;
    mount_two_pages(&server).await;
    let endpoint = format!("{}{}", server.uri(), PRICE_PATH);
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().to_path_buf();

    let (code, out) = tokio::task::spawn_blocking(move || {
        let crawler = crawler(&endpoint, &dir);
        let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let mut out = Vec::new();
        let code = cli::run_demo(&crawler, today, &RunOptions::default(), &mut out);
        (code, out)
    })
    .await
    .unwrap();

    assert_eq!(code, 0);
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Total records: 2"));
    assert!(text.contains("product: 富士苹果, avg price: 5.0, origin: 山东"));

    let files: Vec<String> = std::fs::read_dir(tmp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("apple_price_data_"));

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8(requests[0].body.clone()).unwrap();
    assert!(body.contains("pubDateStartTime=2023-07-01"));
}

#[test]
fn demo_failure_still_exits_zero() {
    let tmp = tempfile::tempdir().unwrap();
    let crawler = crawler(UNREACHABLE, tmp.path());
    let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
    let mut out = Vec::new();

    let code = cli::run_demo(&crawler, today, &RunOptions::default(), &mut out);

    assert_eq!(code, 0);
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("No records fetched"));
    assert!(text.contains("Total records: 0"));
}

#[test]
fn demo_reports_unknown_category_without_failing() {
    let tmp = tempfile::tempdir().unwrap();
    let crawler = crawler(UNREACHABLE, tmp.path());
    let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
    let options = RunOptions {
        category: Some("电子产品".to_string()),
        ..Default::default()
    };
    let mut out = Vec::new();

    let code = cli::run_demo(&crawler, today, &options, &mut out);

    assert_eq!(code, 0);
    assert!(String::from_utf8(out).unwrap().contains("Unknown category"));
}
