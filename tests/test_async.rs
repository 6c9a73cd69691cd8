//! Async wrapper tests. Run with `--features async`.

#![cfg(feature = "async")]

mod common;

use std::time::Duration;

use agri_price_crawler::{AsyncPriceCrawler, QueryFilter};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test(flavor = "multi_thread")]
async fn aggregates_and_exports_off_the_event_loop() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(common::page_body(vec![
            common::record_json("富士苹果", 5.0),
        ])))
        .mount(&server)
        .await;
    let tmp = tempfile::tempdir().unwrap();

    let crawler = AsyncPriceCrawler::builder()
        .endpoint(&format!("{}/getPriceData.html", server.uri()))
        .result_dir(tmp.path())
        .max_pages(3)
        .page_size(1)
        .page_delay(Duration::ZERO)
        .timeout(Duration::from_secs(5))
        .build()
        .await
        .unwrap();

    let dataset = crawler.aggregate(QueryFilter::new()).await.unwrap();
    assert_eq!(dataset.count(), 3);

    let report = crawler
        .crawl_to_csv(QueryFilter::new().product_name("苹果"), "苹果")
        .await
        .unwrap();
    assert_eq!(report.dataset.count(), 3);
    assert!(tmp.path().join(&report.file_name).is_file());

    crawler.close().await.unwrap();
}
