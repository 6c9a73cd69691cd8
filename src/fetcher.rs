//! Single-page requests against the price service.
//!
//! [`HttpFetcher`] posts one form-encoded page request and decodes the JSON
//! body. Every problem along the way (connection, timeout, non-2xx status,
//! malformed body) comes back as [`PageResult::Failure`]; nothing is raised
//! past this boundary.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, REFERER};

use crate::config;
use crate::error::{CrawlerError, Result};
use crate::models::{PageResult, QueryFilter, RawPage};

/// Fetches one page of price records.
///
/// Implementations must not fail: problems are reported as
/// [`PageResult::Failure`].
pub trait PageFetcher {
    fn fetch(&self, filter: &QueryFilter, page: u32, page_size: u32) -> PageResult;
}

impl<F: PageFetcher + ?Sized> PageFetcher for &F {
    fn fetch(&self, filter: &QueryFilter, page: u32, page_size: u32) -> PageResult {
        (**self).fetch(filter, page, page_size)
    }
}

impl<F: PageFetcher + ?Sized> PageFetcher for Box<F> {
    fn fetch(&self, filter: &QueryFilter, page: u32, page_size: u32) -> PageResult {
        (**self).fetch(filter, page, page_size)
    }
}

/// Blocking HTTP fetcher for the price service.
///
/// Sends the browser-like headers the service expects; requests without them
/// are rejected remotely.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    endpoint: String,
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher for `endpoint` with the given per-request timeout.
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static(config::REFERER));
        headers.insert(
            HeaderName::from_static("x-requested-with"),
            HeaderValue::from_static("XMLHttpRequest"),
        );
        let client = Client::builder()
            .user_agent(config::USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_page(&self, filter: &QueryFilter, page: u32, page_size: u32) -> Result<RawPage> {
        if page == 0 {
            return Err(CrawlerError::InvalidArgument(
                "page index starts at 1".to_string(),
            ));
        }
        if page_size == 0 {
            return Err(CrawlerError::InvalidArgument(
                "page size must be positive".to_string(),
            ));
        }

        let form = filter.to_form(page, page_size);
        let mut request = self.client.post(&self.endpoint).form(&form).build()?;
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(config::FORM_CONTENT_TYPE));
        let resp = self.client.execute(request)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CrawlerError::Status {
                status: status.as_u16(),
                url: self.endpoint.clone(),
            });
        }

        let body = resp.text()?;
        let value: serde_json::Value = serde_json::from_str(&body)?;
        if !value.is_object() {
            return Err(CrawlerError::Parse(format!(
                "expected a JSON object, got: {}",
                preview(&body)
            )));
        }
        Ok(serde_json::from_value(value)?)
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, filter: &QueryFilter, page: u32, page_size: u32) -> PageResult {
        match self.request_page(filter, page, page_size) {
            Ok(raw) => {
                tracing::debug!(
                    page,
                    records = raw.records().len(),
                    declared_count = ?raw.count,
                    "decoded price page"
                );
                PageResult::Success(raw)
            }
            Err(e) => {
                tracing::warn!(page, error = %e, "price page request failed");
                PageResult::Failure(e)
            }
        }
    }
}

fn preview(body: &str) -> String {
    const LIMIT: usize = 120;
    match body.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
