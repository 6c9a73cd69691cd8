use crate::config;
use crate::error::{CrawlerError, Result};

// ---------------------------------------------------------------------------
// QueryFilter — parameters narrowing a price request
// ---------------------------------------------------------------------------

/// Parameters narrowing a price request.
///
/// Every field is optional; present fields are sent verbatim to the price
/// service. Page index and page size are supplied per request, see
/// [`QueryFilter::to_form`].
///
/// ```rust
/// use agri_price_crawler::QueryFilter;
///
/// let filter = QueryFilter::new()
///     .start_date("2024-01-01")
///     .end_date("2024-12-31")
///     .product_name("苹果");
/// let form = filter.to_form(1, 100);
/// assert_eq!(form[0], ("current", "1".to_string()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilter {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub parent_category_id: Option<String>,
    pub category_id: Option<String>,
    pub product_name: Option<String>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish date lower bound (`YYYY-MM-DD`), sent as `pubDateStartTime`.
    pub fn start_date(mut self, date: &str) -> Self {
        self.start_date = Some(date.to_string());
        self
    }

    /// Publish date upper bound (`YYYY-MM-DD`), sent as `pubDateEndTime`.
    pub fn end_date(mut self, date: &str) -> Self {
        self.end_date = Some(date.to_string());
        self
    }

    /// First-level category id, sent as `prodPcatid`.
    pub fn parent_category_id(mut self, id: &str) -> Self {
        self.parent_category_id = Some(id.to_string());
        self
    }

    /// Second-level category id, sent as `prodCatid`.
    pub fn category_id(mut self, id: &str) -> Self {
        self.category_id = Some(id.to_string());
        self
    }

    /// Product-name substring, sent as `prodName`.
    pub fn product_name(mut self, name: &str) -> Self {
        self.product_name = Some(name.to_string());
        self
    }

    /// Resolve a first-level category by display name (e.g. `"水果"`).
    ///
    /// Fails with [`CrawlerError::InvalidArgument`] for names not listed in
    /// [`config::categories`].
    pub fn category(self, name: &str) -> Result<Self> {
        let categories = config::categories();
        let id = categories.get(name.trim()).ok_or_else(|| {
            CrawlerError::InvalidArgument(format!("Unknown category: {}", name))
        })?;
        Ok(self.parent_category_id(&id.to_string()))
    }

    /// Form fields for one page request.
    ///
    /// `current` and `limit` always come first; optional keys are included
    /// only when set and non-empty.
    pub fn to_form(&self, page: u32, page_size: u32) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("current", page.to_string()),
            ("limit", page_size.to_string()),
        ];
        let optional = [
            ("pubDateStartTime", &self.start_date),
            ("pubDateEndTime", &self.end_date),
            ("prodPcatid", &self.parent_category_id),
            ("prodCatid", &self.category_id),
            ("prodName", &self.product_name),
        ];
        for (key, value) in optional {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                form.push((key, v.to_string()));
            }
        }
        form
    }
}
