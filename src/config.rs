use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

pub const PRICE_ENDPOINT: &str = "http://www.xinfadi.com.cn/getPriceData.html";
pub const REFERER: &str = "http://www.xinfadi.com.cn/priceDetail.html";
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Content type of the page request body, as a browser posts the form.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

pub const DEFAULT_MAX_PAGES: u32 = 10;
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Product queried by the argument-less demo run (apple).
pub const DEMO_PRODUCT: &str = "苹果";
/// File-name hint used for the demo run's CSV.
pub const DEMO_FILE_HINT: &str = "apple";
pub const DEMO_LOOKBACK_DAYS: i64 = 365;

/// `chrono` format of the second-resolution timestamp embedded in file names.
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Sub-directory of the result directory holding per-product split files.
pub const SPLIT_DIR: &str = "split";

/// CSV header, in column order, of the aggregated export.
pub const CSV_HEADER: [&str; 10] = [
    "一级分类",
    "二级分类",
    "品名",
    "最低价",
    "平均价",
    "最高价",
    "规格",
    "产地",
    "单位",
    "发布日期",
];

/// CSV header of a per-product split file.
pub const SPLIT_CSV_HEADER: [&str; 3] = ["规格", "平均价", "发布日期"];

/// First-level product categories of the price service, keyed by display name.
pub fn categories() -> HashMap<&'static str, u32> {
    HashMap::from([
        ("蔬菜", 1186),
        ("水果", 1187),
        ("粮油", 1188),
        ("肉禽蛋", 1189),
        ("水产", 1190),
        ("豆制品", 1203),
        ("调料", 1204),
    ])
}

pub fn default_result_dir() -> PathBuf {
    PathBuf::from("result")
}
