use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};

// ---------------------------------------------------------------------------
// Price — a price cell as the remote service sent it
// ---------------------------------------------------------------------------

/// A price value, kept exactly as the remote service sent it.
///
/// Numbers stay numbers (so `5.0` is written back as `5.0`), strings stay
/// strings. Missing or `null` prices are represented by `Option::None` on
/// [`PriceRecord`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Price {
    Number(Number),
    Text(String),
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Price::Number(n) => write!(f, "{}", n),
            Price::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Price {
    fn from(value: f64) -> Self {
        Number::from_f64(value)
            .map(Price::Number)
            .unwrap_or_else(|| Price::Text(value.to_string()))
    }
}

impl From<&str> for Price {
    fn from(value: &str) -> Self {
        Price::Text(value.to_string())
    }
}

// ---------------------------------------------------------------------------
// PriceRecord — one commodity price observation
// ---------------------------------------------------------------------------

const PROD_CAT: &str = "prodCat";
const PROD_PCAT: &str = "prodPcat";
const PROD_NAME: &str = "prodName";
const LOW_PRICE: &str = "lowPrice";
const AVG_PRICE: &str = "avgPrice";
const HIGH_PRICE: &str = "highPrice";
const SPEC_INFO: &str = "specInfo";
const PLACE: &str = "place";
const UNIT_INFO: &str = "unitInfo";
const PUB_DATE: &str = "pubDate";

/// One commodity price observation as returned by the price service.
///
/// The typed fields are a lenient view of the remote object used for CSV
/// cells: every field is optional, `null` and empty prices are absent, and
/// scalars of an unexpected type are kept as text.
///
/// A decoded record also keeps the remote object in [`source`](Self::source)
/// and serializes that object unchanged. Records built in code (empty
/// `source`) serialize their present typed fields under the remote key names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceRecord {
    pub prod_cat: Option<String>,
    pub prod_pcat: Option<String>,
    pub prod_name: Option<String>,
    pub low_price: Option<Price>,
    pub avg_price: Option<Price>,
    pub high_price: Option<Price>,
    pub spec_info: Option<String>,
    pub place: Option<String>,
    pub unit_info: Option<String>,
    pub pub_date: Option<String>,
    /// The record object exactly as received.
    pub source: Map<String, Value>,
}

impl From<Map<String, Value>> for PriceRecord {
    fn from(source: Map<String, Value>) -> Self {
        Self {
            prod_cat: text_value(source.get(PROD_CAT)),
            prod_pcat: text_value(source.get(PROD_PCAT)),
            prod_name: text_value(source.get(PROD_NAME)),
            low_price: price_value(source.get(LOW_PRICE)),
            avg_price: price_value(source.get(AVG_PRICE)),
            high_price: price_value(source.get(HIGH_PRICE)),
            spec_info: text_value(source.get(SPEC_INFO)),
            place: text_value(source.get(PLACE)),
            unit_info: text_value(source.get(UNIT_INFO)),
            pub_date: text_value(source.get(PUB_DATE)),
            source,
        }
    }
}

impl<'de> Deserialize<'de> for PriceRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Map::<String, Value>::deserialize(deserializer).map(PriceRecord::from)
    }
}

impl Serialize for PriceRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if !self.source.is_empty() {
            return self.source.serialize(serializer);
        }
        let fields = self.typed_fields();
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in fields.iter() {
            if let Some(value) = value {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

impl PriceRecord {
    /// The record's ten exported attributes in CSV column order, with absent
    /// values rendered as empty strings.
    pub fn csv_row(&self) -> [String; 10] {
        [
            text_cell(&self.prod_cat),
            text_cell(&self.prod_pcat),
            text_cell(&self.prod_name),
            price_cell(&self.low_price),
            price_cell(&self.avg_price),
            price_cell(&self.high_price),
            text_cell(&self.spec_info),
            text_cell(&self.place),
            text_cell(&self.unit_info),
            text_cell(&self.pub_date),
        ]
    }

    /// The publish date without any time-of-day suffix
    /// (`"2024-05-01 00:00:00"` becomes `"2024-05-01"`).
    pub fn pub_date_only(&self) -> &str {
        let date = self.pub_date.as_deref().unwrap_or("").trim();
        match date.find(' ') {
            Some(idx) if idx > 0 => &date[..idx],
            _ => date,
        }
    }

    fn typed_fields(&self) -> [(&'static str, Option<Value>); 10] {
        let text = |v: &Option<String>| v.clone().map(Value::String);
        let price = |v: &Option<Price>| {
            v.as_ref().map(|p| match p {
                Price::Number(n) => Value::Number(n.clone()),
                Price::Text(s) => Value::String(s.clone()),
            })
        };
        [
            (PROD_CAT, text(&self.prod_cat)),
            (PROD_PCAT, text(&self.prod_pcat)),
            (PROD_NAME, text(&self.prod_name)),
            (LOW_PRICE, price(&self.low_price)),
            (AVG_PRICE, price(&self.avg_price)),
            (HIGH_PRICE, price(&self.high_price)),
            (SPEC_INFO, text(&self.spec_info)),
            (PLACE, text(&self.place)),
            (UNIT_INFO, text(&self.unit_info)),
            (PUB_DATE, text(&self.pub_date)),
        ]
    }
}

fn text_cell(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn price_cell(value: &Option<Price>) -> String {
    value.as_ref().map(|p| p.to_string()).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Lenient field views
// ---------------------------------------------------------------------------

fn text_value(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

fn price_value(value: Option<&Value>) -> Option<Price> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => Some(Price::Number(n.clone())),
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(Price::Text(s.clone())),
        Some(other) => Some(Price::Text(other.to_string())),
    }
}
