//! Typed records returned by the POS sales API.
//!
//! The backend is loose about types (amounts arrive as numeric strings, ids
//! are sometimes missing), so every field deserializes leniently and the
//! accessors do the coercion.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::data_helpers::{
    display_date, format_money, lenient_i64, lenient_string, parse_amount, parse_integer,
    parse_timestamp_day, NOT_AVAILABLE,
};

pub const GUEST_CUSTOMER: &str = "Guest";
pub const UNKNOWN_PRODUCT: &str = "Unknown";
pub const UNKNOWN_CUSTOMER: &str = "Unknown";

// ---------------------------------------------------------------------------
// Payment method
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PaymentMethod {
    Cash,
    Upi,
    Card,
    Other(String),
}

impl PaymentMethod {
    /// Exact, case-sensitive classification; the API spells the three known
    /// methods `Cash`, `UPI` and `Card`.
    pub fn classify(raw: &str) -> Self {
        match raw {
            "Cash" => Self::Cash,
            "UPI" => Self::Upi,
            "Card" => Self::Card,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Cash => "Cash",
            Self::Upi => "UPI",
            Self::Card => "Card",
            Self::Other(s) => s.as_str(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sales
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaleLineItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub manual_product_name: Option<String>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub quantity: Option<Value>,
}

impl SaleLineItem {
    pub fn display_name(&self) -> &str {
        [&self.product_name, &self.manual_product_name]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.trim().is_empty())
            .unwrap_or(UNKNOWN_PRODUCT)
    }

    pub fn unit_price(&self) -> f64 {
        parse_amount(self.price.as_ref())
    }

    pub fn quantity(&self) -> i64 {
        parse_integer(self.quantity.as_ref()).unwrap_or(0)
    }

    /// `Margherita (₹250.00) x 2`
    pub fn describe(&self) -> String {
        format!(
            "{} (₹{}) x {}",
            self.display_name(),
            format_money(self.unit_price()),
            self.quantity()
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub customer_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sale_date: Option<String>,
    #[serde(default)]
    pub total_amount: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub payment_method: Option<String>,
    #[serde(default, deserialize_with = "lenient_line_items")]
    pub sale_details: Vec<SaleLineItem>,
}

fn lenient_line_items<'de, D>(deserializer: D) -> Result<Vec<SaleLineItem>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

impl SaleRecord {
    /// Coerced sale total; `0.0` when absent or unparsable.
    pub fn amount(&self) -> f64 {
        parse_amount(self.total_amount.as_ref())
    }

    /// Calendar day of the sale, `None` when the timestamp is missing or
    /// malformed.
    pub fn sale_day(&self) -> Option<NaiveDate> {
        self.sale_date.as_deref().and_then(parse_timestamp_day)
    }

    pub fn date_key(&self) -> Option<String> {
        self.sale_day().map(crate::data_helpers::date_key)
    }

    pub fn method(&self) -> Option<PaymentMethod> {
        self.payment_method
            .as_deref()
            .filter(|m| !m.is_empty())
            .map(PaymentMethod::classify)
    }

    fn has_customer_name(&self) -> bool {
        self.customer_name
            .as_deref()
            .map(|n| !n.is_empty())
            .unwrap_or(false)
    }

    /// A record is shown when it carries an id, a customer name, or at least
    /// one line item. An id of 0 counts as absent.
    pub fn is_valid(&self) -> bool {
        self.id.map(|id| id != 0).unwrap_or(false)
            || self.has_customer_name()
            || !self.sale_details.is_empty()
    }

    pub fn customer_display(&self) -> &str {
        self.customer_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(GUEST_CUSTOMER)
    }

    pub fn payment_display(&self) -> &str {
        self.payment_method
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(NOT_AVAILABLE)
    }

    pub fn total_quantity(&self) -> i64 {
        self.sale_details.iter().map(SaleLineItem::quantity).sum()
    }

    pub fn product_list(&self) -> String {
        if self.sale_details.is_empty() {
            return "No products".to_string();
        }
        self.sale_details
            .iter()
            .map(SaleLineItem::describe)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn display_date(&self) -> String {
        display_date(self.sale_date.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Customers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    #[serde(default, deserialize_with = "lenient_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub created_at: Option<String>,
}

impl CustomerRecord {
    pub fn name(&self) -> &str {
        self.first_name.as_deref().unwrap_or_default()
    }

    pub fn phone(&self) -> &str {
        self.phone.as_deref().unwrap_or_default()
    }

    pub fn created_display(&self) -> String {
        display_date(self.created_at.as_deref())
    }
}

/// Customer block of a sales-history response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryCustomer {
    #[serde(default, alias = "first_name", deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerHistory {
    pub customer: HistoryCustomer,
    #[serde(default, deserialize_with = "lenient_history")]
    pub history: Vec<SaleRecord>,
}

/// `null` reads as no history; rows that are not sale objects are skipped.
fn lenient_history<'de, D>(deserializer: D) -> Result<Vec<SaleRecord>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let rows = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(rows)) => rows,
        Some(Value::Null) | None => return Ok(Vec::new()),
        Some(other) => {
            warn!(kind = %json_kind(&other), "ignoring non-array sales history");
            return Ok(Vec::new());
        }
    };

    let total = rows.len();
    let history: Vec<SaleRecord> = rows
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|row| serde_json::from_value(row).ok())
        .collect();
    if history.len() != total {
        warn!(
            dropped = total - history.len(),
            total, "sales history contained malformed records"
        );
    }
    Ok(history)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl CustomerHistory {
    /// Placeholder returned when the history lookup fails.
    pub fn unknown(phone: &str) -> Self {
        Self {
            customer: HistoryCustomer {
                name: Some(UNKNOWN_CUSTOMER.to_string()),
                phone: Some(phone.to_string()),
                extra: Map::new(),
            },
            history: Vec::new(),
        }
    }

    pub fn lifetime_total(&self) -> f64 {
        self.history.iter().map(SaleRecord::amount).sum()
    }
}
