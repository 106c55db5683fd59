//! Sales-history and customer-list filtering.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{CustomerRecord, PaymentMethod, SaleRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterScope {
    #[default]
    Today,
    All,
}

/// Filter state of the sales-history view. Empty strings mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleFilter {
    pub scope: FilterScope,
    #[serde(default)]
    pub name_query: String,
    #[serde(default)]
    pub exact_date: String,
    #[serde(default)]
    pub payment_method: String,
}

impl SaleFilter {
    pub fn today() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            scope: FilterScope::All,
            ..Default::default()
        }
    }

    /// Drop the name, date and method filters; the scope is kept.
    pub fn clear(&mut self) {
        self.name_query.clear();
        self.exact_date.clear();
        self.payment_method.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.name_query.trim().is_empty()
            && self.exact_date.is_empty()
            && self.payment_method.is_empty()
    }

    fn matches(&self, sale: &SaleRecord, today: NaiveDate) -> bool {
        if self.scope == FilterScope::Today {
            return sale.sale_day() == Some(today);
        }

        if !self.name_query.trim().is_empty() {
            let query = self.name_query.to_lowercase();
            let name_hit = sale
                .customer_name
                .as_deref()
                .map(|name| name.to_lowercase().contains(&query))
                .unwrap_or(false);
            if !name_hit {
                return false;
            }
        }
        if !self.exact_date.is_empty() && sale.date_key().as_deref() != Some(self.exact_date.as_str())
        {
            return false;
        }
        if !self.payment_method.is_empty()
            && sale.payment_method.as_deref() != Some(self.payment_method.as_str())
        {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredSales {
    pub sales: Vec<SaleRecord>,
    pub count: usize,
    pub total_sales: f64,
    pub cash_total: f64,
    pub upi_total: f64,
    pub card_total: f64,
}

/// Keep displayable records and order them newest id first (missing id = 0).
pub fn prepare_sales_history(sales: Vec<SaleRecord>) -> Vec<SaleRecord> {
    let mut valid: Vec<SaleRecord> = sales.into_iter().filter(SaleRecord::is_valid).collect();
    valid.sort_by(|a, b| b.id.unwrap_or(0).cmp(&a.id.unwrap_or(0)));
    valid
}

pub fn apply_filter(sales: &[SaleRecord], filter: &SaleFilter, today: NaiveDate) -> FilteredSales {
    let mut result = FilteredSales::default();
    for sale in sales.iter().filter(|sale| filter.matches(sale, today)) {
        let amount = sale.amount();
        result.total_sales += amount;
        match sale.method() {
            Some(PaymentMethod::Cash) => result.cash_total += amount,
            Some(PaymentMethod::Upi) => result.upi_total += amount,
            Some(PaymentMethod::Card) => result.card_total += amount,
            _ => {}
        }
        result.sales.push(sale.clone());
    }
    result.count = result.sales.len();
    result
}

/// Case-insensitive match on first name, or a plain substring match on phone.
pub fn filter_customers<'a>(customers: &'a [CustomerRecord], query: &str) -> Vec<&'a CustomerRecord> {
    let needle = query.to_lowercase();
    customers
        .iter()
        .filter(|c| c.name().to_lowercase().contains(&needle) || c.phone().contains(query))
        .collect()
}
