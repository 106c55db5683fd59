//! Dashboard metrics derived from the fetched sale list.
//!
//! Everything here is a pure function over `&[SaleRecord]`; it is cheap
//! enough to recompute on every state change.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::data_helpers::{date_key, NOT_AVAILABLE};
use crate::models::SaleRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BestSellingDay {
    pub date: String,
    pub value: f64,
}

impl Default for BestSellingDay {
    fn default() -> Self {
        Self {
            date: "-".to_string(),
            value: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodCount {
    pub name: String,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: String,
    pub sales: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_sales: f64,
    pub total_orders: usize,
    pub average_order_value: f64,
    pub best_selling_day: BestSellingDay,
    pub payment_methods: Vec<PaymentMethodCount>,
    pub sales_trend: Vec<TrendPoint>,
}

/// Summary cards for the current day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodaySummary {
    pub date: String,
    pub total_sales: f64,
    pub total_orders: usize,
    pub average_order_value: f64,
}

fn average(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

/// Per-day sums in first-seen order. Records without a parsable date are
/// skipped.
fn sales_by_day(sales: &[SaleRecord]) -> Vec<(NaiveDate, f64)> {
    let mut index: HashMap<NaiveDate, usize> = HashMap::new();
    let mut days: Vec<(NaiveDate, f64)> = Vec::new();
    for sale in sales {
        let Some(day) = sale.sale_day() else {
            continue;
        };
        let slot = *index.entry(day).or_insert_with(|| {
            days.push((day, 0.0));
            days.len() - 1
        });
        days[slot].1 += sale.amount();
    }
    days
}

fn payment_method_counts(sales: &[SaleRecord]) -> Vec<PaymentMethodCount> {
    let mut counts: Vec<PaymentMethodCount> = Vec::new();
    for sale in sales {
        let name = sale
            .payment_method
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(NOT_AVAILABLE);
        match counts.iter_mut().find(|c| c.name == name) {
            Some(entry) => entry.value += 1,
            None => counts.push(PaymentMethodCount {
                name: name.to_string(),
                value: 1,
            }),
        }
    }
    counts
}

pub fn process_dashboard_data(sales: &[SaleRecord]) -> DashboardMetrics {
    if sales.is_empty() {
        return DashboardMetrics::default();
    }

    let total_sales: f64 = sales.iter().map(SaleRecord::amount).sum();
    let total_orders = sales.len();
    let days = sales_by_day(sales);

    // Strictly greater: on a tie the earlier day keeps the title.
    let mut best_selling_day = BestSellingDay::default();
    for (day, value) in &days {
        if *value > best_selling_day.value {
            best_selling_day = BestSellingDay {
                date: date_key(*day),
                value: *value,
            };
        }
    }

    let mut trend = days;
    trend.sort_by_key(|(day, _)| *day);
    let sales_trend = trend
        .into_iter()
        .map(|(day, sales)| TrendPoint {
            date: date_key(day),
            sales,
        })
        .collect();

    DashboardMetrics {
        total_sales,
        total_orders,
        average_order_value: average(total_sales, total_orders),
        best_selling_day,
        payment_methods: payment_method_counts(sales),
        sales_trend,
    }
}

/// Share of all orders paid with `method`, as a percentage.
pub fn payment_share(method: &PaymentMethodCount, total_orders: usize) -> f64 {
    if total_orders == 0 {
        0.0
    } else {
        method.value as f64 / total_orders as f64 * 100.0
    }
}

pub fn today_summary(sales: &[SaleRecord], today: NaiveDate) -> TodaySummary {
    let (total_sales, total_orders) = sales
        .iter()
        .filter(|sale| sale.sale_day() == Some(today))
        .fold((0.0, 0usize), |(sum, n), sale| (sum + sale.amount(), n + 1));

    TodaySummary {
        date: date_key(today),
        total_sales,
        total_orders,
        average_order_value: average(total_sales, total_orders),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sale(amount: &str, method: &str, date: &str) -> SaleRecord {
        SaleRecord {
            total_amount: Some(json!(amount)),
            payment_method: Some(method.to_string()),
            sale_date: Some(date.to_string()),
            ..Default::default()
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_input_yields_zero_shape() {
        let metrics = process_dashboard_data(&[]);
        assert_eq!(metrics.total_sales, 0.0);
        assert_eq!(metrics.total_orders, 0);
        assert_eq!(metrics.average_order_value, 0.0);
        assert_eq!(metrics.best_selling_day.date, "-");
        assert_eq!(metrics.best_selling_day.value, 0.0);
        assert!(metrics.payment_methods.is_empty());
        assert!(metrics.sales_trend.is_empty());
    }

    #[test]
    fn test_three_sale_scenario() {
        let sales = vec![
            sale("100.50", "Cash", "2024-01-01"),
            sale("50", "UPI", "2024-01-01"),
            sale("200", "Cash", "2024-01-02"),
        ];
        let metrics = process_dashboard_data(&sales);

        assert!((metrics.total_sales - 350.50).abs() < 1e-9);
        assert_eq!(metrics.total_orders, 3);
        assert_eq!(
            metrics.best_selling_day,
            BestSellingDay {
                date: "2024-01-02".into(),
                value: 200.0
            }
        );
        assert_eq!(
            metrics.payment_methods,
            vec![
                PaymentMethodCount {
                    name: "Cash".into(),
                    value: 2
                },
                PaymentMethodCount {
                    name: "UPI".into(),
                    value: 1
                },
            ]
        );
        assert_eq!(metrics.sales_trend.len(), 2);
        assert_eq!(metrics.sales_trend[0].date, "2024-01-01");
        assert!((metrics.sales_trend[0].sales - 150.5).abs() < 1e-9);
    }

    #[test]
    fn test_unparsable_amount_still_counts_as_order() {
        let sales = vec![sale("abc", "Cash", "2024-01-01"), sale("40", "Card", "2024-01-01")];
        let metrics = process_dashboard_data(&sales);
        assert_eq!(metrics.total_orders, 2);
        assert_eq!(metrics.total_sales, 40.0);
        assert_eq!(metrics.average_order_value, 20.0);
    }

    #[test]
    fn test_average_times_orders_matches_total() {
        let sales = vec![
            sale("19.99", "Cash", "2024-05-01"),
            sale("0.01", "UPI", "2024-05-02"),
            sale("7.33", "Card", "2024-05-02"),
        ];
        let metrics = process_dashboard_data(&sales);
        let rebuilt = metrics.average_order_value * metrics.total_orders as f64;
        assert!((rebuilt - metrics.total_sales).abs() < 1e-9);
    }

    #[test]
    fn test_best_day_tie_keeps_first_seen() {
        let sales = vec![
            sale("100", "Cash", "2024-03-05"),
            sale("100", "Cash", "2024-03-01"),
        ];
        let metrics = process_dashboard_data(&sales);
        assert_eq!(metrics.best_selling_day.date, "2024-03-05");
    }

    #[test]
    fn test_best_day_dominates_every_day() {
        let sales = vec![
            sale("10", "Cash", "2024-03-01"),
            sale("75", "UPI", "2024-03-02"),
            sale("30", "Cash", "2024-03-03"),
            sale("50", "Card", "2024-03-03"),
        ];
        let metrics = process_dashboard_data(&sales);
        for point in &metrics.sales_trend {
            assert!(metrics.best_selling_day.value >= point.sales);
        }
        assert_eq!(metrics.best_selling_day.date, "2024-03-03");
    }

    #[test]
    fn test_trend_sorted_ascending_and_skips_bad_dates() {
        let sales = vec![
            sale("5", "Cash", "2024-02-10"),
            sale("5", "Cash", "not-a-date"),
            sale("5", "Cash", "2023-12-31T23:00:00"),
        ];
        let metrics = process_dashboard_data(&sales);
        let dates: Vec<&str> = metrics.sales_trend.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(dates, vec!["2023-12-31", "2024-02-10"]);
        assert_eq!(metrics.total_sales, 15.0);
    }

    #[test]
    fn test_missing_method_grouped_as_not_available() {
        let mut unknown = sale("5", "", "2024-02-10");
        unknown.payment_method = None;
        let metrics = process_dashboard_data(&[unknown]);
        assert_eq!(metrics.payment_methods[0].name, "N/A");
    }

    #[test]
    fn test_payment_share() {
        let cash = PaymentMethodCount {
            name: "Cash".into(),
            value: 1,
        };
        assert_eq!(payment_share(&cash, 4), 25.0);
        assert_eq!(payment_share(&cash, 0), 0.0);
    }

    #[test]
    fn test_today_summary() {
        let sales = vec![
            sale("120", "Cash", "2024-06-01T10:00:00"),
            sale("80", "UPI", "2024-06-01T18:30:00"),
            sale("999", "Card", "2024-05-31T12:00:00"),
        ];
        let summary = today_summary(&sales, day(2024, 6, 1));
        assert_eq!(summary.date, "2024-06-01");
        assert_eq!(summary.total_orders, 2);
        assert_eq!(summary.total_sales, 200.0);
        assert_eq!(summary.average_order_value, 100.0);

        let quiet = today_summary(&sales, day(2024, 6, 2));
        assert_eq!(quiet.total_orders, 0);
        assert_eq!(quiet.average_order_value, 0.0);
    }
}
