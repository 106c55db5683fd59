//! Headless view models for the dashboard screens.
//!
//! Each view owns the records it fetched, its filter state and its load
//! state, and recomputes derived data whenever one of them changes. Rendering
//! is left to the caller; rows carry ready-made display strings.

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::analytics::{self, DashboardMetrics, TodaySummary};
use crate::api::ApiClient;
use crate::data_helpers::format_money;
use crate::filters::{self, FilterScope, FilteredSales, SaleFilter};
use crate::models::{CustomerHistory, CustomerRecord, SaleRecord};
use crate::rollover::DayRollover;

/// Distinguishes "the server had nothing" from "the fetch failed".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "camelCase")]
pub enum LoadState {
    Loading,
    Ready,
    Empty,
    Failed(String),
}

impl LoadState {
    fn for_count(count: usize) -> Self {
        if count == 0 {
            Self::Empty
        } else {
            Self::Ready
        }
    }
}

// ---------------------------------------------------------------------------
// Sales report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRow {
    pub id: String,
    pub customer: String,
    pub products: String,
    pub quantity: i64,
    pub total: String,
    pub payment_mode: String,
    pub date: String,
}

impl From<&SaleRecord> for SaleRow {
    fn from(sale: &SaleRecord) -> Self {
        Self {
            id: sale
                .id
                .filter(|id| *id != 0)
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
            customer: sale.customer_display().to_string(),
            products: sale.product_list(),
            quantity: sale.total_quantity(),
            total: format_money(sale.amount()),
            payment_mode: sale.payment_display().to_string(),
            date: sale.display_date(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub scope: FilterScope,
    pub date: String,
    pub count: usize,
    pub total_sales: String,
    pub cash_sales: String,
    pub upi_sales: String,
    pub card_sales: String,
}

pub struct SalesReportView {
    sales: Vec<SaleRecord>,
    filter: SaleFilter,
    state: LoadState,
    result: FilteredSales,
    /// Day `result` was computed for.
    result_day: NaiveDate,
    today: watch::Receiver<NaiveDate>,
    rollover: Option<DayRollover>,
}

impl Default for SalesReportView {
    fn default() -> Self {
        Self::new()
    }
}

impl SalesReportView {
    /// Report following the local clock. Must be called inside a tokio
    /// runtime; the rollover task lives as long as the view.
    pub fn new() -> Self {
        let rollover = DayRollover::start();
        let mut view = Self::with_today(rollover.subscribe());
        view.rollover = Some(rollover);
        view
    }

    /// Report driven by an external date source.
    pub fn with_today(mut today: watch::Receiver<NaiveDate>) -> Self {
        let result_day = *today.borrow_and_update();
        Self {
            sales: Vec::new(),
            filter: SaleFilter::today(),
            state: LoadState::Loading,
            result: FilteredSales::default(),
            result_day,
            today,
            rollover: None,
        }
    }

    pub async fn load(&mut self, client: &ApiClient) {
        self.state = LoadState::Loading;
        match client.try_fetch_sales().await {
            Ok(sales) => self.set_sales(sales),
            Err(e) => {
                warn!(error = %e, "Failed to load sales history");
                self.sales.clear();
                self.state = LoadState::Failed(e.to_string());
                self.refresh();
            }
        }
    }

    pub fn set_sales(&mut self, sales: Vec<SaleRecord>) {
        self.sales = filters::prepare_sales_history(sales);
        self.state = LoadState::for_count(self.sales.len());
        info!(count = self.sales.len(), "sales history loaded");
        self.refresh();
    }

    pub fn set_scope(&mut self, scope: FilterScope) {
        self.filter.scope = scope;
        if scope == FilterScope::Today {
            self.filter.clear();
        }
        self.refresh();
    }

    pub fn set_name_query(&mut self, query: &str) {
        self.filter.name_query = query.to_string();
        self.refresh();
    }

    pub fn set_date(&mut self, date: &str) {
        self.filter.exact_date = date.trim().to_string();
        self.refresh();
    }

    pub fn set_payment_method(&mut self, method: &str) {
        self.filter.payment_method = method.to_string();
        self.refresh();
    }

    pub fn clear_filters(&mut self) {
        self.filter.clear();
        self.refresh();
    }

    /// Pick up a published date change. Returns `true` when the report was
    /// recomputed.
    pub fn poll_rollover(&mut self) -> bool {
        if !self.today.has_changed().unwrap_or(false) {
            return false;
        }
        self.refresh();
        true
    }

    /// Wait for the next date change and recompute. Returns `false` once the
    /// date source is gone.
    pub async fn next_rollover(&mut self) -> bool {
        if self.today.changed().await.is_err() {
            return false;
        }
        self.refresh();
        true
    }

    fn refresh(&mut self) {
        let today = *self.today.borrow_and_update();
        self.result = filters::apply_filter(&self.sales, &self.filter, today);
        self.result_day = today;
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn filter(&self) -> &SaleFilter {
        &self.filter
    }

    /// Reads below pick up a pending date change first, so a report never
    /// pairs the new date with figures computed for the old one.
    pub fn filtered(&mut self) -> &FilteredSales {
        self.poll_rollover();
        &self.result
    }

    pub fn rows(&mut self) -> Vec<SaleRow> {
        self.poll_rollover();
        self.result.sales.iter().map(SaleRow::from).collect()
    }

    pub fn summary(&mut self) -> SalesSummary {
        self.poll_rollover();
        SalesSummary {
            scope: self.filter.scope,
            date: crate::data_helpers::date_key(self.result_day),
            count: self.result.count,
            total_sales: format_money(self.result.total_sales),
            cash_sales: format_money(self.result.cash_total),
            upi_sales: format_money(self.result.upi_total),
            card_sales: format_money(self.result.card_total),
        }
    }

    /// Stop the rollover task, if this view owns one.
    pub async fn shutdown(mut self) {
        if let Some(rollover) = self.rollover.take() {
            rollover.shutdown().await;
        }
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub today: TodaySummary,
    pub metrics: DashboardMetrics,
    pub payment_shares: Vec<(String, f64)>,
}

pub struct DashboardView {
    sales: Vec<SaleRecord>,
    state: LoadState,
    metrics: DashboardMetrics,
}

impl Default for DashboardView {
    fn default() -> Self {
        Self {
            sales: Vec::new(),
            state: LoadState::Loading,
            metrics: DashboardMetrics::default(),
        }
    }
}

impl DashboardView {
    pub async fn load(&mut self, client: &ApiClient) {
        self.state = LoadState::Loading;
        match client.try_fetch_sales().await {
            Ok(sales) => self.set_sales(sales),
            Err(e) => {
                warn!(error = %e, "Error fetching sales data");
                self.set_sales(Vec::new());
                self.state = LoadState::Failed(e.to_string());
            }
        }
    }

    pub fn set_sales(&mut self, sales: Vec<SaleRecord>) {
        self.metrics = analytics::process_dashboard_data(&sales);
        self.state = LoadState::for_count(sales.len());
        self.sales = sales;
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn metrics(&self) -> &DashboardMetrics {
        &self.metrics
    }

    pub fn snapshot(&self, today: NaiveDate) -> DashboardSnapshot {
        let payment_shares = self
            .metrics
            .payment_methods
            .iter()
            .map(|m| {
                (
                    m.name.clone(),
                    analytics::payment_share(m, self.metrics.total_orders),
                )
            })
            .collect();
        DashboardSnapshot {
            today: analytics::today_summary(&self.sales, today),
            metrics: self.metrics.clone(),
            payment_shares,
        }
    }
}

// ---------------------------------------------------------------------------
// Customers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRow {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub created_date: String,
}

impl From<&CustomerRecord> for CustomerRow {
    fn from(customer: &CustomerRecord) -> Self {
        Self {
            id: customer.id.map(|id| id.to_string()).unwrap_or_default(),
            name: customer.name().to_string(),
            phone: customer.phone().to_string(),
            created_date: customer.created_display(),
        }
    }
}

pub struct CustomersView {
    customers: Vec<CustomerRecord>,
    search: String,
    state: LoadState,
}

impl Default for CustomersView {
    fn default() -> Self {
        Self {
            customers: Vec::new(),
            search: String::new(),
            state: LoadState::Loading,
        }
    }
}

impl CustomersView {
    pub async fn load(&mut self, client: &ApiClient) {
        self.state = LoadState::Loading;
        match client.try_fetch_customers().await {
            Ok(customers) => self.set_customers(customers),
            Err(e) => {
                warn!(error = %e, "Error fetching customer data");
                self.customers.clear();
                self.state = LoadState::Failed(e.to_string());
            }
        }
    }

    pub fn set_customers(&mut self, customers: Vec<CustomerRecord>) {
        self.state = LoadState::for_count(customers.len());
        self.customers = customers;
    }

    pub fn set_search(&mut self, search: &str) {
        self.search = search.to_string();
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn rows(&self) -> Vec<CustomerRow> {
        filters::filter_customers(&self.customers, &self.search)
            .into_iter()
            .map(CustomerRow::from)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Customer history
// ---------------------------------------------------------------------------

/// Result of a history lookup. `notice` carries the blocking alert shown when
/// the lookup failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryLookup {
    pub history: CustomerHistory,
    pub rows: Vec<SaleRow>,
    pub lifetime_total: String,
    pub notice: Option<String>,
}

pub async fn lookup_customer_history(client: &ApiClient, phone: &str) -> HistoryLookup {
    let (history, notice) = match client.try_fetch_customer_history(phone).await {
        Ok(history) => (history, None),
        Err(e) => {
            warn!(error = %e, "Error fetching customer sales history");
            (
                CustomerHistory::unknown(phone),
                Some(format!("Failed to load sales history: {e}")),
            )
        }
    };
    let rows = history.history.iter().map(SaleRow::from).collect();
    HistoryLookup {
        lifetime_total: format_money(history.lifetime_total()),
        rows,
        history,
        notice,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::models::SaleLineItem;
    use serde_json::json;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sale(id: i64, name: &str, amount: &str, method: &str, date: &str) -> SaleRecord {
        SaleRecord {
            id: Some(id),
            customer_name: Some(name.to_string()),
            total_amount: Some(json!(amount)),
            payment_method: Some(method.to_string()),
            sale_date: Some(date.to_string()),
            ..Default::default()
        }
    }

    fn sample_sales() -> Vec<SaleRecord> {
        vec![
            sale(1, "Alice", "100.50", "Cash", "2024-01-01T09:00:00"),
            sale(2, "Bob", "50", "UPI", "2024-01-01T13:00:00"),
            sale(3, "Carol", "200", "Cash", "2024-01-02T11:00:00"),
        ]
    }

    fn unreachable_client() -> ApiClient {
        ApiClient::new(&DashboardConfig::new("http://127.0.0.1:1", "http://127.0.0.1:1")).unwrap()
    }

    #[test]
    fn test_sale_row_display_strings() {
        let mut record = sale(9, "", "abc", "", "bad-date");
        record.sale_details = vec![SaleLineItem {
            product_name: Some("Tea".into()),
            manual_product_name: None,
            price: Some(json!("12")),
            quantity: Some(json!(2)),
        }];
        let row = SaleRow::from(&record);
        assert_eq!(row.id, "9");
        assert_eq!(row.customer, "Guest");
        assert_eq!(row.products, "Tea (₹12.00) x 2");
        assert_eq!(row.quantity, 2);
        assert_eq!(row.total, "0.00");
        assert_eq!(row.payment_mode, "N/A");
        assert_eq!(row.date, "N/A");

        let anonymous = SaleRow::from(&SaleRecord::default());
        assert_eq!(anonymous.id, "-");
    }

    #[test]
    fn test_report_today_scope_follows_date_source() {
        let (tx, rx) = watch::channel(day(2024, 1, 1));
        let mut report = SalesReportView::with_today(rx);
        report.set_sales(sample_sales());

        assert_eq!(report.state(), &LoadState::Ready);
        assert_eq!(report.filtered().count, 2);
        assert_eq!(report.summary().cash_sales, "100.50");
        assert_eq!(report.summary().upi_sales, "50.00");

        assert!(!report.poll_rollover());
        tx.send(day(2024, 1, 2)).unwrap();
        assert!(report.poll_rollover());
        assert_eq!(report.filtered().count, 1);
        assert_eq!(report.summary().date, "2024-01-02");
        assert_eq!(report.summary().total_sales, "200.00");
    }

    #[tokio::test]
    async fn test_report_next_rollover_waits_for_change() {
        let (tx, rx) = watch::channel(day(2024, 1, 1));
        let mut report = SalesReportView::with_today(rx);
        report.set_sales(sample_sales());

        tx.send(day(2024, 1, 2)).unwrap();
        assert!(report.next_rollover().await);
        assert_eq!(report.filtered().count, 1);

        drop(tx);
        assert!(!report.next_rollover().await);
    }

    #[test]
    fn test_report_all_scope_filters_and_clear() {
        let (_tx, rx) = watch::channel(day(2030, 1, 1));
        let mut report = SalesReportView::with_today(rx);
        report.set_sales(sample_sales());
        assert_eq!(report.filtered().count, 0);

        report.set_scope(FilterScope::All);
        assert_eq!(report.filtered().count, 3);
        let ids: Vec<String> = report.rows().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["3", "2", "1"]);

        report.set_payment_method("Cash");
        report.set_date("2024-01-01");
        assert_eq!(report.filtered().count, 1);
        assert_eq!(report.summary().cash_sales, "100.50");

        report.clear_filters();
        assert_eq!(report.filtered().count, 3);
        assert_eq!(report.filter().scope, FilterScope::All);
    }

    #[test]
    fn test_switching_to_today_clears_filters() {
        let (_tx, rx) = watch::channel(day(2024, 1, 1));
        let mut report = SalesReportView::with_today(rx);
        report.set_sales(sample_sales());
        report.set_scope(FilterScope::All);
        report.set_name_query("bob");
        assert_eq!(report.filtered().count, 1);

        report.set_scope(FilterScope::Today);
        assert!(report.filter().is_empty());
        assert_eq!(report.filtered().count, 2);
    }

    #[tokio::test]
    async fn test_report_failed_load_is_distinct_from_empty() {
        let (_tx, rx) = watch::channel(day(2024, 1, 1));
        let mut report = SalesReportView::with_today(rx);
        report.load(&unreachable_client()).await;
        assert!(matches!(report.state(), LoadState::Failed(_)));
        assert_eq!(report.filtered().count, 0);

        report.set_sales(Vec::new());
        assert_eq!(report.state(), &LoadState::Empty);
    }

    #[test]
    fn test_report_reads_pick_up_date_change_without_polling() {
        let (tx, rx) = watch::channel(day(2024, 1, 1));
        let mut report = SalesReportView::with_today(rx);
        report.set_sales(vec![sale(1, "Alice", "100", "Cash", "2024-01-01T09:00:00")]);
        assert_eq!(report.summary().count, 1);

        tx.send(day(2024, 1, 2)).unwrap();
        let summary = report.summary();
        assert_eq!(summary.date, "2024-01-02");
        assert_eq!(summary.count, 0);
        assert_eq!(summary.total_sales, "0.00");
        assert!(report.rows().is_empty());

        tx.send(day(2024, 1, 1)).unwrap();
        assert_eq!(report.rows().len(), 1);
        assert_eq!(report.filtered().count, 1);
    }

    #[tokio::test]
    async fn test_report_owned_rollover_shuts_down() {
        let mut report = SalesReportView::default();
        assert_eq!(report.summary().scope, FilterScope::Today);
        report.shutdown().await;
    }

    #[test]
    fn test_dashboard_snapshot() {
        let mut dashboard = DashboardView::default();
        assert_eq!(dashboard.state(), &LoadState::Loading);
        dashboard.set_sales(sample_sales());

        let snapshot = dashboard.snapshot(day(2024, 1, 1));
        assert_eq!(snapshot.today.total_orders, 2);
        assert!((snapshot.today.total_sales - 150.5).abs() < 1e-9);
        assert_eq!(snapshot.metrics.best_selling_day.date, "2024-01-02");
        assert_eq!(snapshot.payment_shares.len(), 2);
        assert_eq!(snapshot.payment_shares[0].0, "Cash");
        assert!((snapshot.payment_shares[0].1 - 66.666).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_dashboard_failed_load() {
        let mut dashboard = DashboardView::default();
        dashboard.load(&unreachable_client()).await;
        assert!(matches!(dashboard.state(), LoadState::Failed(_)));
        assert_eq!(dashboard.metrics(), &DashboardMetrics::default());
    }

    #[test]
    fn test_customers_view_search() {
        let mut view = CustomersView::default();
        view.set_customers(vec![
            CustomerRecord {
                id: Some(1),
                first_name: Some("Kavya".into()),
                phone: Some("9000000001".into()),
                created_at: Some("2024-02-01T10:00:00".into()),
            },
            CustomerRecord {
                id: Some(2),
                first_name: Some("Rohan".into()),
                phone: Some("9000000002".into()),
                created_at: Some("garbage".into()),
            },
        ]);
        assert_eq!(view.rows().len(), 2);

        view.set_search("kav");
        let rows = view.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].created_date, "01/02/2024");

        view.set_search("0002");
        assert_eq!(view.rows()[0].created_date, "N/A");
    }

    #[tokio::test]
    async fn test_history_lookup_failure_sets_notice() {
        let lookup = lookup_customer_history(&unreachable_client(), "12345").await;
        assert!(lookup.notice.is_some());
        assert_eq!(lookup.history, CustomerHistory::unknown("12345"));
        assert!(lookup.rows.is_empty());
        assert_eq!(lookup.lifetime_total, "0.00");
    }
}
