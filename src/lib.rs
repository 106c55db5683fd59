//! POS Sales Dashboard
//!
//! Headless admin dashboard for the point-of-sale backend: fetches sales and
//! customers from the sales API and derives the figures the dashboard screens
//! show (totals, best day, payment mix, sales trend, filtered sales history).

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod analytics;
pub mod api;
pub mod config;
pub mod data_helpers;
pub mod diagnostics;
pub mod filters;
pub mod models;
pub mod rollover;
pub mod views;

pub use analytics::{process_dashboard_data, today_summary, DashboardMetrics};
pub use api::{ApiClient, ApiError, LoginRequest};
pub use config::DashboardConfig;
pub use filters::{apply_filter, prepare_sales_history, FilterScope, FilteredSales, SaleFilter};
pub use models::{CustomerHistory, CustomerRecord, PaymentMethod, SaleLineItem, SaleRecord};
pub use rollover::DayRollover;

/// Initialize structured logging (console on stderr + daily rolling file).
///
/// Keep the returned guard alive for the lifetime of the process; dropping
/// it flushes the file writer.
pub fn init_logging() -> WorkerGuard {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));

    diagnostics::prune_old_logs();

    let log_dir = diagnostics::get_log_dir();
    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(&log_dir, diagnostics::LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!("Starting POS Sales Dashboard v{}", env!("CARGO_PKG_VERSION"));
    guard
}
