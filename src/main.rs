use clap::{Parser, Subcommand};
use serde_json::json;

use pos_sales_dashboard::api::{ApiClient, LoginRequest};
use pos_sales_dashboard::config::DashboardConfig;
use pos_sales_dashboard::filters::FilterScope;
use pos_sales_dashboard::views::{self, CustomersView, DashboardView, SalesReportView};
use pos_sales_dashboard::{diagnostics, rollover};

/// Admin dashboard for the POS sales API
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Headline metrics, payment mix and sales trend
    Dashboard,
    /// Sales history with per-method totals (today's sales unless --all)
    Sales {
        /// Include every day instead of today only
        #[arg(long)]
        all: bool,
        /// Case-insensitive customer name search (with --all)
        #[arg(long)]
        name: Option<String>,
        /// Exact sale date, YYYY-MM-DD (with --all)
        #[arg(long)]
        date: Option<String>,
        /// Payment method: Cash, UPI or Card (with --all)
        #[arg(long)]
        method: Option<String>,
    },
    /// Customer list
    Customers {
        /// Match on first name or phone
        #[arg(long)]
        search: Option<String>,
    },
    /// Sales history for one customer
    History {
        /// Customer phone number
        phone: String,
    },
    /// Check staff credentials against the login endpoint
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "POS_DASHBOARD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Build and platform information
    About,
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _log_guard = pos_sales_dashboard::init_logging();

    let config = DashboardConfig::from_env();
    let client = ApiClient::new(&config)?;

    match args.command {
        Command::Dashboard => {
            let mut dashboard = DashboardView::default();
            dashboard.load(&client).await;
            print_json(&json!({
                "state": dashboard.state(),
                "dashboard": dashboard.snapshot(rollover::local_today()),
            }))?;
        }
        Command::Sales {
            all,
            name,
            date,
            method,
        } => {
            let mut report = SalesReportView::new();
            report.load(&client).await;
            if all {
                report.set_scope(FilterScope::All);
                report.set_name_query(name.as_deref().unwrap_or_default());
                report.set_date(date.as_deref().unwrap_or_default());
                report.set_payment_method(method.as_deref().unwrap_or_default());
            }
            let summary = report.summary();
            let rows = report.rows();
            print_json(&json!({
                "state": report.state(),
                "summary": summary,
                "rows": rows,
            }))?;
            report.shutdown().await;
        }
        Command::Customers { search } => {
            let mut customers = CustomersView::default();
            customers.load(&client).await;
            customers.set_search(search.as_deref().unwrap_or_default());
            print_json(&json!({
                "state": customers.state(),
                "rows": customers.rows(),
            }))?;
        }
        Command::History { phone } => {
            let lookup = views::lookup_customer_history(&client, &phone).await;
            if let Some(notice) = &lookup.notice {
                eprintln!("{notice}");
            }
            print_json(&lookup)?;
        }
        Command::Login { email, password } => {
            let request = LoginRequest::new(&email, &password);
            let body = client.login(&request).await?;
            print_json(&body)?;
        }
        Command::About => print_json(&diagnostics::get_about_info())?,
    }

    Ok(())
}
