use crate::infra::{database_config, open_store, parse_date, parse_reference_month, ReferenceMonth};
use chrono::NaiveDate;
use clap::Args;
use doctrack::documents::{AlertFilter, AlertsView, Clock, DocumentService};
use doctrack::error::AppError;
use doctrack::store::seed_reference_data;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct SeedArgs {
    /// SQLite database to create or update (defaults to APP_DATABASE_PATH)
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct AlertsArgs {
    /// SQLite database to read (defaults to APP_DATABASE_PATH)
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
    /// Restrict to one document category ("todas" for every category)
    #[arg(long)]
    pub(crate) category: Option<String>,
    /// Reference month (YYYY-MM) bounding the expiration dates
    #[arg(long, value_parser = parse_reference_month)]
    pub(crate) month: Option<ReferenceMonth>,
    /// Evaluation date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Print the renewal report as CSV instead of a summary
    #[arg(long)]
    pub(crate) csv: bool,
}

pub(crate) fn run_seed(args: SeedArgs) -> Result<(), AppError> {
    let config = database_config(args.database)?;
    let store = open_store(&config)?;
    let report = seed_reference_data(&store)?;

    println!("Seeded {}", config.path.display());
    println!("- branches inserted: {}", report.branches);
    println!("- document types inserted: {}", report.document_types);
    println!(
        "- alert parameters: {}",
        if report.alert_parameters {
            "inserted"
        } else {
            "kept existing"
        }
    );
    Ok(())
}

pub(crate) fn run_alerts(args: AlertsArgs) -> Result<(), AppError> {
    let AlertsArgs {
        database,
        category,
        month,
        today,
        csv,
    } = args;

    let config = database_config(database)?;
    let store = Arc::new(open_store(&config)?);
    let clock = today.map_or(Clock::System, Clock::Fixed);
    let service = DocumentService::with_clock(store, clock);
    let today = service.today();

    let filter = month
        .and_then(ReferenceMonth::window)
        .unwrap_or_default()
        .with_category(category.as_deref());

    if csv {
        let report = service.alert_report_csv(&filter, today)?;
        print!("{report}");
        return Ok(());
    }

    let alerts = service.list_alerts(&filter, today)?;
    let horizon_days = service.alert_configuration().horizon_days();
    render_alerts(horizon_days, &filter, today, &alerts);
    Ok(())
}

fn render_alerts(horizon_days: i64, filter: &AlertFilter, today: NaiveDate, alerts: &AlertsView) {
    println!("Renewal alerts (evaluated {today}, horizon {horizon_days} days)");
    match (filter.start, filter.end) {
        (Some(start), Some(end)) => println!("Window: {start} -> {end}"),
        _ => println!("Window: all expiration dates"),
    }
    if let Some(category) = &filter.category {
        println!("Category: {category}");
    }
    println!(
        "{} related documents | {} need attention",
        alerts.related.len(),
        alerts.upcoming.len()
    );

    if alerts.upcoming.is_empty() {
        println!("Nothing to renew.");
        return;
    }

    println!("Upcoming:");
    for view in &alerts.upcoming {
        println!(
            "  - [{}] {} ({}, {}) expires {} | {}",
            view.status,
            view.title,
            view.document_type,
            view.branch,
            view.expiration,
            view.responsible
        );
    }
}
