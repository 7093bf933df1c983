use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use admin_calendar::export::{self, ExportFormat};
use admin_calendar::store::{FilterStore, JsonStore};
use admin_calendar::{
    AppConfig, CalendarController, CalendarError, CalendarService, Environment, FetchRequest,
    HttpSource, Notice, NoticeLevel, ViewState,
};
use anyhow::Context;
use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use shared_types::{CalendarEvent, DateRange, Filters, Pagination};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "admin-calendar")]
#[command(about = "Load, inspect and export the admin activity calendar")]
#[command(
    long_about = "A command-line host for the admin calendar.\n\n\
    Aggregates resume uploads, interviews, new jobs and application deadlines\n\
    from the portal API into calendar events, with caching, endpoint fallbacks\n\
    and CSV/JSON/iCalendar export."
)]
struct Cli {
    /// Portal API base URL the endpoint paths are appended to.
    #[arg(short, long, env = "CALENDAR_API_URL")]
    base_url: Option<String>,

    /// Bearer token sent with every API request.
    #[arg(long, env = "CALENDAR_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Treat the API as production: never substitute sample data.
    #[arg(long)]
    production: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one calendar view and print or export it
    ///
    /// Without --format a summary is printed. With --format the events are
    /// written to --output, or to stdout when no output file is given.
    Fetch {
        #[command(flatten)]
        view: ViewArgs,

        /// Page to load (1-based).
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Records per page requested from the API.
        #[arg(long)]
        limit: Option<u32>,

        /// Export format: csv, json or ics.
        #[arg(short, long, value_name = "FORMAT")]
        format: Option<String>,

        /// File to write the export to. A directory gets a dated file name.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Keep the calendar loaded and refresh it periodically until Ctrl+C
    Watch {
        #[command(flatten)]
        view: ViewArgs,
    },
}

#[derive(Args)]
struct ViewArgs {
    /// First day of the range (YYYY-MM-DD). Defaults to the start of this month.
    #[arg(long, value_name = "DATE")]
    from: Option<NaiveDate>,

    /// Last day of the range (YYYY-MM-DD). Defaults to the end of this month.
    #[arg(long, value_name = "DATE")]
    to: Option<NaiveDate>,

    /// Status filter: all, approved or pending.
    /// Omitted filters fall back to the ones saved by the last run.
    #[arg(long)]
    status: Option<String>,

    /// Role filter: all, jobSeeker, trainer or employer.
    #[arg(long)]
    role: Option<String>,

    /// Event type filter: all, resume, interview, newJob, deadline or custom.
    #[arg(long = "type", value_name = "TYPE")]
    event_type: Option<String>,

    /// Bypass the cache and always hit the API.
    #[arg(long)]
    refresh: bool,
}

impl ViewArgs {
    fn range(&self) -> anyhow::Result<DateRange> {
        let today = Utc::now().date_naive();
        let month_start = today.with_day(1).context("Failed to compute month start")?;
        let month_end = month_start
            .checked_add_months(chrono::Months::new(1))
            .and_then(|next| next.pred_opt())
            .context("Failed to compute month end")?;

        let from = self.from.unwrap_or(month_start);
        let to = self.to.unwrap_or(month_end);

        let start = from.and_hms_opt(0, 0, 0).context("Invalid start date")?;
        let end = to.and_hms_opt(23, 59, 59).context("Invalid end date")?;
        Ok(DateRange::new(Utc.from_utc_datetime(&start), Utc.from_utc_datetime(&end)))
    }

    fn filters(&self, saved: Filters) -> anyhow::Result<Filters> {
        Ok(Filters {
            status: parse_choice(self.status.as_deref(), saved.status, "status")?,
            role: parse_choice(self.role.as_deref(), saved.role, "role")?,
            event_type: parse_choice(self.event_type.as_deref(), saved.event_type, "type")?,
        })
    }

    fn has_filters(&self) -> bool {
        self.status.is_some() || self.role.is_some() || self.event_type.is_some()
    }
}

fn parse_choice<T: DeserializeOwned>(value: Option<&str>, default: T, name: &str) -> anyhow::Result<T> {
    match value {
        Some(value) => serde_json::from_value(serde_json::Value::String(value.to_string()))
            .with_context(|| format!("Invalid {} filter '{}'", name, value)),
        None => Ok(default),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "admin_calendar=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env().context("Failed to load configuration")?;
    if let Some(base_url) = &cli.base_url {
        config.source.base_url = base_url.clone();
    }
    if cli.token.is_some() {
        config.source.api_token = cli.token.clone();
    }
    if cli.production {
        config.environment = Environment::Production;
        config.fetch.environment = Environment::Production;
    }

    tracing::info!(
        "Using portal API at {} ({:?})",
        config.source.base_url,
        config.environment
    );

    let source = HttpSource::new(&config.source).context("Failed to create API client")?;
    let service = Arc::new(CalendarService::new(Arc::new(source), config.fetch.clone()));
    let filter_store = FilterStore::new(JsonStore::in_dir(&config.state_dir));

    match cli.command {
        Commands::Fetch {
            view,
            page,
            limit,
            format,
            output,
        } => {
            let format = format
                .map(|f| f.parse::<ExportFormat>())
                .transpose()
                .context("Invalid export format")?;
            let limit = limit.unwrap_or(config.controller.page_limit);
            handle_fetch(&service, &filter_store, &view, page, limit, format, output).await?
        }
        Commands::Watch { view } => handle_watch(service, filter_store, &config, &view).await?,
    }

    Ok(())
}

async fn handle_fetch(
    service: &CalendarService,
    filter_store: &FilterStore,
    view: &ViewArgs,
    page: u32,
    limit: u32,
    format: Option<ExportFormat>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let filters = view.filters(filter_store.load())?;
    if view.has_filters() {
        filter_store.save(&filters).context("Failed to save filters")?;
    }

    let mut request = FetchRequest::new(
        view.range()?,
        filters,
        Pagination::first_page(limit).with_page(page),
    );
    request.force_refresh = view.refresh;

    let outcome = service
        .fetch(&request, &tokio_util::sync::CancellationToken::new())
        .await
        .context("Failed to load calendar")?;
    print_notices(&outcome.notices);

    let Some(format) = format else {
        println!(
            "{} events ({:?}), page {} of {} records{}",
            outcome.events.len(),
            outcome.origin,
            outcome.pagination.page,
            outcome.pagination.total,
            if outcome.pagination.has_more { ", more available" } else { "" }
        );
        print_events(&outcome.events);
        return Ok(());
    };

    match export::export(&outcome.events, format) {
        Ok(contents) => match output {
            Some(path) => {
                let path = if path.is_dir() {
                    path.join(export::file_name(format, Utc::now()))
                } else {
                    path
                };
                std::fs::write(&path, contents)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!(
                    "Exported {} events to {} ({})",
                    outcome.events.len(),
                    path.display(),
                    format.mime_type()
                );
            }
            None => print!("{}", contents),
        },
        Err(CalendarError::NoData) => println!("No data to export."),
        Err(e) => return Err(e).context("Export failed"),
    }

    Ok(())
}

async fn handle_watch(
    service: Arc<CalendarService>,
    filter_store: FilterStore,
    config: &AppConfig,
    view: &ViewArgs,
) -> anyhow::Result<()> {
    let filters = view.filters(filter_store.load())?;
    let controller = CalendarController::new(
        service,
        filter_store,
        config.controller.clone(),
        config.batch.clone(),
        view.range()?,
    );

    let mut updates = controller.subscribe();
    if view.has_filters() {
        report(controller.set_filters(filters).await);
    } else if view.refresh {
        report(controller.refresh().await);
    } else {
        report(controller.load().await);
    }
    print_state(&controller.snapshot());
    print_notices(&controller.take_notices());

    let refresher = controller.start_auto_refresh();
    tracing::info!(
        "Watching calendar, refreshing every {:?} (Ctrl+C to stop)",
        config.controller.refresh_interval
    );

    let mut last_refresh = controller.snapshot().last_refresh;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                print_notices(&controller.take_notices());
                if !state.loading && state.last_refresh != last_refresh {
                    last_refresh = state.last_refresh;
                    print_state(&state);
                }
            }
        }
    }

    controller.shutdown();
    refresher.await.context("Refresh task panicked")?;
    Ok(())
}

fn report(result: Result<(), CalendarError>) {
    match result {
        Ok(()) | Err(CalendarError::Cancelled) => {}
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn print_state(state: &ViewState) {
    if let Some(error) = &state.error {
        println!("Error: {}", error);
        return;
    }
    let refreshed = state
        .last_refresh
        .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
    println!(
        "{} events between {} and {} (refreshed {})",
        state.events.len(),
        state.date_range.start.format("%Y-%m-%d"),
        state.date_range.end.format("%Y-%m-%d"),
        refreshed
    );
    print_type_counts(&state.events);
}

fn print_events(events: &[CalendarEvent]) {
    if events.is_empty() {
        println!("No events found.");
        return;
    }
    for event in events {
        println!(
            "{}  {:<20} {} ({})",
            event.start.format("%Y-%m-%d %H:%M"),
            event.event_type.label(),
            event.title,
            event.status().as_str()
        );
    }
    print_type_counts(events);
}

fn print_type_counts(events: &[CalendarEvent]) {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for event in events {
        *counts.entry(event.event_type.label()).or_default() += 1;
    }
    for (label, count) in counts {
        println!("    {}: {}", label, count);
    }
}

fn print_notices(notices: &[Notice]) {
    for notice in notices {
        let prefix = match notice.level {
            NoticeLevel::Info => "Info",
            NoticeLevel::Warning => "Warning",
            NoticeLevel::Error => "Error",
        };
        eprintln!("{}: {}", prefix, notice.message);
    }
}
