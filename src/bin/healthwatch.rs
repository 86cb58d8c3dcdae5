//! healthwatch CLI — operator interface to the health-event monitor.

use clap::{Parser, Subcommand};
use healthwatch::config::Config;
use healthwatch::ingest::{self, HealthClient};
use healthwatch::notify::dispatch::{Dispatcher, WebhookTransport};
use healthwatch::notify::format::Formatter;
use healthwatch::pipeline::Pipeline;
use healthwatch::store::Store;
use healthwatch::store::records::FEED_CHANNEL;
use healthwatch::telemetry::{TelemetryConfig, init_telemetry};
use secrecy::ExposeSecret;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "healthwatch", about = "Cloud health-event monitor")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// One ingestion pass: fetch provider events, write through the store
    Poll,
    /// One pipeline pass: drain the change feed and deliver notifications
    Publish {
        /// Maximum feed entries to process
        #[arg(long, default_value_t = 100)]
        limit: i64,
    },
    /// Run the monitor daemon: periodic ingestion + feed-driven publishing
    Run {
        /// Seconds between ingestion passes
        #[arg(long, default_value_t = 300)]
        ingest_interval: u64,
        /// Fallback seconds between feed drains when no NOTIFY arrives
        #[arg(long, default_value_t = 5)]
        drain_interval: u64,
    },
    /// Stored record operations
    Records {
        #[command(subcommand)]
        action: RecordsAction,
    },
}

#[derive(Subcommand)]
enum RecordsAction {
    /// List stored event records
    List {
        /// Maximum records to show
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
    /// Show a record (full identity or suffix of it)
    Show { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Poll => cmd_poll().await,
        Command::Publish { limit } => cmd_publish(limit).await,
        Command::Run {
            ingest_interval,
            drain_interval,
        } => cmd_run(ingest_interval, drain_interval).await,
        Command::Records { action } => {
            let config = Config::from_env()?;
            let store = Store::connect(config.database_url.expose_secret()).await?;
            store.migrate().await?;

            match action {
                RecordsAction::List { limit } => cmd_records_list(&store, limit).await,
                RecordsAction::Show { id } => cmd_records_show(&store, id).await,
            }
        }
    }
}

fn health_client(config: &Config) -> anyhow::Result<HealthClient> {
    let base = config
        .health_api_url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("HEALTH_API_URL must be set for ingestion"))?;
    Ok(HealthClient::new(base)?)
}

fn build_pipeline(config: &Config, store: Store) -> anyhow::Result<Pipeline<WebhookTransport>> {
    let transport = WebhookTransport::new(&config.environment)?;
    let dispatcher = Dispatcher::new(
        transport,
        config.webhook_url.clone(),
        config.fail_webhook_url.clone(),
    );
    Ok(Pipeline::new(store, Formatter::default(), dispatcher))
}

async fn cmd_poll() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let store = Store::connect(config.database_url.expose_secret()).await?;
    store.migrate().await?;

    let client = health_client(&config)?;
    let summary = ingest::run(&client, &store, config.retention()).await?;
    let purged = store.purge_expired().await?;

    println!(
        "Fetched: {}  Written: {}  Skipped: {}  Purged: {}",
        summary.fetched, summary.written, summary.skipped, purged
    );
    Ok(())
}

async fn cmd_publish(limit: i64) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let store = Store::connect(config.database_url.expose_secret()).await?;
    store.migrate().await?;

    let pipeline = build_pipeline(&config, store)?;
    let summary = pipeline.process_batch(limit).await?;

    println!(
        "Processed: {}  Created: {}  Modified: {}  Suppressed: {}  Malformed: {}  Failed: {}",
        summary.processed,
        summary.created,
        summary.modified,
        summary.suppressed,
        summary.malformed,
        summary.failed
    );
    Ok(())
}

async fn cmd_run(ingest_interval: u64, drain_interval: u64) -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "healthwatch".to_string(),
        environment: config.environment.clone(),
    })?;

    let store = Store::connect(config.database_url.expose_secret()).await?;
    store.migrate().await?;

    let client = health_client(&config)?;

    // Listener for change-feed NOTIFYs; poll fallback covers missed ones.
    let mut listener = sqlx::postgres::PgListener::connect_with(store.pool()).await?;
    listener.listen(FEED_CHANNEL).await?;

    let pipeline = build_pipeline(&config, store)?;
    let mut ingest_tick = tokio::time::interval(std::time::Duration::from_secs(ingest_interval));
    let drain_interval = std::time::Duration::from_secs(drain_interval);

    info!(environment = %config.environment, "healthwatch started");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                return Ok(());
            }
            _ = ingest_tick.tick() => {
                match ingest::run(&client, pipeline.store(), config.retention()).await {
                    Ok(summary) => info!(written = summary.written, "ingestion pass"),
                    Err(e) => error!("ingestion error: {e}"),
                }
                if let Err(e) = pipeline.store().purge_expired().await {
                    warn!("purge error: {e}");
                }
            }
            notif = listener.recv() => {
                if let Err(e) = notif {
                    warn!("listener error: {e}, falling back to poll");
                }
            }
            _ = tokio::time::sleep(drain_interval) => {}
        }

        // Notified or polling — either way, drain whatever is pending.
        if let Err(e) = pipeline.process_batch(100).await {
            error!("publish error: {e}");
        }
    }
}

async fn cmd_records_list(store: &Store, limit: i64) -> anyhow::Result<()> {
    let records = store.list_records(limit).await?;

    if records.is_empty() {
        println!("No event records found.");
        return Ok(());
    }

    println!(
        "{:<40}  {:<8}  {:<12}  {:<14}  UPDATED",
        "EVENT", "STATUS", "SERVICE", "REGION"
    );
    println!("{}", "-".repeat(100));

    for record in &records {
        let short = record.id.short();
        let short_display = if short.len() > 40 { &short[..40] } else { short };
        println!(
            "{:<40}  {:<8}  {:<12}  {:<14}  {}",
            short_display,
            record.status,
            record.service,
            record.region,
            record.last_updated_time.format("%Y-%m-%d %H:%M")
        );
    }

    println!("\n{} record(s)", records.len());
    Ok(())
}

async fn cmd_records_show(store: &Store, id_str: String) -> anyhow::Result<()> {
    // Support suffix matching — ARNs are long, the trailing segment is
    // usually enough.
    let records = store.list_records(500).await?;
    let matches: Vec<_> = records
        .iter()
        .filter(|r| r.id.0 == id_str || r.id.0.ends_with(&id_str))
        .collect();

    let record = match matches.len() {
        0 => anyhow::bail!("no record matching '{id_str}'"),
        1 => matches[0],
        n => anyhow::bail!("{n} records match '{id_str}' — be more specific"),
    };

    println!("Identity:     {}", record.id);
    println!("Status:       {}", record.status);
    println!("Service:      {}", record.service);
    println!("Region:       {}", record.region);
    println!("Type:         {}", record.event_type_code);
    println!("Category:     {}", record.event_type_category);
    println!("Scope:        {}", record.scope);
    println!("Started:      {}", record.start_time);
    println!("Last Update:  {}", record.last_updated_time);
    if let Some(end) = record.end_time {
        println!("Ended:        {end}");
    }
    println!("---");
    println!("{}", record.description);

    Ok(())
}
