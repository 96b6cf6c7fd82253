//! GEDSys - Geographic Event Detection System CLI
//!
//! The `gedsys` command turns a geographic event definition into CEP engine
//! artifacts and manages their lifecycle on the engine.
//!
//! ## Commands
//!
//! - `render`: Generate the artifact set into a local directory
//! - `deploy`: Upload the artifact set to the CEP server over SFTP
//! - `undeploy`: Tear down a previously deployed artifact set
//! - `run`: Full lifecycle: deploy, stream observations, tear down
//! - `push`: Post one observation payload to a receiver endpoint
//! - `listen`: Receive publisher notifications and count them

use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

use gedsys_core::{
    undeploy_record, DeploymentRecord, DeploymentReport, EventHandler, GedsysConfig,
    GeographicEvent,
};
use gedsys_transport::{
    serve_notifications, stream_all, ListenerState, LocalDirStore, ObservationsBuffer, SensorApi,
    SftpStore, StreamGenerator,
};

#[derive(Parser)]
#[command(name = "gedsys")]
#[command(author = "GeoSmart Systems")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Geographic Event Detection System (GEDSys)", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the artifact set for an event into a local directory
    Render {
        /// Path to the event definition (JSON)
        #[arg(short, long)]
        event: PathBuf,

        /// Path to the system configuration file
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// Output directory for the generated artifacts
        #[arg(short, long, default_value = "artifacts")]
        out: PathBuf,

        /// Target URL for the generated publisher
        #[arg(short, long, default_value = "http://localhost:8280/endpoint")]
        target: String,
    },

    /// Deploy an event's artifact set to the CEP server
    Deploy {
        /// Path to the event definition (JSON)
        #[arg(short, long)]
        event: PathBuf,

        /// Path to the system configuration file
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// Target URL for the generated publisher
        #[arg(short, long)]
        target: String,

        /// Where to persist the deployment record for later teardown
        #[arg(short, long, default_value = ".gedsys/record.json")]
        record: PathBuf,
    },

    /// Tear down a previously deployed artifact set
    Undeploy {
        /// Path to the system configuration file
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// Deployment record written by `deploy`
        #[arg(short, long, default_value = ".gedsys/record.json")]
        record: PathBuf,
    },

    /// Deploy, stream observations until the event expires, then tear down
    Run {
        /// Path to the event definition (JSON)
        #[arg(short, long)]
        event: PathBuf,

        /// Path to the system configuration file
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// Target URL for the generated publisher
        #[arg(short, long)]
        target: String,

        /// SensorThings API root URL
        #[arg(long)]
        api_url: String,

        /// SensorThings API display name
        #[arg(long, default_value = "sensorthings")]
        api_name: String,

        /// Page size for observation requests
        #[arg(long, default_value = "200")]
        page_size: usize,

        /// Maximum number of concurrent stream generators
        #[arg(short, long, default_value = "4")]
        workers: usize,

        /// Seconds the engine gets to pick up the deployed artifacts
        #[arg(long, default_value = "10")]
        settle_secs: u64,

        /// Streaming duration in seconds (overrides the event's temporal
        /// validity)
        #[arg(long)]
        duration_secs: Option<i64>,
    },

    /// Post one observation payload to a receiver endpoint
    Push {
        /// Receiver endpoint URL
        #[arg(short, long)]
        receiver: String,

        /// Path to the observation payload (JSON)
        #[arg(short, long)]
        observation: PathBuf,
    },

    /// Receive publisher notifications and count them (Ctrl-C to stop)
    Listen {
        /// Address to bind the notification sink to
        #[arg(short, long, default_value = "0.0.0.0:8280")]
        bind: SocketAddr,

        /// Maximum number of notifications handled concurrently
        #[arg(short, long, default_value = "4")]
        workers: usize,
    },
}

/// 0 on full success, 2 when some transfers failed, 1 when none succeeded.
fn report_exit(report: &DeploymentReport) -> u8 {
    if report.fully_succeeded() {
        0
    } else if report.succeeded_count() > 0 {
        2
    } else {
        1
    }
}

fn print_report(verb: &str, report: &DeploymentReport) {
    for outcome in &report.outcomes {
        match &outcome.status {
            gedsys_core::ArtifactStatus::Failed { cause } => {
                println!("  ✗ {} {} ({})", outcome.kind, outcome.remote_path, cause);
            }
            _ => println!("  ✓ {} {}", outcome.kind, outcome.remote_path),
        }
    }
    println!(
        "{}: {}/{} artifacts ({})",
        verb,
        report.succeeded_count(),
        report.outcomes.len(),
        report.event_id
    );
}

fn load_event(path: &Path) -> Result<GeographicEvent> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read event definition: {:?}", path))?;
    GeographicEvent::from_json(&text)
        .with_context(|| format!("Invalid event definition: {:?}", path))
}

fn write_record(path: &Path, record: &DeploymentRecord) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create record directory: {:?}", parent))?;
    }
    let json = serde_json::to_string_pretty(record)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write record: {:?}", path))
}

fn read_record(path: &Path) -> Result<DeploymentRecord> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("No deployment record at {:?}; nothing to undeploy", path))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid deployment record: {:?}", path))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    gedsys_core::init_tracing(cli.json, level);

    let code = match cli.command {
        Commands::Render {
            event,
            config,
            out,
            target,
        } => cmd_render(&event, &config, &out, &target).await,
        Commands::Deploy {
            event,
            config,
            target,
            record,
        } => cmd_deploy(&event, &config, &target, &record).await,
        Commands::Undeploy { config, record } => cmd_undeploy(&config, &record).await,
        Commands::Run {
            event,
            config,
            target,
            api_url,
            api_name,
            page_size,
            workers,
            settle_secs,
            duration_secs,
        } => {
            cmd_run(
                &event,
                &config,
                &target,
                &api_url,
                &api_name,
                page_size,
                workers,
                settle_secs,
                duration_secs,
            )
            .await
        }
        Commands::Push {
            receiver,
            observation,
        } => cmd_push(&receiver, &observation).await,
        Commands::Listen { bind, workers } => cmd_listen(bind, workers).await,
    }?;
    Ok(ExitCode::from(code))
}

/// Generate the artifact set into a local directory
async fn cmd_render(
    event_path: &Path,
    config_path: &Path,
    out: &Path,
    target: &str,
) -> Result<u8> {
    let event = load_event(event_path)?;
    let config = GedsysConfig::from_file(config_path)?;

    let store = LocalDirStore::new(out);
    let mut handler = EventHandler::new(event, config.system.cep);
    let report = handler.deploy(target, &store).await?;

    print_report("Rendered", &report);
    println!("Artifacts written under {:?}", out);
    Ok(report_exit(&report))
}

/// Deploy an event's artifact set over SFTP and persist the record
async fn cmd_deploy(
    event_path: &Path,
    config_path: &Path,
    target: &str,
    record_path: &Path,
) -> Result<u8> {
    let event = load_event(event_path)?;
    let config = GedsysConfig::from_file(config_path)?;

    let store = SftpStore::new(config.system.cep.clone());
    let mut handler = EventHandler::new(event, config.system.cep);
    let report = handler.deploy(target, &store).await?;

    write_record(record_path, handler.record())?;
    print_report("Deployed", &report);
    println!("Record written to {:?}", record_path);
    Ok(report_exit(&report))
}

/// Tear down everything a persisted deployment record lists
async fn cmd_undeploy(config_path: &Path, record_path: &Path) -> Result<u8> {
    let config = GedsysConfig::from_file(config_path)?;
    let mut record = read_record(record_path)?;

    let store = SftpStore::new(config.system.cep);
    let report = undeploy_record(&mut record, &store).await;

    if record.is_empty() {
        std::fs::remove_file(record_path)
            .with_context(|| format!("Failed to remove record: {:?}", record_path))?;
        println!("Record {:?} removed", record_path);
    } else {
        // Failed removals stay recorded so a later retry can finish.
        write_record(record_path, &record)?;
        println!("Record {:?} kept ({} paths remain)", record_path, record.total_artifacts());
    }

    print_report("Undeployed", &report);
    Ok(report_exit(&report))
}

/// Full lifecycle: deploy, stream observations until expiration, tear down
#[allow(clippy::too_many_arguments)]
async fn cmd_run(
    event_path: &Path,
    config_path: &Path,
    target: &str,
    api_url: &str,
    api_name: &str,
    page_size: usize,
    workers: usize,
    settle_secs: u64,
    duration_secs: Option<i64>,
) -> Result<u8> {
    let event = load_event(event_path)?;
    let config = GedsysConfig::from_file(config_path)?;

    let expiration = match duration_secs {
        Some(secs) => Utc::now() + ChronoDuration::seconds(secs),
        None => event
            .temporal
            .validity
            .parse::<DateTime<Utc>>()
            .with_context(|| {
                format!(
                    "Event validity is not a timestamp: {:?} (use --duration-secs)",
                    event.temporal.validity
                )
            })?,
    };

    // Check the data source before anything lands on the engine.
    let api = SensorApi::new(api_name, api_url);
    let status = api
        .ping()
        .await
        .with_context(|| format!("SensorThings API unreachable: {api_url}"))?;
    if !(200..300).contains(&status) {
        anyhow::bail!("SensorThings API at {api_url} answered {status}");
    }

    let store = SftpStore::new(config.system.cep.clone());
    let mut handler = EventHandler::new(event, config.system.cep);
    let artifacts = handler.build_artifacts(target)?;

    let deploy_report = handler.deploy(target, &store).await?;
    print_report("Deployed", &deploy_report);

    if !deploy_report.fully_succeeded() {
        // Partial deployments never stream; clean up whatever landed.
        let undeploy_report = handler.undeploy(&store).await;
        print_report("Undeployed", &undeploy_report);
        return Ok(1);
    }

    info!(settle_secs, "waiting for the engine to pick up the artifacts");
    tokio::time::sleep(Duration::from_secs(settle_secs)).await;

    let extent = handler
        .event()
        .extent
        .first()
        .cloned()
        .context("Event definition has no extent")?;
    let update_frequency = handler.event().update_frequency;

    let mut generators = Vec::with_capacity(artifacts.streams_in.len());
    for (k, stream) in artifacts.streams_in.iter().enumerate() {
        let phenomenon = stream
            .phenomenon_field()
            .context("Input stream without a phenomenon field")?
            .name
            .clone();
        let request = api.observations_request(&extent, &phenomenon, page_size)?;
        let buffer = ObservationsBuffer::new(&api, request)
            .await
            .with_context(|| format!("Failed to fetch observations for {phenomenon}"))?;
        info!(
            phenomenon = %phenomenon,
            sensors = buffer.data.len(),
            "stream generator ready"
        );
        generators.push(StreamGenerator::new(
            handler.receiver_endpoint(k + 1),
            buffer.data,
            stream.clone(),
            expiration,
            update_frequency,
        ));
    }

    let outcome = stream_all(generators, workers).await;
    println!("Streamed {} observations", outcome.total_pushed);
    for (id, result) in &outcome.results {
        match result {
            Ok(pushed) => println!("  ✓ generator {} ({} pushed)", id, pushed),
            Err(e) => println!("  ✗ generator {} ({})", id, e),
        }
    }

    let undeploy_report = handler.undeploy(&store).await;
    print_report("Undeployed", &undeploy_report);

    if outcome.fully_succeeded() && undeploy_report.fully_succeeded() {
        Ok(0)
    } else if outcome.total_pushed > 0 || undeploy_report.succeeded_count() > 0 {
        Ok(2)
    } else {
        Ok(1)
    }
}

/// Post one observation payload to a receiver endpoint
async fn cmd_push(receiver: &str, observation_path: &Path) -> Result<u8> {
    let text = std::fs::read_to_string(observation_path)
        .with_context(|| format!("Failed to read observation: {:?}", observation_path))?;
    let payload: serde_json::Value =
        serde_json::from_str(&text).context("Observation is not valid JSON")?;

    // Engine deployments historically run with stale certificates.
    let client = reqwest::Client::builder()
        .user_agent(concat!("gedsys/", env!("CARGO_PKG_VERSION")))
        .danger_accept_invalid_certs(true)
        .build()
        .context("Failed to create HTTP client")?;

    let response = client
        .post(receiver)
        .json(&payload)
        .send()
        .await
        .with_context(|| format!("Failed to reach receiver: {receiver}"))?;

    let status = response.status();
    println!("{} -> {}", receiver, status);
    if status.is_success() {
        Ok(0)
    } else {
        Ok(1)
    }
}

/// Serve the notification sink until interrupted, then report the count
async fn cmd_listen(bind: SocketAddr, workers: usize) -> Result<u8> {
    let state = Arc::new(ListenerState::new());
    println!("Listening for notifications on http://{bind}/ (Ctrl-C to stop)");

    serve_notifications(bind, Arc::clone(&state), workers)
        .await
        .with_context(|| format!("Notification listener failed on {bind}"))?;

    println!("Received {} notifications", state.received());
    Ok(0)
}
