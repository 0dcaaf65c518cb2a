// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Webpulse main entry point - CLI, demo session, and reports.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use webpulse::config::{self, RecorderOverrides};
use webpulse::logging::{init_logging, LoggingConfig, LoggingGuard};
use webpulse::sink::MemorySink;
use webpulse::types::{VitalKind, VitalSample};
use webpulse::vitals::{thresholds_for, ManualVitalSource};
use webpulse::{NavigationWatcher, RecorderBuilder, TrackedClient};

/// Webpulse version string.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Webpulse - navigation and web-vitals metrics recorder.
#[derive(Parser)]
#[command(name = "webpulse")]
#[command(author, version, about = "Navigation and web-vitals metrics recorder", long_about = None)]
struct Cli {
    /// Service name attached to every measurement
    #[arg(short, long)]
    service: Option<String>,

    /// Replay cadence in milliseconds
    #[arg(long)]
    replay_interval_ms: Option<u64>,

    /// Output format for reports
    #[arg(short = 'f', long, value_enum, default_value = "text")]
    output_format: OutputFormat,

    /// Show verbose output
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Show debug output
    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Subcommands for webpulse.
#[derive(Subcommand)]
enum Commands {
    /// Run a scripted navigation session and print the captured measurements
    Demo,

    /// Fetch a URL through the tracked client and report its metrics
    Fetch {
        /// URL to request
        url: String,

        /// HTTP method to use
        #[arg(short, long, default_value = "GET")]
        method: String,
    },

    /// Show the vital rating thresholds
    Thresholds,

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Initialize a new configuration file
    Init,

    /// Show version information
    Version,
}

/// Config subcommand actions.
#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(&cli);

    let overrides = RecorderOverrides {
        service_name: cli.service.clone(),
        replay_interval_ms: cli.replay_interval_ms,
        ..Default::default()
    };

    match cli.command {
        Some(command) => handle_command(command, overrides, cli.output_format).await,
        None => run_demo(overrides, cli.output_format).await,
    }
}

fn init_tracing(cli: &Cli) -> Option<LoggingGuard> {
    let config = if cli.debug {
        LoggingConfig::development()
    } else if cli.verbose {
        LoggingConfig::default()
    } else {
        LoggingConfig::default().with_level(tracing::Level::WARN)
    };
    init_logging(&config).ok()
}

async fn handle_command(
    command: Commands,
    overrides: RecorderOverrides,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match command {
        Commands::Demo => {
            run_demo(overrides, format).await?;
        }
        Commands::Fetch { url, method } => {
            handle_fetch(&url, &method, overrides, format).await?;
        }
        Commands::Thresholds => {
            print_thresholds();
        }
        Commands::Config { action } => {
            let workspace_root = std::env::current_dir()?;
            match action {
                Some(ConfigAction::Show) | None => {
                    let config = config::resolve_config(&workspace_root, overrides)?;
                    println!("{}", serde_json::to_string_pretty(&config)?);
                }
            }
        }
        Commands::Init => {
            let workspace_root = std::env::current_dir()?;
            let path = config::init_config(&workspace_root)?;
            println!("Created config file: {}", path.display());
        }
        Commands::Version => {
            println!("webpulse {}", VERSION);
        }
    }
    Ok(())
}

/// Drive the recorder through a short scripted session: two navigations,
/// a set of vitals, and one replay cycle.
async fn run_demo(overrides: RecorderOverrides, format: OutputFormat) -> anyhow::Result<()> {
    let workspace_root = std::env::current_dir()?;
    let mut config = config::resolve_config(&workspace_root, overrides)?;
    // Clamp replay so the demo does not sit idle for seconds.
    config.replay_interval_ms = config.replay_interval_ms.min(400);

    let sink = MemorySink::new();
    let recorder = RecorderBuilder::new()
        .config(config)
        .sink(Arc::new(sink.clone()))
        .build()?;

    if matches!(format, OutputFormat::Text) {
        println!("{} Simulating a navigation session...", "→".cyan());
    }

    // Initial page load.
    recorder.start_route_switch("/dashboard");
    tokio::time::sleep(Duration::from_millis(120)).await;
    recorder.page_render_tracker().record_render();

    // Vitals arrive from the performance observer.
    let source = ManualVitalSource::new();
    recorder.attach_vital_source(&source);
    source.emit(VitalSample::new(VitalKind::TimeToFirstByte, 240.0).with_route("/dashboard"));
    source.emit(VitalSample::new(VitalKind::FirstContentfulPaint, 980.0).with_route("/dashboard"));
    source.emit(
        VitalSample::new(VitalKind::LargestContentfulPaint, 2650.0).with_route("/dashboard"),
    );
    source.emit(VitalSample::new(VitalKind::LayoutShift, 0.04).with_route("/dashboard"));

    // A second navigation flows through the watcher channel.
    let watcher = NavigationWatcher::spawn(recorder.route_tracker());
    watcher.navigate("/reports");
    tokio::time::sleep(Duration::from_millis(80)).await;
    recorder.page_render_tracker().record_render();
    source.emit(VitalSample::new(VitalKind::InteractionLatency, 160.0).with_route("/reports"));
    watcher.shutdown().await;

    // One replay cycle re-emits the cached vitals.
    recorder.start_replay();
    tokio::time::sleep(recorder.config().replay_interval() + Duration::from_millis(100)).await;
    recorder.stop_replay();

    print_report(&sink, format)
}

async fn handle_fetch(
    url: &str,
    method: &str,
    overrides: RecorderOverrides,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let workspace_root = std::env::current_dir()?;
    let config = config::resolve_config(&workspace_root, overrides)?;

    let sink = MemorySink::new();
    let recorder = RecorderBuilder::new()
        .config(config)
        .sink(Arc::new(sink.clone()))
        .build()?;

    let Some(metrics) = recorder.endpoint_metrics() else {
        anyhow::bail!("endpoint tracking is disabled in configuration");
    };

    let method = reqwest::Method::from_bytes(method.to_uppercase().as_bytes())?;
    let client = TrackedClient::new(metrics);

    match client.execute(method, url).await {
        Ok(response) => {
            if matches!(format, OutputFormat::Text) {
                println!("{} {} {}", "✓".green(), url, response.status());
            }
        }
        Err(error) => {
            if matches!(format, OutputFormat::Text) {
                eprintln!("{} {} {}", "✗".red(), url, error);
            }
        }
    }

    print_report(&sink, format)
}

fn print_thresholds() {
    println!("{}", "Vital rating thresholds".bright_blue().bold());
    for kind in VitalKind::ALL {
        let thresholds = thresholds_for(kind);
        println!(
            "  {:<26} good ≤ {:<7} poor > {:<7} [{}]",
            kind.as_str().bright_white(),
            thresholds.good,
            thresholds.poor,
            kind.unit()
        );
    }
}

fn print_report(sink: &MemorySink, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            println!("\n{}", sink.format_report());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&sink.measurements())?);
        }
    }
    Ok(())
}
