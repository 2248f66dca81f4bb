//! Binary entry point for `helpdesk-router`.
//!
//! This module provides the command-line interface for helpdesk-router with options
//! for configuration file paths and logging verbosity. It initializes the
//! necessary components and either serves the API or runs a one-off command.

use clap::{Parser, Subcommand};
use helpdesk_router::base::{
    config::Config,
    types::{ClassificationRequest, SummaryRequest, Void},
};
use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::{Protocol, WithExportConfig};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt};

/// Helpdesk-router – ticket classification and auto-assignment for a university helpdesk.
///
/// Configuration can come from `config.toml` or `HELPDESK_*` environment variables.
/// Without an OpenAI key, tickets are classified by keyword scoring only.
#[derive(Parser, Debug)]
#[command(version, author, about, long_about = None)]
struct Args {
    /// Override the config file path (optional).
    ///
    /// By default, the router will look for a config file at `.hidden/config.toml`
    /// in the current directory.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,
    /// Increase log verbosity (-v, -vv, etc.).
    ///
    /// Use multiple times to increase verbosity:
    /// - No flag: INFO level
    /// - -v: DEBUG level
    /// - -vv or more: TRACE level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Export spans over OTLP/HTTP (endpoint from `OTEL_EXPORTER_OTLP_ENDPOINT`).
    #[arg(long)]
    otlp: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default).
    Serve,
    /// Classify one ticket and print the result as JSON.
    Classify {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Summarize one ticket and print the summary.
    Summarize {
        #[arg(long)]
        title: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
    },
}

/// Main entry point for the helpdesk-router binary.
///
/// Sets up logging based on verbosity, loads configuration, and runs the command.
#[tokio::main]
async fn main() -> Void {
    let args = Args::parse();

    // Construct the level filter.

    let level = match args.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let level_filter = tracing_subscriber::filter::LevelFilter::from_level(level);

    // Prepare the log layer.

    let stdout = tracing_subscriber::fmt::layer()
        .without_time()
        .with_ansi(true)
        .with_level(true)
        .with_file(false)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);

    // Prepare the otlp layer.

    let otel = if args.otlp {
        let exporter = opentelemetry_otlp::SpanExporter::builder().with_http().with_protocol(Protocol::HttpBinary).build()?;
        let tracer = opentelemetry_sdk::trace::SdkTracerProvider::builder().with_simple_exporter(exporter).build().tracer("helpdesk-router");

        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    tracing_subscriber::registry().with(otel).with(level_filter).with(stdout).init();

    let config = Config::load(args.config.as_deref())?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => helpdesk_router::start(config).await,
        Command::Classify { title, description } => {
            let result = helpdesk_router::classify_once(config, ClassificationRequest::new(title, description)).await?;

            println!("{}", serde_json::to_string_pretty(&result)?);

            Ok(())
        }
        Command::Summarize { title, description } => {
            let summary = helpdesk_router::summarize_once(config, SummaryRequest::Ticket { title, description }).await?;

            println!("{summary}");

            Ok(())
        }
    }
}
