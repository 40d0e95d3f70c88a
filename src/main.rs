use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use terminwatch::config::Config;
use terminwatch::fetcher::AvailabilityFetcher;
use terminwatch::notify::{BeepNotifier, Notifier, SilentNotifier};
use terminwatch::scheduler::PollScheduler;
use terminwatch::server::{self, AppState, SubscriberRegistry};
use terminwatch::store::SnapshotStore;

#[derive(Parser)]
#[command(
    name = "terminwatch",
    version,
    about = "Watches a Berlin.de service page for open appointment slots and streams availability to WebSocket subscribers",
    long_about = None
)]
struct Cli {
    /// URL of the service page to watch, e.g. "https://service.berlin.de/dienstleistung/120686/"
    #[arg(short = 'u', long = "url")]
    url: Option<String>,

    /// Your email address; required by the Berlin.de appointments team and
    /// included in every request this tool makes
    #[arg(short = 'e', long = "email")]
    email: Option<String>,

    /// A unique ID for this script, used by the Berlin.de team to identify
    /// requests from you
    #[arg(short = 'i', long = "id", default_value = "")]
    script_id: String,

    /// Port for the WebSocket server
    #[arg(short = 'p', long = "port", default_value_t = 80)]
    port: u16,

    /// Suppress the audible alert when appointments are found
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Seconds between upstream polls (180 is the minimum allowed upstream)
    #[arg(long = "poll-interval", default_value_t = 180)]
    poll_interval: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, default_value = "text")]
    log_format: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    let service_page_url = match cli.url {
        Some(url) => url,
        None => ask_question(
            "What is the URL of the service you want to watch?",
            "This is the service.berlin.de page for the service you want an appointment for. \
             For example, \"https://service.berlin.de/dienstleistung/120686/\"",
        )?,
    };

    let email = match cli.email {
        Some(email) => email,
        None => ask_question(
            "What is your email address?",
            "It will be included in the requests this script makes. \
             It's required by the Berlin.de appointments team.",
        )?,
    };

    let config = Config {
        service_page_url,
        email,
        script_id: cli.script_id,
        port: cli.port,
        quiet: cli.quiet,
        poll_interval_secs: cli.poll_interval,
    };
    config.validate()?;

    let fetcher = AvailabilityFetcher::new(&config).context("failed to set up the fetcher")?;
    tracing::info!(
        service_page = %config.service_page_url,
        listing = %fetcher.appointments_url(),
        "watching for appointments"
    );

    let store = Arc::new(SnapshotStore::new());
    let registry = Arc::new(SubscriberRegistry::new());
    let state = AppState {
        store: store.clone(),
        registry: registry.clone(),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "WebSocket server listening");

    tokio::spawn(async move {
        if let Err(e) = server::serve(listener, state).await {
            tracing::error!("server error: {e}");
        }
    });

    let notifier: Box<dyn Notifier> = if config.quiet {
        Box::new(SilentNotifier)
    } else {
        Box::new(BeepNotifier)
    };

    PollScheduler::new(fetcher, store, registry, notifier, config.poll_interval())
        .run()
        .await;

    Ok(())
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("terminwatch=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("terminwatch=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    Ok(())
}

/// Prompt the operator for a value the command line did not provide
fn ask_question(question: &str, instructions: &str) -> Result<String> {
    println!("\x1b[1m{question}\x1b[0m");
    if !instructions.is_empty() {
        println!("{instructions}");
    }
    print!("> ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
