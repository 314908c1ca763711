use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use english_chat_relay::config::{load_config, Config, LogFormat, ObservabilityConfig};
use english_chat_relay::function::{invoke, FunctionEvent};
use english_chat_relay::relay::ChatRelay;
use english_chat_relay::routes::create_router;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Server bind address
        #[arg(short, long, env = "RELAY_BIND_ADDR")]
        bind: Option<String>,
    },
    /// Handle a single function event and print the response JSON
    Invoke {
        /// Event file; reads stdin when omitted
        #[arg(short, long)]
        event: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    init_tracing(&config.observability)?;

    let relay = Arc::new(ChatRelay::from_config(&config).context("Failed to create chat relay")?);

    let command = args.command.unwrap_or_else(|| Command::Serve {
        bind: std::env::var("RELAY_BIND_ADDR").ok(),
    });

    match command {
        Command::Serve { bind } => serve(config, relay, bind).await,
        Command::Invoke { event } => invoke_once(&relay, event).await,
    }
}

async fn serve(config: Config, relay: Arc<ChatRelay>, bind: Option<String>) -> Result<()> {
    info!("Starting English chat relay server...");

    // Determine bind address
    let bind_addr = bind.unwrap_or(config.server.bind_addr.clone());

    let app = create_router(
        relay,
        config.server.request_body_limit_bytes,
        config.server.request_timeout(),
    );

    info!("Server starting on {}", bind_addr);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    info!("English chat relay running at http://{}/", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.graceful_shutdown_duration()))
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn invoke_once(relay: &ChatRelay, event_path: Option<PathBuf>) -> Result<()> {
    let raw = match event_path {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read event file {}", path.display()))?,
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read event from stdin")?;
            raw
        }
    };

    let event: FunctionEvent = serde_json::from_str(&raw).context("Invalid function event")?;
    let response = invoke(relay, event).await;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn init_tracing(observability: &ObservabilityConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "english_chat_relay={level},tower_http={level}",
            level = observability.tracing_level
        )
        .into()
    });

    // Logs go to stderr so `invoke` output stays machine-readable
    let registry = tracing_subscriber::registry().with(filter);
    match observability.log_format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    }
    .context("Failed to initialize tracing")?;

    Ok(())
}

async fn shutdown_signal(grace_period: Duration) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        },
    }

    // Give in-flight upstream calls some time to finish
    if grace_period > Duration::ZERO {
        info!("Waiting {}s for ongoing requests to complete...", grace_period.as_secs());
        tokio::time::sleep(grace_period).await;
    }
}
