//! crosspost-server - HTTP dispatcher for multi-channel content publishing

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use libcrosspost::api::app;
use libcrosspost::audit::AuditRecorder;
use libcrosspost::channels::ChannelRouter;
use libcrosspost::credentials::CredentialResolver;
use libcrosspost::db::Database;
use libcrosspost::logging::{self, LogFormat, LoggingConfig};
use libcrosspost::vault::SecretCipher;
use libcrosspost::{Config, PublishService};

#[derive(Parser, Debug)]
#[command(name = "crosspost-server")]
#[command(about = "Multi-channel content publishing dispatcher", long_about = None)]
struct Cli {
    /// Path to the configuration file (defaults to the XDG location,
    /// overridable with CROSSPOST_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address, overriding the configured one (e.g. 0.0.0.0:8087)
    #[arg(short, long)]
    bind: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        LoggingConfig::new(LogFormat::Text, "debug".to_string(), true).init();
    } else {
        logging::init_default();
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load().context("loading config")?,
    };

    if config.server.api_token.is_empty() {
        warn!("No API token configured (server.api_token); all dispatch requests will be rejected");
    }

    let db = Database::new(&config.database.path)
        .await
        .context("opening database")?;

    let cipher = match &config.vault.key {
        Some(key) => Some(SecretCipher::from_base64_key(key).context("loading vault key")?),
        None => {
            warn!("No vault key configured; credentials resolve from process configuration only");
            None
        }
    };

    let resolver = CredentialResolver::new(db.clone(), cipher, config.channel_fallback());
    let router = Arc::new(ChannelRouter::standard(
        reqwest::Client::new(),
        &config.endpoints,
    ));
    let audit = AuditRecorder::spawn(db.clone());
    let service = Arc::new(PublishService::new(db, resolver, router, audit));

    let bind = cli.bind.as_deref().unwrap_or(&config.server.bind);
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {}", bind))?;

    info!("Listening on {}", bind);

    axum::serve(listener, app(service, config.server.api_token.clone()))
        .await
        .context("serving")?;

    Ok(())
}
