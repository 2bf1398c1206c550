//! Certificate registry entry point.

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cert_registry::api::{create_router, AppState};
use cert_registry::certificate::CertificateStore;
use cert_registry::config::Config;
use cert_registry::error::AppError;
use cert_registry::metrics;
use cert_registry::qr::QrGenerator;
use cert_registry::utils::shutdown_signal;

/// Certificate issuance and verification service.
#[derive(Parser, Debug)]
#[command(name = "cert-registry")]
#[command(about = "Issue certificates, render verification QR codes, and verify by code")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Look a certificate up in the store file.
    Lookup {
        /// Certificate code.
        code: String,
    },

    /// Render the verification QR image for a code.
    Qr {
        /// Certificate code.
        code: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("cert_registry=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match args.command {
        Some(Command::Serve { port }) => cmd_serve(port.or(args.port)).await,
        Some(Command::CheckConfig) => cmd_check_config(),
        Some(Command::Lookup { code }) => cmd_lookup(&code).await,
        Some(Command::Qr { code }) => cmd_qr(&code).await,
        None => cmd_serve(args.port).await,
    }
}

/// Load configuration, apply CLI overrides, then validate.
fn load_config(port_override: Option<u16>) -> anyhow::Result<Config> {
    let mut config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        AppError::from(e)
    })?;
    config.apply_overrides(port_override);

    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        AppError::InvalidConfig(e)
    })?;

    Ok(config)
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("CERT REGISTRY - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Listen: {}", config.listen_addr());
    println!("  Store: {}", config.store_path.display());
    println!("  Public Dir: {}", config.public_dir.display());
    println!(
        "  QR Codes: {}",
        if config.qr_enabled { "Enabled" } else { "Disabled" }
    );
    println!("  QR Dir: {}", config.qr_dir().display());
    println!("  Verification Base: {}", config.verification_base());
    if !config.public_dir.join("index.html").exists() {
        println!("  WARNING: {} has no index.html", config.public_dir.display());
    }
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Print the stored record for a code.
async fn cmd_lookup(code: &str) -> anyhow::Result<()> {
    let config = load_config(None)?;
    let store = CertificateStore::new(config.store_path.clone());

    match store.find(code).await {
        Some(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        None => Err(anyhow::anyhow!(
            "no certificate with code {} in {}",
            code,
            store.path().display()
        )),
    }
}

/// Render the QR image for a code.
async fn cmd_qr(code: &str) -> anyhow::Result<()> {
    let config = load_config(None)?;
    let generator = QrGenerator::from_config(&config);

    let image = generator.generate(code).await.map_err(AppError::from)?;
    println!("Encoded: {}", generator.verification_url(code)?);
    println!("Written: {}", image.file_path.display());
    println!("Served at: {}", image.web_path);

    Ok(())
}

/// Run the HTTP server.
async fn cmd_serve(port_override: Option<u16>) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let config = load_config(port_override)?;

    info!("Configuration loaded successfully");
    info!("Store: {}", config.store_path.display());
    info!("Public dir: {}", config.public_dir.display());
    info!(
        "QR codes: {}",
        if config.qr_enabled { "enabled" } else { "disabled" }
    );

    let mut app_state = AppState::new(config.clone());
    match metrics::install_prometheus() {
        Ok(handle) => app_state = app_state.with_metrics(handle),
        Err(e) => warn!("Prometheus recorder not installed: {}", e),
    }

    let existing = app_state.store.len().await;
    info!("{} certificates in store", existing);

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server running on {}", listener.local_addr()?);

    let router = create_router(app_state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
