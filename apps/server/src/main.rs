use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;

use campus_api::{build_router, ApiSettings, AppState};
use campus_config::load as load_config;
use campus_runtime::{telemetry, BackendServices};

#[derive(Parser)]
#[command(name = "campus-backend")]
#[command(about = "Campus backend (HTTP server by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Create or promote an admin account
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "Platform Admin")]
        full_name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server().await,
        Commands::CreateAdmin {
            email,
            phone,
            password,
            full_name,
        } => create_admin(&email, &phone, &password, &full_name).await,
    }
}

async fn run_server() -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    info!("starting Campus backend");

    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let state = AppState::new(
        services.db_pool.clone(),
        services.authenticator.clone(),
        services.billing.clone(),
        services.assistant.clone(),
        ApiSettings::from_config(&config),
    );
    let app = build_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(campus_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

async fn create_admin(
    email: &str,
    phone: &str,
    password: &str,
    full_name: &str,
) -> anyhow::Result<()> {
    telemetry::init_tracing().context("failed to initialise tracing")?;

    let config = load_config().context("failed to load configuration")?;

    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    let user_id = services
        .authenticator
        .ensure_admin(email, phone, password, full_name)
        .await
        .context("failed to ensure admin account")?;

    println!("admin account ready (user id {user_id})");
    Ok(())
}
