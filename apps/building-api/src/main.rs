//! Building API Server
//!
//! Serves the building footprint table to the 3D viewer and answers
//! free-text questions about it. Provides:
//!
//! - Building listing, search, proximity and statistics endpoints
//! - The keyword chatbot (`POST /api/chat`)
//! - `import`: load an osmium GeoJSON export into the database

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use building_store::{BuildingStore, MemoryStore, PgBuildingStore, PgStoreConfig};
use clap::{Args, Parser, Subcommand};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod error;
mod handlers;
mod import;
mod models;
mod state;

use state::AppState;

/// Command-line interface for the building API
#[derive(Parser, Debug)]
#[command(name = "building-api", version)]
#[command(about = "REST API and chat endpoint for the 3D building viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Load buildings from a GeoJSON FeatureCollection
    Import(ImportArgs),
}

#[derive(Args, Debug)]
struct DatabaseArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Maximum connections in the pool
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value = "10")]
    max_connections: u32,
}

impl DatabaseArgs {
    fn config(&self) -> anyhow::Result<PgStoreConfig> {
        let url = self
            .database_url
            .as_deref()
            .context("DATABASE_URL is not set (use --database-url or --memory)")?;
        let mut config = PgStoreConfig::new(url);
        config.max_connections = self.max_connections;
        Ok(config)
    }
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3001")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Serve from an in-process store instead of PostgreSQL
    #[arg(long)]
    memory: bool,

    /// GeoJSON file loaded into the in-process store at startup
    #[arg(long, requires = "memory")]
    seed: Option<PathBuf>,

    #[command(flatten)]
    database: DatabaseArgs,
}

#[derive(Args, Debug)]
struct ImportArgs {
    /// GeoJSON FeatureCollection exported by osmium
    #[arg(short, long)]
    file: PathBuf,

    /// Delete existing buildings first
    #[arg(long)]
    replace: bool,

    #[command(flatten)]
    database: DatabaseArgs,
}

/// Build the API router
pub fn build_router(state: AppState) -> Router {
    // CORS configuration for the browser viewer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Building endpoints
        .route("/api/buildings", get(handlers::list_buildings))
        .route("/api/buildings/tallest", get(handlers::tallest_building))
        .route("/api/buildings/search", get(handlers::search_buildings))
        .route("/api/buildings/nearby", get(handlers::nearby_buildings))
        .route("/api/buildings/statistics", get(handlers::building_statistics))
        .route("/api/buildings/random", get(handlers::random_buildings))
        .route(
            "/api/buildings/type/:building_type",
            get(handlers::buildings_by_type),
        )
        .route("/api/buildings/:id", get(handlers::get_building))
        // Chat
        .route("/api/chat", post(handlers::chat))
        .route("/api/chat/suggestions", get(handlers::chat_suggestions))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let directives = if cli.verbose {
        "building_api=debug,building_store=debug,chat_engine=debug,tower_http=debug"
    } else {
        "building_api=info,tower_http=debug"
    };
    let mut filter = EnvFilter::from_default_env();
    for directive in directives.split(',') {
        filter = filter.add_directive(directive.parse()?);
    }
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Import(args) => run_import(args).await,
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    info!("Initializing building API...");
    let state = if args.memory {
        let store = MemoryStore::new();
        if let Some(seed) = &args.seed {
            import::import_file(&store, seed, false).await?;
        }
        info!("Using in-memory building store");
        AppState::in_memory(store)
    } else {
        AppState::connect(&args.database.config()?).await?
    };
    let store = state.store.clone();

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", args.host, args.port))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Building API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down, closing database pool");
    store.close().await;
    Ok(())
}

async fn run_import(args: ImportArgs) -> anyhow::Result<()> {
    let store = PgBuildingStore::connect(&args.database.config()?).await?;
    store.ensure_schema().await?;

    let summary = import::import_file(&store, &args.file, args.replace).await;
    store.close().await;
    let summary = summary?;

    info!(
        "Import finished: {} imported, {} skipped, {} removed",
        summary.imported, summary.skipped, summary.cleared
    );
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
