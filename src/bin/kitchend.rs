use arrrg::CommandLine;
use arrrg_derive::CommandLine;
use tokio::net::TcpListener;
use tokio::signal;

use kitchen::cli_utils;
use kitchen::{LoggingConfig, ServerConfig, StoreConfig, create_router};

#[derive(CommandLine, Default, PartialEq, Eq)]
struct Args {
    #[arrrg(optional, "Host to bind the HTTP server")]
    host: Option<String>,
    #[arrrg(optional, "Port to bind the HTTP server")]
    port: Option<u16>,
    #[arrrg(optional, "PostgreSQL database URL")]
    database_url: Option<String>,
    #[arrrg(flag, "Serve from a process-local in-memory store")]
    in_memory: bool,
    #[arrrg(flag, "Enable verbose logging")]
    verbose: bool,
}

const USAGE: &str = "USAGE: kitchend [OPTIONS]";

const HELP_TEXT: &str = r#"kitchend - recipe and cuisine daemon

USAGE:
    kitchend [OPTIONS]

OPTIONS:
    --host <HOST>           Host to bind the HTTP server [default: 127.0.0.1]
    --port <PORT>           Port to bind the HTTP server [default: 5000]
    --database-url <URL>    PostgreSQL database URL [default: $DATABASE_URL or postgres://localhost/kitchen]
    --in-memory             Serve from a process-local in-memory store
    --verbose               Enable verbose logging

ENVIRONMENT:
    DATABASE_URL            Database URL when --database-url is not given
    RUST_LOG                Log filter directives (overrides --verbose)
    LOG_FORMAT              Set to "json" for JSON log lines

DESCRIPTION:
    Serves recipes and cuisines over a JSON HTTP API. The database connection
    is opened on first use, so the server starts even when the database is down.

    The server supports graceful shutdown via Ctrl+C.

API ENDPOINTS:
    Recipes:
      GET    /recipes           List all recipes, newest first
      POST   /recipes           Create a recipe
      GET    /recipes/{id}      Get a recipe
      PATCH  /recipes/{id}      Update selected recipe fields
      DELETE /recipes/{id}      Delete a recipe

    Cuisines:
      GET    /cuisines?slug=    List cuisines, optionally by slug
      POST   /cuisines          Create a cuisine
      GET    /cuisines/{id}     Get a cuisine
      PATCH  /cuisines/{id}     Update selected cuisine fields
      DELETE /cuisines/{id}     Delete a cuisine

    Health:
      GET    /health            Process liveness
      GET    /db/health         Database reachability"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, free) = Args::from_command_line(USAGE);

    if cli_utils::wants_help(&free) {
        println!("{}", HELP_TEXT);
        return Ok(());
    }
    cli_utils::reject_free_arguments(&free, USAGE);

    let config = ServerConfig::from_options(
        args.host,
        args.port,
        StoreConfig::from_options(args.database_url, args.in_memory),
        args.verbose,
    );

    if let Err(e) = LoggingConfig::from_env(config.verbose).init() {
        cli_utils::exit_with_error(&format!("Failed to initialize logging: {}", e));
    }

    let store = config
        .store
        .open()
        .unwrap_or_else(|e| cli_utils::exit_with_error(&format!("Failed to open store: {}", e)));
    let app = create_router(store);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    tracing::info!(address = %addr, store = %config.store, "kitchend listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("kitchend stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received, draining connections"),
        Err(e) => {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    }
}
