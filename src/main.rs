//! Demo server for the onion middleware framework.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ net::server (axum/hyper, TraceLayer)
//!                         │
//!                         ▼
//!                     RequestHandler
//!                         │
//!          ┌──────────────┴──────────────────────────┐
//!          │ RequestIdMiddleware → AccessLog →        │
//!          │ ResponseTime → hello                     │
//!          └──────────────┬──────────────────────────┘
//!                         ▼
//!     Client Response ◀── respond / on_error
//! ```

use std::path::PathBuf;

use clap::Parser;

use onion::config::{self, Config};
use onion::middleware::{AccessLog, RequestIdExt, RequestIdMiddleware, ResponseTime};
use onion::net::server;
use onion::observability::logging;
use onion::{Application, HttpServer, Shutdown};

#[derive(Debug, Parser)]
#[command(name = "onion", version, about = "Onion-model middleware demo server")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address, overriding the configuration.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "onion starting");
    tracing::info!(
        bind_address = %config.server.bind_address,
        env = %config.app.env,
        proxy = config.app.proxy,
        "Configuration loaded"
    );

    let mut app = Application::new(config.app.clone());
    app.metrics(config.observability.metrics_enabled)
        .register(RequestIdMiddleware)
        .register(AccessLog)
        .register(ResponseTime)
        .register_fn(|ctx, next| {
            Box::pin(async move {
                next.run(ctx).await?;
                if ctx.body().is_empty() && ctx.path() == "/" {
                    let greeting = serde_json::json!({
                        "message": "Hello from onion",
                        "request_id": ctx.request_id(),
                    });
                    ctx.set_body(greeting);
                }
                Ok(())
            })
        });

    let listener = server::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_ctrl_c();

    HttpServer::new(app.into_handler())
        .run(listener, server_shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
