//! Mock Twitter API server.
//!
//! # Environment Variables
//!
//! - `PORT`: Server port (default: 3000)
//! - `RUST_LOG`: Log filter, e.g. `mock_server=debug` (default: info)

use std::env;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    FmtSubscriber::builder()
        .with_env_filter(log_filter())
        .with_target(true)
        .init();

    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "mock twitter api listening");
    mock_server::run(listener).await
}

/// `RUST_LOG` directives, falling back to `info` when unset or invalid.
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
