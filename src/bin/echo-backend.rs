//! Minimal upstream for trying the proxy by hand.
//!
//! Replies to every request with the Host header and path it received,
//! which shows exactly what the proxy forwarded.

use axum::{extract::Request, http::header, Router};
use clap::Parser;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "echo-backend")]
#[command(about = "Echo upstream that replies with the requested host and path", long_about = None)]
struct Cli {
    /// Listening port number
    #[arg(long, env = "PORT", default_value_t = 8081)]
    port: u16,
}

async fn echo(request: Request) -> String {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    format!("{}{}\n", host, request.uri().path())
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let listener = TcpListener::bind(("0.0.0.0", cli.port)).await?;
    tracing::info!(address = %listener.local_addr()?, "Echo backend listening");

    let app = Router::new().fallback(echo);
    axum::serve(listener, app).await
}
