//! hanashi interactive client.
//!
//! Logs in as one user, keeps a WebSocket connection to the server for
//! presence and message events, and reconnects with backoff when it drops.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hanashi-client -- --user-id alice
//! cargo run --bin hanashi-client -- -u bob --url ws://127.0.0.1:3000/ws --api-url http://127.0.0.1:3000
//! ```

use std::time::Duration;

use clap::Parser;

use hanashi_client::{
    ClientConfig,
    connection::{ReconnectPolicy, policy::DEFAULT_MAX_ATTEMPTS},
    run_client,
};
use hanashi_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "hanashi-client")]
#[command(about = "Direct messaging client with presence and reconnection", long_about = None)]
struct Args {
    /// User to log in as
    #[arg(short = 'u', long)]
    user_id: String,

    /// WebSocket server URL
    #[arg(long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,

    /// REST API origin
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    api_url: String,

    /// Seconds between background refreshes of conversations and unread counts
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    refresh_secs: u64,

    /// Reconnection attempts before giving up
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    max_reconnect_attempts: u32,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let mut config = match ClientConfig::new(&args.user_id, &args.url, &args.api_url) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(2);
        }
    };
    config.refresh_interval = Duration::from_secs(args.refresh_secs);
    config.reconnect = ReconnectPolicy {
        max_attempts: args.max_reconnect_attempts,
        ..ReconnectPolicy::default()
    };

    // Run the client
    if let Err(e) = run_client(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
