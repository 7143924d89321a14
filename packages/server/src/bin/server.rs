//! hanashi messaging server.
//!
//! Tracks who is online and pushes message events to the receiver's live
//! connection after the REST endpoints persist them.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hanashi-server
//! cargo run --bin hanashi-server -- --host 0.0.0.0 --port 3000 --user alice --user bob
//! ```

use std::sync::Arc;

use clap::Parser;
use hanashi_server::{
    domain::UserId,
    infrastructure::{
        presence::InMemoryPresenceRegistry,
        repository::{InMemoryMessageRepository, InMemoryUserRepository},
    },
    ui::{AppState, Server, state::DEFAULT_OUTBOX_CAPACITY},
};
use hanashi_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "hanashi-server")]
#[command(about = "Direct messaging server with presence and real-time delivery", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Number of events queued per connection before new ones are dropped
    #[arg(long, default_value_t = DEFAULT_OUTBOX_CAPACITY)]
    outbox_capacity: usize,

    /// Users known from startup (repeatable)
    #[arg(short = 'u', long = "user")]
    users: Vec<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Repositories
    // 2. Presence Registry
    // 3. AppState (EventRouter + UseCases)
    // 4. Server

    // 1. Create Repositories (in-memory database)
    let mut seed = Vec::with_capacity(args.users.len());
    for raw in args.users {
        match UserId::new(raw.clone()) {
            Ok(id) => seed.push(id),
            Err(e) => {
                tracing::error!("Invalid --user '{}': {}", raw, e);
                std::process::exit(2);
            }
        }
    }
    tracing::info!("Seeded {} user(s)", seed.len());
    let users = Arc::new(InMemoryUserRepository::with_users(seed));
    let messages = Arc::new(InMemoryMessageRepository::new());

    // 2. Create Presence Registry
    let registry = Arc::new(InMemoryPresenceRegistry::new());

    // 3. Create AppState
    let state = AppState::new(
        messages,
        users,
        registry,
        Arc::new(SystemClock),
        args.outbox_capacity,
    );

    // 4. Create and run the server
    let server = Server::new(state);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
