//! Client execution logic: wires the store, the connection manager and the
//! terminal together.

use std::{sync::Arc, time::Duration};

use reqwest::Url;
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::{broadcast, mpsc};

use crate::{
    api::HttpChatApi,
    command::{Command, HELP},
    connection::{ConnectionManager, ReconnectPolicy},
    error::ClientError,
    formatter::MessageFormatter,
    store::{StoreEvent, StoreHandle, spawn_store},
    ui::{Renderer, redisplay_prompt},
};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Settings of one client run.
///
/// Built through [`ClientConfig::new`], which trims the user id once so the
/// REST header, the WebSocket query and the store all agree on it.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    user_id: String,
    /// WebSocket endpoint, e.g. `ws://127.0.0.1:8080/ws`
    ws_url: Url,
    /// REST origin, e.g. `http://127.0.0.1:8080`
    api_url: Url,
    /// Interval of the background conversation refresh
    pub refresh_interval: Duration,
    pub reconnect: ReconnectPolicy,
}

impl ClientConfig {
    pub fn new(user_id: &str, ws_url: &str, api_url: &str) -> Result<Self, ClientError> {
        let user_id = user_id.trim();
        if user_id.is_empty() || user_id.chars().any(char::is_whitespace) {
            return Err(ClientError::InvalidUserId(user_id.to_string()));
        }
        Ok(Self {
            user_id: user_id.to_string(),
            ws_url: parse_url(ws_url)?,
            api_url: parse_url(api_url)?,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            reconnect: ReconnectPolicy::default(),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

fn parse_url(url: &str) -> Result<Url, ClientError> {
    Url::parse(url).map_err(|e| ClientError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Run the client until the user quits or reconnection gives up.
pub async fn run_client(config: ClientConfig) -> Result<(), ClientError> {
    let prompt = format!("{}> ", config.user_id());

    let api = Arc::new(HttpChatApi::new(config.api_url.clone(), config.user_id()));
    let store = spawn_store(config.user_id(), api);
    let mut manager =
        ConnectionManager::spawn(&config.ws_url, config.user_id(), config.reconnect, store.clone());

    println!(
        "\nYou are '{}'. Type /open <peer> to start a conversation, /help for commands.\n",
        config.user_id()
    );

    let render_task = tokio::spawn(render_loop(store.clone(), prompt.clone()));
    let notify_task = tokio::spawn(notification_loop(store.notifications(), prompt.clone()));
    let refresh_task = tokio::spawn(refresh_loop(store.clone(), config.refresh_interval));
    let mut input_rx = spawn_readline(prompt.clone());

    let ended = tokio::select! {
        _ = input_loop(&mut input_rx, &store, &prompt) => None,
        result = manager.join() => Some(result),
    };
    let result = match ended {
        Some(result) => result,
        None => {
            manager.logout();
            manager.join().await
        }
    };

    refresh_task.abort();
    notify_task.abort();
    render_task.abort();
    result
}

/// Spawn a blocking thread for rustyline (synchronous readline).
fn spawn_readline(prompt: String) -> mpsc::UnboundedReceiver<String> {
    let (input_tx, input_rx) = mpsc::unbounded_channel::<String>();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    input_rx
}

/// Handle typed lines until `/quit` or the end of input.
async fn input_loop(input_rx: &mut mpsc::UnboundedReceiver<String>, store: &StoreHandle, prompt: &str) {
    while let Some(line) = input_rx.recv().await {
        match Command::parse(&line) {
            Command::Quit => break,
            Command::Peers => {
                print!("{}", MessageFormatter::format_conversation_list(&store.snapshot()));
                redisplay_prompt(prompt);
            }
            Command::Help => {
                println!("{}", HELP);
                redisplay_prompt(prompt);
            }
            Command::Invalid(reason) => {
                println!("{}", MessageFormatter::format_notice(&reason));
                redisplay_prompt(prompt);
            }
            command => {
                if let Some(event) = command.into_event()
                    && !store.dispatch(event)
                {
                    break;
                }
            }
        }
    }
}

async fn render_loop(store: StoreHandle, prompt: String) {
    let mut snapshots = store.subscribe();
    let mut renderer = Renderer::new(snapshots.borrow_and_update().clone());

    while snapshots.changed().await.is_ok() {
        let next = snapshots.borrow_and_update().clone();
        let lines = renderer.render(&next);
        if lines.is_empty() {
            continue;
        }
        println!();
        for line in lines {
            println!("{}", line);
        }
        redisplay_prompt(&prompt);
    }
}

async fn notification_loop(mut notifications: broadcast::Receiver<String>, prompt: String) {
    loop {
        match notifications.recv().await {
            Ok(text) => {
                println!("\n{}", MessageFormatter::format_notice(&text));
                redisplay_prompt(&prompt);
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!("Skipped {} notification(s)", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Periodically re-fetch conversations so unread counts converge with the server.
async fn refresh_loop(store: StoreHandle, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    // 最初の tick は即時に発火するため読み捨てる（接続時に取得済み）
    ticker.tick().await;
    loop {
        ticker.tick().await;
        if !store.dispatch(StoreEvent::RefreshRequested) {
            break;
        }
    }
}
