//! Client reconciliation store.
//!
//! A single task owns [`ReconciliationState`] and applies [`StoreEvent`]s one
//! at a time, so pushed events, REST results and user commands never race.
//! Every applied event publishes a fresh snapshot on a `watch` channel.
//! Effects run in their own tasks and report back as new events.

pub mod reducer;
pub mod state;

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};

use crate::api::ChatApi;

pub use reducer::{Effect, RECONNECTING_NOTICE, StoreEvent};
pub use state::{ConversationSummary, ReconciliationState};

const NOTIFICATION_CAPACITY: usize = 32;

/// Cloneable handle to a running store.
///
/// The store task stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct StoreHandle {
    events: mpsc::UnboundedSender<StoreEvent>,
    snapshots: watch::Receiver<ReconciliationState>,
    notifications: broadcast::Sender<String>,
}

impl StoreHandle {
    /// Queue an event. Returns `false` if the store has stopped.
    pub fn dispatch(&self, event: StoreEvent) -> bool {
        self.events.send(event).is_ok()
    }

    /// Latest published state.
    pub fn snapshot(&self) -> ReconciliationState {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ReconciliationState> {
        self.snapshots.clone()
    }

    /// Notifications about conversations other than the open one.
    pub fn notifications(&self) -> broadcast::Receiver<String> {
        self.notifications.subscribe()
    }
}

/// Start the store task for `self_id`.
///
/// Must be called from within a tokio runtime.
pub fn spawn_store(self_id: impl Into<String>, api: Arc<dyn ChatApi>) -> StoreHandle {
    let state = ReconciliationState::new(self_id);
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (snapshot_tx, snapshot_rx) = watch::channel(state.clone());
    let (notify_tx, _) = broadcast::channel(NOTIFICATION_CAPACITY);

    let store = Store {
        state,
        api,
        events: events_tx.downgrade(),
        snapshots: snapshot_tx,
        notifications: notify_tx.clone(),
    };
    tokio::spawn(store.run(events_rx));

    StoreHandle {
        events: events_tx,
        snapshots: snapshot_rx,
        notifications: notify_tx,
    }
}

struct Store {
    state: ReconciliationState,
    api: Arc<dyn ChatApi>,
    events: mpsc::WeakUnboundedSender<StoreEvent>,
    snapshots: watch::Sender<ReconciliationState>,
    notifications: broadcast::Sender<String>,
}

impl Store {
    async fn run(mut self, mut events: mpsc::UnboundedReceiver<StoreEvent>) {
        tracing::debug!("Store started for '{}'", self.state.self_id);
        while let Some(event) = events.recv().await {
            let effects = self.state.apply(event);
            self.snapshots.send_replace(self.state.clone());
            for effect in effects {
                self.execute(effect);
            }
        }
        tracing::debug!("Store stopped for '{}'", self.state.self_id);
    }

    fn execute(&self, effect: Effect) {
        if let Effect::Notify(text) = effect {
            // 受信者がいなければ捨てる
            let _ = self.notifications.send(text);
            return;
        }
        let Some(events) = self.events.upgrade() else {
            return;
        };
        let api = Arc::clone(&self.api);
        tokio::spawn(async move {
            for event in run_effect(api.as_ref(), effect).await {
                if events.send(event).is_err() {
                    break;
                }
            }
        });
    }
}

/// Perform one REST effect and turn its outcome into events.
async fn run_effect(api: &dyn ChatApi, effect: Effect) -> Vec<StoreEvent> {
    match effect {
        Effect::FetchHistory(peer) => match api.fetch_history(&peer).await {
            Ok(messages) => vec![StoreEvent::HistoryLoaded { peer, messages }],
            Err(e) => vec![failed(format!("Failed to load conversation with {}", peer), e)],
        },
        Effect::MarkSeen(peer) => match api.mark_seen(&peer).await {
            Ok(updated) => {
                tracing::debug!("Marked {} message(s) from '{}' as seen", updated, peer);
                vec![]
            }
            Err(e) => vec![failed(format!("Failed to mark {} as seen", peer), e)],
        },
        Effect::Refresh => {
            let (peers, counts) = tokio::join!(api.list_peers(), api.unread_counts());
            let mut events = Vec::with_capacity(2);
            match peers {
                Ok(peers) => events.push(StoreEvent::PeersLoaded(peers)),
                Err(e) => events.push(failed("Failed to load conversations".to_string(), e)),
            }
            match counts {
                Ok(counts) => events.push(StoreEvent::UnreadCountsLoaded(counts)),
                Err(e) => events.push(failed("Failed to load unread counts".to_string(), e)),
            }
            events
        }
        Effect::SendMessage { peer, text } => match api.send_message(&peer, &text).await {
            Ok(message) => vec![StoreEvent::MessageSent(message)],
            Err(e) => vec![failed(format!("Failed to send message to {}", peer), e)],
        },
        Effect::EditMessage { id, text } => match api.edit_message(&id, &text).await {
            Ok(message) => vec![StoreEvent::MessageEdited(message)],
            Err(e) => vec![failed(format!("Failed to edit message {}", id), e)],
        },
        Effect::Notify(_) => vec![],
    }
}

fn failed(context: String, error: crate::error::ClientError) -> StoreEvent {
    tracing::warn!("{}: {}", context, error);
    StoreEvent::RequestFailed(format!("{}: {}", context, error))
}
