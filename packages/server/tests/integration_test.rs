//! Integration tests for the messaging server.
//!
//! Each test binds an in-process server on an ephemeral port and drives it
//! over real WebSocket and HTTP connections.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use hanashi_server::{
    infrastructure::{
        presence::InMemoryPresenceRegistry,
        repository::{InMemoryMessageRepository, InMemoryUserRepository},
    },
    ui::{AppState, Server},
};
use hanashi_shared::{
    protocol::{
        ApiResponse, CreateMessageRequest, MarkSeenResult, MessageDto, MessagesReadPayload,
        MessagesSeenPayload, PeerDto, ServerEvent, USER_ID_HEADER, UnreadCounts,
        UpdateMessageRequest,
    },
    time::SystemClock,
};
use tokio::{net::TcpListener, task::JoinHandle, time::timeout};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite};

type Ws = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

const WAIT: Duration = Duration::from_secs(3);

/// Helper struct to manage server lifecycle
struct TestServer {
    handle: JoinHandle<()>,
    addr: SocketAddr,
    http: reqwest::Client,
}

impl TestServer {
    /// Start a test server on an ephemeral port
    async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = AppState::new(
            Arc::new(InMemoryMessageRepository::new()),
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryPresenceRegistry::new()),
            Arc::new(SystemClock),
            64,
        );
        let handle = tokio::spawn(async move {
            let _ = Server::new(state).serve(listener).await;
        });
        TestServer {
            handle,
            addr,
            http: reqwest::Client::new(),
        }
    }

    fn ws_url(&self, user_id: Option<&str>) -> String {
        match user_id {
            Some(id) => format!("ws://{}/ws?userId={}", self.addr, id),
            None => format!("ws://{}/ws", self.addr),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn connect(&self, user_id: Option<&str>) -> Ws {
        let (ws, _) = connect_async(self.ws_url(user_id)).await.unwrap();
        ws
    }

    async fn send_message(&self, from: &str, to: &str, text: &str) -> reqwest::Response {
        self.http
            .post(self.url("/messages"))
            .header(USER_ID_HEADER, from)
            .json(&CreateMessageRequest {
                receiver_id: Some(to.to_string()),
                text: Some(text.to_string()),
                image_url: None,
            })
            .send()
            .await
            .unwrap()
    }

    async fn update(&self, caller: &str, id: &str, body: UpdateMessageRequest) -> reqwest::Response {
        self.http
            .put(self.url(&format!("/messages/{}", id)))
            .header(USER_ID_HEADER, caller)
            .json(&body)
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Next server event on `ws`, failing the test after a timeout.
async fn next_event(ws: &mut Ws) -> ServerEvent {
    loop {
        let frame = timeout(WAIT, ws.next())
            .await
            .expect("timed out waiting for an event")
            .expect("stream ended")
            .expect("websocket error");
        if let tungstenite::Message::Text(text) = frame {
            return ServerEvent::from_json(text.as_str()).unwrap();
        }
    }
}

/// Skip events until a presence snapshot equal to `expected` arrives.
async fn expect_presence(ws: &mut Ws, expected: &[&str]) {
    let expected: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
    loop {
        if let ServerEvent::GetOnlineUsers(online) = next_event(ws).await {
            if online == expected {
                return;
            }
        }
    }
}

/// Next event that is not a presence snapshot.
async fn next_non_presence(ws: &mut Ws) -> ServerEvent {
    loop {
        let event = next_event(ws).await;
        if !matches!(event, ServerEvent::GetOnlineUsers(_)) {
            return event;
        }
    }
}

#[tokio::test]
async fn test_presence_is_broadcast_on_connect_and_disconnect() {
    // テスト項目: 接続・切断のたびに presence の全量が全接続に届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect(Some("alice")).await;
    expect_presence(&mut alice, &["alice"]).await;

    // when (操作):
    let mut bob = server.connect(Some("bob")).await;

    // then (期待する結果):
    expect_presence(&mut alice, &["alice", "bob"]).await;
    expect_presence(&mut bob, &["alice", "bob"]).await;

    // when (操作):
    bob.close(None).await.unwrap();

    // then (期待する結果):
    expect_presence(&mut alice, &["alice"]).await;
}

#[tokio::test]
async fn test_anonymous_connection_receives_presence_snapshot() {
    // テスト項目: userId なしの接続も presence スナップショットを受け取り、自身は一覧に載らない
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect(Some("alice")).await;
    expect_presence(&mut alice, &["alice"]).await;

    // when (操作):
    let mut anonymous = server.connect(None).await;

    // then (期待する結果):
    assert_eq!(
        next_event(&mut anonymous).await,
        ServerEvent::GetOnlineUsers(vec!["alice".to_string()])
    );
}

#[tokio::test]
async fn test_invalid_user_id_is_rejected_at_handshake() {
    // テスト項目: 不正な userId での接続はハンドシェイクで拒否される
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let result = connect_async(server.ws_url(Some("two%20words"))).await;

    // then (期待する結果):
    match result {
        Err(tungstenite::Error::Http(response)) => {
            assert_eq!(response.status(), 400);
        }
        other => panic!("expected HTTP 400, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_new_message_is_pushed_to_receiver() {
    // テスト項目: POST /messages が 201 を返し、受信者に newMessage が push される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut bob = server.connect(Some("bob")).await;
    expect_presence(&mut bob, &["bob"]).await;

    // when (操作):
    let response = server.send_message("alice", "bob", "hello bob").await;

    // then (期待する結果):
    assert_eq!(response.status(), 201);
    let body: ApiResponse<MessageDto> = response.json().await.unwrap();
    assert!(body.ok);
    let created = body.data.unwrap();
    assert_eq!(created.sender_id, "alice");
    assert!(!created.seen);

    match next_non_presence(&mut bob).await {
        ServerEvent::NewMessage(pushed) => assert_eq!(pushed, created),
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn test_history_fetch_marks_seen_and_notifies_sender() {
    // テスト項目: 履歴取得で既読化され、送信者に messagesSeen が届き、未読数が 0 になる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect(Some("alice")).await;
    expect_presence(&mut alice, &["alice"]).await;
    server.send_message("alice", "bob", "one").await;
    server.send_message("alice", "bob", "two").await;

    let counts: ApiResponse<UnreadCounts> = server
        .http
        .get(server.url("/messages/unread/counts"))
        .header(USER_ID_HEADER, "bob")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(counts.data.unwrap().get("alice"), Some(&2));

    // when (操作):
    let history: ApiResponse<Vec<MessageDto>> = server
        .http
        .get(server.url("/messages/alice"))
        .header(USER_ID_HEADER, "bob")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // then (期待する結果):
    let history = history.data.unwrap();
    let texts: Vec<Option<&str>> = history.iter().map(|m| m.text.as_deref()).collect();
    assert_eq!(texts, vec![Some("one"), Some("two")]);
    assert!(history.iter().all(|m| m.seen));
    assert_eq!(
        next_event(&mut alice).await,
        ServerEvent::MessagesSeen(MessagesSeenPayload {
            sender_id: "alice".to_string(),
            receiver_id: "bob".to_string(),
        })
    );

    let counts: ApiResponse<UnreadCounts> = server
        .http
        .get(server.url("/messages/unread/counts"))
        .header(USER_ID_HEADER, "bob")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(counts.data.unwrap().is_empty());
}

#[tokio::test]
async fn test_mark_seen_with_offline_sender_succeeds() {
    // テスト項目: 送信者がオフラインでも markSeen は成功し、読んだ本人に messagesRead が届く
    // given (前提条件):
    let server = TestServer::start().await;
    server.send_message("alice", "bob", "are you there?").await;
    let mut bob = server.connect(Some("bob")).await;
    expect_presence(&mut bob, &["bob"]).await;

    // when (操作):
    let response = server
        .update("bob", "alice", UpdateMessageRequest::mark_seen())
        .await;

    // then (期待する結果):
    assert_eq!(response.status(), 200);
    let body: ApiResponse<MarkSeenResult> = response.json().await.unwrap();
    assert_eq!(body.data, Some(MarkSeenResult { updated: 1 }));
    assert_eq!(
        next_non_presence(&mut bob).await,
        ServerEvent::MessagesRead(MessagesReadPayload {
            sender_id: "alice".to_string(),
        })
    );
}

#[tokio::test]
async fn test_edit_pushes_to_receiver_and_rejects_non_sender() {
    // テスト項目: 送信者の編集は受信者に push され、送信者以外の編集は 403 になる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut bob = server.connect(Some("bob")).await;
    expect_presence(&mut bob, &["bob"]).await;
    let created: ApiResponse<MessageDto> = server
        .send_message("alice", "bob", "helo")
        .await
        .json()
        .await
        .unwrap();
    let id = created.data.unwrap().id;
    let _new_message = next_non_presence(&mut bob).await;

    // when (操作):
    let forbidden = server
        .update("bob", &id, UpdateMessageRequest::edit("hacked"))
        .await;
    let edited = server
        .update("alice", &id, UpdateMessageRequest::edit("hello"))
        .await;

    // then (期待する結果):
    assert_eq!(forbidden.status(), 403);
    let body: ApiResponse<serde_json::Value> = forbidden.json().await.unwrap();
    assert!(!body.ok);
    assert_eq!(body.code.as_deref(), Some("ERRORS.NOT_AUTHORIZED"));

    assert_eq!(edited.status(), 200);
    match next_non_presence(&mut bob).await {
        ServerEvent::MessageEdited(dto) => {
            assert_eq!(dto.id, id);
            assert_eq!(dto.text.as_deref(), Some("hello"));
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn test_newer_connection_supersedes_older_one() {
    // テスト項目: 同じユーザーの新しい接続が古い接続を置き換え、古い接続の切断で新しい登録が消えない
    // given (前提条件):
    let server = TestServer::start().await;
    let mut first = server.connect(Some("alice")).await;
    expect_presence(&mut first, &["alice"]).await;
    let mut second = server.connect(Some("alice")).await;
    expect_presence(&mut second, &["alice"]).await;

    // when (操作):
    first.close(None).await.unwrap();
    expect_presence(&mut second, &["alice"]).await;
    server.send_message("bob", "alice", "which tab?").await;

    // then (期待する結果):
    match next_non_presence(&mut second).await {
        ServerEvent::NewMessage(dto) => assert_eq!(dto.text.as_deref(), Some("which tab?")),
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn test_rest_requires_identity_and_lists_peers() {
    // テスト項目: x-user-id のないリクエストは 401、会話相手一覧は最新メッセージ順
    // given (前提条件):
    let server = TestServer::start().await;
    server.send_message("alice", "bob", "hi bob").await;
    server.send_message("carol", "alice", "hi alice").await;

    // when (操作):
    let unauthorized = server
        .http
        .get(server.url("/messages/users"))
        .send()
        .await
        .unwrap();
    let peers: ApiResponse<Vec<PeerDto>> = server
        .http
        .get(server.url("/messages/users"))
        .header(USER_ID_HEADER, "alice")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(unauthorized.status(), 401);
    let ids: Vec<String> = peers.data.unwrap().into_iter().map(|p| p.id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"bob".to_string()));
    assert!(ids.contains(&"carol".to_string()));
}

#[tokio::test]
async fn test_malformed_frame_does_not_close_connection() {
    // テスト項目: 不正なフレームを送っても接続は維持される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = server.connect(Some("alice")).await;
    expect_presence(&mut alice, &["alice"]).await;

    // when (操作):
    alice
        .send(tungstenite::Message::Text("not json".into()))
        .await
        .unwrap();
    server.send_message("bob", "alice", "still here?").await;

    // then (期待する結果):
    assert!(matches!(
        next_non_presence(&mut alice).await,
        ServerEvent::NewMessage(_)
    ));
}
