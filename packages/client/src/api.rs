//! REST client for the messaging endpoints.

use async_trait::async_trait;
use hanashi_shared::protocol::{
    ApiResponse, CreateMessageRequest, MarkSeenResult, MessageDto, PeerDto, USER_ID_HEADER,
    UnreadCounts, UpdateMessageRequest,
};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;

use crate::error::ClientError;

/// REST calls the reconciliation store depends on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// `GET /messages/users`
    async fn list_peers(&self) -> Result<Vec<PeerDto>, ClientError>;

    /// `GET /messages/unread/counts`
    async fn unread_counts(&self) -> Result<UnreadCounts, ClientError>;

    /// `GET /messages/{peer}`; the server also marks the peer's messages seen.
    async fn fetch_history(&self, peer: &str) -> Result<Vec<MessageDto>, ClientError>;

    /// `PUT /messages/{peer}` with `markSeen`.
    async fn mark_seen(&self, peer: &str) -> Result<u64, ClientError>;

    /// `POST /messages`
    async fn send_message(&self, peer: &str, text: &str) -> Result<MessageDto, ClientError>;

    /// `PUT /messages/{id}` with `edit`.
    async fn edit_message(&self, id: &str, text: &str) -> Result<MessageDto, ClientError>;
}

/// [`ChatApi`] over HTTP with reqwest.
#[derive(Debug, Clone)]
pub struct HttpChatApi {
    client: reqwest::Client,
    base_url: Url,
    user_id: String,
}

impl HttpChatApi {
    /// `base_url` is the server origin, e.g. `http://127.0.0.1:8080`.
    pub fn new(base_url: Url, user_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            user_id: user_id.into(),
        }
    }

    /// Append `segments` to the base path, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: "cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<reqwest::RequestBuilder, ClientError> {
        Ok(self
            .client
            .request(method, self.endpoint(segments)?)
            .header(USER_ID_HEADER, &self.user_id))
    }
}

/// Unwrap the `{ok, data?, code?}` envelope.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status().as_u16();
    let body: ApiResponse<T> = response.json().await?;
    if !body.ok {
        return Err(ClientError::Api {
            status,
            code: body.code.unwrap_or_default(),
            message: body.message,
        });
    }
    body.data
        .ok_or_else(|| ClientError::InvalidResponse("missing data".to_string()))
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn list_peers(&self) -> Result<Vec<PeerDto>, ClientError> {
        let request = self.request(Method::GET, &["messages", "users"])?;
        decode(request.send().await?).await
    }

    async fn unread_counts(&self) -> Result<UnreadCounts, ClientError> {
        let request = self.request(Method::GET, &["messages", "unread", "counts"])?;
        decode(request.send().await?).await
    }

    async fn fetch_history(&self, peer: &str) -> Result<Vec<MessageDto>, ClientError> {
        let request = self.request(Method::GET, &["messages", peer])?;
        decode(request.send().await?).await
    }

    async fn mark_seen(&self, peer: &str) -> Result<u64, ClientError> {
        let response = self
            .request(Method::PUT, &["messages", peer])?
            .json(&UpdateMessageRequest::mark_seen())
            .send()
            .await?;
        let result: MarkSeenResult = decode(response).await?;
        Ok(result.updated)
    }

    async fn send_message(&self, peer: &str, text: &str) -> Result<MessageDto, ClientError> {
        let body = CreateMessageRequest {
            receiver_id: Some(peer.to_string()),
            text: Some(text.to_string()),
            image_url: None,
        };
        let response = self
            .request(Method::POST, &["messages"])?
            .json(&body)
            .send()
            .await?;
        decode(response).await
    }

    async fn edit_message(&self, id: &str, text: &str) -> Result<MessageDto, ClientError> {
        let response = self
            .request(Method::PUT, &["messages", id])?
            .json(&UpdateMessageRequest::edit(text))
            .send()
            .await?;
        decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> HttpChatApi {
        HttpChatApi::new(Url::parse(base).unwrap(), "alice")
    }

    #[test]
    fn test_endpoint_encodes_reserved_characters() {
        // テスト項目: 相手の id に URL の予約文字が含まれていても 1 つのパスセグメントに収まる
        // given (前提条件):
        let api = api("http://127.0.0.1:8080");

        // when (操作):
        let url = api.endpoint(&["messages", "al&ice/x?y#z%"]).unwrap();

        // then (期待する結果):
        assert_eq!(url.path(), "/messages/al&ice%2Fx%3Fy%23z%25");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path_segments().unwrap().count(), 2);
    }

    #[test]
    fn test_endpoint_keeps_base_path_prefix() {
        // テスト項目: 末尾スラッシュ付きのパス前置きがあっても二重スラッシュにならない
        // given (前提条件):
        let api = api("http://127.0.0.1:8080/chat/");

        // when (操作):
        let url = api.endpoint(&["messages", "unread", "counts"]).unwrap();

        // then (期待する結果):
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/chat/messages/unread/counts");
    }
}
