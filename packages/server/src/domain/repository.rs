//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use std::collections::HashMap;

use async_trait::async_trait;

use super::{
    entity::Message,
    error::RepositoryError,
    value_object::{MessageId, UserId},
};

/// Message Repository trait
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// 新しいメッセージを保存
    async fn insert(&self, message: Message) -> Result<(), RepositoryError>;

    /// ID でメッセージを取得
    async fn find_by_id(&self, id: &MessageId) -> Result<Option<Message>, RepositoryError>;

    /// 既存のメッセージを更新
    async fn update(&self, message: Message) -> Result<(), RepositoryError>;

    /// 2 人の間の会話を `createdAt` 昇順（同時刻は id 順）で取得
    async fn find_conversation(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Vec<Message>, RepositoryError>;

    /// `sender` から `receiver` への未読メッセージを既読にし、更新件数を返す
    async fn mark_seen(
        &self,
        sender: &UserId,
        receiver: &UserId,
    ) -> Result<usize, RepositoryError>;

    /// `receiver` 宛ての未読メッセージ数を送信者ごとに集計
    async fn unread_counts(
        &self,
        receiver: &UserId,
    ) -> Result<HashMap<UserId, usize>, RepositoryError>;

    /// 2 人の間の最新メッセージ
    async fn last_message_between(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Option<Message>, RepositoryError>;
}

/// User directory trait
///
/// ユーザーの永続化は外部のコラボレーターの責務。ここでは会話相手の一覧に必要な最小限の契約のみ。
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// ユーザーを登録（既に存在する場合は何もしない）
    async fn upsert(&self, id: UserId);

    /// `id` 以外の全ユーザーを ID 順で取得
    async fn list_except(&self, id: &UserId) -> Vec<UserId>;
}
