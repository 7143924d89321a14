//! InMemory User Repository 実装

use std::collections::BTreeSet;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{UserId, UserRepository};

/// インメモリ User Repository 実装
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<BTreeSet<UserId>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-populated with `users`.
    pub fn with_users(users: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            users: Mutex::new(users.into_iter().collect()),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn upsert(&self, id: UserId) {
        let mut users = self.users.lock().await;
        if users.insert(id.clone()) {
            tracing::debug!("User '{}' added to directory", id);
        }
    }

    async fn list_except(&self, id: &UserId) -> Vec<UserId> {
        let users = self.users.lock().await;
        users.iter().filter(|u| *u != id).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_list_except_excludes_caller_and_is_sorted() {
        // テスト項目: 自分以外のユーザーが ID 順で返され、重複登録は無視される
        // given (前提条件):
        let repo = InMemoryUserRepository::with_users([user("carol"), user("alice")]);
        repo.upsert(user("bob")).await;
        repo.upsert(user("bob")).await;

        // when (操作):
        let others = repo.list_except(&user("alice")).await;

        // then (期待する結果):
        assert_eq!(others, vec![user("bob"), user("carol")]);
    }
}
