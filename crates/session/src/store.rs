use crate::context::SessionContext;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use workdesk_protocol::UserId;

/// Session contexts partitioned by user. Each context has its own lock, so updates for one
/// user are handled in order while different users proceed concurrently.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<UserId, Arc<Mutex<SessionContext>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for `user_id`, created on first use.
    pub async fn checkout(&self, user_id: UserId) -> Arc<Mutex<SessionContext>> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(SessionContext::new(user_id))))
            .clone()
    }

    /// Forgets a single user's context.
    pub async fn drop_session(&self, user_id: UserId) -> bool {
        self.sessions.lock().await.remove(&user_id).is_some()
    }

    /// Drops every context except `keep`; returns how many were discarded.
    pub async fn clear_except(&self, keep: Option<UserId>) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|user_id, _| Some(*user_id) == keep);
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{State, Step};

    #[tokio::test]
    async fn test_checkout_returns_same_context() {
        let store = SessionStore::new();
        {
            let session = store.checkout(1).await;
            session.lock().await.apply(Step::Goto(State::Searching));
        }
        let again = store.checkout(1).await;
        assert_eq!(again.lock().await.state(), State::Searching);

        let other = store.checkout(2).await;
        assert_eq!(other.lock().await.state(), State::Idle);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_clear_except_keeps_caller() {
        let store = SessionStore::new();
        for id in 1..=3 {
            store.checkout(id).await;
        }
        assert_eq!(store.clear_except(Some(2)).await, 2);
        assert_eq!(store.len().await, 1);
        assert!(store.drop_session(2).await);
        assert!(store.is_empty().await);
    }
}
