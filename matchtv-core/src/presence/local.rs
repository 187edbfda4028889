//! In-process presence channel
//!
//! Single-node implementation over a concurrent map and `watch` channels.
//! Used by tests and deployments without Redis.

use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::watch;

use super::PresenceChannel;
use crate::models::{MatchId, SessionId};
use crate::Result;

struct Topic {
    sessions: HashSet<SessionId>,
    tx: watch::Sender<u64>,
}

impl Topic {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self {
            sessions: HashSet::new(),
            tx,
        }
    }

    fn publish(&self) {
        self.tx.send_replace(self.sessions.len() as u64);
    }
}

#[derive(Default)]
pub struct LocalPresence {
    topics: DashMap<MatchId, Topic>,
}

impl LocalPresence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PresenceChannel for LocalPresence {
    async fn join(&self, match_id: &MatchId, session_id: &SessionId) -> Result<()> {
        let mut topic = self
            .topics
            .entry(match_id.clone())
            .or_insert_with(Topic::new);
        topic.sessions.insert(session_id.clone());
        topic.publish();
        Ok(())
    }

    async fn leave(&self, match_id: &MatchId, session_id: &SessionId) -> Result<()> {
        if let Some(mut topic) = self.topics.get_mut(match_id) {
            topic.sessions.remove(session_id);
            topic.publish();
        }
        Ok(())
    }

    async fn count(&self, match_id: &MatchId) -> Result<u64> {
        Ok(self
            .topics
            .get(match_id)
            .map(|topic| topic.sessions.len() as u64)
            .unwrap_or(0))
    }

    async fn watch(&self, match_id: &MatchId) -> watch::Receiver<u64> {
        self.topics
            .entry(match_id.clone())
            .or_insert_with(Topic::new)
            .tx
            .subscribe()
    }
}
