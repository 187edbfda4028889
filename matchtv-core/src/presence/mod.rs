//! Live-viewer presence
//!
//! Ephemeral `(match, session)` membership. Entries are created when a
//! session opens, removed explicitly on close, and cleaned up by the channel
//! itself when a client vanishes without saying goodbye — TTL expiry in the
//! Redis implementation, handle drop in the in-process one. That fallback is
//! what keeps the viewer count self-healing without a heartbeat protocol in
//! the session controller.

pub mod local;
pub mod redis;

pub use local::LocalPresence;
pub use redis::RedisPresence;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::models::{MatchId, SessionId};
use crate::Result;

#[async_trait]
pub trait PresenceChannel: Send + Sync {
    /// Register a session under a match. Distinct sessions are independent
    /// and all counted; re-joining the same pair is idempotent.
    async fn join(&self, match_id: &MatchId, session_id: &SessionId) -> Result<()>;

    /// Explicitly remove a session. Unknown pairs are a no-op.
    async fn leave(&self, match_id: &MatchId, session_id: &SessionId) -> Result<()>;

    /// Number of currently-joined distinct sessions for a match.
    async fn count(&self, match_id: &MatchId) -> Result<u64>;

    /// Observe the viewer count. The receiver sees the current count
    /// immediately and every subsequent change.
    async fn watch(&self, match_id: &MatchId) -> watch::Receiver<u64>;
}
