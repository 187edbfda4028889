//! Redis-backed presence channel
//!
//! One Redis key per `(match, session)` entry, expiring unless refreshed by
//! that session's heartbeat task. A client that vanishes without `leave`
//! simply stops refreshing and its entry ages out, so the viewer count heals
//! itself across nodes. Counting SCANs the per-match key pattern instead of
//! KEYS to avoid blocking Redis.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use redis::aio::ConnectionManager;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::PresenceChannel;
use crate::models::{MatchId, SessionId};
use crate::Result;

/// Heartbeat interval in seconds for presence liveness.
pub const HEARTBEAT_INTERVAL_SECS: u64 = 20;

/// TTL multiplier: TTL = `HEARTBEAT_INTERVAL_SECS` * `TTL_MULTIPLIER`.
/// A multiplier of 3 means up to 2 consecutive missed heartbeats are
/// tolerated before the entry expires.
const TTL_MULTIPLIER: u64 = 3;

/// Entry TTL in seconds, derived from the heartbeat interval.
pub const ENTRY_TTL_SECS: u64 = HEARTBEAT_INTERVAL_SECS * TTL_MULTIPLIER;

// TTL must be at least 3x the heartbeat interval to tolerate transient
// network issues.
const _: () = assert!(
    ENTRY_TTL_SECS >= HEARTBEAT_INTERVAL_SECS * 3,
    "ENTRY_TTL_SECS must be at least 3x HEARTBEAT_INTERVAL_SECS"
);

/// How often count watchers poll Redis.
const WATCH_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub struct RedisPresence {
    conn: ConnectionManager,
    key_prefix: String,
    heartbeats: DashMap<(MatchId, SessionId), CancellationToken>,
    watchers: std::sync::Arc<DashMap<MatchId, watch::Sender<u64>>>,
}

impl RedisPresence {
    /// Connect and return a presence channel using the given key prefix.
    pub async fn connect(url: &str, key_prefix: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self {
            conn,
            key_prefix: key_prefix.to_string(),
            heartbeats: DashMap::new(),
            watchers: std::sync::Arc::new(DashMap::new()),
        })
    }

    fn entry_key(&self, match_id: &MatchId, session_id: &SessionId) -> String {
        format!("{}presence:{match_id}:{session_id}", self.key_prefix)
    }

    fn match_pattern(&self, match_id: &MatchId) -> String {
        format!("{}presence:{match_id}:*", self.key_prefix)
    }

    fn spawn_heartbeat(&self, key: String) -> CancellationToken {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let mut conn = self.conn.clone();

        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));
            interval.tick().await; // first tick fires immediately
            loop {
                tokio::select! {
                    () = task_token.cancelled() => break,
                    _ = interval.tick() => {
                        let refreshed: std::result::Result<(), redis::RedisError> =
                            redis::cmd("EXPIRE")
                                .arg(&key)
                                .arg(ENTRY_TTL_SECS)
                                .query_async(&mut conn)
                                .await;
                        if let Err(e) = refreshed {
                            warn!("Presence heartbeat failed for {key}: {e}");
                        }
                    }
                }
            }
        });

        token
    }
}

/// Count entries matching a pattern with incremental SCAN.
async fn scan_count(conn: &mut ConnectionManager, pattern: &str) -> Result<u64> {
    let mut cursor: u64 = 0;
    let mut total: u64 = 0;
    loop {
        let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(100)
            .query_async(conn)
            .await?;
        total += keys.len() as u64;
        cursor = new_cursor;
        if cursor == 0 {
            break;
        }
    }
    Ok(total)
}

#[async_trait]
impl PresenceChannel for RedisPresence {
    async fn join(&self, match_id: &MatchId, session_id: &SessionId) -> Result<()> {
        let key = self.entry_key(match_id, session_id);
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("SET")
            .arg(&key)
            .arg("1")
            .arg("EX")
            .arg(ENTRY_TTL_SECS)
            .query_async(&mut conn)
            .await?;

        let token = self.spawn_heartbeat(key);
        if let Some(previous) = self
            .heartbeats
            .insert((match_id.clone(), session_id.clone()), token)
        {
            // Re-join of the same pair: stop the stale heartbeat.
            previous.cancel();
        }
        Ok(())
    }

    async fn leave(&self, match_id: &MatchId, session_id: &SessionId) -> Result<()> {
        if let Some((_, token)) = self
            .heartbeats
            .remove(&(match_id.clone(), session_id.clone()))
        {
            token.cancel();
        }

        let key = self.entry_key(match_id, session_id);
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("DEL").arg(&key).query_async(&mut conn).await?;
        Ok(())
    }

    async fn count(&self, match_id: &MatchId) -> Result<u64> {
        let mut conn = self.conn.clone();
        scan_count(&mut conn, &self.match_pattern(match_id)).await
    }

    async fn watch(&self, match_id: &MatchId) -> watch::Receiver<u64> {
        if let Some(tx) = self.watchers.get(match_id) {
            return tx.subscribe();
        }

        let initial = self.count(match_id).await.unwrap_or_else(|e| {
            warn!("Presence count for {match_id} unavailable: {e}");
            0
        });
        let (tx, rx) = watch::channel(initial);
        self.watchers.insert(match_id.clone(), tx.clone());

        let mut conn = self.conn.clone();
        let pattern = self.match_pattern(match_id);
        let watchers = self.watchers.clone();
        let watched = match_id.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(WATCH_POLL_INTERVAL);
            loop {
                interval.tick().await;
                if tx.is_closed() {
                    // Drop the registered sender so the next watch() starts
                    // a fresh poller; re-check in case a subscriber raced in.
                    watchers.remove(&watched);
                    if tx.is_closed() {
                        break;
                    }
                    watchers.insert(watched.clone(), tx.clone());
                }
                match scan_count(&mut conn, &pattern).await {
                    Ok(count) => {
                        tx.send_if_modified(|current| {
                            let changed = *current != count;
                            *current = count;
                            changed
                        });
                    }
                    Err(e) => warn!("Presence poll failed for {pattern}: {e}"),
                }
            }
        });

        rx
    }
}
