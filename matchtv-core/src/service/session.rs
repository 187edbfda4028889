//! Stream session lifecycle controller
//!
//! Turns a match id into a live, correctly configured, presence-tracked
//! playback session and guarantees cleanup. A session moves through
//! `Resolving → Configuring → Playing → Closed`; resolution and load
//! failures are terminal and require a fresh `open`, never an internal
//! retry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::models::{MatchId, SessionId};
use crate::playback::{
    resolve_format, ClearKey, EngineFactory, EngineSpec, EngineVariant, LiveTuning, PlayOutcome,
    PlaybackEngine, VideoSink,
};
use crate::presence::PresenceChannel;
use crate::repository::CatalogRepository;
use crate::{Error, Result};

/// Display title when a record has none.
const FALLBACK_TITLE: &str = "Live Match";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Resolving,
    Configuring,
    Playing,
    Closed,
}

/// Opens sessions and tracks the live ones so they can be closed by id.
pub struct SessionService {
    catalog: Arc<dyn CatalogRepository>,
    presence: Arc<dyn PresenceChannel>,
    engines: Arc<dyn EngineFactory>,
    sessions: DashMap<SessionId, Arc<StreamSession>>,
}

impl SessionService {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        presence: Arc<dyn PresenceChannel>,
        engines: Arc<dyn EngineFactory>,
    ) -> Self {
        Self {
            catalog,
            presence,
            engines,
            sessions: DashMap::new(),
        }
    }

    /// Open a playback session for a match.
    ///
    /// `expected` is the variant the calling endpoint serves; a record whose
    /// URL resolves differently is rejected before any engine work, so a
    /// DASH record can never start loading on the segmented page.
    pub async fn open(
        &self,
        match_id: &MatchId,
        expected: EngineVariant,
    ) -> Result<Arc<StreamSession>> {
        debug!(%match_id, phase = ?SessionPhase::Resolving, "Opening session");

        let record = self.catalog.get(match_id).await?.ok_or(Error::NotFound)?;

        let variant = resolve_format(&record.stream_url).ok_or_else(|| {
            Error::Unsupported(format!("Match {match_id} has no playable stream URL"))
        })?;
        if variant != expected {
            return Err(Error::Unsupported(format!(
                "Match {match_id} is a {variant} stream, not {expected}"
            )));
        }

        debug!(%match_id, phase = ?SessionPhase::Configuring, %variant, "Configuring engine");

        let source_url = record.stream_url.trim().to_string();
        let spec = EngineSpec {
            variant,
            source_url: source_url.clone(),
            clear_key: match variant {
                // DRM only applies with a complete pair; a half pair is
                // treated as absent rather than partially configured.
                EngineVariant::ManifestDrm => record
                    .clear_key()
                    .map(|(kid, key)| ClearKey {
                        kid: kid.to_string(),
                        key: key.to_string(),
                    }),
                EngineVariant::Segmented => None,
            },
            cookie: match variant {
                EngineVariant::ManifestDrm => record.cookie.clone(),
                EngineVariant::Segmented => None,
            },
            tuning: match variant {
                EngineVariant::Segmented => Some(LiveTuning::live_edge()),
                EngineVariant::ManifestDrm => None,
            },
        };

        let mut engine = self.engines.create(spec);

        // Load before joining presence: a load failure therefore never
        // leaves a presence entry behind.
        engine.load(&source_url).await?;

        engine.attach(VideoSink::inline_muted());
        match engine.play().await? {
            PlayOutcome::Started => {}
            PlayOutcome::AwaitingInteraction => {
                // Autoplay rejection is not an error; the session stays
                // loaded and paused until the viewer interacts.
                debug!(%match_id, "Autoplay rejected by sink");
            }
        }

        let session_id = SessionId::new();
        if let Err(e) = self.presence.join(match_id, &session_id).await {
            // Degraded mode: playback continues, the viewer count just
            // stops updating.
            warn!(%match_id, %session_id, "Presence join failed: {e}");
        }

        let title = {
            let trimmed = record.title.trim();
            if trimmed.is_empty() {
                FALLBACK_TITLE.to_string()
            } else {
                trimmed.to_string()
            }
        };

        let session = Arc::new(StreamSession {
            session_id: session_id.clone(),
            match_id: match_id.clone(),
            title,
            variant,
            engine: Mutex::new(Some(engine)),
            presence: self.presence.clone(),
            closed: AtomicBool::new(false),
        });

        self.sessions.insert(session_id.clone(), session.clone());
        info!(%match_id, %session_id, %variant, "Session playing");
        Ok(session)
    }

    #[must_use]
    pub fn get(&self, session_id: &SessionId) -> Option<Arc<StreamSession>> {
        self.sessions.get(session_id).map(|s| Arc::clone(s.value()))
    }

    /// Close a session by id. Returns whether the session was known.
    pub async fn close(&self, session_id: &SessionId) -> bool {
        match self.sessions.remove(session_id) {
            Some((_, session)) => {
                session.close().await;
                true
            }
            None => false,
        }
    }

    /// Number of sessions currently tracked by this node.
    #[must_use]
    pub fn open_sessions(&self) -> usize {
        self.sessions.len()
    }
}

/// Handle to one live playback session.
pub struct StreamSession {
    session_id: SessionId,
    match_id: MatchId,
    title: String,
    variant: EngineVariant,
    engine: Mutex<Option<Box<dyn PlaybackEngine>>>,
    presence: Arc<dyn PresenceChannel>,
    closed: AtomicBool,
}

impl StreamSession {
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    #[must_use]
    pub fn match_id(&self) -> &MatchId {
        &self.match_id
    }

    /// Display title: the record title, or a fallback literal when absent.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn variant(&self) -> EngineVariant {
        self.variant
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.closed.load(Ordering::SeqCst) {
            SessionPhase::Closed
        } else {
            SessionPhase::Playing
        }
    }

    /// Observe this match's live viewer count.
    pub async fn viewers(&self) -> watch::Receiver<u64> {
        self.presence.watch(&self.match_id).await
    }

    /// Tear the session down: remove the presence entry (best effort; the
    /// channel's disconnect detection is the guaranteed fallback) and
    /// release the engine. Idempotent.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        if let Err(e) = self
            .presence
            .leave(&self.match_id, &self.session_id)
            .await
        {
            warn!(
                match_id = %self.match_id,
                session_id = %self.session_id,
                "Presence leave failed: {e}"
            );
        }

        if let Some(mut engine) = self.engine.lock().take() {
            engine.destroy();
        }
        debug!(session_id = %self.session_id, "Session closed");
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        // Abandoned without close(): release the engine now and leave
        // presence asynchronously. If no runtime is available the entry is
        // reclaimed by the channel's own disconnect cleanup.
        if let Some(mut engine) = self.engine.lock().take() {
            engine.destroy();
        }
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let presence = self.presence.clone();
            let match_id = self.match_id.clone();
            let session_id = self.session_id.clone();
            handle.spawn(async move {
                let _ = presence.leave(&match_id, &session_id).await;
            });
        }
    }
}
