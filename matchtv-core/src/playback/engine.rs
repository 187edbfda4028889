//! Playback engine seam
//!
//! Engines are constructor-injected capabilities: the session controller
//! describes what it needs in an [`EngineSpec`] and an [`EngineFactory`]
//! turns that into a configured engine. Production uses
//! [`HttpEngineFactory`]; tests substitute recording fakes.

use async_trait::async_trait;

use super::dash::ManifestDrmEngine;
use super::filter::credential_filter;
use super::hls::SegmentedEngine;
use super::EngineVariant;
use crate::Result;

/// Render target for a session. Mirrors the playback element's relevant
/// switches; a sink that refuses autoplay leaves the session loaded but
/// paused, which is not an error.
#[derive(Debug, Clone, Copy)]
pub struct VideoSink {
    pub muted: bool,
    pub plays_inline: bool,
    pub allow_autoplay: bool,
}

impl VideoSink {
    /// The sink every session starts with: muted, inline-playable, autoplay
    /// permitted.
    #[must_use]
    pub const fn inline_muted() -> Self {
        Self {
            muted: true,
            plays_inline: true,
            allow_autoplay: true,
        }
    }
}

/// Outcome of starting playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    Started,
    /// The sink rejected autoplay. The session stays loaded and paused
    /// until user interaction; callers must not treat this as a failure.
    AwaitingInteraction,
}

/// Clear-key DRM configuration: a single key-id/key pair supplied directly,
/// no license server involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearKey {
    pub kid: String,
    pub key: String,
}

/// Buffering profile for segmented live playback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveTuning {
    /// Target distance from the live edge, in seconds.
    pub target_latency_secs: f64,
    /// Demux segments off the playback thread.
    pub background_demux: bool,
}

impl LiveTuning {
    /// Low-latency profile used for live matches.
    #[must_use]
    pub const fn live_edge() -> Self {
        Self {
            target_latency_secs: 3.0,
            background_demux: true,
        }
    }
}

/// Common engine lifecycle. `load` may fail with `Error::Load`; everything
/// after a successful `load` is expected to succeed or degrade silently.
#[async_trait]
pub trait PlaybackEngine: Send + Sync {
    fn variant(&self) -> EngineVariant;

    /// Fetch and validate the stream entry point.
    async fn load(&mut self, url: &str) -> Result<()>;

    fn attach(&mut self, sink: VideoSink);

    /// Start playback on the attached sink.
    async fn play(&mut self) -> Result<PlayOutcome>;

    /// Release the engine. Idempotent.
    fn destroy(&mut self);
}

/// Everything the controller decided an engine must be configured with.
#[derive(Debug, Clone)]
pub struct EngineSpec {
    pub variant: EngineVariant,
    /// Trimmed playback source URL.
    pub source_url: String,
    /// Clear-key pair; `None` when the record has no complete pair.
    pub clear_key: Option<ClearKey>,
    /// Credential for the request filter (manifest variant only).
    pub cookie: Option<String>,
    /// Buffering profile (segmented variant only).
    pub tuning: Option<LiveTuning>,
}

/// Engine construction seam.
pub trait EngineFactory: Send + Sync {
    fn create(&self, spec: EngineSpec) -> Box<dyn PlaybackEngine>;
}

/// Production factory building engines over a shared HTTP client.
pub struct HttpEngineFactory {
    client: reqwest::Client,
}

impl HttpEngineFactory {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpEngineFactory {
    fn default() -> Self {
        // No request timeout: a hung upstream keeps the session loading,
        // matching the accepted behavior of the watch pages.
        Self::new(reqwest::Client::new())
    }
}

impl EngineFactory for HttpEngineFactory {
    fn create(&self, spec: EngineSpec) -> Box<dyn PlaybackEngine> {
        match spec.variant {
            EngineVariant::Segmented => Box::new(SegmentedEngine::new(
                self.client.clone(),
                spec.tuning.unwrap_or_else(LiveTuning::live_edge),
            )),
            EngineVariant::ManifestDrm => {
                let mut engine = ManifestDrmEngine::new(self.client.clone());
                if let Some(clear_key) = &spec.clear_key {
                    engine.configure_drm(&clear_key.kid, &clear_key.key);
                }
                engine.register_request_filter(credential_filter(spec.cookie));
                Box::new(engine)
            }
        }
    }
}
