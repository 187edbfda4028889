//! Playback engine selection and configuration
//!
//! The stream URL suffix is the single dispatch key of the whole system:
//! `.m3u8` plays on the segmented (HLS) engine, `.mpd` on the manifest
//! (DASH + clear-key DRM) engine, anything else is unsupported. Every call
//! site — the listing router and both watch endpoints — goes through
//! [`resolve_format`] so they can never disagree.

pub mod dash;
pub mod engine;
pub mod filter;
pub mod hls;

pub use dash::ManifestDrmEngine;
pub use engine::{
    ClearKey, EngineFactory, EngineSpec, HttpEngineFactory, LiveTuning, PlayOutcome,
    PlaybackEngine, VideoSink,
};
pub use filter::{credential_filter, PlaybackRequest, RequestFilter, RequestKind};
pub use hls::SegmentedEngine;

/// Which playback technology handles a given stream format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineVariant {
    /// Segmented HLS playback.
    Segmented,
    /// DASH manifest playback with optional clear-key DRM.
    ManifestDrm,
}

impl EngineVariant {
    /// URL path segment of the watch endpoint serving this variant.
    #[must_use]
    pub const fn route_segment(self) -> &'static str {
        match self {
            Self::Segmented => "hls",
            Self::ManifestDrm => "dash",
        }
    }
}

impl std::fmt::Display for EngineVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Segmented => "segmented",
            Self::ManifestDrm => "manifest_drm",
        })
    }
}

/// Resolve the engine variant for a stream URL.
///
/// Trims surrounding whitespace first; an empty URL or an unknown suffix is
/// unsupported (`None`) and must never reach an engine.
#[must_use]
pub fn resolve_format(stream_url: &str) -> Option<EngineVariant> {
    let url = stream_url.trim();
    if url.is_empty() {
        return None;
    }
    if url.ends_with(".m3u8") {
        Some(EngineVariant::Segmented)
    } else if url.ends_with(".mpd") {
        Some(EngineVariant::ManifestDrm)
    } else {
        None
    }
}
