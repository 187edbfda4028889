//! Segmented (HLS) playback engine

use async_trait::async_trait;

use super::engine::{LiveTuning, PlayOutcome, PlaybackEngine, VideoSink};
use super::EngineVariant;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Created,
    Loaded,
    Destroyed,
}

/// Adaptive-segment engine for `.m3u8` streams. Fetches and validates the
/// playlist on load; decoding happens downstream of the attached sink.
pub struct SegmentedEngine {
    client: reqwest::Client,
    tuning: LiveTuning,
    sink: Option<VideoSink>,
    state: EngineState,
}

impl SegmentedEngine {
    #[must_use]
    pub fn new(client: reqwest::Client, tuning: LiveTuning) -> Self {
        Self {
            client,
            tuning,
            sink: None,
            state: EngineState::Created,
        }
    }

    #[must_use]
    pub fn tuning(&self) -> LiveTuning {
        self.tuning
    }
}

#[async_trait]
impl PlaybackEngine for SegmentedEngine {
    fn variant(&self) -> EngineVariant {
        EngineVariant::Segmented
    }

    async fn load(&mut self, url: &str) -> Result<()> {
        if self.state == EngineState::Destroyed {
            return Err(Error::Internal("Engine already destroyed".to_string()));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Load(format!("Playlist request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Load(format!(
                "Playlist returned status {}",
                response.status()
            )));
        }

        let playlist = response
            .text()
            .await
            .map_err(|e| Error::Load(format!("Failed to read playlist: {e}")))?;

        if !playlist.trim_start().starts_with("#EXTM3U") {
            return Err(Error::Load("Source is not an M3U playlist".to_string()));
        }

        self.state = EngineState::Loaded;
        Ok(())
    }

    fn attach(&mut self, sink: VideoSink) {
        self.sink = Some(sink);
    }

    async fn play(&mut self) -> Result<PlayOutcome> {
        if self.state != EngineState::Loaded {
            return Err(Error::Load("Cannot play before a successful load".to_string()));
        }
        let allow_autoplay = self.sink.map(|s| s.allow_autoplay).unwrap_or(false);
        Ok(if allow_autoplay {
            PlayOutcome::Started
        } else {
            PlayOutcome::AwaitingInteraction
        })
    }

    fn destroy(&mut self) {
        self.state = EngineState::Destroyed;
        self.sink = None;
    }
}
