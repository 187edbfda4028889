//! Manifest (DASH) playback engine with clear-key DRM

use async_trait::async_trait;

use super::engine::{ClearKey, PlayOutcome, PlaybackEngine, VideoSink};
use super::filter::{PlaybackRequest, RequestFilter, RequestKind};
use super::EngineVariant;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Created,
    Loaded,
    Destroyed,
}

/// Manifest engine for `.mpd` streams. Carries an optional clear-key pair
/// and an ordered request-filter chain applied to every outgoing request.
pub struct ManifestDrmEngine {
    client: reqwest::Client,
    clear_key: Option<ClearKey>,
    filters: Vec<RequestFilter>,
    sink: Option<VideoSink>,
    state: EngineState,
}

impl ManifestDrmEngine {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            clear_key: None,
            filters: Vec::new(),
            sink: None,
            state: EngineState::Created,
        }
    }

    /// Configure clear-key DRM with a single key-id/key pair.
    pub fn configure_drm(&mut self, kid: &str, key: &str) {
        self.clear_key = Some(ClearKey {
            kid: kid.to_string(),
            key: key.to_string(),
        });
    }

    pub fn register_request_filter(&mut self, filter: RequestFilter) {
        self.filters.push(filter);
    }

    #[must_use]
    pub fn clear_key(&self) -> Option<&ClearKey> {
        self.clear_key.as_ref()
    }

    /// Build an outgoing request and run it through the filter chain.
    fn prepare_request(&self, kind: RequestKind, uri: &str) -> PlaybackRequest {
        let mut request = PlaybackRequest::new(kind, uri);
        for filter in &self.filters {
            filter(&mut request);
        }
        request
    }
}

#[async_trait]
impl PlaybackEngine for ManifestDrmEngine {
    fn variant(&self) -> EngineVariant {
        EngineVariant::ManifestDrm
    }

    async fn load(&mut self, url: &str) -> Result<()> {
        if self.state == EngineState::Destroyed {
            return Err(Error::Internal("Engine already destroyed".to_string()));
        }

        let request = self.prepare_request(RequestKind::Manifest, url);

        let mut builder = self.client.get(&request.uri);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Load(format!("Manifest request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Load(format!(
                "Manifest returned status {}",
                response.status()
            )));
        }

        let manifest = response
            .text()
            .await
            .map_err(|e| Error::Load(format!("Failed to read manifest: {e}")))?;

        if !manifest.contains("<MPD") {
            return Err(Error::Load("Source is not a DASH manifest".to_string()));
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
        self.filters.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::filter::credential_filter;

    fn engine() -> ManifestDrmEngine {
        ManifestDrmEngine::new(reqwest::Client::new())
    }

    #[test]
    fn drm_configuration_stores_the_pair() {
        let mut engine = engine();
        assert!(engine.clear_key().is_none());
        engine.configure_drm("abc", "def");
        let clear_key = engine.clear_key().expect("configured");
        assert_eq!(clear_key.kid, "abc");
        assert_eq!(clear_key.key, "def");
    }

    #[test]
    fn filter_chain_rewrites_manifest_requests() {
        let mut engine = engine();
        engine.register_request_filter(credential_filter(Some("tok=1".to_string())));

        let request = engine.prepare_request(RequestKind::Manifest, "https://x/live.mpd");
        assert_eq!(request.uri, "https://x/live.mpd?tok=1");
        assert_eq!(request.headers.get("Cookie").map(String::as_str), Some("tok=1"));
    }

    #[test]
    fn filters_apply_in_registration_order() {
        let mut engine = engine();
        engine.register_request_filter(std::sync::Arc::new(|req: &mut PlaybackRequest| {
            req.headers.insert("X-Order".to_string(), "first".to_string());
        }));
        engine.register_request_filter(std::sync::Arc::new(|req: &mut PlaybackRequest| {
            req.headers.insert("X-Order".to_string(), "second".to_string());
        }));

        let request = engine.prepare_request(RequestKind::Segment, "https://x/seg1.ts");
        assert_eq!(request.headers.get("X-Order").map(String::as_str), Some("second"));
    }

    #[tokio::test]
    async fn play_before_load_is_an_error() {
        let mut engine = engine();
        engine.attach(VideoSink::inline_muted());
        assert!(matches!(engine.play().await, Err(Error::Load(_))));
    }
}
