//! End-to-end session controller tests over the in-memory repository, the
//! local presence channel, and recording engine fakes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use matchtv_core::models::{MatchId, MatchRecord, MatchStatus};
use matchtv_core::playback::{
    EngineFactory, EngineSpec, EngineVariant, PlayOutcome, PlaybackEngine, VideoSink,
};
use matchtv_core::presence::{LocalPresence, PresenceChannel};
use matchtv_core::repository::{CatalogRepository, MemoryCatalogRepository};
use matchtv_core::service::SessionService;
use matchtv_core::{Error, Result};

struct FakeEngine {
    variant: EngineVariant,
    fail_load: bool,
    loaded: bool,
    destroyed: Arc<AtomicUsize>,
}

#[async_trait]
impl PlaybackEngine for FakeEngine {
    fn variant(&self) -> EngineVariant {
        self.variant
    }

    async fn load(&mut self, _url: &str) -> Result<()> {
        if self.fail_load {
            return Err(Error::Load("manifest fetch failed".to_string()));
        }
        self.loaded = true;
        Ok(())
    }

    fn attach(&mut self, _sink: VideoSink) {}

    async fn play(&mut self) -> Result<PlayOutcome> {
        if !self.loaded {
            return Err(Error::Load("not loaded".to_string()));
        }
        Ok(PlayOutcome::Started)
    }

    fn destroy(&mut self) {
        self.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Records every spec the controller asks for and hands out fake engines.
#[derive(Default)]
struct RecordingFactory {
    specs: Mutex<Vec<EngineSpec>>,
    fail_load: bool,
    destroyed: Arc<AtomicUsize>,
}

impl RecordingFactory {
    fn failing() -> Self {
        Self {
            fail_load: true,
            ..Self::default()
        }
    }

    fn specs(&self) -> Vec<EngineSpec> {
        self.specs.lock().expect("specs lock").clone()
    }

    fn engines_built(&self) -> usize {
        self.specs.lock().expect("specs lock").len()
    }

    fn engines_destroyed(&self) -> usize {
        self.destroyed.load(Ordering::SeqCst)
    }
}

impl EngineFactory for RecordingFactory {
    fn create(&self, spec: EngineSpec) -> Box<dyn PlaybackEngine> {
        self.specs.lock().expect("specs lock").push(spec.clone());
        Box::new(FakeEngine {
            variant: spec.variant,
            fail_load: self.fail_load,
            loaded: false,
            destroyed: self.destroyed.clone(),
        })
    }
}

struct Harness {
    repo: Arc<MemoryCatalogRepository>,
    presence: Arc<LocalPresence>,
    factory: Arc<RecordingFactory>,
    service: SessionService,
}

fn harness_with(factory: RecordingFactory) -> Harness {
    let repo = Arc::new(MemoryCatalogRepository::new());
    let presence = Arc::new(LocalPresence::new());
    let factory = Arc::new(factory);
    let service = SessionService::new(repo.clone(), presence.clone(), factory.clone());
    Harness {
        repo,
        presence,
        factory,
        service,
    }
}

fn harness() -> Harness {
    harness_with(RecordingFactory::default())
}

fn hls_record(id: &str) -> MatchRecord {
    MatchRecord {
        id: MatchId::from(id),
        title: "Final".to_string(),
        poster_url: "https://cdn/p.jpg".to_string(),
        stream_url: "https://x/live.m3u8".to_string(),
        status: MatchStatus::Live,
        created_at: 1,
        cookie: None,
        kid: None,
        key: None,
    }
}

fn dash_record(id: &str, cookie: Option<&str>, kid: Option<&str>, key: Option<&str>) -> MatchRecord {
    MatchRecord {
        id: MatchId::from(id),
        title: "Final".to_string(),
        poster_url: "https://cdn/p.jpg".to_string(),
        stream_url: "https://x/live.mpd".to_string(),
        status: MatchStatus::Live,
        created_at: 1,
        cookie: cookie.map(String::from),
        kid: kid.map(String::from),
        key: key.map(String::from),
    }
}

#[tokio::test]
async fn unknown_match_fails_not_found_before_any_engine_work() {
    let h = harness();
    let result = h.service.open(&MatchId::from("ghost"), EngineVariant::Segmented).await;
    assert!(matches!(result, Err(Error::NotFound)));
    assert_eq!(h.factory.engines_built(), 0);
}

#[tokio::test]
async fn empty_stream_url_is_unsupported_before_any_engine_work() {
    let h = harness();
    let mut record = hls_record("m1");
    record.stream_url = String::new();
    h.repo.create(&record).await.unwrap();

    let result = h.service.open(&record.id, EngineVariant::Segmented).await;
    assert!(matches!(result, Err(Error::Unsupported(_))));
    assert_eq!(h.factory.engines_built(), 0);
}

#[tokio::test]
async fn variant_mismatch_is_unsupported() {
    let h = harness();
    let record = dash_record("m2", None, None, None);
    h.repo.create(&record).await.unwrap();

    // A DASH record opened on the segmented page must never start loading.
    let result = h.service.open(&record.id, EngineVariant::Segmented).await;
    assert!(matches!(result, Err(Error::Unsupported(_))));
    assert_eq!(h.factory.engines_built(), 0);
}

#[tokio::test]
async fn hls_session_gets_live_tuning_and_no_credentials() {
    let h = harness();
    h.repo.create(&hls_record("m1")).await.unwrap();

    let session = h
        .service
        .open(&MatchId::from("m1"), EngineVariant::Segmented)
        .await
        .unwrap();
    assert_eq!(session.variant(), EngineVariant::Segmented);

    let specs = h.factory.specs();
    assert_eq!(specs.len(), 1);
    assert!(specs[0].tuning.is_some());
    assert!(specs[0].clear_key.is_none());
    assert!(specs[0].cookie.is_none());
}

#[tokio::test]
async fn dash_session_with_full_pair_configures_drm_and_cookie() {
    let h = harness();
    h.repo
        .create(&dash_record("m2", Some("tok=1"), Some("abc"), Some("def")))
        .await
        .unwrap();

    h.service
        .open(&MatchId::from("m2"), EngineVariant::ManifestDrm)
        .await
        .unwrap();

    let specs = h.factory.specs();
    let clear_key = specs[0].clear_key.as_ref().expect("DRM configured");
    assert_eq!(clear_key.kid, "abc");
    assert_eq!(clear_key.key, "def");
    assert_eq!(specs[0].cookie.as_deref(), Some("tok=1"));
}

#[tokio::test]
async fn dash_session_with_half_pair_skips_drm_entirely() {
    let h = harness();
    h.repo
        .create(&dash_record("m2", Some("tok=1"), Some("abc"), None))
        .await
        .unwrap();
    h.repo
        .create(&dash_record("m3", None, None, Some("def")))
        .await
        .unwrap();

    h.service
        .open(&MatchId::from("m2"), EngineVariant::ManifestDrm)
        .await
        .unwrap();
    h.service
        .open(&MatchId::from("m3"), EngineVariant::ManifestDrm)
        .await
        .unwrap();

    for spec in h.factory.specs() {
        assert!(spec.clear_key.is_none(), "half pair must not configure DRM");
    }
}

#[tokio::test]
async fn source_url_is_trimmed_before_load() {
    let h = harness();
    let mut record = hls_record("m1");
    record.stream_url = "  https://x/live.m3u8  ".to_string();
    h.repo.create(&record).await.unwrap();

    h.service
        .open(&record.id, EngineVariant::Segmented)
        .await
        .unwrap();

    assert_eq!(h.factory.specs()[0].source_url, "https://x/live.m3u8");
}

#[tokio::test]
async fn open_joins_presence_and_close_leaves_it() {
    let h = harness();
    h.repo.create(&hls_record("m1")).await.unwrap();
    let match_id = MatchId::from("m1");

    let session = h
        .service
        .open(&match_id, EngineVariant::Segmented)
        .await
        .unwrap();
    assert_eq!(h.presence.count(&match_id).await.unwrap(), 1);

    session.close().await;
    assert_eq!(h.presence.count(&match_id).await.unwrap(), 0);
}

#[tokio::test]
async fn close_twice_removes_entry_once_and_destroys_engine_once() {
    let h = harness();
    h.repo.create(&hls_record("m1")).await.unwrap();
    let match_id = MatchId::from("m1");

    let session = h
        .service
        .open(&match_id, EngineVariant::Segmented)
        .await
        .unwrap();

    session.close().await;
    session.close().await;

    assert_eq!(h.presence.count(&match_id).await.unwrap(), 0);
    assert_eq!(h.factory.engines_destroyed(), 1);
}

#[tokio::test]
async fn load_failure_leaves_no_presence_entry() {
    let h = harness_with(RecordingFactory::failing());
    h.repo.create(&hls_record("m1")).await.unwrap();
    let match_id = MatchId::from("m1");

    let result = h.service.open(&match_id, EngineVariant::Segmented).await;
    assert!(matches!(result, Err(Error::Load(_))));
    assert_eq!(h.presence.count(&match_id).await.unwrap(), 0);
}

#[tokio::test]
async fn concurrent_sessions_of_one_match_are_counted_independently() {
    let h = harness();
    h.repo.create(&hls_record("m1")).await.unwrap();
    let match_id = MatchId::from("m1");

    let s1 = h
        .service
        .open(&match_id, EngineVariant::Segmented)
        .await
        .unwrap();
    let s2 = h
        .service
        .open(&match_id, EngineVariant::Segmented)
        .await
        .unwrap();
    assert_ne!(s1.session_id(), s2.session_id());
    assert_eq!(h.presence.count(&match_id).await.unwrap(), 2);

    s1.close().await;
    assert_eq!(h.presence.count(&match_id).await.unwrap(), 1);
}

#[tokio::test]
async fn blank_title_falls_back_to_literal() {
    let h = harness();
    let mut record = hls_record("m1");
    record.title = "   ".to_string();
    h.repo.create(&record).await.unwrap();

    let session = h
        .service
        .open(&record.id, EngineVariant::Segmented)
        .await
        .unwrap();
    assert_eq!(session.title(), "Live Match");
}

#[tokio::test]
async fn service_close_by_id_is_single_shot() {
    let h = harness();
    h.repo.create(&hls_record("m1")).await.unwrap();

    let session = h
        .service
        .open(&MatchId::from("m1"), EngineVariant::Segmented)
        .await
        .unwrap();
    let session_id = session.session_id().clone();
    drop(session);

    assert!(h.service.close(&session_id).await);
    assert!(!h.service.close(&session_id).await);
    assert_eq!(h.service.open_sessions(), 0);
}

#[tokio::test]
async fn abandoned_session_is_cleaned_up_on_drop() {
    let h = harness();
    h.repo.create(&hls_record("m1")).await.unwrap();
    let match_id = MatchId::from("m1");
    let presence = h.presence.clone();

    let session = h
        .service
        .open(&match_id, EngineVariant::Segmented)
        .await
        .unwrap();
    assert_eq!(presence.count(&match_id).await.unwrap(), 1);

    // Abandon without close(): drop the tracking service and the handle.
    drop(h.service);
    drop(session);

    // The drop hook leaves presence asynchronously.
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(presence.count(&match_id).await.unwrap(), 0);
}
