//! Listing view-model
//!
//! Pure render function turning catalog records into display-ready cards.
//! All markup construction belongs to the consumer; nothing here knows about
//! HTML or DOM.

use chrono::DateTime;
use serde::Serialize;

use super::match_record::{MatchRecord, MatchStatus};
use crate::playback::{resolve_format, EngineVariant};

/// Where the listing routes a viewer who opens a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchRoute {
    pub variant: EngineVariant,
    pub path: String,
}

/// One render-ready listing card.
#[derive(Debug, Clone, Serialize)]
pub struct MatchCard {
    pub id: String,
    pub title: String,
    pub poster_url: String,
    pub status: MatchStatus,
    pub badge: String,
    /// Publication time formatted for display (UTC).
    pub posted_at: String,
    /// Present only when the match is live AND its format is supported.
    /// `None` renders as a disabled card.
    pub watch_route: Option<WatchRoute>,
}

/// Render the catalog into listing cards, preserving input order.
///
/// Routing uses `resolve_format` so the listing and the watch endpoints can
/// never disagree about which engine a record belongs to.
#[must_use]
pub fn render_listing(records: &[MatchRecord]) -> Vec<MatchCard> {
    records.iter().map(render_card).collect()
}

fn render_card(record: &MatchRecord) -> MatchCard {
    let watch_route = if record.is_live() {
        resolve_format(&record.stream_url).map(|variant| WatchRoute {
            variant,
            path: format!("/api/watch/{}?id={}", variant.route_segment(), record.id),
        })
    } else {
        None
    };

    MatchCard {
        id: record.id.to_string(),
        title: record.title.clone(),
        poster_url: record.poster_url.clone(),
        status: record.status,
        badge: record.status.badge().to_string(),
        posted_at: format_posted_at(record.created_at),
        watch_route,
    }
}

fn format_posted_at(epoch_ms: i64) -> String {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::id::MatchId;

    fn record(stream_url: &str, status: MatchStatus) -> MatchRecord {
        MatchRecord {
            id: MatchId::from("m1"),
            title: "Final".to_string(),
            poster_url: "https://cdn/p.jpg".to_string(),
            stream_url: stream_url.to_string(),
            status,
            created_at: 1_700_000_000_000,
            cookie: None,
            kid: None,
            key: None,
        }
    }

    #[test]
    fn live_hls_match_routes_to_hls_watch_page() {
        let cards = render_listing(&[record("https://x/live.m3u8", MatchStatus::Live)]);
        let route = cards[0].watch_route.as_ref().expect("live match routes");
        assert_eq!(route.variant, EngineVariant::Segmented);
        assert_eq!(route.path, "/api/watch/hls?id=m1");
        assert_eq!(cards[0].badge, "LIVE");
    }

    #[test]
    fn live_dash_match_routes_to_dash_watch_page() {
        let cards = render_listing(&[record("https://x/live.mpd", MatchStatus::Live)]);
        let route = cards[0].watch_route.as_ref().expect("live match routes");
        assert_eq!(route.variant, EngineVariant::ManifestDrm);
        assert_eq!(route.path, "/api/watch/dash?id=m1");
    }

    #[test]
    fn upcoming_match_has_no_route() {
        let cards = render_listing(&[record("https://x/live.m3u8", MatchStatus::Upcoming)]);
        assert!(cards[0].watch_route.is_none());
        assert_eq!(cards[0].badge, "UPCOMING");
    }

    #[test]
    fn unsupported_format_has_no_route() {
        let cards = render_listing(&[record("https://x/live.flv", MatchStatus::Live)]);
        assert!(cards[0].watch_route.is_none());
    }

    #[test]
    fn posted_at_is_formatted() {
        let cards = render_listing(&[record("https://x/live.m3u8", MatchStatus::Live)]);
        assert!(cards[0].posted_at.ends_with("UTC"));
    }
}
