//! Match catalog entities
//!
//! A match record describes one publishable live/upcoming event. The stream
//! URL suffix is the single dispatch key deciding which playback engine
//! serves it.

use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::id::MatchId;
use crate::{Error, Result};

/// Publication status. Only `Live` matches can be opened from the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Live,
    Upcoming,
}

impl MatchStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Upcoming => "upcoming",
        }
    }

    /// Badge label shown on the listing card.
    #[must_use]
    pub const fn badge(self) -> &'static str {
        match self {
            Self::Live => "LIVE",
            Self::Upcoming => "UPCOMING",
        }
    }
}

impl FromStr for MatchStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "live" => Ok(Self::Live),
            "upcoming" => Ok(Self::Upcoming),
            other => Err(Error::InvalidInput(format!("Unknown match status: {other}"))),
        }
    }
}

/// One publishable event in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub title: String,
    pub poster_url: String,
    pub stream_url: String,
    pub status: MatchStatus,
    /// Epoch milliseconds, set once at creation. Only used for sorting.
    pub created_at: i64,
    /// Opaque credential appended to manifest/segment requests (DASH only).
    pub cookie: Option<String>,
    /// Clear-key DRM key id. Effective only together with `key`.
    pub kid: Option<String>,
    /// Clear-key DRM key. Effective only together with `kid`.
    pub key: Option<String>,
}

impl MatchRecord {
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.status == MatchStatus::Live
    }

    /// The clear-key pair, or `None` unless BOTH halves are present.
    /// A half-configured pair is treated as absent, never partially applied.
    #[must_use]
    pub fn clear_key(&self) -> Option<(&str, &str)> {
        match (self.kid.as_deref(), self.key.as_deref()) {
            (Some(kid), Some(key)) => Some((kid, key)),
            _ => None,
        }
    }
}

/// Validated draft of a match record, as submitted by the admin console.
/// All fields arrive as raw form strings; `new` trims them and collapses
/// empty optional credentials to `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMatch {
    pub title: String,
    pub poster_url: String,
    pub stream_url: String,
    pub status: MatchStatus,
    pub cookie: Option<String>,
    pub kid: Option<String>,
    pub key: Option<String>,
}

impl NewMatch {
    pub fn new(
        title: &str,
        poster_url: &str,
        stream_url: &str,
        status: MatchStatus,
        cookie: Option<&str>,
        kid: Option<&str>,
        key: Option<&str>,
    ) -> Result<Self> {
        let title = title.trim();
        let poster_url = poster_url.trim();
        let stream_url = stream_url.trim();

        if title.is_empty() || poster_url.is_empty() || stream_url.is_empty() {
            return Err(Error::InvalidInput(
                "Title, poster URL and stream URL are required".to_string(),
            ));
        }

        Ok(Self {
            title: title.to_string(),
            poster_url: poster_url.to_string(),
            stream_url: stream_url.to_string(),
            status,
            cookie: normalize_optional(cookie),
            kid: normalize_optional(kid),
            key: normalize_optional(key),
        })
    }

    /// Materialize into a record with a fresh id and creation timestamp.
    #[must_use]
    pub fn into_record(self) -> MatchRecord {
        MatchRecord {
            id: MatchId::new(),
            title: self.title,
            poster_url: self.poster_url,
            stream_url: self.stream_url,
            status: self.status,
            created_at: Utc::now().timestamp_millis(),
            cookie: self.cookie,
            kid: self.kid,
            key: self.key,
        }
    }

    /// Overwrite an existing record's fields, keeping id and creation time.
    #[must_use]
    pub fn apply_to(self, existing: &MatchRecord) -> MatchRecord {
        MatchRecord {
            id: existing.id.clone(),
            title: self.title,
            poster_url: self.poster_url,
            stream_url: self.stream_url,
            status: self.status,
            created_at: existing.created_at,
            cookie: self.cookie,
            kid: self.kid,
            key: self.key,
        }
    }
}

/// Blank form fields count as absent, not as empty credentials.
fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kid: Option<&str>, key: Option<&str>) -> MatchRecord {
        MatchRecord {
            id: MatchId::new(),
            title: "Final".to_string(),
            poster_url: "https://cdn/p.jpg".to_string(),
            stream_url: "https://cdn/live.mpd".to_string(),
            status: MatchStatus::Live,
            created_at: 0,
            cookie: None,
            kid: kid.map(String::from),
            key: key.map(String::from),
        }
    }

    #[test]
    fn clear_key_requires_both_halves() {
        assert_eq!(
            record(Some("abc"), Some("def")).clear_key(),
            Some(("abc", "def"))
        );
        assert_eq!(record(Some("abc"), None).clear_key(), None);
        assert_eq!(record(None, Some("def")).clear_key(), None);
        assert_eq!(record(None, None).clear_key(), None);
    }

    #[test]
    fn new_match_trims_and_validates() {
        let draft = NewMatch::new(
            "  Final  ",
            " https://cdn/p.jpg ",
            " https://cdn/live.m3u8 ",
            MatchStatus::Live,
            None,
            None,
            None,
        )
        .expect("valid draft");
        assert_eq!(draft.title, "Final");
        assert_eq!(draft.stream_url, "https://cdn/live.m3u8");
    }

    #[test]
    fn new_match_rejects_blank_required_fields() {
        let result = NewMatch::new("", "p", "s", MatchStatus::Live, None, None, None);
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        let result = NewMatch::new("t", "p", "   ", MatchStatus::Live, None, None, None);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn blank_credentials_collapse_to_none() {
        let draft = NewMatch::new(
            "Final",
            "p",
            "https://cdn/live.mpd",
            MatchStatus::Live,
            Some("   "),
            Some(""),
            Some("def"),
        )
        .expect("valid draft");
        assert_eq!(draft.cookie, None);
        assert_eq!(draft.kid, None);
        assert_eq!(draft.key.as_deref(), Some("def"));
    }

    #[test]
    fn apply_to_preserves_id_and_created_at() {
        let existing = record(None, None);
        let draft = NewMatch::new(
            "Rematch",
            "p2",
            "https://cdn/other.mpd",
            MatchStatus::Upcoming,
            None,
            None,
            None,
        )
        .expect("valid draft");

        let updated = draft.apply_to(&existing);
        assert_eq!(updated.id, existing.id);
        assert_eq!(updated.created_at, existing.created_at);
        assert_eq!(updated.title, "Rematch");
        assert_eq!(updated.status, MatchStatus::Upcoming);
    }

    #[test]
    fn status_round_trips() {
        assert_eq!("live".parse::<MatchStatus>().ok(), Some(MatchStatus::Live));
        assert_eq!(
            "upcoming".parse::<MatchStatus>().ok(),
            Some(MatchStatus::Upcoming)
        );
        assert!("paused".parse::<MatchStatus>().is_err());
    }
}
