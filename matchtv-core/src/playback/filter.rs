//! Request filters for manifest/segment fetches
//!
//! A filter may rewrite the outgoing request before the engine sends it.
//! The credential filter reproduces what protected DASH upstreams expect:
//! fixed identification headers, the stored cookie, and the cookie mirrored
//! into the query string for CDNs that validate credentials on the URI.

use std::collections::HashMap;
use std::sync::Arc;

/// Request types an engine issues while playing a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Manifest,
    Segment,
    /// License fetches, telemetry, everything else. Never query-rewritten.
    Other,
}

/// One outgoing engine request, mutable by filters before dispatch.
#[derive(Debug, Clone)]
pub struct PlaybackRequest {
    pub kind: RequestKind,
    pub uri: String,
    pub headers: HashMap<String, String>,
}

impl PlaybackRequest {
    #[must_use]
    pub fn new(kind: RequestKind, uri: impl Into<String>) -> Self {
        Self {
            kind,
            uri: uri.into(),
            headers: HashMap::new(),
        }
    }
}

pub type RequestFilter = Arc<dyn Fn(&mut PlaybackRequest) + Send + Sync>;

/// Fixed Referer sent with every manifest/segment request.
pub const STREAM_REFERER: &str = "https://www.jiotv.com/";

/// Fixed User-Agent sent with every manifest/segment request.
pub const STREAM_USER_AGENT: &str = "plaYtv/7.1.5 (Linux;Android 13) ExoPlayerLib/2.11.6";

/// CDN auth-token marker. A URI already carrying this token must not get the
/// cookie credential appended a second time.
const CDN_TOKEN_MARKER: &str = "__hdnea=";

/// Build the credential filter for a stream.
///
/// Always sets the fixed `Referer` and `User-Agent`. When a cookie is
/// configured it is sent as a `Cookie` header on every request, and
/// additionally appended verbatim to the query string of manifest and
/// segment URIs that are not already CDN-tokenized. The join character is
/// `&` when the URI already has a query, `?` otherwise.
#[must_use]
pub fn credential_filter(cookie: Option<String>) -> RequestFilter {
    Arc::new(move |request: &mut PlaybackRequest| {
        request
            .headers
            .insert("Referer".to_string(), STREAM_REFERER.to_string());
        request
            .headers
            .insert("User-Agent".to_string(), STREAM_USER_AGENT.to_string());

        let Some(cookie) = &cookie else {
            return;
        };

        request
            .headers
            .insert("Cookie".to_string(), cookie.clone());

        if matches!(request.kind, RequestKind::Manifest | RequestKind::Segment)
            && !request.uri.contains(CDN_TOKEN_MARKER)
        {
            let sep = if request.uri.contains('?') { '&' } else { '?' };
            request.uri.push(sep);
            request.uri.push_str(cookie);
        }
    })
}
