//! Catalog management service
//!
//! Validated CRUD over the match catalog. Writes are whole-record
//! overwrites; deletes are hard. Ordering is creation-time descending.

use std::sync::Arc;

use tracing::warn;

use crate::models::{render_listing, MatchCard, MatchId, MatchRecord, NewMatch};
use crate::playback::{resolve_format, EngineVariant};
use crate::repository::CatalogRepository;
use crate::{Error, Result};

#[derive(Clone)]
pub struct CatalogService {
    repo: Arc<dyn CatalogRepository>,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService").finish()
    }
}

impl CatalogService {
    pub fn new(repo: Arc<dyn CatalogRepository>) -> Self {
        Self { repo }
    }

    pub async fn create_match(&self, draft: NewMatch) -> Result<MatchRecord> {
        warn_on_mixed_discriminators(&draft.stream_url, draft.cookie.as_deref());
        self.repo.create(&draft.into_record()).await
    }

    /// Full-field overwrite. Id and creation time are preserved.
    pub async fn update_match(&self, id: &MatchId, draft: NewMatch) -> Result<MatchRecord> {
        let existing = self.repo.get(id).await?.ok_or(Error::NotFound)?;
        warn_on_mixed_discriminators(&draft.stream_url, draft.cookie.as_deref());
        self.repo.update(&draft.apply_to(&existing)).await
    }

    pub async fn delete_match(&self, id: &MatchId) -> Result<()> {
        if self.repo.delete(id).await? {
            Ok(())
        } else {
            Err(Error::NotFound)
        }
    }

    pub async fn get_match(&self, id: &MatchId) -> Result<MatchRecord> {
        self.repo.get(id).await?.ok_or(Error::NotFound)
    }

    /// All records, newest first.
    pub async fn list_matches(&self) -> Result<Vec<MatchRecord>> {
        self.repo.list_by_created_desc().await
    }

    /// Render-ready listing cards, newest first.
    pub async fn listing(&self) -> Result<Vec<MatchCard>> {
        Ok(render_listing(&self.list_matches().await?))
    }
}

/// The catalog carries two format discriminators: the URL suffix (used for
/// playback routing) and cookie presence (used by legacy edit forms). They
/// can disagree; routing always follows the suffix, so a disagreement is
/// flagged here instead of silently reinterpreted.
fn warn_on_mixed_discriminators(stream_url: &str, cookie: Option<&str>) {
    let is_dash = matches!(resolve_format(stream_url), Some(EngineVariant::ManifestDrm));
    if cookie.is_some() && !is_dash {
        warn!("Match has a cookie credential but a non-DASH stream URL; playback routes by URL suffix");
    }
    if cookie.is_none() && is_dash {
        warn!("DASH match has no cookie credential; cookie-keyed edit tooling will misclassify it");
    }
}
