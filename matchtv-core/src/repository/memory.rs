//! In-memory catalog repository for tests and single-node development

use async_trait::async_trait;
use dashmap::DashMap;

use super::catalog::CatalogRepository;
use crate::models::{MatchId, MatchRecord};
use crate::{Error, Result};

#[derive(Default)]
pub struct MemoryCatalogRepository {
    records: DashMap<MatchId, MatchRecord>,
}

impl MemoryCatalogRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogRepository for MemoryCatalogRepository {
    async fn create(&self, record: &MatchRecord) -> Result<MatchRecord> {
        if self.records.contains_key(&record.id) {
            return Err(Error::InvalidInput(format!(
                "Match {} already exists",
                record.id
            )));
        }
        self.records.insert(record.id.clone(), record.clone());
        Ok(record.clone())
    }

    async fn update(&self, record: &MatchRecord) -> Result<MatchRecord> {
        let mut existing = self.records.get_mut(&record.id).ok_or(Error::NotFound)?;
        *existing = record.clone();
        Ok(record.clone())
    }

    async fn delete(&self, id: &MatchId) -> Result<bool> {
        Ok(self.records.remove(id).is_some())
    }

    async fn get(&self, id: &MatchId) -> Result<Option<MatchRecord>> {
        Ok(self.records.get(id).map(|r| r.value().clone()))
    }

    async fn list_by_created_desc(&self) -> Result<Vec<MatchRecord>> {
        let mut records: Vec<MatchRecord> =
            self.records.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchStatus;

    fn record(id: &str, created_at: i64) -> MatchRecord {
        MatchRecord {
            id: MatchId::from(id),
            title: "Final".to_string(),
            poster_url: "https://cdn/p.jpg".to_string(),
            stream_url: "https://cdn/live.m3u8".to_string(),
            status: MatchStatus::Live,
            created_at,
            cookie: None,
            kid: None,
            key: None,
        }
    }

    #[tokio::test]
    async fn create_get_delete_round_trip() {
        let repo = MemoryCatalogRepository::new();
        repo.create(&record("m1", 1)).await.unwrap();

        let fetched = repo.get(&MatchId::from("m1")).await.unwrap();
        assert!(fetched.is_some());

        assert!(repo.delete(&MatchId::from("m1")).await.unwrap());
        assert!(!repo.delete(&MatchId::from("m1")).await.unwrap());
        assert!(repo.get(&MatchId::from("m1")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_of_missing_record_is_not_found() {
        let repo = MemoryCatalogRepository::new();
        let result = repo.update(&record("ghost", 1)).await;
        assert!(matches!(result, Err(Error::NotFound)));
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let repo = MemoryCatalogRepository::new();
        repo.create(&record("old", 100)).await.unwrap();
        repo.create(&record("new", 300)).await.unwrap();
        repo.create(&record("mid", 200)).await.unwrap();

        let records = repo.list_by_created_desc().await.unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }
}
