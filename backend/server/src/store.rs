//! # Campaign Store
//!
//! One collection of flat campaign documents behind three calls: create, point lookup and a
//! full or top-N scan.
//!
//! - No filtering is pushed down, category filtering happens after retrieval
//! - The only ordering is `createdAt` descending
//! - No transactions, secondary indexes or partial reads are asked of a backend
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    error::StoreError,
    models::{Campaign, CampaignRecord},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    CreatedAtDesc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl ListQuery {
    /// Every campaign, in whatever order the backend iterates them.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn newest(limit: usize) -> Self {
        Self {
            order: Some(Order::CreatedAtDesc),
            limit: Some(limit),
        }
    }
}

#[async_trait]
pub trait CampaignStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    /// Appends a campaign and returns the id the store assigned to it.
    async fn create_campaign(&self, record: CampaignRecord) -> Result<String, StoreError>;

    /// `Ok(None)` when no campaign has this id.
    async fn get_campaign(&self, id: &str) -> Result<Option<Campaign>, StoreError>;

    async fn list_campaigns(&self, query: ListQuery) -> Result<Vec<Campaign>, StoreError>;
}

/// Applies a [`ListQuery`] to campaigns already in backend iteration order.
pub fn apply_query(mut campaigns: Vec<Campaign>, query: ListQuery) -> Vec<Campaign> {
    if let Some(Order::CreatedAtDesc) = query.order {
        // stable, so equal timestamps keep iteration order
        campaigns.sort_by(|a, b| b.record.created_at.cmp(&a.record.created_at));
    }

    if let Some(limit) = query.limit {
        campaigns.truncate(limit);
    }

    campaigns
}

/// Insertion-ordered store kept in process memory.
#[derive(Default)]
pub struct MemoryStore {
    campaigns: RwLock<Vec<Campaign>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.campaigns.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.campaigns.read().await.is_empty()
    }
}

#[async_trait]
impl CampaignStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn create_campaign(&self, record: CampaignRecord) -> Result<String, StoreError> {
        let id = (self.next_id.fetch_add(1, Ordering::Relaxed) + 1).to_string();

        self.campaigns
            .write()
            .await
            .push(Campaign::new(id.clone(), record));

        Ok(id)
    }

    async fn get_campaign(&self, id: &str) -> Result<Option<Campaign>, StoreError> {
        Ok(self
            .campaigns
            .read()
            .await
            .iter()
            .find(|campaign| campaign.id == id)
            .cloned())
    }

    async fn list_campaigns(&self, query: ListQuery) -> Result<Vec<Campaign>, StoreError> {
        let campaigns = self.campaigns.read().await.clone();

        Ok(apply_query(campaigns, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, fixtures::record};

    #[tokio::test]
    async fn ids_are_unique() {
        let store = MemoryStore::new();
        let a = store
            .create_campaign(record("A", Category::Health, 0))
            .await
            .unwrap();
        let b = store
            .create_campaign(record("B", Category::Health, 1))
            .await
            .unwrap();

        assert_ne!(a, b);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn point_lookup() {
        let store = MemoryStore::new();
        let id = store
            .create_campaign(record("A", Category::Arts, 0))
            .await
            .unwrap();

        let found = store.get_campaign(&id).await.unwrap().unwrap();
        assert_eq!(found.record.title, "A");
        assert_eq!(store.get_campaign("missing-id").await.unwrap(), None);
    }

    #[tokio::test]
    async fn unordered_scan_keeps_insertion_order() {
        let store = MemoryStore::new();
        for (title, minute) in [("late", 30), ("early", 5), ("mid", 15)] {
            store
                .create_campaign(record(title, Category::Community, minute))
                .await
                .unwrap();
        }

        let titles: Vec<_> = store
            .list_campaigns(ListQuery::all())
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.record.title)
            .collect();

        assert_eq!(titles, ["late", "early", "mid"]);
    }

    #[tokio::test]
    async fn newest_first_with_limit() {
        let store = MemoryStore::new();
        for (title, minute) in [("a", 1), ("b", 4), ("c", 2), ("d", 3)] {
            store
                .create_campaign(record(title, Category::Technology, minute))
                .await
                .unwrap();
        }

        let titles: Vec<_> = store
            .list_campaigns(ListQuery::newest(3))
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.record.title)
            .collect();

        assert_eq!(titles, ["b", "d", "c"]);
    }

    #[test]
    fn limit_without_order_truncates_iteration_order() {
        let campaigns = vec![
            Campaign::new("1".into(), record("x", Category::Arts, 1)),
            Campaign::new("2".into(), record("y", Category::Arts, 9)),
        ];
        let query = ListQuery {
            order: None,
            limit: Some(1),
        };

        let out = apply_query(campaigns, query);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "1");
    }
}
