//! # Redis
//!
//! Document store for campaigns.
//!
//! ## Layout
//!
//! - `campaigns`: Redis hash, campaign id to flat JSON document
//! - `campaigns:created`: sorted set of ids scored by `createdAt` in milliseconds, only read by
//!   the newest-first query
//! - `campaigns:next_id`: counter, `INCR` hands out ids so they are never reused
//!
//! ## Implementation
//!
//! - Document and index entry are written in one `MULTI` so a half-written campaign never shows
//! - Unordered scans are a single `HVALS`, order is whatever the hash iterates in
//! - Newest-first scans are `ZREVRANGE` then `HMGET`
//! - Documents are never updated or removed
use std::time::Duration;

use async_trait::async_trait;
use redis::{
    AsyncCommands, Client, RedisError,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use tracing::{debug, warn};

use crate::{
    error::StoreError,
    models::{Campaign, CampaignRecord},
    store::{CampaignStore, ListQuery, Order, apply_query},
};

pub const CAMPAIGNS_KEY: &str = "campaigns";
pub const CREATED_INDEX_KEY: &str = "campaigns:created";
pub const NEXT_ID_KEY: &str = "campaigns:next_id";

pub async fn init_redis(redis_url: &str) -> Result<ConnectionManager, RedisError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url)?;
    let connection_manager = client.get_connection_manager_with_config(config).await?;

    Ok(connection_manager)
}

pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    pub async fn connect(redis_url: &str) -> Result<Self, RedisError> {
        Ok(Self::new(init_redis(redis_url).await?))
    }
}

fn read_error(err: RedisError) -> StoreError {
    warn!("Redis read failed: {err}");
    StoreError::Read(err.to_string())
}

fn write_error(err: RedisError) -> StoreError {
    warn!("Redis write failed: {err}");
    StoreError::Write(err.to_string())
}

fn decode(document: &str) -> Result<Campaign, StoreError> {
    serde_json::from_str(document).map_err(|e| {
        warn!("Undecodable campaign document: {e}");
        StoreError::Read(format!("corrupt campaign document: {e}"))
    })
}

#[async_trait]
impl CampaignStore for RedisStore {
    fn backend_tag(&self) -> &'static str {
        "redis"
    }

    async fn create_campaign(&self, record: CampaignRecord) -> Result<String, StoreError> {
        let mut connection = self.connection.clone();

        let id: u64 = connection.incr(NEXT_ID_KEY, 1).await.map_err(write_error)?;
        let campaign = Campaign::new(id.to_string(), record);
        let score = campaign.record.created_at.timestamp_millis();

        let document =
            serde_json::to_string(&campaign).map_err(|e| StoreError::Write(e.to_string()))?;

        redis::pipe()
            .atomic()
            .hset(CAMPAIGNS_KEY, &campaign.id, document)
            .ignore()
            .zadd(CREATED_INDEX_KEY, &campaign.id, score)
            .ignore()
            .query_async::<()>(&mut connection)
            .await
            .map_err(write_error)?;

        debug!("Stored campaign {}", campaign.id);

        Ok(campaign.id)
    }

    async fn get_campaign(&self, id: &str) -> Result<Option<Campaign>, StoreError> {
        let mut connection = self.connection.clone();

        let document: Option<String> = connection
            .hget(CAMPAIGNS_KEY, id)
            .await
            .map_err(read_error)?;

        document.as_deref().map(decode).transpose()
    }

    async fn list_campaigns(&self, query: ListQuery) -> Result<Vec<Campaign>, StoreError> {
        let mut connection = self.connection.clone();

        let documents: Vec<String> = match query.order {
            None => connection.hvals(CAMPAIGNS_KEY).await.map_err(read_error)?,
            Some(Order::CreatedAtDesc) => {
                if query.limit == Some(0) {
                    return Ok(Vec::new());
                }
                let stop = query.limit.map_or(-1, |limit| limit as isize - 1);

                let ids: Vec<String> = connection
                    .zrevrange(CREATED_INDEX_KEY, 0, stop)
                    .await
                    .map_err(read_error)?;
                if ids.is_empty() {
                    return Ok(Vec::new());
                }

                let found: Vec<Option<String>> = redis::cmd("HMGET")
                    .arg(CAMPAIGNS_KEY)
                    .arg(&ids)
                    .query_async(&mut connection)
                    .await
                    .map_err(read_error)?;

                found.into_iter().flatten().collect()
            }
        };

        let campaigns = documents
            .iter()
            .map(|document| decode(document))
            .collect::<Result<Vec<_>, _>>()?;

        // re-applied so ties and the unordered limit follow the same rules as every backend
        Ok(apply_query(campaigns, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn malformed_redis_url_is_an_error() {
        assert!(init_redis("not a redis url").await.is_err());
        assert!(RedisStore::connect("http://127.0.0.1:6379").await.is_err());
    }

    #[test]
    fn corrupt_documents_are_read_errors() {
        assert!(matches!(decode("{not json"), Err(StoreError::Read(_))));
        assert!(matches!(decode(r#"{"id":"1"}"#), Err(StoreError::Read(_))));
    }

    #[test]
    fn stored_documents_decode() {
        let document = r#"{
            "id": "12",
            "title": "Solar lamps",
            "description": "Lamps for the village school",
            "category": "Technology",
            "targetAmount": 800,
            "image": "/uploads/lamp",
            "accountName": "School Fund",
            "accountNumber": "42",
            "ifscCode": "UTIB0000007",
            "createdAt": "2025-04-02T08:30:00Z"
        }"#;

        let campaign = decode(document).unwrap();
        assert_eq!(campaign.id, "12");
        assert_eq!(campaign.record.target_amount, 800.0);
        assert_eq!(campaign.record.upi_id, None);
    }
}
