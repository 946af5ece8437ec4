// region:    --- Imports
use super::{AuctionStore, StoreError};
use crate::auction::model::{Auction, AuctionId, BidUpdate, NewAuction};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

// endregion: --- Imports

// region:    --- In-Memory Auction Store
#[derive(Default)]
struct Inner {
    next_id: AuctionId,
    records: BTreeMap<AuctionId, Auction>,
    closed: bool,
}

/// Process-local store. Used by tests and by `STORE_BACKEND=memory`.
#[derive(Default)]
pub struct InMemoryAuctionStore {
    inner: RwLock<Inner>,
}

impl InMemoryAuctionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn open(inner: &Inner) -> Result<(), StoreError> {
    if inner.closed {
        Err(StoreError::Closed)
    } else {
        Ok(())
    }
}

#[async_trait]
impl AuctionStore for InMemoryAuctionStore {
    async fn insert(&self, auction: NewAuction) -> Result<Auction, StoreError> {
        let mut inner = self.inner.write().await;
        open(&inner)?;
        inner.next_id += 1;
        let now = Utc::now();
        let record = Auction {
            id: inner.next_id,
            item_name: auction.item_name,
            item_category: auction.item_category,
            starting_bid: auction.starting_bid,
            current_bid: auction.starting_bid,
            bidder_name: None,
            auction_end_date: auction.auction_end_date,
            item_description: auction.item_description,
            created_at: now,
            updated_at: now,
            version: 0,
        };
        inner.records.insert(record.id, record.clone());
        info!("{:<12} --> Auction inserted id: {}", "Store", record.id);
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<Auction>, StoreError> {
        let inner = self.inner.read().await;
        open(&inner)?;
        let mut all: Vec<Auction> = inner.records.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(all)
    }

    async fn get(&self, id: AuctionId) -> Result<Option<Auction>, StoreError> {
        let inner = self.inner.read().await;
        open(&inner)?;
        Ok(inner.records.get(&id).cloned())
    }

    async fn apply_bid(&self, update: BidUpdate) -> Result<Option<Auction>, StoreError> {
        let mut inner = self.inner.write().await;
        open(&inner)?;
        let Some(record) = inner.records.get_mut(&update.auction_id) else {
            return Ok(None);
        };
        if record.version != update.expected_version {
            debug!(
                "{:<12} --> Version conflict id: {} expected version: {}, found: {}",
                "Store", update.auction_id, update.expected_version, record.version
            );
            return Ok(None);
        }
        record.current_bid = update.bid_amount;
        record.bidder_name = Some(update.bidder_name);
        record.updated_at = Utc::now();
        record.version += 1;
        Ok(Some(record.clone()))
    }

    async fn delete(&self, id: AuctionId) -> Result<Option<Auction>, StoreError> {
        let mut inner = self.inner.write().await;
        open(&inner)?;
        Ok(inner.records.remove(&id))
    }

    async fn close(&self) {
        self.inner.write().await.closed = true;
        info!("{:<12} --> In-memory store closed", "Store");
    }
}

// endregion: --- In-Memory Auction Store

// endregion: --- Tests
