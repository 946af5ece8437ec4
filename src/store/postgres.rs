// region:    --- Imports
use super::queries;
use super::{AuctionStore, StoreError};
use crate::auction::model::{Auction, AuctionId, BidUpdate, NewAuction};
use crate::database::DatabaseManager;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

// endregion: --- Imports

// region:    --- Postgres Auction Store
pub struct PostgresAuctionStore {
    db_manager: Arc<DatabaseManager>,
}

impl PostgresAuctionStore {
    pub fn new(db_manager: Arc<DatabaseManager>) -> Self {
        Self { db_manager }
    }
}

fn store_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolClosed => StoreError::Closed,
        other => StoreError::Database(other),
    }
}

#[async_trait]
impl AuctionStore for PostgresAuctionStore {
    async fn insert(&self, auction: NewAuction) -> Result<Auction, StoreError> {
        let created = sqlx::query_as::<_, Auction>(queries::INSERT_AUCTION)
            .bind(&auction.item_name)
            .bind(&auction.item_category)
            .bind(auction.starting_bid)
            .bind(auction.auction_end_date)
            .bind(&auction.item_description)
            .fetch_one(self.db_manager.pool())
            .await
            .map_err(store_error)?;
        info!("{:<12} --> Auction inserted id: {}", "Store", created.id);
        Ok(created)
    }

    async fn list(&self) -> Result<Vec<Auction>, StoreError> {
        sqlx::query_as::<_, Auction>(queries::GET_ALL_AUCTIONS)
            .fetch_all(self.db_manager.pool())
            .await
            .map_err(store_error)
    }

    async fn get(&self, id: AuctionId) -> Result<Option<Auction>, StoreError> {
        sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
            .bind(id)
            .fetch_optional(self.db_manager.pool())
            .await
            .map_err(store_error)
    }

    async fn apply_bid(&self, update: BidUpdate) -> Result<Option<Auction>, StoreError> {
        let updated = sqlx::query_as::<_, Auction>(queries::APPLY_BID)
            .bind(update.auction_id)
            .bind(update.expected_version)
            .bind(update.bid_amount)
            .bind(&update.bidder_name)
            .fetch_optional(self.db_manager.pool())
            .await
            .map_err(store_error)?;
        if updated.is_none() {
            debug!(
                "{:<12} --> Version conflict id: {} expected version: {}",
                "Store", update.auction_id, update.expected_version
            );
        }
        Ok(updated)
    }

    async fn delete(&self, id: AuctionId) -> Result<Option<Auction>, StoreError> {
        sqlx::query_as::<_, Auction>(queries::DELETE_AUCTION)
            .bind(id)
            .fetch_optional(self.db_manager.pool())
            .await
            .map_err(store_error)
    }

    async fn close(&self) {
        self.db_manager.close().await;
    }
}

// endregion: --- Postgres Auction Store
