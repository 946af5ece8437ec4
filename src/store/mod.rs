// region:    --- Imports
use crate::auction::model::{Auction, AuctionId, BidUpdate, NewAuction};
use async_trait::async_trait;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Modules
pub mod memory;
pub mod postgres;
pub mod queries;

pub use memory::InMemoryAuctionStore;
pub use postgres::PostgresAuctionStore;

// endregion: --- Modules

// region:    --- Store Error
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store is closed")]
    Closed,
}

// endregion: --- Store Error

// region:    --- Auction Store Trait
/// Persistence for auction records.
///
/// Implementations assign `id`, `created_at` and `updated_at`, and start every
/// record at `version` 0 with `current_bid == starting_bid` and no bidder.
#[async_trait]
pub trait AuctionStore: Send + Sync {
    async fn insert(&self, auction: NewAuction) -> Result<Auction, StoreError>;

    /// All records, newest `created_at` first.
    async fn list(&self) -> Result<Vec<Auction>, StoreError>;

    async fn get(&self, id: AuctionId) -> Result<Option<Auction>, StoreError>;

    /// Compare-and-swap on `version`: writes the bid and bumps the version only
    /// when the stored version equals `expected_version`. `Ok(None)` means the
    /// record changed (or vanished) since it was read.
    async fn apply_bid(&self, update: BidUpdate) -> Result<Option<Auction>, StoreError>;

    /// Removes the record, returning it if it existed.
    async fn delete(&self, id: AuctionId) -> Result<Option<Auction>, StoreError>;

    /// Releases the underlying resources. Later calls fail with `StoreError::Closed`.
    async fn close(&self);
}

// endregion: --- Auction Store Trait
