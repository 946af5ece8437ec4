/// Auction service
/// 1. Create
/// 2. Place bid
/// 3. Delete
/// 4. List / get
// region:    --- Imports
use super::error::AuctionError;
use super::model::{Auction, AuctionId, BidUpdate, NewAuction};
use super::requests::PlaceBid;
use crate::store::AuctionStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

// endregion: --- Imports

// Max CAS attempts for one bid
pub const MAX_RETRIES: u32 = 100;

// region:    --- Auction Service
#[derive(Clone)]
pub struct AuctionService {
    store: Arc<dyn AuctionStore>,
}

impl AuctionService {
    pub fn new(store: Arc<dyn AuctionStore>) -> Self {
        Self { store }
    }

    /// 1. Create
    pub async fn create(&self, new: NewAuction) -> Result<Auction, AuctionError> {
        self.create_at(new, Utc::now()).await
    }

    pub async fn create_at(
        &self,
        new: NewAuction,
        now: DateTime<Utc>,
    ) -> Result<Auction, AuctionError> {
        let new = check_new_auction(new, now)?;
        let created = self.store.insert(new).await?;
        info!(
            "{:<12} --> Auction created id: {} starting bid: {}",
            "Service", created.id, created.starting_bid
        );
        Ok(created)
    }

    /// 2. Place bid
    pub async fn place_bid(&self, bid: PlaceBid) -> Result<Auction, AuctionError> {
        self.place_bid_at(bid, Utc::now()).await
    }

    /// Checks run against a fresh read on every attempt; the write only lands
    /// if nobody else bid in between.
    pub async fn place_bid_at(
        &self,
        bid: PlaceBid,
        now: DateTime<Utc>,
    ) -> Result<Auction, AuctionError> {
        let bidder_name = bid.bidder_name.trim();
        if bidder_name.is_empty() {
            return Err(AuctionError::MissingFields(vec!["bidderName"]));
        }
        if !bid.bid_amount.is_finite() || bid.bid_amount <= 0.0 {
            return Err(AuctionError::validation("Bid amount must be greater than 0"));
        }

        for attempt in 1..=MAX_RETRIES {
            let auction = self
                .store
                .get(bid.auction_id)
                .await?
                .ok_or(AuctionError::NotFound(bid.auction_id))?;

            check_bid(&auction, bid.bid_amount, now)?;

            let update = BidUpdate {
                auction_id: auction.id,
                expected_version: auction.version,
                bid_amount: bid.bid_amount,
                bidder_name: bidder_name.to_string(),
            };
            if let Some(updated) = self.store.apply_bid(update).await? {
                info!(
                    "{:<12} --> Bid accepted id: {} amount: {} bidder: {}",
                    "Service", updated.id, updated.current_bid, bidder_name
                );
                return Ok(updated);
            }

            warn!(
                "{:<12} --> Version conflict on id: {}, retrying ({}/{})",
                "Service", bid.auction_id, attempt, MAX_RETRIES
            );
        }

        Err(AuctionError::Contention(bid.auction_id))
    }

    /// 3. Delete
    pub async fn delete(&self, id: AuctionId) -> Result<Auction, AuctionError> {
        let deleted = self
            .store
            .delete(id)
            .await?
            .ok_or(AuctionError::NotFound(id))?;
        info!("{:<12} --> Auction deleted id: {}", "Service", id);
        Ok(deleted)
    }

    /// 4. List, newest first
    pub async fn list(&self) -> Result<Vec<Auction>, AuctionError> {
        Ok(self.store.list().await?)
    }

    pub async fn get(&self, id: AuctionId) -> Result<Auction, AuctionError> {
        self.store
            .get(id)
            .await?
            .ok_or(AuctionError::NotFound(id))
    }
}

// endregion: --- Auction Service

// region:    --- Rules
fn check_new_auction(new: NewAuction, now: DateTime<Utc>) -> Result<NewAuction, AuctionError> {
    let item_name = new.item_name.trim().to_string();
    let item_category = new.item_category.trim().to_string();
    let item_description = new.item_description.trim().to_string();

    let missing: Vec<&'static str> = [
        ("itemName", item_name.is_empty()),
        ("itemCategory", item_category.is_empty()),
        ("itemDescription", item_description.is_empty()),
    ]
    .into_iter()
    .filter_map(|(field, empty)| empty.then_some(field))
    .collect();
    if !missing.is_empty() {
        return Err(AuctionError::MissingFields(missing));
    }

    if !new.starting_bid.is_finite() || new.starting_bid < 0.0 {
        return Err(AuctionError::validation(
            "Starting bid must be a positive number",
        ));
    }
    if new.auction_end_date <= now {
        return Err(AuctionError::validation(
            "Auction end date must be in the future",
        ));
    }

    Ok(NewAuction {
        item_name,
        item_category,
        item_description,
        ..new
    })
}

/// Ended is checked before the amount, so a late bid reports the auction as
/// ended even when it is also too low.
fn check_bid(auction: &Auction, bid_amount: f64, now: DateTime<Utc>) -> Result<(), AuctionError> {
    if auction.is_ended_at(now) {
        return Err(AuctionError::AuctionEnded(auction.id));
    }
    if bid_amount <= auction.current_bid {
        return Err(AuctionError::BidTooLow {
            current_bid: auction.current_bid,
        });
    }
    Ok(())
}

// endregion: --- Rules
