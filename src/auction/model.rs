use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type AuctionId = i64;

// Auction model
/// One item for sale. `bidder_name` stays `None` until the first accepted bid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
    pub id: AuctionId,
    pub item_name: String,
    pub item_category: String,
    pub starting_bid: f64,
    pub current_bid: f64,
    pub bidder_name: Option<String>,
    pub auction_end_date: DateTime<Utc>,
    pub item_description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub version: i64,
}

impl Auction {
    /// Ended is derived from the clock, never stored.
    pub fn is_ended_at(&self, now: DateTime<Utc>) -> bool {
        now > self.auction_end_date
    }
}

/// Validated creation input handed to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuction {
    pub item_name: String,
    pub item_category: String,
    pub starting_bid: f64,
    pub auction_end_date: DateTime<Utc>,
    pub item_description: String,
}

/// Bid that passed validation, written only if `expected_version` still matches.
#[derive(Debug, Clone, PartialEq)]
pub struct BidUpdate {
    pub auction_id: AuctionId,
    pub expected_version: i64,
    pub bid_amount: f64,
    pub bidder_name: String,
}

/// Record as returned by the API, with `isEnded` computed at response time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionView {
    #[serde(flatten)]
    pub auction: Auction,
    pub is_ended: bool,
}

impl AuctionView {
    pub fn at(auction: Auction, now: DateTime<Utc>) -> Self {
        let is_ended = auction.is_ended_at(now);
        Self { auction, is_ended }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(end: DateTime<Utc>) -> Auction {
        let now = Utc::now();
        Auction {
            id: 1,
            item_name: "Lamp".to_string(),
            item_category: "Home".to_string(),
            starting_bid: 10.0,
            current_bid: 10.0,
            bidder_name: None,
            auction_end_date: end,
            item_description: "Brass desk lamp".to_string(),
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    #[test]
    fn ended_only_after_end_date() {
        let end = Utc::now();
        let auction = sample(end);
        assert!(!auction.is_ended_at(end));
        assert!(!auction.is_ended_at(end - Duration::seconds(1)));
        assert!(auction.is_ended_at(end + Duration::seconds(1)));
    }

    #[test]
    fn view_serializes_camel_case_with_null_bidder() {
        let end = Utc::now() + Duration::hours(1);
        let view = AuctionView::at(sample(end), Utc::now());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["itemName"], "Lamp");
        assert_eq!(json["currentBid"], 10.0);
        assert!(json["bidderName"].is_null());
        assert_eq!(json["isEnded"], false);
        assert!(json.get("auction").is_none());
    }
}
