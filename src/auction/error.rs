use super::model::AuctionId;
use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuctionError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("{0}")]
    Validation(String),

    #[error("Auction not found")]
    NotFound(AuctionId),

    #[error("Bid amount must be greater than current bid of ${current_bid}")]
    BidTooLow { current_bid: f64 },

    #[error("Auction has already ended")]
    AuctionEnded(AuctionId),

    #[error("Too many concurrent bids on auction {0}, please retry")]
    Contention(AuctionId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuctionError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AuctionError::Validation(msg.into())
    }

    /// Short code for clients that branch on the failure kind.
    pub fn code(&self) -> &'static str {
        match self {
            AuctionError::MissingFields(_) | AuctionError::Validation(_) => "VALIDATION",
            AuctionError::NotFound(_) => "NOT_FOUND",
            AuctionError::BidTooLow { .. } => "LOW_BID",
            AuctionError::AuctionEnded(_) => "ALREADY_ENDED",
            AuctionError::Contention(_) => "MAX_RETRIES_EXCEEDED",
            AuctionError::Store(_) => "STORE",
        }
    }
}
