pub mod error;
pub mod model;
pub mod requests;
pub mod service;

pub use error::AuctionError;
pub use model::{Auction, AuctionId, AuctionView, NewAuction};
pub use service::AuctionService;
