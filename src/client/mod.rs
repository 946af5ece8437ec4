/// HTTP client for the auction API.
/// Runs the same pre-submit checks the browser form runs, and can poll
/// `viewAll` in the background the way the page refreshes itself.
// region:    --- Imports
use crate::auction::model::{AuctionId, AuctionView};
use crate::auction::requests::{AddNewRequest, DeleteItemRequest, NumberInput, PlaceBidRequest};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

// endregion: --- Imports

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const MIN_DESCRIPTION_LEN: usize = 10;

// region:    --- Client Error
#[derive(Debug, Error)]
pub enum ClientError {
    /// Rejected before anything was sent.
    #[error("{0}")]
    Invalid(String),

    /// The server answered with an error envelope.
    #[error("{status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

// endregion: --- Client Error

// region:    --- Envelope
#[derive(Debug, Deserialize)]
struct SuccessEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: String,
    message: Option<String>,
}

// endregion: --- Envelope

// region:    --- Forms
/// Values typed into the "new auction" form.
#[derive(Debug, Clone)]
pub struct AuctionForm {
    pub item_name: String,
    pub item_category: String,
    pub starting_bid: f64,
    pub auction_end_date: DateTime<Utc>,
    pub item_description: String,
}

impl AuctionForm {
    pub fn check(&self, now: DateTime<Utc>) -> Result<(), ClientError> {
        let invalid = |msg: &str| Err(ClientError::Invalid(msg.to_string()));
        if self.item_name.trim().is_empty() {
            return invalid("Item name is required");
        }
        if self.item_category.trim().is_empty() {
            return invalid("Item category is required");
        }
        if !self.starting_bid.is_finite() || self.starting_bid <= 0.0 {
            return invalid("Starting bid must be greater than 0");
        }
        if self.auction_end_date <= now {
            return invalid("Auction end date must be in the future");
        }
        if self.item_description.trim().chars().count() < MIN_DESCRIPTION_LEN {
            return invalid("Item description must be at least 10 characters");
        }
        Ok(())
    }

    fn to_request(&self) -> AddNewRequest {
        AddNewRequest {
            item_name: Some(self.item_name.clone()),
            item_category: Some(self.item_category.clone()),
            starting_bid: Some(NumberInput::Number(self.starting_bid)),
            auction_end_date: Some(self.auction_end_date.to_rfc3339()),
            item_description: Some(self.item_description.clone()),
        }
    }
}

/// Bid form check against the last snapshot the client saw.
pub fn check_bid(
    auction: &AuctionView,
    bid_amount: f64,
    bidder_name: &str,
) -> Result<(), ClientError> {
    if bidder_name.trim().is_empty() {
        return Err(ClientError::Invalid("Bidder name is required".to_string()));
    }
    if !bid_amount.is_finite() || bid_amount <= 0.0 {
        return Err(ClientError::Invalid(
            "Bid amount must be greater than 0".to_string(),
        ));
    }
    if bid_amount <= auction.auction.current_bid {
        return Err(ClientError::Invalid(format!(
            "Bid must be higher than current bid of ${}",
            auction.auction.current_bid
        )));
    }
    Ok(())
}

// endregion: --- Forms

// region:    --- Auction Client
#[derive(Debug, Clone)]
pub struct AuctionClient {
    http: Client,
    api_base: String,
}

impl AuctionClient {
    /// `base_url` is the server root, e.g. `http://localhost:7000`.
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl AsRef<str>) -> Self {
        let api_base = format!("{}/api", base_url.as_ref().trim_end_matches('/'));
        Self { http, api_base }
    }

    pub async fn view_all(&self) -> Result<Vec<AuctionView>, ClientError> {
        debug!("{:<12} --> GET {}/viewAll", "Client", self.api_base);
        let response = self
            .http
            .get(format!("{}/viewAll", self.api_base))
            .send()
            .await?;
        read_data(response).await
    }

    pub async fn get(&self, id: AuctionId) -> Result<AuctionView, ClientError> {
        let response = self
            .http
            .get(format!("{}/auction/{}", self.api_base, id))
            .send()
            .await?;
        read_data(response).await
    }

    pub async fn add_new(&self, form: &AuctionForm) -> Result<AuctionView, ClientError> {
        form.check(Utc::now())?;
        self.post("addNew", &form.to_request()).await
    }

    /// Checks the bid against `auction` as last seen, then submits it.
    pub async fn place_bid(
        &self,
        auction: &AuctionView,
        bid_amount: f64,
        bidder_name: &str,
    ) -> Result<AuctionView, ClientError> {
        check_bid(auction, bid_amount, bidder_name)?;
        let req = PlaceBidRequest {
            auction_id: Some(auction.auction.id.into()),
            bid_amount: Some(bid_amount.into()),
            bidder_name: Some(bidder_name.trim().to_string()),
        };
        self.post("placeBid", &req).await
    }

    pub async fn delete_item(&self, id: AuctionId) -> Result<AuctionView, ClientError> {
        let req = DeleteItemRequest {
            auction_id: Some(id.into()),
        };
        self.post("deleteItem", &req).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("{:<12} --> POST {}/{}", "Client", self.api_base, path);
        let response = self
            .http
            .post(format!("{}/{}", self.api_base, path))
            .json(body)
            .send()
            .await?;
        read_data(response).await
    }
}

async fn read_data<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        let envelope: SuccessEnvelope<T> = response.json().await?;
        return Ok(envelope.data);
    }
    let message = match response.json::<ErrorEnvelope>().await {
        Ok(ErrorEnvelope {
            error,
            message: Some(detail),
        }) => format!("{}: {}", error, detail),
        Ok(ErrorEnvelope { error, .. }) => error,
        Err(_) => status.canonical_reason().unwrap_or("error").to_string(),
    };
    Err(ClientError::Api { status, message })
}

// endregion: --- Auction Client

// region:    --- Auction Watcher
/// Polls `viewAll` on a fixed interval and publishes each snapshot.
/// A failed poll keeps the previous snapshot.
pub struct AuctionWatcher {
    receiver: watch::Receiver<Vec<AuctionView>>,
    handle: JoinHandle<()>,
}

impl AuctionWatcher {
    pub fn start(client: AuctionClient, every: Duration) -> Self {
        let (sender, receiver) = watch::channel(Vec::new());
        let handle = tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match client.view_all().await {
                    Ok(auctions) => {
                        debug!("{:<12} --> Polled {} auctions", "Watcher", auctions.len());
                        if sender.send(auctions).is_err() {
                            info!("{:<12} --> No subscribers left, stopping", "Watcher");
                            break;
                        }
                    }
                    Err(e) => warn!("{:<12} --> Failed to fetch auctions: {}", "Watcher", e),
                }
            }
        });
        Self { receiver, handle }
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<AuctionView>> {
        self.receiver.clone()
    }

    pub fn latest(&self) -> Vec<AuctionView> {
        self.receiver.borrow().clone()
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

// endregion: --- Auction Watcher

// endregion: --- Tests
