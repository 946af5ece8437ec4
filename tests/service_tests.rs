use async_trait::async_trait;
use auction_board::auction::model::{Auction, AuctionId, BidUpdate, NewAuction};
use auction_board::auction::requests::PlaceBid;
use auction_board::auction::{AuctionError, AuctionService};
use auction_board::handlers;
use auction_board::store::{AuctionStore, InMemoryAuctionStore, StoreError};
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Service backed by a fresh in-memory store
fn setup() -> (AuctionService, Arc<InMemoryAuctionStore>) {
    let store = Arc::new(InMemoryAuctionStore::new());
    let service = AuctionService::new(store.clone());
    (service, store)
}

/// Store whose bid writes always lose the version race
struct AlwaysConflicting {
    inner: Arc<InMemoryAuctionStore>,
}

#[async_trait]
impl AuctionStore for AlwaysConflicting {
    async fn insert(&self, auction: NewAuction) -> Result<Auction, StoreError> {
        self.inner.insert(auction).await
    }

    async fn list(&self) -> Result<Vec<Auction>, StoreError> {
        self.inner.list().await
    }

    async fn get(&self, id: AuctionId) -> Result<Option<Auction>, StoreError> {
        self.inner.get(id).await
    }

    async fn apply_bid(&self, _update: BidUpdate) -> Result<Option<Auction>, StoreError> {
        Ok(None)
    }

    async fn delete(&self, id: AuctionId) -> Result<Option<Auction>, StoreError> {
        self.inner.delete(id).await
    }

    async fn close(&self) {
        self.inner.close().await
    }
}

fn setup_conflicting() -> (AuctionService, Arc<InMemoryAuctionStore>) {
    let inner = Arc::new(InMemoryAuctionStore::new());
    let service = AuctionService::new(Arc::new(AlwaysConflicting {
        inner: inner.clone(),
    }));
    (service, inner)
}

fn new_auction(name: &str, starting_bid: f64, end: DateTime<Utc>) -> NewAuction {
    NewAuction {
        item_name: name.to_string(),
        item_category: "Collectibles".to_string(),
        starting_bid,
        auction_end_date: end,
        item_description: "Test item for bidding".to_string(),
    }
}

fn bid(auction_id: i64, amount: f64, bidder: &str) -> PlaceBid {
    PlaceBid {
        auction_id,
        bid_amount: amount,
        bidder_name: bidder.to_string(),
    }
}

#[tokio::test]
async fn test_create_starts_at_starting_bid() {
    let (service, _) = setup();
    for starting_bid in [0.0, 1.5, 100.0, 99_999.99] {
        let created = service
            .create(new_auction("Coin", starting_bid, Utc::now() + Duration::hours(1)))
            .await
            .unwrap();
        assert_eq!(created.current_bid, starting_bid);
        assert_eq!(created.starting_bid, starting_bid);
        assert!(created.bidder_name.is_none());
        assert_eq!(created.version, 0);
    }
}

#[tokio::test]
async fn test_create_validation() {
    let (service, store) = setup();
    let end = Utc::now() + Duration::hours(1);

    let mut blank = new_auction("  ", 10.0, end);
    blank.item_category = String::new();
    match service.create(blank).await {
        Err(AuctionError::MissingFields(fields)) => {
            assert_eq!(fields, vec!["itemName", "itemCategory"])
        }
        other => panic!("unexpected: {:?}", other),
    }

    let negative = new_auction("Coin", -5.0, end);
    assert!(matches!(
        service.create(negative).await,
        Err(AuctionError::Validation(_))
    ));

    let nan = new_auction("Coin", f64::NAN, end);
    assert!(matches!(
        service.create(nan).await,
        Err(AuctionError::Validation(_))
    ));

    let past = new_auction("Coin", 10.0, Utc::now() - Duration::seconds(1));
    assert!(matches!(
        service.create(past).await,
        Err(AuctionError::Validation(_))
    ));

    assert!(store.is_empty().await);
}

/// Create, reject low bid, accept higher bid, reject bid under the new high, delete
#[tokio::test]
async fn test_auction_lifecycle() {
    let (service, _) = setup();
    let created = service
        .create(new_auction("Vase", 100.0, Utc::now() + Duration::hours(1)))
        .await
        .unwrap();
    assert_eq!(created.current_bid, 100.0);
    assert!(created.bidder_name.is_none());

    let low = service.place_bid(bid(created.id, 50.0, "Ann")).await;
    assert!(matches!(low, Err(AuctionError::BidTooLow { current_bid }) if current_bid == 100.0));

    let accepted = service
        .place_bid(bid(created.id, 150.0, "Ann"))
        .await
        .unwrap();
    assert_eq!(accepted.current_bid, 150.0);
    assert_eq!(accepted.bidder_name.as_deref(), Some("Ann"));
    assert_eq!(accepted.starting_bid, 100.0);

    let under = service.place_bid(bid(created.id, 120.0, "Bo")).await;
    assert!(matches!(under, Err(AuctionError::BidTooLow { current_bid }) if current_bid == 150.0));

    let deleted = service.delete(created.id).await.unwrap();
    assert_eq!(deleted.id, created.id);
    assert!(service.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_equal_bid_is_rejected() {
    let (service, _) = setup();
    let created = service
        .create(new_auction("Stamp", 20.0, Utc::now() + Duration::hours(1)))
        .await
        .unwrap();
    assert!(matches!(
        service.place_bid(bid(created.id, 20.0, "Ann")).await,
        Err(AuctionError::BidTooLow { .. })
    ));
    service.place_bid(bid(created.id, 25.0, "Ann")).await.unwrap();
    assert!(matches!(
        service.place_bid(bid(created.id, 25.0, "Bo")).await,
        Err(AuctionError::BidTooLow { .. })
    ));
}

#[tokio::test]
async fn test_bid_after_end_date_is_rejected() {
    let (service, store) = setup();
    let opened_at = Utc::now() - Duration::hours(3);
    let end = opened_at + Duration::hours(1);
    let created = service
        .create_at(new_auction("Clock", 10.0, end), opened_at)
        .await
        .unwrap();

    // exactly at the end date still counts as open
    let at_end = service
        .place_bid_at(bid(created.id, 11.0, "Ann"), end)
        .await
        .unwrap();
    assert_eq!(at_end.current_bid, 11.0);

    let late = service
        .place_bid_at(bid(created.id, 500.0, "Bo"), end + Duration::milliseconds(1))
        .await;
    assert!(matches!(late, Err(AuctionError::AuctionEnded(id)) if id == created.id));

    let late_now = service.place_bid(bid(created.id, 500.0, "Bo")).await;
    assert!(matches!(late_now, Err(AuctionError::AuctionEnded(_))));

    let stored = store.get(created.id).await.unwrap().unwrap();
    assert_eq!(stored.current_bid, 11.0);
    assert_eq!(stored.bidder_name.as_deref(), Some("Ann"));
}

#[tokio::test]
async fn test_bid_validation_and_not_found() {
    let (service, _) = setup();
    assert!(matches!(
        service.place_bid(bid(404, 10.0, "Ann")).await,
        Err(AuctionError::NotFound(404))
    ));

    let created = service
        .create(new_auction("Pen", 1.0, Utc::now() + Duration::hours(1)))
        .await
        .unwrap();
    assert!(matches!(
        service.place_bid(bid(created.id, 0.0, "Ann")).await,
        Err(AuctionError::Validation(_))
    ));
    assert!(matches!(
        service.place_bid(bid(created.id, -3.0, "Ann")).await,
        Err(AuctionError::Validation(_))
    ));
    assert!(matches!(
        service.place_bid(bid(created.id, 5.0, "   ")).await,
        Err(AuctionError::MissingFields(_))
    ));

    let trimmed = service
        .place_bid(bid(created.id, 5.0, "  Cleo  "))
        .await
        .unwrap();
    assert_eq!(trimmed.bidder_name.as_deref(), Some("Cleo"));
}

#[tokio::test]
async fn test_delete_missing_leaves_store_unchanged() {
    let (service, store) = setup();
    service
        .create(new_auction("Mug", 3.0, Utc::now() + Duration::hours(1)))
        .await
        .unwrap();
    let before = store.list().await.unwrap();

    assert!(matches!(
        service.delete(9_999).await,
        Err(AuctionError::NotFound(9_999))
    ));
    assert_eq!(store.list().await.unwrap(), before);
}

#[tokio::test]
async fn test_list_after_creates_and_deletes() {
    let (service, _) = setup();
    let end = Utc::now() + Duration::hours(1);
    let mut ids = Vec::new();
    for i in 0..6 {
        let created = service
            .create(new_auction(&format!("Item {}", i), 1.0, end))
            .await
            .unwrap();
        ids.push(created.id);
    }
    service.delete(ids[1]).await.unwrap();
    service.delete(ids[4]).await.unwrap();

    let listed: Vec<i64> = service.list().await.unwrap().iter().map(|a| a.id).collect();
    assert_eq!(listed, vec![ids[5], ids[3], ids[2], ids[0]]);
}

/// Concurrent bids never let a lower bid overwrite a higher accepted one
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bidding() {
    let (service, store) = setup();
    let created = service
        .create(new_auction("Watch", 1_000.0, Utc::now() + Duration::hours(1)))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 1..=50 {
        let service = service.clone();
        let id = created.id;
        handles.push(tokio::spawn(async move {
            service
                .place_bid(bid(id, 1_000.0 + i as f64 * 10.0, &format!("bidder-{}", i)))
                .await
        }));
    }

    let mut accepted = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(updated) => accepted.push(updated),
            Err(AuctionError::BidTooLow { .. }) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert!(!accepted.is_empty());
    let stored = store.get(created.id).await.unwrap().unwrap();
    assert_eq!(stored.current_bid, 1_500.0);
    assert_eq!(stored.bidder_name.as_deref(), Some("bidder-50"));
    assert_eq!(stored.version as usize, accepted.len());

    // each accepted write happened at a distinct version, in increasing bid order
    accepted.sort_by_key(|a| a.version);
    for pair in accepted.windows(2) {
        assert!(pair[1].current_bid > pair[0].current_bid);
    }
}

#[tokio::test]
async fn test_bid_gives_up_after_max_retries() {
    let (service, store) = setup_conflicting();
    let created = service
        .create(new_auction("Clock", 20.0, Utc::now() + Duration::hours(1)))
        .await
        .unwrap();

    match service.place_bid(bid(created.id, 25.0, "Ann")).await {
        Err(AuctionError::Contention(id)) => assert_eq!(id, created.id),
        other => panic!("unexpected: {:?}", other),
    }

    let stored = store.get(created.id).await.unwrap().unwrap();
    assert_eq!(stored, created);
    assert_eq!(stored.current_bid, 20.0);
    assert!(stored.bidder_name.is_none());
    assert_eq!(stored.version, 0);
}

#[tokio::test]
async fn test_contention_is_409_over_http() {
    let (service, store) = setup_conflicting();
    let created = service
        .create(new_auction("Clock", 20.0, Utc::now() + Duration::hours(1)))
        .await
        .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, handlers::routes(service).into_make_service())
            .await
            .unwrap();
    });

    let response = reqwest::Client::new()
        .post(format!("http://{}/api/placeBid", addr))
        .json(&json!({ "auctionId": created.id, "bidAmount": 25, "bidderName": "Ann" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), reqwest::StatusCode::CONFLICT);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "MAX_RETRIES_EXCEEDED");
    assert_eq!(store.get(created.id).await.unwrap().unwrap().version, 0);
}
