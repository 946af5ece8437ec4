// region:    --- Imports
use crate::auction::model::{Auction, AuctionId, AuctionView};
use crate::auction::requests::{
    AddNewRequest, DeleteItemRequest, PlaceBidRequest, ADD_NEW_FIELDS, DELETE_ITEM_FIELDS,
    PLACE_BID_FIELDS,
};
use crate::auction::{AuctionError, AuctionService};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{DefaultBodyLimit, OriginalUri, Path, Request, State};
use axum::http::{Method, StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Router
pub fn routes(service: AuctionService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/viewAll", get(handle_view_all))
        .route("/addNew", post(handle_add_new))
        .route("/placeBid", post(handle_place_bid))
        .route("/deleteItem", post(handle_delete_item))
        .route("/auction/:id", get(handle_get_auction))
        .route("/health", get(handle_health))
        .method_not_allowed_fallback(handle_method_not_allowed);

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .nest("/api", api)
        .method_not_allowed_fallback(handle_method_not_allowed)
        .fallback(handle_not_found)
        .layer(middleware::from_fn(log_request))
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .with_state(service)
}

async fn log_request(req: Request, next: Next) -> Response {
    info!("{:<12} --> {} {}", "Request", req.method(), req.uri().path());
    next.run(req).await
}

// endregion: --- Router

// region:    --- Api Error
/// Failure at the API boundary: the service error plus the operation it came from.
#[derive(Debug)]
pub struct ApiError {
    context: &'static str,
    required: Option<&'static [&'static str]>,
    source: AuctionError,
}

impl ApiError {
    fn new(context: &'static str, source: AuctionError) -> Self {
        Self {
            context,
            required: None,
            source,
        }
    }

    fn with_required(mut self, fields: &'static [&'static str]) -> Self {
        self.required = Some(fields);
        self
    }

    fn bad_body(context: &'static str, rejection: JsonRejection) -> Self {
        Self::new(
            context,
            AuctionError::validation(format!("Invalid request body: {}", rejection.body_text())),
        )
    }

    fn bad_path(context: &'static str, rejection: PathRejection) -> Self {
        Self::new(
            context,
            AuctionError::validation(format!("Invalid auction id: {}", rejection.body_text())),
        )
    }
}

fn status_for(err: &AuctionError) -> StatusCode {
    match err {
        AuctionError::MissingFields(_)
        | AuctionError::Validation(_)
        | AuctionError::BidTooLow { .. }
        | AuctionError::AuctionEnded(_) => StatusCode::BAD_REQUEST,
        AuctionError::NotFound(_) => StatusCode::NOT_FOUND,
        AuctionError::Contention(_) => StatusCode::CONFLICT,
        AuctionError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.source);
        let mut body = match &self.source {
            AuctionError::Store(e) => {
                warn!("{:<12} --> {}: {}", "Handler", self.context, e);
                json!({ "error": self.context, "message": e.to_string() })
            }
            other => {
                info!("{:<12} --> {}: {}", "Handler", self.context, other);
                json!({ "error": other.to_string(), "code": other.code() })
            }
        };
        if let (Some(fields), AuctionError::MissingFields(_)) = (self.required, &self.source) {
            body["required"] = json!(fields);
        }
        (status, Json(body)).into_response()
    }
}

// endregion: --- Api Error

// region:    --- Envelope
fn envelope(status: StatusCode, message: &str, data: Value) -> Response {
    (status, Json(json!({ "message": message, "data": data }))).into_response()
}

fn view(auction: Auction) -> Value {
    json!(AuctionView::at(auction, Utc::now()))
}

// endregion: --- Envelope

// region:    --- Command Handlers
pub async fn handle_add_new(
    State(service): State<AuctionService>,
    payload: Result<Json<AddNewRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    const CONTEXT: &str = "Error creating auction";
    let Json(req) = payload.map_err(|e| ApiError::bad_body(CONTEXT, e))?;
    let fail = |e: AuctionError| ApiError::new(CONTEXT, e).with_required(&ADD_NEW_FIELDS);

    let new = req.validate().map_err(fail)?;
    let created = service.create(new).await.map_err(fail)?;
    Ok(envelope(
        StatusCode::CREATED,
        "Auction created successfully",
        view(created),
    ))
}

pub async fn handle_place_bid(
    State(service): State<AuctionService>,
    payload: Result<Json<PlaceBidRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    const CONTEXT: &str = "Error placing bid";
    let Json(req) = payload.map_err(|e| ApiError::bad_body(CONTEXT, e))?;
    let fail = |e: AuctionError| ApiError::new(CONTEXT, e).with_required(&PLACE_BID_FIELDS);

    let bid = req.validate().map_err(fail)?;
    let updated = service.place_bid(bid).await.map_err(fail)?;
    Ok(envelope(StatusCode::OK, "Bid placed successfully", view(updated)))
}

pub async fn handle_delete_item(
    State(service): State<AuctionService>,
    payload: Result<Json<DeleteItemRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    const CONTEXT: &str = "Error deleting auction";
    let Json(req) = payload.map_err(|e| ApiError::bad_body(CONTEXT, e))?;
    let fail = |e: AuctionError| ApiError::new(CONTEXT, e).with_required(&DELETE_ITEM_FIELDS);

    let id = req.validate().map_err(fail)?;
    let deleted = service.delete(id).await.map_err(fail)?;
    Ok(envelope(
        StatusCode::OK,
        "Auction deleted successfully",
        view(deleted),
    ))
}

// endregion: --- Command Handlers

// region:    --- Query Handlers
pub async fn handle_view_all(State(service): State<AuctionService>) -> Result<Response, ApiError> {
    let auctions = service
        .list()
        .await
        .map_err(|e| ApiError::new("Error retrieving auctions", e))?;

    if auctions.is_empty() {
        return Ok(envelope(StatusCode::OK, "No auctions found", json!([])));
    }

    let now = Utc::now();
    let count = auctions.len();
    let data: Vec<AuctionView> = auctions
        .into_iter()
        .map(|a| AuctionView::at(a, now))
        .collect();
    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Auctions retrieved successfully",
            "count": count,
            "data": data,
        })),
    )
        .into_response())
}

pub async fn handle_get_auction(
    State(service): State<AuctionService>,
    path: Result<Path<AuctionId>, PathRejection>,
) -> Result<Response, ApiError> {
    const CONTEXT: &str = "Error retrieving auction";
    let Path(id) = path.map_err(|e| ApiError::bad_path(CONTEXT, e))?;
    let auction = service
        .get(id)
        .await
        .map_err(|e| ApiError::new(CONTEXT, e))?;
    Ok(envelope(
        StatusCode::OK,
        "Auction retrieved successfully",
        view(auction),
    ))
}

pub async fn handle_health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "message": "Server is running" })))
}

pub async fn handle_root() -> impl IntoResponse {
    Json(json!({
        "message": "Welcome to Auction App API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "GET /api/viewAll": "Get all auctions",
            "GET /api/auction/:id": "Get one auction",
            "POST /api/addNew": "Create a new auction",
            "POST /api/placeBid": "Place a bid on an auction",
            "POST /api/deleteItem": "Delete an auction item",
            "GET /health": "Health check",
        }
    }))
}

pub async fn handle_not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not Found",
            "message": format!("Route {} not found", uri.path()),
        })),
    )
}

pub async fn handle_method_not_allowed(
    method: Method,
    OriginalUri(uri): OriginalUri,
) -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "error": "Method Not Allowed",
            "message": format!("Method {} not allowed for {}", method, uri.path()),
        })),
    )
}

// endregion: --- Query Handlers
