/// Request schemas for the API surface.
/// Every body is deserialized into one of these, then checked into a typed
/// command before the service sees it.
// region:    --- Imports
use super::error::AuctionError;
use super::model::{AuctionId, NewAuction};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// endregion: --- Imports

pub const ADD_NEW_FIELDS: [&str; 5] = [
    "itemName",
    "itemCategory",
    "startingBid",
    "auctionEndDate",
    "itemDescription",
];
pub const PLACE_BID_FIELDS: [&str; 3] = ["auctionId", "bidAmount", "bidderName"];
pub const DELETE_ITEM_FIELDS: [&str; 1] = ["auctionId"];

// region:    --- Loose Inputs
/// Form posts send numbers either as JSON numbers or as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberInput {
    Number(f64),
    Text(String),
}

impl NumberInput {
    fn is_blank(&self) -> bool {
        matches!(self, NumberInput::Text(s) if s.trim().is_empty())
    }

    fn to_f64(&self) -> Option<f64> {
        let value = match self {
            NumberInput::Number(n) => *n,
            NumberInput::Text(s) => s.trim().parse().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for NumberInput {
    fn from(value: f64) -> Self {
        NumberInput::Number(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IdInput {
    Number(AuctionId),
    Text(String),
}

impl IdInput {
    fn is_blank(&self) -> bool {
        matches!(self, IdInput::Text(s) if s.trim().is_empty())
    }

    fn to_id(&self) -> Option<AuctionId> {
        match self {
            IdInput::Number(n) => Some(*n),
            IdInput::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl From<AuctionId> for IdInput {
    fn from(value: AuctionId) -> Self {
        IdInput::Number(value)
    }
}

fn present_text(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_id(input: &IdInput) -> Result<AuctionId, AuctionError> {
    input
        .to_id()
        .ok_or_else(|| AuctionError::validation("Auction id must be a valid identifier"))
}

/// Accepts RFC 3339, the browser `datetime-local` shape, or a bare date.
/// Values without an offset are read as UTC.
pub fn parse_end_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

// endregion: --- Loose Inputs

// region:    --- Add New
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddNewRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starting_bid: Option<NumberInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auction_end_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_description: Option<String>,
}

impl AddNewRequest {
    pub fn validate(&self) -> Result<NewAuction, AuctionError> {
        let item_name = present_text(&self.item_name);
        let item_category = present_text(&self.item_category);
        let end_date = present_text(&self.auction_end_date);
        let item_description = present_text(&self.item_description);
        let starting_bid = self.starting_bid.as_ref().filter(|n| !n.is_blank());

        let mut missing = Vec::new();
        if item_name.is_none() {
            missing.push(ADD_NEW_FIELDS[0]);
        }
        if item_category.is_none() {
            missing.push(ADD_NEW_FIELDS[1]);
        }
        if starting_bid.is_none() {
            missing.push(ADD_NEW_FIELDS[2]);
        }
        if end_date.is_none() {
            missing.push(ADD_NEW_FIELDS[3]);
        }
        if item_description.is_none() {
            missing.push(ADD_NEW_FIELDS[4]);
        }

        match (item_name, item_category, starting_bid, end_date, item_description) {
            (Some(name), Some(category), Some(bid), Some(end), Some(description)) => {
                let starting_bid = bid
                    .to_f64()
                    .ok_or_else(|| AuctionError::validation("Starting bid must be a number"))?;
                let auction_end_date = parse_end_date(end)
                    .ok_or_else(|| AuctionError::validation("Auction end date must be a valid date"))?;

                Ok(NewAuction {
                    item_name: name.to_string(),
                    item_category: category.to_string(),
                    starting_bid,
                    auction_end_date,
                    item_description: description.to_string(),
                })
            }
            _ => Err(AuctionError::MissingFields(missing)),
        }
    }
}

// endregion: --- Add New

// region:    --- Place Bid
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBidRequest {
    #[serde(alias = "id", skip_serializing_if = "Option::is_none")]
    pub auction_id: Option<IdInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bid_amount: Option<NumberInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bidder_name: Option<String>,
}

/// Checked bid command.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceBid {
    pub auction_id: AuctionId,
    pub bid_amount: f64,
    pub bidder_name: String,
}

impl PlaceBidRequest {
    pub fn validate(&self) -> Result<PlaceBid, AuctionError> {
        let auction_id = self.auction_id.as_ref().filter(|id| !id.is_blank());
        let bid_amount = self.bid_amount.as_ref().filter(|n| !n.is_blank());
        let bidder_name = present_text(&self.bidder_name);

        let (Some(auction_id), Some(bid_amount), Some(bidder_name)) =
            (auction_id, bid_amount, bidder_name)
        else {
            let missing = PLACE_BID_FIELDS
                .iter()
                .zip([auction_id.is_none(), bid_amount.is_none(), bidder_name.is_none()])
                .filter_map(|(field, absent)| absent.then_some(*field))
                .collect();
            return Err(AuctionError::MissingFields(missing));
        };

        let auction_id = parse_id(auction_id)?;
        let bid_amount = bid_amount
            .to_f64()
            .ok_or_else(|| AuctionError::validation("Bid amount must be a number"))?;

        Ok(PlaceBid {
            auction_id,
            bid_amount,
            bidder_name: bidder_name.to_string(),
        })
    }
}

// endregion: --- Place Bid

// region:    --- Delete Item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteItemRequest {
    #[serde(alias = "id", skip_serializing_if = "Option::is_none")]
    pub auction_id: Option<IdInput>,
}

impl DeleteItemRequest {
    pub fn validate(&self) -> Result<AuctionId, AuctionError> {
        match self.auction_id.as_ref().filter(|id| !id.is_blank()) {
            Some(id) => parse_id(id),
            None => Err(AuctionError::MissingFields(DELETE_ITEM_FIELDS.to_vec())),
        }
    }
}

// endregion: --- Delete Item

// endregion: --- Tests
