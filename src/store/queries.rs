/// Insert a new auction; current bid starts at the starting bid.
pub const INSERT_AUCTION: &str = r#"
    INSERT INTO auctions (item_name, item_category, starting_bid, current_bid, auction_end_date, item_description)
    VALUES ($1, $2, $3, $3, $4, $5)
    RETURNING id, item_name, item_category, starting_bid, current_bid, bidder_name, auction_end_date, item_description, created_at, updated_at, version
"#;

/// All auctions, newest first
pub const GET_ALL_AUCTIONS: &str =
    "SELECT id, item_name, item_category, starting_bid, current_bid, bidder_name, auction_end_date, item_description, created_at, updated_at, version FROM auctions ORDER BY created_at DESC, id DESC";

pub const GET_AUCTION: &str =
    "SELECT id, item_name, item_category, starting_bid, current_bid, bidder_name, auction_end_date, item_description, created_at, updated_at, version FROM auctions WHERE id = $1";

/// Version-guarded bid write
pub const APPLY_BID: &str = r#"
    UPDATE auctions
    SET current_bid = $3, bidder_name = $4, updated_at = NOW(), version = version + 1
    WHERE id = $1 AND version = $2
    RETURNING id, item_name, item_category, starting_bid, current_bid, bidder_name, auction_end_date, item_description, created_at, updated_at, version
"#;

pub const DELETE_AUCTION: &str = r#"
    DELETE FROM auctions
    WHERE id = $1
    RETURNING id, item_name, item_category, starting_bid, current_bid, bidder_name, auction_end_date, item_description, created_at, updated_at, version
"#;
