pub mod auction;
pub mod client;
pub mod config;
pub mod database;
pub mod handlers;
pub mod store;
