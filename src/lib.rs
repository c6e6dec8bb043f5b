pub mod account;
pub mod currency;
pub mod entry;
pub mod error;
pub mod holding;
pub mod loader;
pub mod query_engine;
pub mod user;
