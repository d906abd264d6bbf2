pub mod analytics;
pub(crate) mod common;
pub mod ingest;
pub mod patterns;
pub mod receipts;
pub mod shops;
pub mod users;
