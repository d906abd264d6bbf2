pub mod analytics;
pub mod commands;
pub mod config;
pub mod contracts;
pub mod error;
pub mod ingest;
pub mod migrations;
pub mod receipts;
pub mod resolver;
pub mod setup;
pub mod shops;
pub mod state;
pub mod users;

pub use contracts::envelope::{FailureEnvelope, SuccessEnvelope};
pub use error::{ClientError, ClientResult};

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");
