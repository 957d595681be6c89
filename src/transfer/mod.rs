pub mod engine;
pub mod models;

pub use engine::TransferEngine;
pub use models::{Transfer, TransferRequest, TransferResponse, TransferStatus};
