pub mod models;
pub mod schedule;
pub mod service;
pub mod worker;

pub use models::{Frequency, RecurringStatus, RecurringTransfer, RecurringTransferRequest};
pub use service::RecurringService;
pub use worker::{RecurringWorker, RunStats};
