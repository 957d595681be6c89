pub mod models;
pub mod service;

pub use models::{GoalStatus, SavingsGoal, SavingsGoalRequest, SavingsGoalResponse};
pub use service::SavingsService;
