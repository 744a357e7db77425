pub mod activity;
pub mod aggregate;
pub mod app;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod manage;
pub mod models;
pub mod normalize;
pub mod repair;
pub mod state;
pub mod storage;
pub mod store;
pub mod timestamp;
pub mod ui;

#[cfg(test)]
mod testing;

pub use aggregate::{AggregationLimits, recent_activity};
pub use app::router;
pub use config::Config;
pub use errors::{AppError, StoreError};
pub use repair::repair_all;
pub use state::AppState;
pub use storage::{JsonStore, load_data};
