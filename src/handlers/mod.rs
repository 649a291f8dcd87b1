pub mod cycle_counts;
pub mod health;
pub mod locations;
pub mod ownership;
pub mod picking;
pub mod reconciliation;
pub mod stock;

pub use crate::AppState;
