//! Persistence for forecast output.

pub mod history;

pub use history::{HistoryError, HistoryStore};
