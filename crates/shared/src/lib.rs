//! Order-key maintenance and drag reconciliation for items grouped into
//! folders.

pub mod board;
pub mod cache;
pub mod config;
pub mod error;
pub mod gesture;
pub mod models;
pub mod order_key;
pub mod persistence;
pub mod position;
pub mod reconciler;
pub mod sibling;

pub use board::Board;
pub use config::OrderingConfig;
pub use error::{ConfigError, OrderKeyError, PersistenceError};
pub use order_key::OrderKey;
