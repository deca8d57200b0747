//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite database operations
//! - Key lookup seam for the signer

mod database;
mod models;
mod repository;

pub use database::Database;
pub use models::*;
pub use repository::KeyRepository;

#[cfg(test)]
pub use repository::MockKeyRepository;
