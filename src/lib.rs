pub mod api;
pub mod api_docs;
pub mod domain;
pub mod infrastructure;
pub mod models;
pub mod services;

// Re-export infrastructure modules at crate root
pub use infrastructure::{auth, config, db, seed, server};
