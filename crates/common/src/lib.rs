//! Common types and utilities shared across all crates

pub mod types;
pub mod config;
pub mod error;
pub mod logging;

pub use types::*;
pub use config::*;
pub use error::{IndexError, Result};
pub use logging::*;
