//! Shared building blocks for the admin console crates: logging setup,
//! startup environment checks, process metrics and small wire types.

pub mod types;
pub mod utils;
pub mod env;
pub mod metrics;
