//! Storage abstractions for service layer
//!
//! File-backed helpers used by the local collaborators in [`crate::file`].

pub mod json_map_store;
