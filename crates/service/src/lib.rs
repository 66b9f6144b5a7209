//! Service layer of the portfolio console.
//! - `backend` defines the identity, record and object collaborators.
//! - `supabase` and `file` implement them against a hosted project or the
//!   local filesystem.
//! - `console` holds the operator workflow on top of them.

pub mod backend;
pub mod bootstrap;
pub mod console;
pub mod errors;
pub mod file;
pub mod repository;
pub mod runtime;
pub mod storage;
pub mod supabase;

pub use bootstrap::{build_backends, Backends};
pub use errors::ServiceError;
