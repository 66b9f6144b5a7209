//! Collaborator contracts the console depends on.
//!
//! Each trait has a hosted implementation in [`crate::supabase`], a
//! file-backed one in [`crate::file`], and an in-memory `mock` for tests.

pub mod identity;
pub mod objects;
pub mod records;

pub use identity::{AccessToken, AuthError, Identity, IdentityProvider, SignedIn};
pub use objects::ObjectStorage;
pub use records::RecordStore;
