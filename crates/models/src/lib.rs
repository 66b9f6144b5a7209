//! Record types managed by the console.
//!
//! Rows live in the external record store; these types only describe their
//! shape, the editable draft of each, and the ordering rules of the list.

pub mod errors;
pub mod record;
pub mod project;
pub mod service;

pub use errors::ModelError;
pub use project::{Project, ProjectDraft};
pub use record::{sort_for_display, Collection, Draft, OrderIndex, Record, RecordId};
pub use service::{Service, ServiceDraft};
