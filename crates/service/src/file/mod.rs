//! Local collaborators backed by the filesystem, for running the console
//! without a hosted project.

pub mod identity;
pub mod object_store;
pub mod record_store;

pub use identity::LocalIdentity;
pub use object_store::DirObjectStorage;
pub use record_store::FileRecordStore;
