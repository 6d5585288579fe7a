//! Repository layer
//!
//! Repositories are stateless HTTP seams over the external systems the
//! dispatcher consumes: the pending-work record store and the per-job
//! backends. They carry no business logic.
//!
//! All repositories are trait-based to enable testing and mocking.

mod backend;
mod store;

// Re-export traits
pub use backend::JobBackend;
pub use store::RecordStore;

// Re-export implementations and support types
pub use backend::{BackendError, BackendRequest, BackendResponse, HttpJobBackend};
pub use store::{HttpRecordStore, PendingFile, TimeBlockKey};
