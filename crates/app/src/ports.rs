//! Port definitions: traits that adapters implement.
//!
//! They live in `app` so that both the store and the adapters can depend on
//! them without a cycle between crates.

pub mod repository;
pub mod storage;

pub use repository::Repository;
pub use storage::Storage;
