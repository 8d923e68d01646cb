//! # Adapter Registry
//!
//! The set of known backend model servers, which one is selected as the
//! translation target, and the persistence collaborator that stores the
//! records between runs.
//!
//! Server records are referenced by id, never copied, from the adapter
//! configuration. While the adapter is running its target id is pinned
//! here: deleting or deactivating a pinned server fails instead of
//! silently swapping the target mid-flight.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod registry;
pub mod server;
pub mod store;

pub use registry::BackendRegistry;
pub use server::{BackendKind, BackendServer};
pub use store::{JsonFileStore, MemoryStore, RegistryStore};
