//! Host key/value storage.
//!
//! The persistent log talks to host storage only through [`KeyValueStore`]: whole string
//! values under string keys, like a browser's local storage. Two implementations ship:
//!
//! - [`MemoryStore`] in-process map with an optional byte quota and an availability switch
//! - [`FileStore`] one JSON file per key in a directory
//!
//! ## Rules
//! - `get` of a missing key is `Ok(None)`, not an error.
//! - `set` replaces the whole value.
//! - `remove` of a missing key succeeds.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::StorageError;

/// Durable string key/value store provided by the host.
pub trait KeyValueStore: Send + Sync + 'static {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Store name used in log fields.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
