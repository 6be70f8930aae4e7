//! Persistent key/value storage used by the credential store.
//!
//! Access is synchronous; values are plain strings keyed by a short name.

mod file;
mod memory;

use anyhow::Result;
use std::sync::Arc;

pub use file::FileStorage;
pub use memory::MemoryStorage;

#[cfg_attr(test, mockall::automock)]
pub trait Storage: Send + Sync {
    /// Returns the stored value, or `None` when the key has never been set.
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}
