use std::sync::RwLock;

use crate::types::CredentialSet;

/// Holder of the current credential set.
///
/// Implementations perform no validation; keeping the set consistent is the
/// caller's job.
pub trait TokenStore: Send + Sync {
    /// A copy of the current set.
    fn read(&self) -> CredentialSet;

    /// Replace the current set.
    fn write(&self, set: CredentialSet);

    /// Forget everything.
    fn clear(&self) {
        self.write(CredentialSet::default());
    }
}

/// In-process store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    inner: RwLock<CredentialSet>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that starts with `set`.
    pub fn with_credentials(set: CredentialSet) -> Self {
        Self {
            inner: RwLock::new(set),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn read(&self) -> CredentialSet {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn write(&self, set: CredentialSet) {
        *self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = set;
    }
}
