//! # Format Checker Registry
//!
//! Maps a format name, as written in a schema's `format` keyword, to a
//! predicate over string values. The validator consults the registry for
//! every string leaf whose schema names a format.
//!
//! Registration may happen at any time. Readers and writers are
//! synchronized by a read-write lock; checkers run outside the lock.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use provcfg_core::is_uuid_like;

/// Name of the built-in UUID format.
pub const UUID_FORMAT: &str = "uuid";

/// A shareable format predicate.
pub type FormatChecker = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Registry of named format checkers.
#[derive(Default)]
pub struct FormatRegistry {
    checkers: RwLock<HashMap<String, FormatChecker>>,
}

impl FormatRegistry {
    /// An empty registry. Every [`check`](Self::check) returns `false`.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in checkers.
    ///
    /// `uuid` accepts anything [`is_uuid_like`] accepts, which is looser
    /// than RFC 4122 on purpose.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register(UUID_FORMAT, is_uuid_like);
        registry
    }

    /// Register `checker` under `name`.
    ///
    /// Registering a name that is already present replaces the previous
    /// checker: the last registration wins. This is how callers override a
    /// built-in. Returns true if a checker was replaced.
    pub fn register<F>(&self, name: impl Into<String>, checker: F) -> bool
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        let name = name.into();
        let replaced = self
            .checkers
            .write()
            .insert(name.clone(), Arc::new(checker))
            .is_some();
        if replaced {
            tracing::debug!(format = %name, "format checker replaced");
        }
        replaced
    }

    /// Run the checker registered under `name` against `value`.
    ///
    /// Returns `false` when no checker is registered under `name`.
    pub fn check(&self, name: &str, value: &str) -> bool {
        let checker = self.checkers.read().get(name).cloned();
        checker.is_some_and(|checker| checker(value))
    }

    /// Returns true if a checker is registered under `name`.
    pub fn is_registered(&self, name: &str) -> bool {
        self.checkers.read().contains_key(name)
    }

    /// Registered format names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.checkers.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("formats", &self.names())
            .finish()
    }
}
