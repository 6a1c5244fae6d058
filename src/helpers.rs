//! Registry of functions that are never reported as the origin of an error.
//!
//! Marking a function as a helper works like `t.Helper()` in a test
//! framework: shared assertion utilities and error-construction wrappers call
//! [`mark_helper`] so that attribution points at *their* caller instead of at
//! themselves.
//!
//! ```
//! use causeway::{mark_helper, opt};
//!
//! fn not_found(name: &str) -> causeway::Error {
//!     mark_helper();
//!     causeway::new_m(format!("{name} not found"), [opt::caller()])
//! }
//!
//! let error = not_found("config.toml");
//! assert!(error.caller().is_none_or(|frame| !frame.function().ends_with("not_found")));
//! ```

use std::sync::OnceLock;

use hashbrown::HashSet;
use rustc_hash::FxBuildHasher;

use crate::{frame, lock::AppendLock};

/// A set of function identities to skip during attribution.
///
/// Identities are demangled function names as reported by
/// [`Frame::function`](crate::frame::Frame::function). Entries are never
/// removed. Marking and lookup are safe from any number of threads; a mark is
/// visible to every lookup that starts after it completes.
///
/// Most code uses the process-wide [`HelperRegistry::global`] instance
/// through [`mark_helper`]. Separate instances can be handed to a
/// [`Builder`](crate::Builder) to keep attribution rules isolated.
#[derive(Default)]
pub struct HelperRegistry {
    functions: AppendLock<HashSet<String, FxBuildHasher>>,
}

impl HelperRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide registry.
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<HelperRegistry> = OnceLock::new();
        GLOBAL.get_or_init(Self::new)
    }

    /// Marks the calling function as a helper.
    ///
    /// Does nothing when the caller cannot be resolved, for instance when the
    /// binary has no debug information.
    pub fn mark_helper(&self) {
        match frame::capture_one(0) {
            Some(frame) => self.mark(frame.function()),
            None => tracing::debug!("unable to resolve the function to mark as helper"),
        }
    }

    /// Marks `function` as a helper.
    pub fn mark(&self, function: &str) {
        if self.is_helper(function) {
            return;
        }
        if self.functions.write().insert(function.to_owned()) {
            tracing::trace!(function, "registered error helper");
        }
    }

    /// Returns whether `function` has been marked as a helper.
    #[must_use]
    pub fn is_helper(&self, function: &str) -> bool {
        self.functions.read().contains(function)
    }

    /// Returns the number of registered helpers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.read().len()
    }

    /// Returns `true` if no helper has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl core::fmt::Debug for HelperRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let functions = HashSet::clone(&self.functions.read());
        f.debug_set().entries(functions.iter()).finish()
    }
}

/// Marks the calling function as a helper in the process-wide registry.
///
/// See the [module documentation](self) for an example.
pub fn mark_helper() {
    HelperRegistry::global().mark_helper();
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;

    static_assertions::assert_impl_all!(HelperRegistry: Send, Sync);

    #[test]
    fn test_mark_is_append_only() {
        let registry = HelperRegistry::new();
        assert!(registry.is_empty());

        registry.mark("app::wrap");
        registry.mark("app::wrap");
        registry.mark("app::other");

        assert_eq!(registry.len(), 2);
        assert!(registry.is_helper("app::wrap"));
        assert!(!registry.is_helper("app::main"));
    }

    #[test]
    fn test_concurrent_marking() {
        let registry = Arc::new(HelperRegistry::new());
        let workers: Vec<_> = (0..8)
            .map(|worker| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for i in 0..50 {
                        let name = format!("worker{worker}::helper{i}");
                        registry.mark(&name);
                        assert!(registry.is_helper(&name));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(registry.len(), 400);
    }
}
