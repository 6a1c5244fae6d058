use core::cell::RefCell;
use std::sync::OnceLock;

use crate::{AnyError, lock::AppendLock};

/// Rendered in place of an error that would contain itself.
pub(crate) const CYCLE: &str = "<cycle>";

thread_local! {
    static RENDERING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks a cause list as being rendered on this thread until dropped.
pub(crate) struct RenderGuard(usize);

impl Drop for RenderGuard {
    fn drop(&mut self) {
        RENDERING.with_borrow_mut(|rendering| {
            if let Some(position) = rendering.iter().rposition(|&addr| addr == self.0) {
                rendering.remove(position);
            }
        });
    }
}

/// A snapshot of the errors wrapped by an [`Error`](crate::Error).
///
/// A single cause and a list of causes are distinct cases; the list case
/// always holds at least two errors.
#[derive(Clone, Debug, Default)]
pub enum Causes {
    /// No wrapped error.
    #[default]
    None,
    /// Exactly one wrapped error.
    Single(AnyError),
    /// Two or more wrapped errors, in order.
    Many(Vec<AnyError>),
}

impl Causes {
    /// Number of wrapped errors.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::None => 0,
            Self::Single(_) => 1,
            Self::Many(causes) => causes.len(),
        }
    }

    /// Returns `true` if nothing is wrapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    /// The first wrapped error.
    #[must_use]
    pub fn first(&self) -> Option<&AnyError> {
        match self {
            Self::None => None,
            Self::Single(cause) => Some(cause),
            Self::Many(causes) => causes.first(),
        }
    }

    /// All wrapped errors, in order.
    #[must_use]
    pub fn into_vec(self) -> Vec<AnyError> {
        match self {
            Self::None => Vec::new(),
            Self::Single(cause) => vec![cause],
            Self::Many(causes) => causes,
        }
    }
}

/// Ordered, append-only cause storage shared by all handles of an error.
///
/// The first cause lives in a write-once slot so that
/// [`source`](core::error::Error::source) can lend it out without holding a
/// lock; the remaining causes are appended behind the lock.
/// `rest` is non-empty only when `first` is set.
#[derive(Default)]
pub(crate) struct CauseList {
    first: OnceLock<AnyError>,
    rest: AppendLock<Vec<AnyError>>,
}

impl CauseList {
    pub(crate) fn new(causes: Vec<AnyError>) -> Self {
        let list = Self::default();
        list.extend(causes);
        list
    }

    pub(crate) fn first(&self) -> Option<&AnyError> {
        self.first.get()
    }

    pub(crate) fn len(&self) -> usize {
        match self.first.get() {
            Some(_) => 1 + self.rest.read().len(),
            None => 0,
        }
    }

    pub(crate) fn to_vec(&self) -> Vec<AnyError> {
        let rest = self.rest.read();
        self.first.get().into_iter().chain(rest.iter()).cloned().collect()
    }

    pub(crate) fn snapshot(&self) -> Causes {
        let rest = self.rest.read();
        match (self.first.get(), rest.is_empty()) {
            (None, _) => Causes::None,
            (Some(first), true) => Causes::Single(first.clone()),
            (Some(first), false) => {
                Causes::Many(core::iter::once(first).chain(rest.iter()).cloned().collect())
            }
        }
    }

    /// Starts rendering this list, or returns `None` if it is already being
    /// rendered further up the stack.
    ///
    /// Text and structured forms hold the guard while they recurse into the
    /// causes.
    pub(crate) fn render_guard(&self) -> Option<RenderGuard> {
        let addr = core::ptr::from_ref(self).addr();
        RENDERING.with_borrow_mut(|rendering| {
            if rendering.contains(&addr) {
                None
            } else {
                rendering.push(addr);
                Some(RenderGuard(addr))
            }
        })
    }

    /// Appends `causes` in order.
    ///
    /// The iterator is drained before the lock is taken, so it may freely
    /// read this list.
    pub(crate) fn extend(&self, causes: impl IntoIterator<Item = AnyError>) {
        let causes: Vec<AnyError> = causes.into_iter().collect();
        if causes.is_empty() {
            return;
        }
        let mut causes = causes.into_iter();
        let mut rest = self.rest.write();
        if self.first.get().is_none() {
            let Some(first) = causes.next() else {
                return;
            };
            // Only set while the write lock is held, so this cannot race.
            let _ = self.first.set(first);
        }
        rest.extend(causes);
    }
}
