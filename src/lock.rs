use spin::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Reader/writer lock around data that is only ever appended to.
///
/// Waiters spin, so guards are never held across user code.
#[repr(transparent)]
pub(crate) struct AppendLock<T>(RwLock<T>);

impl<T> AppendLock<T> {
    #[must_use]
    pub(crate) const fn new(value: T) -> Self {
        Self(RwLock::new(value))
    }

    #[inline]
    pub(crate) fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read()
    }

    #[inline]
    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.0.write()
    }
}

impl<T: Default> Default for AppendLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
