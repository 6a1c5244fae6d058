use core::{any::Any, error::Error as StdError, fmt};
use std::sync::Arc;

use serde_json::Value;

use crate::{Aggregate, Error, causes::CauseList};

/// An opaque value attached to an [`Error`] for typed extraction later.
///
/// Implemented for every `Debug + Send + Sync + 'static` type. The `Debug`
/// form is what the structured export records under `@value`.
pub trait Payload: Any + fmt::Debug + Send + Sync {}

impl<T: Any + fmt::Debug + Send + Sync> Payload for T {}

/// Capability of errors that take part in chain walking.
///
/// [`Error`] and [`Aggregate`] implement this trait. Third-party error types
/// can implement it as well and opt in with [`AnyError::from_chain`]; every
/// other error exports as its message and has its
/// [`source`](core::error::Error::source) chain as its causes.
pub trait Chain: StdError + Send + Sync + 'static {
    /// All wrapped errors, in order.
    fn causes(&self) -> Vec<AnyError>;

    /// The attached payload, if any.
    fn payload(&self) -> Option<&dyn Payload> {
        None
    }

    /// The structured export of this error.
    ///
    /// Defaults to the `Display` text.
    fn to_value(&self) -> Value {
        Value::String(self.to_string())
    }
}

#[derive(Clone)]
enum Repr {
    Error(Error),
    Aggregate(Aggregate),
    Chain(Arc<dyn Chain>),
    Leaf(Arc<dyn StdError + Send + Sync>),
    /// The error `depth` steps down the `source` chain of `root`.
    Source {
        root: Arc<dyn StdError + Send + Sync>,
        depth: usize,
    },
}

/// Follows `source` up to `depth` times, stopping at the last error reached.
fn nth_source<'a>(root: &'a (dyn StdError + 'static), depth: usize) -> &'a (dyn StdError + 'static) {
    let mut current = root;
    for _ in 0..depth {
        match current.source() {
            Some(source) => current = source,
            None => break,
        }
    }
    current
}

/// A shared, dynamically typed error: either one of this crate's errors or
/// any foreign [`std::error::Error`].
///
/// `AnyError` is what cause lists store and what [`combine`](crate::combine)
/// and the inspection functions operate on. Cloning is cheap and clones
/// refer to the same error.
///
/// Converting an [`Error`] or [`Aggregate`] keeps its identity, so appends
/// through one handle are visible through the other:
///
/// ```
/// use causeway::{AnyError, opt};
///
/// let error = causeway::new_m("outer", [opt::no_timestamp()]);
/// let any = AnyError::from(error.clone());
/// error.append([Some(AnyError::from(std::io::Error::other("late")))]);
///
/// assert_eq!(causeway::unwrap_many(&any).len(), 1);
/// assert!(any.same(&AnyError::from(error)));
/// ```
#[derive(Clone)]
pub struct AnyError {
    repr: Repr,
}

impl AnyError {
    /// Wraps an error that implements the [`Chain`] capability.
    pub fn from_chain<C: Chain>(error: C) -> Self {
        Self::classify(error, |error| Repr::Chain(Arc::new(error)))
    }

    /// Keeps the identity of this crate's own handle types and wraps
    /// everything else with `wrap`.
    fn classify<E: 'static>(error: E, wrap: impl FnOnce(E) -> Repr) -> Self {
        let mut slot = Some(error);
        let any: &mut dyn Any = &mut slot;
        if let Some(error) = any.downcast_mut::<Option<Error>>().and_then(Option::take) {
            return Self {
                repr: Repr::Error(error),
            };
        }
        if let Some(aggregate) = any.downcast_mut::<Option<Aggregate>>().and_then(Option::take) {
            return Self {
                repr: Repr::Aggregate(aggregate),
            };
        }

        match slot {
            Some(error) => Self { repr: wrap(error) },
            None => unreachable!("the error is only taken by a successful downcast"),
        }
    }

    /// The error as a trait object, for `Display`, `source` and downcasts.
    #[must_use]
    pub fn as_dyn(&self) -> &(dyn StdError + 'static) {
        match &self.repr {
            Repr::Error(error) => error,
            Repr::Aggregate(aggregate) => aggregate,
            Repr::Chain(chain) => &**chain,
            Repr::Leaf(leaf) => &**leaf,
            Repr::Source { root, depth } => nth_source(&**root, *depth),
        }
    }

    /// The chain capability, `None` for foreign errors.
    #[must_use]
    pub fn as_chain(&self) -> Option<&dyn Chain> {
        match &self.repr {
            Repr::Error(error) => Some(error),
            Repr::Aggregate(aggregate) => Some(aggregate),
            Repr::Chain(chain) => Some(&**chain),
            Repr::Leaf(_) | Repr::Source { .. } => None,
        }
    }

    /// The [`source`](core::error::Error::source) of a foreign error.
    ///
    /// A source that is one of this crate's handle types is returned with its
    /// identity intact. Always `None` for errors with the [`Chain`]
    /// capability, whose causes are reported by [`Chain::causes`].
    pub(crate) fn source_cause(&self) -> Option<AnyError> {
        let (root, depth) = match &self.repr {
            Repr::Leaf(root) => (root, 0),
            Repr::Source { root, depth } => (root, *depth),
            Repr::Error(_) | Repr::Aggregate(_) | Repr::Chain(_) => return None,
        };
        let source = self.as_dyn().source()?;
        if let Some(error) = source.downcast_ref::<Error>() {
            return Some(Self::from(error.clone()));
        }
        if let Some(aggregate) = source.downcast_ref::<Aggregate>() {
            return Some(Self::from(aggregate.clone()));
        }
        Some(Self {
            repr: Repr::Source {
                root: Arc::clone(root),
                depth: depth + 1,
            },
        })
    }

    /// Returns `true` if both handles refer to the same error.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }

    /// The structured export: an object for [`Error`], an array for
    /// [`Aggregate`], and the plain message for foreign errors.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self.as_chain() {
            Some(chain) => chain.to_value(),
            None => Value::String(self.to_string()),
        }
    }

    /// Cause storage that can be extended in place.
    pub(crate) fn cause_list(&self) -> Option<&CauseList> {
        match &self.repr {
            Repr::Error(error) => Some(error.cause_list()),
            Repr::Aggregate(aggregate) => Some(aggregate.cause_list()),
            Repr::Chain(_) | Repr::Leaf(_) | Repr::Source { .. } => None,
        }
    }

    /// Address of the shared allocation behind this handle, paired with the
    /// position in its `source` chain.
    pub(crate) fn identity(&self) -> (usize, usize) {
        match &self.repr {
            Repr::Error(error) => (error.addr(), 0),
            Repr::Aggregate(aggregate) => (aggregate.addr(), 0),
            Repr::Chain(chain) => (Arc::as_ptr(chain).cast::<()>() as usize, 0),
            Repr::Leaf(leaf) => (Arc::as_ptr(leaf).cast::<()>() as usize, 0),
            Repr::Source { root, depth } => (Arc::as_ptr(root).cast::<()>() as usize, *depth),
        }
    }
}

impl<E> From<E> for AnyError
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::classify(error, |error| Repr::Leaf(Arc::new(error)))
    }
}

impl fmt::Display for AnyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_dyn(), f)
    }
}

impl fmt::Debug for AnyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_dyn(), f)
    }
}

impl serde::Serialize for AnyError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&self.to_value(), serializer)
    }
}
