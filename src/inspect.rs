//! Querying errors by type and walking cause graphs.
//!
//! # Exact matching
//!
//! [`is`] and [`downcast`] look at the concrete type of the error they are
//! given and nothing else. They do **not** walk the cause chain: an
//! [`Error`](crate::Error) wrapping an [`std::io::Error`] is not an
//! `io::Error` as far as [`is`] is concerned.
//!
//! ```
//! use causeway::{AnyError, opt};
//!
//! let io = std::io::Error::other("disk full");
//! let wrapped = AnyError::from(causeway::new_w(io, [opt::no_timestamp()]));
//!
//! assert!(causeway::is::<causeway::Error>(&wrapped));
//! assert!(!causeway::is::<std::io::Error>(&wrapped));
//!
//! // Chain-aware matching is a walk away.
//! assert!(causeway::walk(&wrapped).any(|e| causeway::is::<std::io::Error>(&e)));
//! ```
//!
//! # Walking
//!
//! [`walk`] visits an error and then its causes breadth-first. Errors with the
//! [`Chain`](crate::Chain) capability report all of their causes; any other
//! error has at most one, its [`source`](core::error::Error::source).

use core::{any::Any, error::Error as StdError, iter::FusedIterator};
use std::collections::VecDeque;

use hashbrown::HashSet;
use rustc_hash::FxBuildHasher;

use crate::AnyError;

/// Returns `true` if `error` is exactly an `E`.
///
/// Wrapped causes are not considered, see the [module docs](self).
#[must_use]
pub fn is<E: StdError + 'static>(error: &AnyError) -> bool {
    error.as_dyn().is::<E>()
}

/// Returns `error` as an `E` if it is exactly an `E`.
///
/// Wrapped causes are not considered, see the [module docs](self).
///
/// ```
/// use causeway::{AnyError, opt};
///
/// let error = AnyError::from(causeway::new_m("boom", [opt::field("code", 7)]));
/// let error = causeway::downcast::<causeway::Error>(&error).unwrap();
/// assert_eq!(error.field("code"), Some(&serde_json::json!(7)));
/// ```
#[must_use]
pub fn downcast<E: StdError + 'static>(error: &AnyError) -> Option<&E> {
    error.as_dyn().downcast_ref::<E>()
}

/// The first cause of `error`, if it has one.
#[must_use]
pub fn unwrap(error: &AnyError) -> Option<AnyError> {
    match error.as_chain() {
        Some(chain) => chain.causes().into_iter().next(),
        None => error.source_cause(),
    }
}

/// Every cause of `error`, in order.
///
/// For a foreign error this is its `source`, if any.
#[must_use]
pub fn unwrap_many(error: &AnyError) -> Vec<AnyError> {
    match error.as_chain() {
        Some(chain) => chain.causes(),
        None => error.source_cause().into_iter().collect(),
    }
}

/// Finds the first payload of type `T` in the cause graph of `error`.
///
/// The graph is searched breadth-first, starting with `error` itself, so a
/// payload closer to the root wins over a deeper one.
///
/// ```
/// use causeway::{AnyError, opt};
///
/// let error = AnyError::from(causeway::new([opt::causes([
///     causeway::new_m("a", []),
///     causeway::new_m("b", [opt::value(123)]),
/// ].map(AnyError::from))]).unwrap());
///
/// assert_eq!(causeway::unwrap_value::<i32>(&error), Some(123));
/// assert_eq!(causeway::unwrap_value::<bool>(&error), None);
/// ```
#[must_use]
pub fn unwrap_value<T: Any + Clone>(error: &AnyError) -> Option<T> {
    walk(error).find_map(|node| {
        let payload: &dyn Any = node.as_chain()?.payload()?;
        payload.downcast_ref::<T>().cloned()
    })
}

/// Iterates over `error` and all of its transitive causes breadth-first.
///
/// Each error is yielded once, even if it is reachable along several paths.
pub fn walk(error: &AnyError) -> Walk {
    let mut walk = Walk {
        queue: VecDeque::new(),
        seen: HashSet::default(),
    };
    walk.push(error.clone());
    walk
}

/// Breadth-first iterator over a cause graph, returned by [`walk`].
#[must_use]
pub struct Walk {
    queue: VecDeque<AnyError>,
    seen: HashSet<(usize, usize), FxBuildHasher>,
}

impl Walk {
    fn push(&mut self, error: AnyError) {
        if self.seen.insert(error.identity()) {
            self.queue.push_back(error);
        }
    }
}

impl Iterator for Walk {
    type Item = AnyError;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.queue.pop_front()?;
        for cause in unwrap_many(&current) {
            self.push(cause);
        }
        Some(current)
    }
}

impl FusedIterator for Walk {}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::{Aggregate, Error, combine, new, new_m, opt};

    fn leaf(message: &str) -> AnyError {
        AnyError::from(io::Error::other(message.to_owned()))
    }

    fn messages(errors: impl IntoIterator<Item = AnyError>) -> Vec<String> {
        errors.into_iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_is_does_not_walk_causes() {
        let inner = new_m("inner", [opt::no_timestamp()]);
        let outer = AnyError::from(new_m("outer", [opt::cause(leaf("io"))]));

        assert!(is::<Error>(&AnyError::from(inner)));
        assert!(is::<Error>(&outer));
        assert!(!is::<io::Error>(&outer));
        assert!(!is::<Aggregate>(&outer));
        assert!(downcast::<io::Error>(&outer).is_none());
        assert!(is::<io::Error>(&unwrap(&outer).unwrap()));
    }

    #[test]
    fn test_unwrap_shapes() {
        let none = AnyError::from(new_m("none", []));
        assert!(unwrap(&none).is_none());
        assert!(unwrap_many(&none).is_empty());

        let (a, b) = (leaf("a"), leaf("b"));
        let two = AnyError::from(new([opt::causes([a.clone(), b.clone()])]).unwrap());
        assert!(unwrap(&two).unwrap().same(&a));
        let causes = unwrap_many(&two);
        assert_eq!(causes.len(), 2);
        assert!(causes[0].same(&a));
        assert!(causes[1].same(&b));

        assert!(unwrap_many(&a).is_empty());
        assert!(unwrap(&a).is_none());
    }

    #[derive(Debug, thiserror::Error)]
    #[error("query failed")]
    struct Query(#[source] io::Error);

    #[derive(Debug, thiserror::Error)]
    #[error("report failed")]
    struct Report(#[source] Error);

    #[test]
    fn test_unwrap_follows_foreign_source() {
        let query = AnyError::from(Query(io::Error::other("timeout")));

        let causes = unwrap_many(&query);
        assert_eq!(messages(causes.clone()), ["timeout"]);
        assert!(is::<io::Error>(&causes[0]));
        assert!(unwrap(&query).unwrap().same(&causes[0]));
        assert!(unwrap_many(&causes[0]).is_empty());
    }

    #[test]
    fn test_walk_continues_through_foreign_sources() {
        let inner = new_m("inner", [opt::value(5u8), opt::cause(leaf("disk"))]);
        let error = AnyError::from(new_m(
            "outer",
            [opt::cause(Report(inner.clone())), opt::no_timestamp()],
        ));

        assert_eq!(walk(&error).count(), 4);
        assert!(walk(&error).any(|e| e.same(&AnyError::from(inner.clone()))));
        assert_eq!(unwrap_value::<u8>(&error), Some(5));
    }

    #[test]
    fn test_unwrap_value_is_breadth_first() {
        let deep = new_m("deep", [opt::value(1), opt::no_timestamp()]);
        let shallow = new_m("shallow", [opt::value(2), opt::no_timestamp()]);
        let error = combine([
            AnyError::from(new_m("mid", [opt::cause(deep), opt::no_timestamp()])),
            AnyError::from(shallow),
        ])
        .unwrap();

        assert_eq!(unwrap_value::<i32>(&error), Some(2));
        assert_eq!(unwrap_value::<u64>(&error), None);
    }

    #[test]
    fn test_unwrap_value_finds_none_payload() {
        let error = AnyError::from(new_m("x", [opt::value(None::<String>)]));
        assert_eq!(unwrap_value::<Option<String>>(&error), Some(None));
    }

    #[test]
    fn test_walk_order() {
        let error = combine([
            AnyError::from(new_m("a", [opt::cause(leaf("a1")), opt::no_timestamp()])),
            leaf("b"),
        ])
        .unwrap();

        assert_eq!(messages(walk(&error).skip(1)), [r#"a err="a1""#, "b", "a1"]);
    }

    #[test]
    fn test_walk_terminates_on_cycles() {
        let a = new_m("a", [opt::no_timestamp()]);
        let b = new_m("b", [opt::cause(a.clone()), opt::no_timestamp()]);
        a.append([AnyError::from(b)]);

        assert_eq!(walk(&AnyError::from(a)).count(), 2);
    }

    #[test]
    fn test_walk_visits_shared_cause_once() {
        let shared = leaf("shared");
        let error = combine([
            AnyError::from(new_m("x", [opt::cause(shared.clone())])),
            AnyError::from(new_m("y", [opt::cause(shared.clone())])),
        ])
        .unwrap();

        assert_eq!(walk(&error).filter(|e| e.same(&shared)).count(), 1);
    }
}
