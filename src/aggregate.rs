//! Combining independent errors.
//!
//! [`combine`] merges errors into one, dropping `None` entries: nothing left
//! gives `None`, a single survivor is returned as is, and two or more become
//! an [`Aggregate`]. [`append_into`] grows an error variable in place, which
//! is the usual way to collect failures across a loop:
//!
//! ```
//! use causeway::AnyError;
//!
//! let mut errors: Option<AnyError> = None;
//! for name in ["a.toml", "b.toml", "c.toml"] {
//!     causeway::append_fn(&mut errors, || {
//!         std::fs::metadata(format!("/nonexistent/{name}")).map(drop)
//!     });
//! }
//!
//! let errors = errors.expect("all three lookups fail");
//! assert_eq!(causeway::unwrap_many(&errors).len(), 3);
//! ```

use core::{error::Error as StdError, fmt};

use serde_json::Value;
use triomphe::Arc;

use crate::{
    AnyError,
    any_error::Chain,
    causes::{CYCLE, CauseList},
};

/// Two or more independent errors with no primary cause.
///
/// Its message is the `"; "`-joined messages of its causes and its
/// structured export is an array of the causes' exports. Aggregates nested
/// inside aggregates stay nested.
///
/// Like [`Error`](crate::Error), an `Aggregate` is a shared handle: causes
/// appended through [`append_into`] are seen by every clone.
#[derive(Clone)]
pub struct Aggregate(Arc<CauseList>);

impl Aggregate {
    fn new(causes: Vec<AnyError>) -> Self {
        debug_assert!(causes.len() >= 2, "an aggregate holds at least two errors");
        Self(Arc::new(CauseList::new(causes)))
    }

    /// The combined errors, in order.
    #[must_use]
    pub fn errors(&self) -> Vec<AnyError> {
        self.0.to_vec()
    }

    /// Number of combined errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; kept for symmetry with [`Aggregate::len`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.len() == 0
    }

    /// Returns `true` if both handles refer to the same aggregate.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn cause_list(&self) -> &CauseList {
        &self.0
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(_guard) = self.0.render_guard() else {
            return f.write_str(CYCLE);
        };
        for (i, error) in self.0.to_vec().iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(_guard) = self.0.render_guard() else {
            return f.write_str(CYCLE);
        };
        f.debug_tuple("Aggregate").field(&self.0.to_vec()).finish()
    }
}

impl StdError for Aggregate {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.first().map(AnyError::as_dyn)
    }
}

impl Chain for Aggregate {
    fn causes(&self) -> Vec<AnyError> {
        self.0.to_vec()
    }

    fn to_value(&self) -> Value {
        let Some(_guard) = self.0.render_guard() else {
            return Value::String(CYCLE.to_owned());
        };
        Value::Array(self.0.to_vec().iter().map(AnyError::to_value).collect())
    }
}

impl serde::Serialize for Aggregate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&self.to_value(), serializer)
    }
}

fn from_vec(mut errors: Vec<AnyError>) -> Option<AnyError> {
    match errors.len() {
        0 => None,
        1 => errors.pop(),
        _ => Some(AnyError::from(Aggregate::new(errors))),
    }
}

/// Combines errors into one, dropping `None` entries.
///
/// Returns `None` if nothing is left, the error itself if exactly one is
/// left, and an [`Aggregate`] of the survivors, in order, otherwise.
///
/// ```
/// use causeway::{Aggregate, AnyError};
///
/// let a = AnyError::from(std::io::Error::other("a"));
/// let b = AnyError::from(std::io::Error::other("b"));
///
/// assert!(causeway::combine([None::<AnyError>, None]).is_none());
/// assert!(causeway::combine([None, Some(a.clone())]).unwrap().same(&a));
///
/// let both = causeway::combine([a, b]).unwrap();
/// assert!(causeway::is::<Aggregate>(&both));
/// assert_eq!(both.to_string(), "a; b");
/// ```
#[must_use]
pub fn combine<I>(errors: I) -> Option<AnyError>
where
    I: IntoIterator,
    I::Item: Into<Option<AnyError>>,
{
    from_vec(errors.into_iter().filter_map(Into::into).collect())
}

/// Appends errors to `target`, dropping `None` entries.
///
/// - `None` target: becomes [`combine`] of the errors.
/// - [`Aggregate`] or [`Error`](crate::Error) target: the errors are appended
///   to its cause list in place, so every other handle to it sees them too.
/// - Any other target: replaced by [`combine`] of the errors followed by the
///   original error, which ends up last.
pub fn append_into<I>(target: &mut Option<AnyError>, errors: I)
where
    I: IntoIterator,
    I::Item: Into<Option<AnyError>>,
{
    let errors: Vec<AnyError> = errors.into_iter().filter_map(Into::into).collect();

    match target {
        None => *target = from_vec(errors),
        Some(current) => {
            if let Some(causes) = current.cause_list() {
                causes.extend(errors);
            } else if !errors.is_empty() {
                let mut errors = errors;
                errors.extend(target.take());
                *target = from_vec(errors);
            }
        }
    }
}

/// Runs `f` once and appends its error, if any, to `target`.
///
/// See [`append_into`].
pub fn append_fn<E, F>(target: &mut Option<AnyError>, f: F)
where
    E: Into<AnyError>,
    F: FnOnce() -> Result<(), E>,
{
    append_into(target, [f().err().map(Into::<AnyError>::into)]);
}

#[cfg(test)]
mod tests {
    use std::io;

    use serde_json::json;

    use super::*;
    use crate::{Causes, Error, new_m, opt};

    static_assertions::assert_impl_all!(Aggregate: Send, Sync, Clone, StdError);

    fn leaf(message: &str) -> AnyError {
        AnyError::from(io::Error::other(message.to_owned()))
    }

    fn messages(errors: &[AnyError]) -> Vec<String> {
        errors.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_combine_nothing() {
        assert!(combine(Vec::<AnyError>::new()).is_none());
        assert!(combine([None::<AnyError>, None, None]).is_none());
    }

    #[test]
    fn test_combine_single_is_returned_unchanged() {
        let error = new_m("uuh", [opt::no_timestamp()]);
        let combined = combine([AnyError::from(error.clone())]).unwrap();
        assert!(crate::is::<Error>(&combined));
        assert!(crate::downcast::<Error>(&combined).unwrap().ptr_eq(&error));
    }

    #[test]
    fn test_combine_filters_and_keeps_order() {
        let (e1, e2, e3) = (leaf("1"), leaf("2"), leaf("3"));
        let combined = combine([Some(e1.clone()), None, Some(e2.clone()), Some(e3.clone()), None])
            .unwrap();

        let aggregate = crate::downcast::<Aggregate>(&combined).unwrap();
        let errors = aggregate.errors();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].same(&e1));
        assert!(errors[1].same(&e2));
        assert!(errors[2].same(&e3));
        assert_eq!(combined.to_string(), "1; 2; 3");
    }

    #[test]
    fn test_append_into_empty_target() {
        let mut target = None;
        append_into(&mut target, [None::<AnyError>]);
        assert!(target.is_none());

        let a = leaf("a");
        append_into(&mut target, [a.clone()]);
        assert!(target.as_ref().unwrap().same(&a));
    }

    #[test]
    fn test_append_into_aggregate_is_in_place() {
        let (c1, c2, x) = (leaf("c1"), leaf("c2"), leaf("x"));
        let mut target = combine([c1, c2]);
        let earlier = target.clone().unwrap();

        append_into(&mut target, [Some(x.clone()), None]);

        let target = target.unwrap();
        assert!(target.same(&earlier));
        assert_eq!(messages(&crate::unwrap_many(&earlier)), ["c1", "c2", "x"]);
        assert_eq!(messages(&crate::unwrap_many(&target)), ["c1", "c2", "x"]);
    }

    #[test]
    fn test_append_into_error_extends_its_causes() {
        let error = new_m("parent", [opt::cause(leaf("a")), opt::no_timestamp()]);
        let mut target = Some(AnyError::from(error.clone()));

        append_into(&mut target, [leaf("b")]);

        assert!(target.unwrap().same(&AnyError::from(error.clone())));
        let Causes::Many(causes) = error.causes() else {
            panic!("expected the appended cause");
        };
        assert_eq!(messages(&causes), ["a", "b"]);
    }

    #[test]
    fn test_append_into_foreign_target_keeps_original_last() {
        let f = leaf("f");
        let mut target = Some(f.clone());

        append_into(&mut target, [leaf("x"), leaf("y")]);

        let target = target.unwrap();
        assert!(crate::is::<Aggregate>(&target));
        let errors = crate::unwrap_many(&target);
        assert_eq!(messages(&errors), ["x", "y", "f"]);
        assert!(errors[2].same(&f));
    }

    #[test]
    fn test_append_nothing_into_foreign_target() {
        let f = leaf("f");
        let mut target = Some(f.clone());
        append_into(&mut target, [None::<AnyError>]);
        assert!(target.unwrap().same(&f));
    }

    #[test]
    fn test_append_fn() {
        let mut target = None;
        append_fn(&mut target, || Ok::<(), io::Error>(()));
        assert!(target.is_none());

        let mut calls = 0;
        append_fn(&mut target, || {
            calls += 1;
            Err(io::Error::other("first"))
        });
        append_fn(&mut target, || Err(io::Error::other("second")));
        assert_eq!(calls, 1);
        assert_eq!(target.unwrap().to_string(), "second; first");
    }

    #[test]
    fn test_aggregate_in_its_own_causes_renders_finitely() {
        let error = new_m("e", [opt::no_timestamp()]);
        let mut target = combine([leaf("a"), AnyError::from(error.clone())]);
        let aggregate = target.clone().unwrap();
        error.append([aggregate.clone()]);
        append_into(&mut target, [leaf("b")]);

        assert_eq!(aggregate.to_string(), r#"a; e err="<cycle>"; b"#);
        assert_eq!(
            aggregate.to_value(),
            json!(["a", { "@message": "e", "@errors": ["<cycle>"] }, "b"])
        );
    }

    #[test]
    fn test_nested_aggregates_stay_nested() {
        let nested = combine([Some(leaf("a")), combine([leaf("b"), leaf("c")])]).unwrap();

        assert_eq!(nested.to_value(), json!(["a", ["b", "c"]]));
        assert_eq!(serde_json::to_string(&nested).unwrap(), r#"["a",["b","c"]]"#);
    }
}
