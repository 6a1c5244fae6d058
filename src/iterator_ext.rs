use core::iter::FusedIterator;

use crate::{AnyError, combine};

/// Extension methods for iterators over `Result` types to collect errors.
///
/// The standard library's [`Iterator::collect`] stops at the first error.
/// These methods keep going and [`combine`] every error they see, so a
/// single failure comes back as itself and several come back as an
/// [`Aggregate`](crate::Aggregate):
///
/// ```rust
/// use causeway::{Aggregate, IteratorExt};
///
/// let inputs = vec!["1", "2", "invalid", "4", "bad"];
///
/// // Standard collect stops at first error
/// let standard: Result<Vec<u8>, _> = inputs.iter().map(|s| s.parse::<u8>()).collect();
/// assert!(standard.is_err());
///
/// // collect_errors_vec processes every item and keeps every error
/// let result = inputs.into_iter().map(|s| s.parse::<u8>()).collect_errors_vec();
///
/// let errors = result.unwrap_err();
/// assert!(causeway::is::<Aggregate>(&errors));
/// assert_eq!(causeway::unwrap_many(&errors).len(), 2);
/// ```
pub trait IteratorExt<A, E>: Sized + Iterator<Item = Result<A, E>> {
    /// Collects successful values into a container, or every error into one
    /// [`AnyError`].
    ///
    /// The whole iterator is consumed even after the first error.
    ///
    /// ```
    /// use std::collections::BTreeSet;
    ///
    /// use causeway::IteratorExt;
    ///
    /// let values: BTreeSet<u8> = ["1", "2", "2"]
    ///     .into_iter()
    ///     .map(|s| s.parse::<u8>())
    ///     .collect_errors()
    ///     .unwrap();
    /// assert_eq!(values, BTreeSet::from([1u8, 2]));
    /// ```
    fn collect_errors<Container>(self) -> Result<Container, AnyError>
    where
        Container: FromIterator<A>,
        E: Into<AnyError>;

    /// Collects successful values into a `Vec`, or every error into one
    /// [`AnyError`].
    ///
    /// A specialized version of [`collect_errors`](IteratorExt::collect_errors)
    /// that helps with type inference.
    fn collect_errors_vec(self) -> Result<Vec<A>, AnyError>
    where
        E: Into<AnyError>;
}

struct IteratorWrapper<'a, Iter> {
    iter: Iter,
    errors: &'a mut Option<AnyError>,
}

impl<Iter, Object, Error> Iterator for IteratorWrapper<'_, Iter>
where
    Iter: Iterator<Item = Result<Object, Error>>,
    Error: Into<AnyError>,
{
    type Item = Object;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.errors.is_some() {
            return None;
        }

        match self.iter.next() {
            Some(Ok(object)) => Some(object),
            Some(Err(err)) => {
                *self.errors = combine(
                    core::iter::once(err)
                        .chain((&mut self.iter).filter_map(Result::err))
                        .map(Into::<AnyError>::into),
                );
                None
            }
            None => None,
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.errors.is_some() {
            (0, Some(0))
        } else {
            let (_, upper) = self.iter.size_hint();
            (0, upper)
        }
    }
}

impl<Iter, Object, Error> FusedIterator for IteratorWrapper<'_, Iter>
where
    Iter: FusedIterator<Item = Result<Object, Error>>,
    Error: Into<AnyError>,
{
}

impl<A, E, I> IteratorExt<A, E> for I
where
    I: Iterator<Item = Result<A, E>>,
{
    #[inline]
    fn collect_errors<Container>(self) -> Result<Container, AnyError>
    where
        Container: FromIterator<A>,
        E: Into<AnyError>,
    {
        let mut errors = None;
        let result = Container::from_iter(IteratorWrapper {
            iter: self,
            errors: &mut errors,
        });
        match errors {
            Some(errors) => Err(errors),
            None => Ok(result),
        }
    }

    #[inline]
    fn collect_errors_vec(self) -> Result<Vec<A>, AnyError>
    where
        E: Into<AnyError>,
    {
        self.collect_errors()
    }
}

#[cfg(test)]
mod tests {
    use core::num::ParseIntError;

    use super::*;

    #[test]
    fn test_collect_all_ok() {
        let values: Vec<u8> = ["1", "2", "3"]
            .into_iter()
            .map(str::parse::<u8>)
            .collect_errors()
            .unwrap();
        assert_eq!(values, [1, 2, 3]);
    }

    #[test]
    fn test_single_error_is_not_wrapped() {
        let errors = ["1", "x", "3"]
            .into_iter()
            .map(str::parse::<u8>)
            .collect_errors_vec()
            .unwrap_err();
        assert!(crate::is::<ParseIntError>(&errors));
    }

    #[test]
    fn test_every_item_is_consumed() {
        let mut seen = 0;
        let errors = (0..6)
            .map(|i| {
                seen += 1;
                if i % 2 == 0 {
                    Ok(i)
                } else {
                    Err(std::io::Error::other(format!("odd {i}")))
                }
            })
            .collect_errors::<Vec<_>>()
            .unwrap_err();

        assert_eq!(seen, 6);
        assert_eq!(errors.to_string(), "odd 1; odd 3; odd 5");
    }
}
