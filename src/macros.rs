/// Builds an [`Error`](crate::Error) from a format string.
///
/// The arguments are interpreted in the same way as by the [`format!()`]
/// macro and the result becomes the message of a new, timestamped error.
/// Use [`new_m`](crate::new_m) or a [`Builder`](crate::Builder) when the
/// error needs fields, causes or attribution as well.
///
/// [`format!()`]: std::format
///
/// # Examples
///
/// ```
/// let error = causeway::error!("Something broke");
/// assert_eq!(error.message(), "Something broke");
///
/// let what = "it was bad";
/// let error = causeway::error!("Something broke hard: {what}");
/// assert_eq!(error.message(), "Something broke hard: it was bad");
///
/// let error = causeway::error!("{} of {} failed", 2, 5);
/// assert_eq!(error.message(), "2 of 5 failed");
/// assert!(error.at().is_some());
/// ```
#[macro_export]
macro_rules! error {
    ($msg:literal $(,)?) => {
        $crate::__private::format_error($crate::__private::format_args!($msg))
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::__private::format_error($crate::__private::format_args!($fmt, $($arg)*))
    };
}

/// Return early with an error.
///
/// This macro is similar to the [`bail!`] macro from the [`anyhow`] crate.
/// It constructs a new error using the same arguments as the [`error!`]
/// macro, and then returns early from the function with that error wrapped
/// in an `Err`.
///
/// This is equivalent to writing `return Err(error!(...).into());`
///
/// [`bail!`]: https://docs.rs/anyhow/latest/anyhow/macro.bail.html
/// [`anyhow`]: https://docs.rs/anyhow/latest/anyhow/
///
/// # Examples
///
/// ```
/// use causeway::{AnyError, bail};
///
/// fn check_positive(value: i32) -> Result<i32, causeway::Error> {
///     if value < 0 {
///         bail!("Value must be positive, got {value}");
///     }
///     Ok(value)
/// }
///
/// fn check_even(value: i32) -> Result<i32, AnyError> {
///     if value % 2 != 0 {
///         bail!("Value must be even");
///     }
///     Ok(value)
/// }
///
/// assert_eq!(check_positive(5).unwrap(), 5);
/// assert_eq!(
///     check_positive(-3).unwrap_err().message(),
///     "Value must be positive, got -3"
/// );
/// assert!(check_even(3).is_err());
/// ```
#[macro_export]
macro_rules! bail {
    ($($args:tt)*) => {
        return $crate::__private::Err($crate::error!($($args)*).into())
    };
}

#[cfg(test)]
mod tests {
    use crate::{AnyError, Error};

    fn fails(code: u16) -> Result<(), AnyError> {
        bail!("request failed with {code}");
    }

    #[test]
    fn test_error_macro_forms() {
        let error: Error = error!("plain");
        assert_eq!(error.message(), "plain");
        assert!(error.causes().is_empty());

        let error = error!("{}-{}", 1, 2,);
        assert_eq!(error.message(), "1-2");
    }

    #[test]
    fn test_bail_converts_into_the_return_type() {
        let error = fails(503).unwrap_err();
        assert!(crate::is::<Error>(&error));
        assert_eq!(
            crate::downcast::<Error>(&error).unwrap().message(),
            "request failed with 503"
        );
    }
}
