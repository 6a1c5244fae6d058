use crate::{AnyError, Error, ErrorOption, new_w, new_wm};

mod sealed {
    pub trait Sealed {}
    impl<A, E> Sealed for Result<A, E> {}
}

/// Extension methods for wrapping the error of a [`Result`] in an [`Error`].
///
/// ```
/// use causeway::{ResultExt, opt};
///
/// fn read_config() -> Result<String, causeway::Error> {
///     std::fs::read_to_string("/nonexistent/app.toml")
///         .wrap_with([opt::message("cannot read config"), opt::field("attempt", 1)])
/// }
///
/// let error = read_config().unwrap_err();
/// assert_eq!(error.message(), "cannot read config");
/// assert_eq!(error.causes().len(), 1);
/// ```
pub trait ResultExt<V, E>: sealed::Sealed {
    /// Wraps the error in a timestamped [`Error`] with the given message.
    fn wrap_msg(self, message: impl Into<String>) -> Result<V, Error>
    where
        E: Into<AnyError>;

    /// Like [`wrap_msg`](ResultExt::wrap_msg), but only computes the message
    /// on the error path.
    fn wrap_msg_lazy<M, F>(self, message: F) -> Result<V, Error>
    where
        E: Into<AnyError>,
        M: Into<String>,
        F: FnOnce() -> M;

    /// Wraps the error in an [`Error`] built from `options`.
    fn wrap_with<I>(self, options: I) -> Result<V, Error>
    where
        E: Into<AnyError>,
        I: IntoIterator<Item = ErrorOption>;
}

impl<V, E> ResultExt<V, E> for Result<V, E> {
    fn wrap_msg(self, message: impl Into<String>) -> Result<V, Error>
    where
        E: Into<AnyError>,
    {
        self.map_err(|error| new_wm(error, message, []))
    }

    fn wrap_msg_lazy<M, F>(self, message: F) -> Result<V, Error>
    where
        E: Into<AnyError>,
        M: Into<String>,
        F: FnOnce() -> M,
    {
        self.map_err(|error| new_wm(error, message(), []))
    }

    fn wrap_with<I>(self, options: I) -> Result<V, Error>
    where
        E: Into<AnyError>,
        I: IntoIterator<Item = ErrorOption>,
    {
        self.map_err(|error| new_w(error, options))
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::opt;

    #[test]
    fn test_wrap_msg() {
        let result: Result<(), io::Error> = Err(io::Error::other("denied"));
        let error = result.wrap_msg("open failed").unwrap_err();
        assert_eq!(error.message(), "open failed");
        assert!(error.at().is_some());
        assert_eq!(error.causes().first().map(ToString::to_string).as_deref(), Some("denied"));
    }

    #[test]
    fn test_wrap_msg_lazy_only_runs_on_error() {
        let ok: Result<u8, io::Error> = Ok(3);
        let value = ok
            .wrap_msg_lazy(|| -> String { panic!("message computed for Ok") })
            .unwrap();
        assert_eq!(value, 3);
    }

    #[test]
    fn test_wrap_with_nests_crate_errors() {
        let inner = crate::new_m("inner", [opt::no_timestamp()]);
        let result: Result<(), Error> = Err(inner.clone());
        let outer = result
            .wrap_with([opt::message("outer"), opt::no_timestamp()])
            .unwrap_err();

        assert_eq!(outer.to_string(), r#"outer err="inner""#);
        let first = outer.causes().first().cloned().unwrap();
        assert!(crate::downcast::<Error>(&first).unwrap().ptr_eq(&inner));
    }
}
