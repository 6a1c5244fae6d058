//! Option-based error construction.
//!
//! Options are applied in order to a fresh configuration; the call site is
//! resolved exactly once, after all options have been applied.
//!
//! ```
//! use causeway::opt;
//!
//! let error = causeway::new([
//!     opt::message("request failed"),
//!     opt::field("status", 503),
//!     opt::cause(std::io::Error::other("connection reset")),
//!     opt::no_timestamp(),
//! ])
//! .expect("options were given");
//!
//! assert_eq!(
//!     error.to_string(),
//!     r#"request failed status=503 err="connection reset""#
//! );
//! assert!(causeway::new([]).is_none());
//! ```

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::{
    AnyError, Error,
    any_error::Payload,
    caller::{resolve_caller, resolve_stack},
    causes::CauseList,
    error::{Attribution, ErrorInner, Fields},
    helpers::HelperRegistry,
};

/// A single construction option.
///
/// The [`opt`](crate::opt) functions are the usual way to create these.
#[derive(Debug)]
pub enum ErrorOption {
    /// Sets the message; the last one applied wins.
    Message(String),
    /// Merges fields; the last value applied for a name wins.
    Fields(Fields),
    /// Appends causes.
    Causes(Vec<AnyError>),
    /// Attaches a payload; the last one applied wins.
    Value(Box<dyn Payload>),
    /// Requests single-frame attribution.
    Caller,
    /// Requests full-stack attribution. Takes precedence over
    /// [`ErrorOption::Caller`].
    Stacktrace,
    /// Skips additional frames when resolving attribution. Accumulates.
    CallerSkip(usize),
    /// Records this timestamp instead of the construction time.
    At(DateTime<Utc>),
    /// Records no timestamp.
    NoTimestamp,
}

/// Constructors for [`ErrorOption`].
pub mod opt {
    use chrono::{DateTime, Utc};
    use serde_json::Value;

    use super::ErrorOption;
    use crate::{AnyError, any_error::Payload};

    /// Sets the message.
    pub fn message(message: impl Into<String>) -> ErrorOption {
        ErrorOption::Message(message.into())
    }

    /// Adds one field.
    pub fn field(name: impl Into<String>, value: impl Into<Value>) -> ErrorOption {
        fields([(name, value)])
    }

    /// Adds several fields.
    pub fn fields<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> ErrorOption
    where
        K: Into<String>,
        V: Into<Value>,
    {
        ErrorOption::Fields(
            fields
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }

    /// Wraps one error.
    pub fn cause(error: impl Into<AnyError>) -> ErrorOption {
        ErrorOption::Causes(vec![error.into()])
    }

    /// Wraps several errors; `None` entries are dropped.
    pub fn causes<I>(errors: I) -> ErrorOption
    where
        I: IntoIterator,
        I::Item: Into<Option<AnyError>>,
    {
        ErrorOption::Causes(errors.into_iter().filter_map(Into::into).collect())
    }

    /// Attaches a payload. `None::<T>` counts as an attached payload.
    pub fn value(value: impl Payload) -> ErrorOption {
        ErrorOption::Value(Box::new(value))
    }

    /// Records the frame that raised the error.
    #[must_use]
    pub fn caller() -> ErrorOption {
        ErrorOption::Caller
    }

    /// Records the whole stack, without helper frames.
    ///
    /// Nothing is recorded when no frame is available.
    #[must_use]
    pub fn stacktrace() -> ErrorOption {
        ErrorOption::Stacktrace
    }

    /// Attributes the error `skip` frames further up, for wrappers that
    /// build errors on behalf of their caller.
    #[must_use]
    pub fn caller_skip(skip: usize) -> ErrorOption {
        ErrorOption::CallerSkip(skip)
    }

    /// Records `at` as the creation time.
    #[must_use]
    pub fn at(at: DateTime<Utc>) -> ErrorOption {
        ErrorOption::At(at)
    }

    /// Records no creation time.
    #[must_use]
    pub fn no_timestamp() -> ErrorOption {
        ErrorOption::NoTimestamp
    }
}

struct Config {
    message: String,
    fields: Fields,
    at: Option<DateTime<Utc>>,
    causes: Vec<AnyError>,
    value: Option<Box<dyn Payload>>,
    caller: bool,
    stacktrace: bool,
    skip: usize,
}

impl Config {
    fn new() -> Self {
        Self {
            message: String::new(),
            fields: Fields::default(),
            at: Some(Utc::now()),
            causes: Vec::new(),
            value: None,
            caller: false,
            stacktrace: false,
            skip: 0,
        }
    }

    fn apply(&mut self, option: ErrorOption) {
        match option {
            ErrorOption::Message(message) => self.message = message,
            ErrorOption::Fields(fields) => self.fields.extend(fields),
            ErrorOption::Causes(causes) => self.causes.extend(causes),
            ErrorOption::Value(value) => self.value = Some(value),
            ErrorOption::Caller => self.caller = true,
            ErrorOption::Stacktrace => self.stacktrace = true,
            ErrorOption::CallerSkip(skip) => self.skip = self.skip.saturating_add(skip),
            ErrorOption::At(at) => self.at = Some(at),
            ErrorOption::NoTimestamp => self.at = None,
        }
    }
}

/// Collects options and builds an [`Error`].
///
/// ```
/// use causeway::{Builder, HelperRegistry};
///
/// let registry = HelperRegistry::new();
/// let error = Builder::new()
///     .registry(&registry)
///     .message("parse failed")
///     .field("line", 7)
///     .no_timestamp()
///     .build()
///     .expect("options were given");
///
/// assert_eq!(error.to_string(), "parse failed line=7");
/// assert!(Builder::new().build().is_none());
/// ```
#[must_use]
pub struct Builder<'r> {
    options: Vec<ErrorOption>,
    registry: &'r HelperRegistry,
}

impl Builder<'static> {
    /// Creates a builder that resolves attribution against
    /// [`HelperRegistry::global`].
    pub fn new() -> Self {
        Self {
            options: Vec::new(),
            registry: HelperRegistry::global(),
        }
    }
}

impl Default for Builder<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> Builder<'r> {
    /// Resolves attribution against `registry` instead.
    pub fn registry<'s>(self, registry: &'s HelperRegistry) -> Builder<'s> {
        Builder {
            options: self.options,
            registry,
        }
    }

    /// Appends an option.
    pub fn option(mut self, option: ErrorOption) -> Self {
        self.options.push(option);
        self
    }

    /// Appends several options, in order.
    pub fn options(mut self, options: impl IntoIterator<Item = ErrorOption>) -> Self {
        self.options.extend(options);
        self
    }

    /// See [`opt::message`].
    pub fn message(self, message: impl Into<String>) -> Self {
        self.option(opt::message(message))
    }

    /// See [`opt::field`].
    pub fn field(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.option(opt::field(name, value))
    }

    /// See [`opt::cause`].
    pub fn cause(self, error: impl Into<AnyError>) -> Self {
        self.option(opt::cause(error))
    }

    /// See [`opt::causes`].
    pub fn causes<I>(self, errors: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Option<AnyError>>,
    {
        self.option(opt::causes(errors))
    }

    /// See [`opt::value`].
    pub fn value(self, value: impl Payload) -> Self {
        self.option(opt::value(value))
    }

    /// See [`opt::caller`].
    pub fn caller(self) -> Self {
        self.option(ErrorOption::Caller)
    }

    /// See [`opt::stacktrace`].
    pub fn stacktrace(self) -> Self {
        self.option(ErrorOption::Stacktrace)
    }

    /// See [`opt::caller_skip`].
    pub fn caller_skip(self, skip: usize) -> Self {
        self.option(ErrorOption::CallerSkip(skip))
    }

    /// See [`opt::no_timestamp`].
    pub fn no_timestamp(self) -> Self {
        self.option(ErrorOption::NoTimestamp)
    }

    /// Builds the error, or returns `None` if no option was given.
    #[must_use]
    pub fn build(self) -> Option<Error> {
        if self.options.is_empty() {
            return None;
        }

        let mut config = Config::new();
        for option in self.options {
            config.apply(option);
        }

        let attribution = if config.stacktrace {
            let frames = resolve_stack(self.registry, config.skip);
            if frames.is_empty() {
                Attribution::None
            } else {
                Attribution::Stacktrace(frames)
            }
        } else if config.caller {
            resolve_caller(self.registry, config.skip).map_or(Attribution::None, Attribution::Caller)
        } else {
            Attribution::None
        };

        Some(Error::from_inner(ErrorInner {
            message: config.message,
            fields: config.fields,
            at: config.at,
            causes: CauseList::new(config.causes),
            attribution,
            value: config.value,
        }))
    }
}

/// Builds an error from `options`, or returns `None` if there are none.
#[must_use]
pub fn new(options: impl IntoIterator<Item = ErrorOption>) -> Option<Error> {
    Builder::new().options(options).build()
}

/// Builds an error with `message`, applied after `options`.
#[must_use]
pub fn new_m(message: impl Into<String>, options: impl IntoIterator<Item = ErrorOption>) -> Error {
    build_with(options, [opt::message(message)])
}

/// Builds an error wrapping `cause`, applied after `options`.
#[must_use]
pub fn new_w(cause: impl Into<AnyError>, options: impl IntoIterator<Item = ErrorOption>) -> Error {
    build_with(options, [opt::cause(cause)])
}

/// Builds an error wrapping `cause` with `message`, both applied after
/// `options`.
#[must_use]
pub fn new_wm(
    cause: impl Into<AnyError>,
    message: impl Into<String>,
    options: impl IntoIterator<Item = ErrorOption>,
) -> Error {
    build_with(options, [opt::cause(cause), opt::message(message)])
}

/// Builds an error with `message` and `fields`, both applied after `options`.
#[must_use]
pub fn new_f<K, V>(
    message: impl Into<String>,
    fields: impl IntoIterator<Item = (K, V)>,
    options: impl IntoIterator<Item = ErrorOption>,
) -> Error
where
    K: Into<String>,
    V: Into<Value>,
{
    build_with(options, [opt::fields(fields), opt::message(message)])
}

fn build_with<const N: usize>(
    options: impl IntoIterator<Item = ErrorOption>,
    last: [ErrorOption; N],
) -> Error {
    match Builder::new().options(options).options(last).build() {
        Some(error) => error,
        None => unreachable!("at least one option is always applied"),
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use serde_json::json;

    use super::*;
    use crate::Causes;

    #[test]
    fn test_no_options_is_no_error() {
        assert!(new([]).is_none());
        assert!(Builder::new().build().is_none());
    }

    #[test]
    fn test_defaults() {
        let error = new([opt::message("x")]).unwrap();
        assert!(error.at().is_some());
        assert!(error.fields().is_empty());
        assert!(error.causes().is_empty());
        assert_eq!(*error.attribution(), Attribution::None);
        assert!(!error.has_value());
    }

    #[test]
    fn test_last_writer_wins() {
        let error = new([
            opt::message("first"),
            opt::field("a", 1),
            opt::fields([("a", 2), ("b", 3)]),
            opt::message("second"),
            opt::value(1u8),
            opt::value("text"),
        ])
        .unwrap();

        assert_eq!(error.message(), "second");
        assert_eq!(error.field("a"), Some(&json!(2)));
        assert_eq!(error.field("b"), Some(&json!(3)));
        assert_eq!(error.value::<u8>(), None);
        assert_eq!(error.value::<&str>(), Some(&"text"));
    }

    #[test]
    fn test_causes_accumulate_without_none() {
        let a = AnyError::from(io::Error::other("a"));
        let b = AnyError::from(io::Error::other("b"));
        let error = new([
            opt::causes([None, Some(a.clone())]),
            opt::causes([None::<AnyError>]),
            opt::cause(b.clone()),
        ])
        .unwrap();

        let Causes::Many(causes) = error.causes() else {
            panic!("expected two causes");
        };
        assert_eq!(causes.len(), 2);
        assert!(causes[0].same(&a));
        assert!(causes[1].same(&b));
    }

    #[test]
    fn test_single_cause_representation() {
        let error = new_w(io::Error::other("only"), []);
        assert!(matches!(error.causes(), Causes::Single(_)));

        let error = new([opt::causes([None::<AnyError>, None])]).unwrap();
        assert!(matches!(error.causes(), Causes::None));
    }

    #[test]
    fn test_convenience_constructors_apply_arguments_last() {
        let error = new_m("kept", [opt::message("overridden"), opt::no_timestamp()]);
        assert_eq!(error.message(), "kept");

        let error = new_wm(io::Error::other("io"), "wrapped", [opt::no_timestamp()]);
        assert_eq!(error.to_string(), r#"wrapped err="io""#);

        let error = new_f("bad input", [("line", 3)], [opt::field("line", 1), opt::no_timestamp()]);
        assert_eq!(error.to_string(), "bad input line=3");
    }

    #[test]
    fn test_explicit_and_suppressed_timestamps() {
        let at = Utc::now();
        assert_eq!(new_m("x", [opt::at(at)]).at(), Some(at));
        assert_eq!(new_m("x", [opt::at(at), opt::no_timestamp()]).at(), None);
    }
}
