use core::{any::Any, error::Error as StdError, fmt};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use serde_json::{Map, Value};
use triomphe::Arc;

use crate::{
    AnyError,
    any_error::{Chain, Payload},
    causes::{CYCLE, CauseList, Causes},
    frame::Frame,
};

/// User fields of an [`Error`], in insertion order.
pub type Fields = IndexMap<String, Value, FxBuildHasher>;

/// Format used for timestamps in the textual and structured forms.
const RFC1123: &str = "%a, %d %b %Y %H:%M:%S UTC";

/// Recorded call-site information of an [`Error`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Attribution {
    /// No call site recorded.
    #[default]
    None,
    /// The single frame that raised the error.
    Caller(Frame),
    /// The stack at the point the error was raised, innermost first.
    Stacktrace(Vec<Frame>),
}

pub(crate) struct ErrorInner {
    pub(crate) message: String,
    pub(crate) fields: Fields,
    pub(crate) at: Option<DateTime<Utc>>,
    pub(crate) causes: CauseList,
    pub(crate) attribution: Attribution,
    pub(crate) value: Option<Box<dyn Payload>>,
}

/// A structured error.
///
/// An `Error` carries a message, user fields, a creation timestamp, the call
/// site it was raised from, an optional payload, and any number of wrapped
/// causes. Everything except the causes is fixed at construction; causes can
/// be appended later with [`Error::append`] or [`append_into`], and every
/// clone of the handle observes the appended causes.
///
/// Errors are built with [`new`], [`new_m`] and friends, or with a
/// [`Builder`].
///
/// [`append_into`]: crate::append_into
/// [`new`]: crate::new
/// [`new_m`]: crate::new_m
/// [`Builder`]: crate::Builder
#[derive(Clone)]
pub struct Error(Arc<ErrorInner>);

impl Error {
    pub(crate) fn from_inner(inner: ErrorInner) -> Self {
        Self(Arc::new(inner))
    }

    /// The message, empty if none was given.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.0.message
    }

    /// The user fields.
    #[must_use]
    pub fn fields(&self) -> &Fields {
        &self.0.fields
    }

    /// A single user field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.fields.get(name)
    }

    /// The creation timestamp, if one was recorded.
    #[must_use]
    pub fn at(&self) -> Option<DateTime<Utc>> {
        self.0.at
    }

    /// The recorded call-site information.
    #[must_use]
    pub fn attribution(&self) -> &Attribution {
        &self.0.attribution
    }

    /// The frame that raised the error, if single-frame attribution was
    /// requested.
    #[must_use]
    pub fn caller(&self) -> Option<&Frame> {
        match &self.0.attribution {
            Attribution::Caller(frame) => Some(frame),
            _ => None,
        }
    }

    /// The captured stack, if stacktrace attribution was requested.
    #[must_use]
    pub fn stacktrace(&self) -> Option<&[Frame]> {
        match &self.0.attribution {
            Attribution::Stacktrace(frames) => Some(frames),
            _ => None,
        }
    }

    /// A snapshot of the wrapped errors.
    #[must_use]
    pub fn causes(&self) -> Causes {
        self.0.causes.snapshot()
    }

    /// Returns `true` if a payload was attached, even a `None` one.
    #[must_use]
    pub fn has_value(&self) -> bool {
        self.0.value.is_some()
    }

    /// The attached payload, if there is one and it is a `T`.
    ///
    /// Only this error is inspected; use [`unwrap_value`] to search the
    /// whole cause graph.
    ///
    /// [`unwrap_value`]: crate::unwrap_value
    #[must_use]
    pub fn value<T: Any>(&self) -> Option<&T> {
        let value: &dyn Any = self.0.value.as_deref()?;
        value.downcast_ref()
    }

    /// Appends errors to the cause list in place, dropping `None` entries.
    ///
    /// Every handle to this error observes the new causes. Appending an error
    /// that already wraps this one creates a cycle; [`walk`] visits each error
    /// once and the text and structured forms print `<cycle>` where the
    /// error would repeat inside itself.
    ///
    /// [`walk`]: crate::walk
    pub fn append<I>(&self, errors: I)
    where
        I: IntoIterator,
        I::Item: Into<Option<AnyError>>,
    {
        self.0
            .causes
            .extend(errors.into_iter().filter_map(Into::into));
    }

    /// Returns `true` if both handles refer to the same error.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// The structured export of this error.
    ///
    /// User fields are merged with the reserved keys `@message`, `@at`,
    /// `@caller`, `@stacktrace`, `@errors` and `@value`; reserved keys are
    /// only present when the corresponding data is. Wrapped errors are
    /// exported recursively, foreign ones by their message.
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        self.export().unwrap_or_else(|| {
            Map::from_iter([("@message".to_owned(), Value::String(CYCLE.to_owned()))])
        })
    }

    /// The structured export, or `None` if this error is already being
    /// exported further up the stack.
    fn export(&self) -> Option<Map<String, Value>> {
        let _guard = self.0.causes.render_guard()?;
        let inner = &*self.0;
        let mut map: Map<String, Value> = inner
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        if !inner.message.is_empty() {
            map.insert("@message".to_owned(), Value::String(inner.message.clone()));
        }
        if let Some(at) = inner.at {
            map.insert("@at".to_owned(), Value::String(at.format(RFC1123).to_string()));
        }
        match &inner.attribution {
            Attribution::None => {}
            Attribution::Caller(frame) => {
                map.insert("@caller".to_owned(), Value::String(frame.to_string()));
            }
            Attribution::Stacktrace(frames) => {
                let frames = frames.iter().map(|f| Value::String(f.to_string())).collect();
                map.insert("@stacktrace".to_owned(), Value::Array(frames));
            }
        }
        let causes = inner.causes.to_vec();
        if !causes.is_empty() {
            let causes = causes.iter().map(AnyError::to_value).collect();
            map.insert("@errors".to_owned(), Value::Array(causes));
        }
        if let Some(value) = &inner.value {
            map.insert("@value".to_owned(), Value::String(format!("{value:?}")));
        }
        Some(map)
    }

    pub(crate) fn cause_list(&self) -> &CauseList {
        &self.0.causes
    }

    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

fn write_field(f: &mut fmt::Formatter<'_>, name: &str, value: &Value) -> fmt::Result {
    match value {
        Value::String(text) => write!(f, "{name}={text}"),
        other => write!(f, "{name}={other}"),
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(_guard) = self.0.causes.render_guard() else {
            return f.write_str(CYCLE);
        };
        let inner = &*self.0;
        let mut separator = "";
        let mut section = |f: &mut fmt::Formatter<'_>| {
            let result = f.write_str(separator);
            separator = " ";
            result
        };

        if !inner.message.is_empty() {
            section(f)?;
            f.write_str(&inner.message)?;
        }
        if let Some(at) = inner.at {
            section(f)?;
            write!(f, "at={}", at.format(RFC1123))?;
        }
        if let Attribution::Caller(frame) = &inner.attribution {
            section(f)?;
            write!(f, "caller={frame}")?;
        }
        for (name, value) in &inner.fields {
            section(f)?;
            write_field(f, name, value)?;
        }
        match inner.causes.snapshot() {
            Causes::None => {}
            Causes::Single(cause) => {
                section(f)?;
                write!(f, "err={:?}", cause.to_string())?;
            }
            Causes::Many(causes) => {
                section(f)?;
                f.write_str("errs=[")?;
                for (i, cause) in causes.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{cause}")?;
                }
                f.write_str("]")?;
            }
        }
        if let Attribution::Stacktrace(frames) = &inner.attribution {
            section(f)?;
            f.write_str("stacktrace=[")?;
            for (i, frame) in frames.iter().enumerate() {
                if i > 0 {
                    f.write_str("; ")?;
                }
                write!(f, "{frame}")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(_guard) = self.0.causes.render_guard() else {
            return f.write_str(CYCLE);
        };
        let inner = &*self.0;
        f.debug_struct("Error")
            .field("message", &inner.message)
            .field("fields", &inner.fields)
            .field("at", &inner.at)
            .field("attribution", &inner.attribution)
            .field("causes", &inner.causes.snapshot())
            .field("value", &inner.value)
            .finish()
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.causes.first().map(AnyError::as_dyn)
    }
}

impl Chain for Error {
    fn causes(&self) -> Vec<AnyError> {
        self.0.causes.to_vec()
    }

    fn payload(&self) -> Option<&dyn Payload> {
        self.0.value.as_deref()
    }

    fn to_value(&self) -> Value {
        self.export()
            .map_or_else(|| Value::String(CYCLE.to_owned()), Value::Object)
    }
}

impl serde::Serialize for Error {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&self.to_map(), serializer)
    }
}
