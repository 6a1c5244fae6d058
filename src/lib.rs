#![forbid(unsafe_code)]
#![deny(
    missing_docs,
    clippy::as_ptr_cast_mut,
    clippy::ptr_as_ptr,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Structured errors with fields, causes, payloads and call-site
//! attribution.
//!
//! ## Overview
//!
//! An [`Error`] is more than a message. It records when it was raised,
//! which function raised it, arbitrary key/value fields, an optional typed
//! payload, and any number of wrapped causes. Errors are assembled from a
//! list of options, so one call path can build anything from a bare message
//! to a fully attributed error:
//!
//! ```
//! use causeway::{AnyError, opt};
//!
//! fn load(path: &str) -> Result<Vec<u8>, causeway::Error> {
//!     std::fs::read(path).map_err(|io| {
//!         causeway::new_wm(io, "cannot load asset", [
//!             opt::field("path", path),
//!             opt::value(404u16),
//!             opt::caller(),
//!         ])
//!     })
//! }
//!
//! let error = load("/nonexistent/sprite.png").unwrap_err();
//! assert_eq!(error.message(), "cannot load asset");
//! assert_eq!(error.field("path"), Some(&serde_json::json!("/nonexistent/sprite.png")));
//!
//! let error = AnyError::from(error);
//! assert_eq!(causeway::unwrap_value::<u16>(&error), Some(404));
//! assert!(causeway::is::<causeway::Error>(&error));
//! ```
//!
//! ## Building errors
//!
//! [`new`] applies [`ErrorOption`]s, in order, to an empty configuration and
//! returns `None` when no options were given at all. [`new_m`], [`new_w`],
//! [`new_wm`] and [`new_f`] cover the common shapes, and a [`Builder`]
//! allows swapping in a private [`HelperRegistry`]. For ad-hoc errors the
//! [`error!`] and [`bail!`] macros accept a format string.
//!
//! ## Attribution
//!
//! [`opt::caller`] records the frame that raised the error and
//! [`opt::stacktrace`] records the whole stack. Functions that only build
//! errors on behalf of others call [`mark_helper`] and are skipped, as are
//! the frames of this crate. Capture limits are read from the environment,
//! see [`frame::FrameConfig`].
//!
//! ## Combining and inspecting
//!
//! [`combine`] and [`append_into`] merge independent errors into an
//! [`Aggregate`]. [`AnyError`] stores any error, and [`is`], [`downcast`],
//! [`unwrap_many`], [`unwrap_value`] and [`walk`] query it. Note that [`is`]
//! and [`downcast`] only ever look at the outermost error.
//!
//! ## Output
//!
//! `Display` renders a single line:
//!
//! ```
//! use causeway::opt;
//!
//! let inner = causeway::new_m("timeout", [opt::no_timestamp()]);
//! let error = causeway::new_wm(inner, "sync failed", [
//!     opt::field("peer", "10.0.0.7"),
//!     opt::field("retries", 3),
//!     opt::no_timestamp(),
//! ]);
//! assert_eq!(error.to_string(), r#"sync failed peer=10.0.0.7 retries=3 err="timeout""#);
//! ```
//!
//! [`Error::to_map`] and the [`serde::Serialize`] implementations produce
//! the structured form, with reserved `@message`, `@at`, `@caller`,
//! `@stacktrace`, `@errors` and `@value` keys next to the user fields.
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events at `debug` and `trace` level for
//! helper registration, truncated captures and malformed configuration. It
//! never installs a subscriber.

#[macro_use]
mod macros;

pub mod frame;

mod aggregate;
mod any_error;
mod builder;
mod caller;
mod causes;
mod error;
mod helpers;
mod inspect;
mod iterator_ext;
mod lock;
mod result_ext;

pub use self::{
    aggregate::{Aggregate, append_fn, append_into, combine},
    any_error::{AnyError, Chain, Payload},
    builder::{Builder, ErrorOption, new, new_f, new_m, new_w, new_wm, opt},
    caller::{resolve_caller, resolve_stack},
    causes::Causes,
    error::{Attribution, Error, Fields},
    helpers::{HelperRegistry, mark_helper},
    inspect::{Walk, downcast, is, unwrap, unwrap_many, unwrap_value, walk},
    iterator_ext::IteratorExt,
    result_ext::ResultExt,
};

// Not public API. Referenced by macro-generated code.
#[doc(hidden)]
pub mod __private {
    use std::fmt;

    #[doc(hidden)]
    pub use core::{format_args, result::Result::Err};

    use crate::Error;

    #[doc(hidden)]
    #[inline]
    #[cold]
    #[must_use]
    pub fn format_error(args: fmt::Arguments<'_>) -> Error {
        match args.as_str() {
            Some(message) => crate::new_m(message, []),
            None => crate::new_m(fmt::format(args), []),
        }
    }
}
