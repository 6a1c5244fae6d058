//! Call-stack capture.
//!
//! Frames are captured with the [`backtrace`] crate and reported innermost
//! first. The leading run of frames that belong to the capture machinery
//! itself (the `backtrace` crate, `core`/`std`/`alloc` trampolines, and any
//! function of this crate) is always discarded, so a skip of `0` starts at
//! the first frame outside of `causeway`.
//!
//! A frame's crate is told by its source file, not by its symbol: a user
//! `impl Validate for String` has a symbol starting with `alloc::` but is
//! still user code.
//!
//! Frames without a symbol name or without a source file are ignored.

mod config;
mod path;

use core::fmt;

pub use self::config::FrameConfig;

/// Crates whose frames are never reported at the start of a capture.
const INTERNAL_CRATES: &[&str] = &[
    "backtrace",
    "core",
    "std",
    "alloc",
    env!("CARGO_CRATE_NAME"),
];

/// A single entry of a captured call stack.
///
/// Frames are only produced by [`capture`], [`capture_one`] and the
/// attribution functions built on them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Frame {
    function: String,
    file: String,
    line: u32,
}

impl Frame {
    /// The demangled function name, without the symbol hash.
    ///
    /// This is the identity used by the
    /// [`HelperRegistry`](crate::HelperRegistry).
    #[must_use]
    pub fn function(&self) -> &str {
        &self.function
    }

    /// The source file of the frame, as recorded in the debug information.
    #[must_use]
    pub fn file(&self) -> &str {
        &self.file
    }

    /// The source line of the frame, `0` if unknown.
    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }
}

impl fmt::Display for Frame {
    /// Formats the frame as `file#function:line`.
    ///
    /// Std and cargo registry paths are shortened unless
    /// [`FrameConfig::show_full_path`] is set.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = if FrameConfig::get().show_full_path {
            &self.file
        } else {
            path::shorten(&self.file)
        };
        if file.len() == self.file.len() {
            write!(f, "{file}#{}:{}", self.function, self.line)
        } else {
            write!(f, "[..]/{file}#{}:{}", self.function, self.line)
        }
    }
}

fn is_internal(file: &str) -> bool {
    path::file_crate(file).is_some_and(|name| INTERNAL_CRATES.contains(&name))
}

/// Visits frames outward, starting `skip` frames above the first
/// non-internal frame. The walk stops when `visit` returns `false` or after
/// `max_depth` frames.
pub(crate) fn walk(mut skip: usize, max_depth: usize, mut visit: impl FnMut(Frame) -> bool) {
    let mut initial_filtering = true;
    let mut visited = 0usize;
    let mut done = max_depth == 0;

    backtrace::trace(|raw_frame| {
        backtrace::resolve_frame(raw_frame, |symbol| {
            if done {
                return;
            }
            let (Some(name), Some(file)) = (symbol.name(), symbol.filename()) else {
                return;
            };

            let file = file.display().to_string();
            if initial_filtering {
                if is_internal(&file) {
                    return;
                }
                initial_filtering = false;
            }

            if skip > 0 {
                skip -= 1;
                return;
            }

            visited += 1;
            let frame = Frame {
                function: format!("{name:#}"),
                file,
                line: symbol.lineno().unwrap_or(0),
            };
            done = !visit(frame) || visited >= max_depth;
        });

        !done
    });
}

/// Captures the active call stack, innermost frame first.
///
/// `skip` discards that many frames in addition to the internal ones, so
/// `capture(0)` starts at the function that called into this crate. A skip
/// larger than the stack yields an empty `Vec`.
///
/// At most [`FrameConfig::max_depth`] frames are recorded.
///
/// ```
/// let stack = causeway::frame::capture(0);
/// assert!(stack.len() <= causeway::frame::FrameConfig::get().max_depth);
/// assert!(causeway::frame::capture(usize::MAX).is_empty());
/// ```
#[must_use]
pub fn capture(skip: usize) -> Vec<Frame> {
    let max_depth = FrameConfig::get().max_depth;
    let mut frames = Vec::new();
    walk(skip, max_depth, |frame| {
        frames.push(frame);
        true
    });
    if frames.len() == max_depth {
        tracing::trace!(max_depth, "stack capture reached the configured depth limit");
    }
    frames
}

/// Captures only the first frame that [`capture`] would return.
#[must_use]
pub fn capture_one(skip: usize) -> Option<Frame> {
    let mut found = None;
    walk(skip, 1, |frame| {
        found = Some(frame);
        false
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_files() {
        assert!(is_internal(
            "/home/user/.cargo/registry/src/index.crates.io-1949cf8c6b5b557f/backtrace-0.3.76/src/backtrace/libunwind.rs"
        ));
        assert!(is_internal(concat!(env!("CARGO_MANIFEST_DIR"), "/src/frame/mod.rs")));
        assert!(is_internal(
            "/rustc/0123456789abcdef0123456789abcdef01234567/library/std/src/rt.rs"
        ));
        assert!(!is_internal(
            "/home/user/.cargo/registry/src/index.crates.io-1949cf8c6b5b557f/tokio-1.47.1/src/runtime/task/mod.rs"
        ));
        assert!(!is_internal("/build/app/src/validate.rs"));
    }

    #[test]
    fn test_skip_past_stack_is_empty() {
        assert!(capture(usize::MAX).is_empty());
        assert!(capture_one(usize::MAX).is_none());
    }

    #[test]
    fn test_zero_depth_walk_visits_nothing() {
        let mut visited = 0;
        walk(0, 0, |_| {
            visited += 1;
            true
        });
        assert_eq!(visited, 0);
    }

    #[test]
    fn test_display_uses_path_and_line() {
        let frame = Frame {
            function: "app::load".to_string(),
            file: "/build/src/load.rs".to_string(),
            line: 12,
        };
        assert_eq!(frame.to_string(), "/build/src/load.rs#app::load:12");
    }
}
