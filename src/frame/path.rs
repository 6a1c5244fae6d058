//! Symbol and path classification for captured frames.

use std::{path::Path, sync::OnceLock};

use regex::Regex;

struct Patterns {
    /// `/lib/rustlib/src/rust/library/{std|core|alloc}/src/...` and
    /// `/rustc/{40-char-hash}/library/{std|core|alloc}/src/...`
    std_path: Regex,
    /// `/.cargo/registry/src/{index}-{16-char-hash}/{crate}-{version}/src/...`
    registry_path: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        std_path: Regex::new(
            r"(?:/lib/rustlib/src/rust|^/rustc/[0-9a-f]{40})/library/(std|core|alloc)/src/.*$",
        )
        .expect("built-in regex pattern for std library paths should be valid"),
        registry_path: Regex::new(
            r"/\.cargo/registry/src/[^/]+-[0-9a-f]{16}/([^./]+)-[0-9]+\.[^/]*/src/.*$",
        )
        .expect("built-in regex pattern for cargo registry paths should be valid"),
    })
}

/// Returns the crate a source file belongs to, if its location tells.
///
/// Std library sources report `std`, `core` or `alloc`, cargo registry
/// sources the package name, and files under this package's `src/` the
/// name of this crate. Anything else is user code and yields `None`.
pub(crate) fn file_crate(file: &str) -> Option<&str> {
    let patterns = patterns();
    if let Some(name) = patterns
        .std_path
        .captures(file)
        .or_else(|| patterns.registry_path.captures(file))
        .and_then(|captures| captures.get(1))
    {
        return Some(name.as_str());
    }
    let own_sources = Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/src"));
    Path::new(file)
        .starts_with(own_sources)
        .then_some(env!("CARGO_CRATE_NAME"))
}

/// Shortens std and cargo registry paths to `[..]/<crate>/src/...`.
///
/// Paths that match neither prefix are returned unchanged.
pub(crate) fn shorten(path: &str) -> &str {
    let patterns = patterns();
    let crate_start = patterns
        .std_path
        .captures(path)
        .or_else(|| patterns.registry_path.captures(path))
        .and_then(|captures| captures.get(1))
        .map(|m| m.start());
    match crate_start {
        Some(start) => &path[start..],
        None => path,
    }
}
