use std::sync::OnceLock;

/// Limits and formatting options for frame capture.
///
/// The process-wide value is read once from the environment, see
/// [`FrameConfig::get`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameConfig {
    /// Maximum number of frames recorded by a single capture.
    pub max_depth: usize,
    /// Whether frames are displayed with their full source path.
    pub show_full_path: bool,
}

impl FrameConfig {
    /// Default configuration: 50 frames, shortened paths.
    pub const DEFAULT: Self = Self {
        max_depth: 50,
        show_full_path: false,
    };

    /// Returns the process-wide configuration.
    ///
    /// # Environment Variables
    ///
    /// - `RUST_BACKTRACE=full` - Unlimited depth and full paths
    /// - `CAUSEWAY_BACKTRACE` - Comma-separated options:
    ///   - `full_paths` - Show full file paths
    ///   - `depth=<n>` - Record at most `n` frames per capture
    pub fn get() -> &'static Self {
        static FRAME_CONFIG: OnceLock<FrameConfig> = OnceLock::new();

        FRAME_CONFIG.get_or_init(|| {
            let rust_backtrace = std::env::var("RUST_BACKTRACE").ok();
            let causeway_backtrace = std::env::var("CAUSEWAY_BACKTRACE").ok();
            Self::from_vars(rust_backtrace.as_deref(), causeway_backtrace.as_deref())
        })
    }

    fn from_vars(rust_backtrace: Option<&str>, causeway_backtrace: Option<&str>) -> Self {
        let mut config = if rust_backtrace == Some("full") {
            Self {
                max_depth: usize::MAX,
                show_full_path: true,
            }
        } else {
            Self::DEFAULT
        };

        for option in causeway_backtrace.into_iter().flat_map(|v| v.split(',')) {
            let option = option.trim();
            if option.eq_ignore_ascii_case("full_paths") {
                config.show_full_path = true;
            } else if let Some(depth) = option.strip_prefix("depth=") {
                match depth.parse() {
                    Ok(depth) => config.max_depth = depth,
                    Err(error) => {
                        tracing::debug!(%error, depth, "ignoring malformed CAUSEWAY_BACKTRACE depth")
                    }
                }
            } else if !option.is_empty() {
                tracing::debug!(option, "ignoring unknown CAUSEWAY_BACKTRACE option");
            }
        }

        config
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
