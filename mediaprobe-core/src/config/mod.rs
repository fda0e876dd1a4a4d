//! Configuration for probing.
//!
//! [`ProbeConfig`] controls how the ffprobe engine is invoked, whether codec
//! extension data is read, and the bounded lengths applied to the strings
//! stored in a [`crate::MediaInfo`].

mod builder;

use std::env;
use std::path::PathBuf;

pub use builder::ProbeConfigBuilder;

// Default constants

/// Executable used by the ffprobe engine when nothing else is configured.
pub const DEFAULT_FFPROBE_PATH: &str = "ffprobe";

/// Longest source identifier kept in an aggregate, in bytes.
pub const DEFAULT_MAX_SOURCE_LEN: usize = 512;

/// Longest format name kept in an aggregate, in bytes.
pub const DEFAULT_MAX_FORMAT_NAME_LEN: usize = 128;

/// Environment variable overriding the ffprobe executable.
pub const ENV_FFPROBE: &str = "MEDIAPROBE_FFPROBE";

/// Environment variable overriding the probe size in bytes.
pub const ENV_PROBE_SIZE: &str = "MEDIAPROBE_PROBESIZE";

/// Environment variable overriding the analysis duration in microseconds.
pub const ENV_ANALYZE_DURATION: &str = "MEDIAPROBE_ANALYZEDURATION";

/// Settings shared by the probe and the engines.
///
/// # Examples
///
/// ```rust
/// use mediaprobe_core::config::ProbeConfigBuilder;
///
/// let config = ProbeConfigBuilder::new()
///     .ffprobe_path("/opt/ffmpeg/bin/ffprobe")
///     .probe_size(10_000_000)
///     .read_extradata(false)
///     .build();
///
/// assert_eq!(config.probe_size, Some(10_000_000));
/// assert!(!config.read_extradata);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    /// ffprobe executable, looked up on `PATH` when not absolute
    pub ffprobe_path: PathBuf,

    /// Bytes the engine may read while detecting the format (`-probesize`)
    pub probe_size: Option<u64>,

    /// Microseconds of media analysed during stream discovery (`-analyzeduration`)
    pub analyze_duration: Option<u64>,

    /// Whether codec extension data is read into the parameter stores
    pub read_extradata: bool,

    /// Longest source identifier kept, in bytes
    pub max_source_len: usize,

    /// Longest container format name kept, in bytes
    pub max_format_name_len: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ffprobe_path: PathBuf::from(DEFAULT_FFPROBE_PATH),
            probe_size: None,
            analyze_duration: None,
            read_extradata: true,
            max_source_len: DEFAULT_MAX_SOURCE_LEN,
            max_format_name_len: DEFAULT_MAX_FORMAT_NAME_LEN,
        }
    }
}

impl ProbeConfig {
    /// Defaults with environment overrides applied.
    ///
    /// Numeric variables that do not parse are ignored with a warning.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup(ENV_FFPROBE).filter(|p| !p.trim().is_empty()) {
            self.ffprobe_path = PathBuf::from(path);
        }
        if let Some(value) = lookup(ENV_PROBE_SIZE) {
            self.probe_size = parse_u64_override(ENV_PROBE_SIZE, &value).or(self.probe_size);
        }
        if let Some(value) = lookup(ENV_ANALYZE_DURATION) {
            self.analyze_duration =
                parse_u64_override(ENV_ANALYZE_DURATION, &value).or(self.analyze_duration);
        }
        self
    }
}

fn parse_u64_override(key: &str, value: &str) -> Option<u64> {
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            log::warn!("Ignoring {}={:?}: {}", key, value, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_documented_limits() {
        let config = ProbeConfig::default();
        assert_eq!(config.ffprobe_path, PathBuf::from("ffprobe"));
        assert_eq!(config.max_source_len, 512);
        assert_eq!(config.max_format_name_len, 128);
        assert!(config.read_extradata);
        assert_eq!(config.probe_size, None);
    }

    #[test]
    fn environment_overrides_apply_on_top_of_defaults() {
        let config = ProbeConfig::default().with_overrides(lookup(&[
            (ENV_FFPROBE, "/usr/local/bin/ffprobe"),
            (ENV_PROBE_SIZE, "5000000"),
            (ENV_ANALYZE_DURATION, " 2000000 "),
        ]));
        assert_eq!(config.ffprobe_path, PathBuf::from("/usr/local/bin/ffprobe"));
        assert_eq!(config.probe_size, Some(5_000_000));
        assert_eq!(config.analyze_duration, Some(2_000_000));
    }

    #[test]
    fn malformed_overrides_are_ignored() {
        let config = ProbeConfig::default()
            .with_overrides(lookup(&[(ENV_FFPROBE, "  "), (ENV_PROBE_SIZE, "lots")]));
        assert_eq!(config, ProbeConfig::default());
    }
}
