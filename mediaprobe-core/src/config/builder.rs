// ============================================================================
// mediaprobe-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for ProbeConfig
//
// Fluent construction of ProbeConfig. Every setting has a default, so
// `ProbeConfigBuilder::new().build()` equals `ProbeConfig::default()`.
//
// AI-ASSISTANT-INFO: Builder pattern implementation for ProbeConfig

// ---- Standard library imports ----
use std::path::PathBuf;

// ---- Internal crate imports ----
use super::ProbeConfig;

/// Builder for [`ProbeConfig`].
#[derive(Debug, Clone, Default)]
pub struct ProbeConfigBuilder {
    config: ProbeConfig,
}

impl ProbeConfigBuilder {
    /// Creates a builder holding the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration, e.g. [`ProbeConfig::from_env`].
    pub fn from_config(config: ProbeConfig) -> Self {
        Self { config }
    }

    /// Sets the ffprobe executable.
    ///
    /// # Arguments
    ///
    /// * `path` - Absolute path, or a name resolved through `PATH`
    pub fn ffprobe_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ffprobe_path = path.into();
        self
    }

    /// Limits how many bytes are read while detecting the container format.
    pub fn probe_size(mut self, bytes: u64) -> Self {
        self.config.probe_size = Some(bytes);
        self
    }

    /// Limits how much media (in microseconds) the stream discovery pass analyses.
    pub fn analyze_duration(mut self, micros: u64) -> Self {
        self.config.analyze_duration = Some(micros);
        self
    }

    pub fn read_extradata(mut self, read: bool) -> Self {
        self.config.read_extradata = read;
        self
    }

    /// Sets the bounded length of the stored source identifier.
    ///
    /// A limit of 0 is raised to 1 so that at least one byte can be kept.
    pub fn max_source_len(mut self, bytes: usize) -> Self {
        self.config.max_source_len = bytes.max(1);
        self
    }

    /// Sets the bounded length of the stored format names.
    pub fn max_format_name_len(mut self, bytes: usize) -> Self {
        self.config.max_format_name_len = bytes.max(1);
        self
    }

    pub fn build(self) -> ProbeConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_builder_yields_defaults() {
        assert_eq!(ProbeConfigBuilder::new().build(), ProbeConfig::default());
    }

    #[test]
    fn setters_override_individual_fields() {
        let config = ProbeConfigBuilder::new()
            .ffprobe_path("/opt/ffmpeg/bin/ffprobe")
            .analyze_duration(1_500_000)
            .max_source_len(0)
            .max_format_name_len(16)
            .build();

        assert_eq!(config.ffprobe_path, PathBuf::from("/opt/ffmpeg/bin/ffprobe"));
        assert_eq!(config.analyze_duration, Some(1_500_000));
        assert_eq!(config.max_source_len, 1);
        assert_eq!(config.max_format_name_len, 16);
        assert!(config.read_extradata);
    }
}
