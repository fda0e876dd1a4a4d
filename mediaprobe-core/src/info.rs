// ============================================================================
// mediaprobe-core/src/info.rs
// ============================================================================
//
// MEDIA INFO: The Result of Probing One Source
//
// `MediaInfo` bundles container-level metadata with the ordered stream
// descriptors. It is built in one step by the probe and never exists in a
// partially populated state. It holds no reference into any engine context,
// so it can be cloned, sent across threads and kept after the source is gone.
//
// TEARDOWN:
// `release` frees the stream descriptors (and with them every codec parameter
// copy) before the aggregate's own strings. It can be called any number of
// times and also runs on drop.
//
// AI-ASSISTANT-INFO: Media info aggregate, probe warnings and teardown

// ---- External crate imports ----
use serde::Serialize;

// ---- Internal crate imports ----
use crate::error::{ProbeError, ProbeResult};
use crate::stream::{MediaKind, StreamDescriptor};

// ---- Standard library imports ----
use std::fmt;
use std::path::Path;

/// Duration stored when the engine reports none, or an invalid one.
pub const DURATION_UNKNOWN: i64 = -1;

// ============================================================================
// WARNINGS
// ============================================================================

/// Non-fatal conditions noticed while building a [`MediaInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeWarning {
    /// A bounded string field was cut to fit its limit.
    Truncated {
        field: &'static str,
        original_len: usize,
        kept_len: usize,
    },
}

impl fmt::Display for ProbeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeWarning::Truncated {
                field,
                original_len,
                kept_len,
            } => write!(
                f,
                "{} truncated from {} to {} bytes",
                field, original_len, kept_len
            ),
        }
    }
}

// ============================================================================
// AGGREGATE
// ============================================================================

/// Container-level values gathered by the probe before the streams.
#[derive(Debug, Clone, Default)]
pub(crate) struct ContainerFields {
    pub source: String,
    pub file_size: Option<u64>,
    pub duration: i64,
    pub start_time: Option<i64>,
    pub bit_rate: i64,
    pub format_short_name: String,
    pub format_long_name: String,
    pub warnings: Vec<ProbeWarning>,
}

/// Metadata of one probed source.
///
/// `stream_count()` always equals `streams().len()`, and every descriptor's
/// `stream_index()` equals its position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaInfo {
    // Declared first so the streams drop before the strings below.
    streams: Vec<StreamDescriptor>,
    source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_size: Option<u64>,
    /// Microseconds, or [`DURATION_UNKNOWN`]
    duration: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_time: Option<i64>,
    bit_rate: i64,
    format_short_name: String,
    format_long_name: String,
    stream_count: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<ProbeWarning>,
    #[serde(skip)]
    released: bool,
}

impl MediaInfo {
    pub(crate) fn assemble(
        container: ContainerFields,
        streams: Vec<StreamDescriptor>,
    ) -> ProbeResult<Self> {
        let stream_count = u32::try_from(streams.len()).map_err(|_| ProbeError::Format {
            field: "stream_count",
            detail: format!("{} streams", streams.len()),
        })?;

        Ok(Self {
            streams,
            source: container.source,
            file_size: container.file_size,
            duration: container.duration,
            start_time: container.start_time,
            bit_rate: container.bit_rate,
            format_short_name: container.format_short_name,
            format_long_name: container.format_long_name,
            stream_count,
            warnings: container.warnings,
            released: false,
        })
    }

    /// Source identifier as given to the probe, bounded in length.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Size of the source file in bytes, when it is a regular file.
    pub fn file_size(&self) -> Option<u64> {
        self.file_size
    }

    /// Lower-cased file extension of the source, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.source)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
    }

    /// Container duration in microseconds, or [`DURATION_UNKNOWN`].
    pub fn duration(&self) -> i64 {
        self.duration
    }

    pub fn duration_ms(&self) -> Option<u64> {
        u64::try_from(self.duration).ok().map(|micros| micros / 1000)
    }

    /// Container start time in microseconds.
    pub fn start_time(&self) -> Option<i64> {
        self.start_time
    }

    /// Total bit rate in bits per second, 0 when unknown.
    pub fn bit_rate(&self) -> i64 {
        self.bit_rate
    }

    /// Comma separated short names of the detected container format.
    pub fn format_short_name(&self) -> &str {
        &self.format_short_name
    }

    pub fn format_long_name(&self) -> &str {
        &self.format_long_name
    }

    pub fn stream_count(&self) -> u32 {
        self.stream_count
    }

    pub fn streams(&self) -> &[StreamDescriptor] {
        &self.streams
    }

    pub fn stream(&self, index: usize) -> Option<&StreamDescriptor> {
        self.streams.get(index)
    }

    /// Streams of one kind, in container order.
    pub fn streams_of(&self, kind: MediaKind) -> impl Iterator<Item = &StreamDescriptor> {
        self.streams.iter().filter(move |s| s.media_kind() == kind)
    }

    pub fn warnings(&self) -> &[ProbeWarning] {
        &self.warnings
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Frees every stream descriptor, then the aggregate's own buffers.
    ///
    /// Calling it again is a no-op.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        let released_streams = self.streams.len();

        self.streams = Vec::new();
        self.stream_count = 0;

        self.source = String::new();
        self.format_short_name = String::new();
        self.format_long_name = String::new();
        self.warnings = Vec::new();
        self.file_size = None;
        self.start_time = None;
        self.duration = DURATION_UNKNOWN;
        self.bit_rate = 0;
        self.released = true;

        log::trace!("Released media info with {} streams", released_streams);
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Drop for MediaInfo {
    fn drop(&mut self) {
        self.release();
    }
}

/// Releases an aggregate that may never have been built.
///
/// `None`, or an aggregate that was already released, is left alone.
pub fn release(info: &mut Option<MediaInfo>) {
    if let Some(mut info) = info.take() {
        info.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(source: &str) -> ContainerFields {
        ContainerFields {
            source: source.to_string(),
            duration: 2_500_000,
            format_short_name: "wav".to_string(),
            format_long_name: "WAV / WAVE (Waveform Audio)".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn release_is_idempotent() {
        let mut info = MediaInfo::assemble(container("/media/tone.WAV"), Vec::new()).unwrap();
        assert_eq!(info.extension().as_deref(), Some("wav"));
        assert_eq!(info.duration_ms(), Some(2_500));

        info.release();
        assert!(info.is_released());
        assert_eq!(info.stream_count(), 0);
        assert!(info.streams().is_empty());
        assert_eq!(info.source(), "");
        assert_eq!(info.duration(), DURATION_UNKNOWN);

        info.release();
        assert!(info.is_released());
    }

    #[test]
    fn releasing_nothing_is_a_no_op() {
        let mut never_built: Option<MediaInfo> = None;
        release(&mut never_built);
        release(&mut never_built);
        assert!(never_built.is_none());

        let mut built = Some(MediaInfo::assemble(container("a.wav"), Vec::new()).unwrap());
        release(&mut built);
        assert!(built.is_none());
    }

    #[test]
    fn unknown_duration_has_no_milliseconds() {
        let fields = ContainerFields {
            duration: DURATION_UNKNOWN,
            ..container("live.ts")
        };
        let info = MediaInfo::assemble(fields, Vec::new()).unwrap();
        assert_eq!(info.duration_ms(), None);
    }

    #[test]
    fn json_omits_release_state_and_empty_warnings() {
        let info = MediaInfo::assemble(container("a.wav"), Vec::new()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&info.to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["format_short_name"], "wav");
        assert_eq!(json["stream_count"], 0);
        assert!(json.get("released").is_none());
        assert!(json.get("warnings").is_none());
    }

    #[test]
    fn truncation_warning_describes_the_cut() {
        let warning = ProbeWarning::Truncated {
            field: "format_long_name",
            original_len: 200,
            kept_len: 128,
        };
        assert_eq!(warning.to_string(), "format_long_name truncated from 200 to 128 bytes");
    }
}
