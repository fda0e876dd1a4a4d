// ============================================================================
// mediaprobe-core/src/engine/mod.rs
// ============================================================================
//
// DEMUXING ENGINES: The Collaborator That Actually Reads Containers
//
// The probe never parses container bytes itself. It talks to a demuxing engine
// through the two traits defined here: `DemuxEngine` opens a source and names
// codecs, `FormatContext` is the per-source state the engine fills in while
// detecting the format and analysing streams.
//
// KEY COMPONENTS:
// - DemuxEngine / FormatContext: the engine seam
// - RawStream: one stream's timing data plus borrowed codec parameters
// - FfprobeEngine: runs the ffprobe executable and parses its JSON report
// - MemoryEngine: serves containers described in memory
// - NativeEngine: links libavformat (feature `ffmpeg-native`)
//
// DESIGN PHILOSOPHY:
// A context is closed by dropping it. Contexts are owned exclusively by the
// probe call that opened them, so every exit path releases them.
//
// AI-ASSISTANT-INFO: Demuxing engine traits and implementations

// ---- Internal crate imports ----
use crate::error::{EngineError, EngineResult};
use crate::params::{CodecId, Rational, RawCodecParameters};

// ---- Standard library imports ----
use std::path::Path;

// ============================================================================
// SUBMODULES
// ============================================================================

/// Engine backed by the ffprobe executable
pub mod ffprobe;

/// Engine serving containers described in memory
pub mod memory;

/// Engine backed by libavformat
#[cfg(feature = "ffmpeg-native")]
pub mod native;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ffprobe::{FfprobeContext, FfprobeEngine};
pub use memory::{EngineStats, MemoryContainer, MemoryContext, MemoryEngine, MemoryStream};
#[cfg(feature = "ffmpeg-native")]
pub use native::{NativeContext, NativeEngine};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Timestamp value engines report when a time is unset (FFmpeg's `AV_NOPTS_VALUE`).
pub const NO_TIMESTAMP: i64 = i64::MIN;

/// Engine-level time base: container durations are in microseconds.
pub const TIME_BASE: i64 = 1_000_000;

// ============================================================================
// TRAITS
// ============================================================================

/// A demuxing engine able to open sources and name codecs.
pub trait DemuxEngine {
    /// Per-source state. Dropping it closes the source.
    type Context: FormatContext;

    /// Short name used in log messages.
    fn name(&self) -> &'static str;

    /// Opens `source` and detects its container format.
    fn open_format(&self, source: &Path) -> EngineResult<Self::Context>;

    /// Looks up the display name of a codec, `None` when the engine has none.
    fn codec_name(&self, codec_id: &CodecId) -> Option<String>;
}

/// State of one opened source.
pub trait FormatContext {
    /// Runs the stream discovery pass. May read ahead into the source.
    fn find_stream_info(&mut self) -> EngineResult<()>;

    /// Number of streams in the container.
    fn stream_count(&self) -> u64;

    /// Container duration in [`TIME_BASE`] units, or [`NO_TIMESTAMP`].
    fn duration(&self) -> i64;

    /// Container start time in [`TIME_BASE`] units, or [`NO_TIMESTAMP`].
    fn start_time(&self) -> i64;

    /// Total bit rate in bits per second, 0 when unknown.
    fn bit_rate(&self) -> i64;

    fn format_short_name(&self) -> Option<&str>;

    fn format_long_name(&self) -> Option<&str>;

    /// The stream at `index`, borrowing its codec parameters from the context.
    fn stream_at(&self, index: usize) -> Option<RawStream<'_>>;
}

// ============================================================================
// STREAM DATA
// ============================================================================

/// One stream as reported by an engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RawStream<'a> {
    /// Format-specific stream id (e.g. an MPEG-TS PID).
    pub id: i32,
    pub time_base: Rational,
    /// Duration in `time_base` units, or [`NO_TIMESTAMP`].
    pub duration: i64,
    pub avg_frame_rate: Rational,
    pub codec_parameters: RawCodecParameters<'a>,
}

// ============================================================================
// SOURCE IDENTIFIERS
// ============================================================================

/// Whether `source` starts with a URL scheme such as `https:`, `pipe:` or
/// `file:`. Single-letter prefixes are drive letters, not schemes.
pub(crate) fn has_url_scheme(source: &Path) -> bool {
    let Some(text) = source.to_str() else {
        return false;
    };
    let Some((scheme, _)) = text.split_once(':') else {
        return false;
    };
    scheme.len() > 1
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Rejects plain paths that do not exist. URLs and other protocol inputs are
/// left for the engine to resolve.
pub(crate) fn check_local_source(source: &Path) -> EngineResult<()> {
    if !has_url_scheme(source) && !source.exists() {
        return Err(EngineError::NotFound(source.to_path_buf()));
    }
    Ok(())
}

/// Lets several probes share one engine by reference.
impl<E: DemuxEngine + ?Sized> DemuxEngine for &E {
    type Context = E::Context;

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn open_format(&self, source: &Path) -> EngineResult<Self::Context> {
        (**self).open_format(source)
    }

    fn codec_name(&self, codec_id: &CodecId) -> Option<String> {
        (**self).codec_name(codec_id)
    }
}
