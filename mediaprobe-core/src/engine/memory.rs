//! In-memory demuxing engine.
//!
//! Serves containers that were described in Rust instead of read from disk.
//! Useful for synthesising inputs and for checking that callers release every
//! context they open: [`EngineStats`] counts opened and closed contexts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::engine::{DemuxEngine, FormatContext, NO_TIMESTAMP, RawStream};
use crate::error::{EngineError, EngineResult};
use crate::params::{CodecId, CodecParameters, Rational};

// ============================================================================
// STATISTICS
// ============================================================================

/// Counts contexts opened and closed by a [`MemoryEngine`].
#[derive(Debug, Default)]
pub struct EngineStats {
    opened: AtomicUsize,
    closed: AtomicUsize,
}

impl EngineStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Contexts that were opened and not yet dropped.
    pub fn live(&self) -> usize {
        self.opened().saturating_sub(self.closed())
    }
}

// ============================================================================
// CONTAINER DESCRIPTIONS
// ============================================================================

/// One stream of a [`MemoryContainer`].
#[derive(Debug, Clone)]
pub struct MemoryStream {
    pub id: i32,
    pub time_base: Rational,
    pub duration: i64,
    pub avg_frame_rate: Rational,
    pub parameters: CodecParameters,
}

impl MemoryStream {
    pub fn new(parameters: CodecParameters) -> Self {
        Self {
            id: 0,
            time_base: Rational::new(1, 1000),
            duration: NO_TIMESTAMP,
            avg_frame_rate: Rational::new(0, 1),
            parameters,
        }
    }

    pub fn with_id(mut self, id: i32) -> Self {
        self.id = id;
        self
    }

    pub fn with_timing(mut self, time_base: Rational, duration: i64) -> Self {
        self.time_base = time_base;
        self.duration = duration;
        self
    }
}

/// A container served by [`MemoryEngine`].
#[derive(Debug, Clone)]
pub struct MemoryContainer {
    pub format_short_name: Option<String>,
    pub format_long_name: Option<String>,
    pub duration: i64,
    pub start_time: i64,
    pub bit_rate: i64,
    pub streams: Vec<MemoryStream>,
    /// Stream count to report instead of `streams.len()`.
    pub reported_stream_count: Option<u64>,
    /// When set, `find_stream_info` fails with this message.
    pub stream_info_failure: Option<String>,
    /// When set, `open_format` rejects the container as unrecognized.
    pub unrecognized: bool,
}

impl MemoryContainer {
    pub fn new(short_name: &str, long_name: &str) -> Self {
        Self {
            format_short_name: Some(short_name.to_string()),
            format_long_name: Some(long_name.to_string()),
            duration: NO_TIMESTAMP,
            start_time: NO_TIMESTAMP,
            bit_rate: 0,
            streams: Vec::new(),
            reported_stream_count: None,
            stream_info_failure: None,
            unrecognized: false,
        }
    }

    /// A source whose bytes match no known container.
    pub fn unrecognized() -> Self {
        Self {
            format_short_name: None,
            format_long_name: None,
            unrecognized: true,
            ..Self::new("", "")
        }
    }

    pub fn with_stream(mut self, stream: MemoryStream) -> Self {
        self.streams.push(stream);
        self
    }

    pub fn with_duration(mut self, duration: i64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_start_time(mut self, start_time: i64) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn with_bit_rate(mut self, bit_rate: i64) -> Self {
        self.bit_rate = bit_rate;
        self
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// Demuxing engine over a fixed set of in-memory containers keyed by path.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    containers: HashMap<PathBuf, Arc<MemoryContainer>>,
    codec_names: HashMap<u32, String>,
    stats: Arc<EngineStats>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_container(mut self, path: impl Into<PathBuf>, container: MemoryContainer) -> Self {
        self.containers.insert(path.into(), Arc::new(container));
        self
    }

    /// Registers a display name for a numeric codec id.
    pub fn with_codec_name(mut self, codec_id: u32, name: &str) -> Self {
        self.codec_names.insert(codec_id, name.to_string());
        self
    }

    pub fn stats(&self) -> Arc<EngineStats> {
        Arc::clone(&self.stats)
    }
}

impl DemuxEngine for MemoryEngine {
    type Context = MemoryContext;

    fn name(&self) -> &'static str {
        "memory"
    }

    fn open_format(&self, source: &Path) -> EngineResult<MemoryContext> {
        let container = self
            .containers
            .get(source)
            .ok_or_else(|| EngineError::NotFound(source.to_path_buf()))?;

        if container.unrecognized {
            return Err(EngineError::UnrecognizedFormat(format!(
                "{} matched no known container",
                source.display()
            )));
        }

        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryContext {
            container: Arc::clone(container),
            analysed: false,
            stats: Arc::clone(&self.stats),
        })
    }

    fn codec_name(&self, codec_id: &CodecId) -> Option<String> {
        match codec_id {
            CodecId::Native(id) => self.codec_names.get(id).cloned(),
            CodecId::Named(name) if !name.is_empty() => Some(name.clone()),
            _ => None,
        }
    }
}

// ============================================================================
// CONTEXT
// ============================================================================

/// An opened [`MemoryContainer`].
#[derive(Debug)]
pub struct MemoryContext {
    container: Arc<MemoryContainer>,
    analysed: bool,
    stats: Arc<EngineStats>,
}

impl MemoryContext {
    pub fn is_analysed(&self) -> bool {
        self.analysed
    }
}

impl FormatContext for MemoryContext {
    fn find_stream_info(&mut self) -> EngineResult<()> {
        if let Some(message) = &self.container.stream_info_failure {
            return Err(EngineError::Analysis(message.clone()));
        }
        self.analysed = true;
        Ok(())
    }

    fn stream_count(&self) -> u64 {
        self.container
            .reported_stream_count
            .unwrap_or(self.container.streams.len() as u64)
    }

    fn duration(&self) -> i64 {
        self.container.duration
    }

    fn start_time(&self) -> i64 {
        self.container.start_time
    }

    fn bit_rate(&self) -> i64 {
        self.container.bit_rate
    }

    fn format_short_name(&self) -> Option<&str> {
        self.container.format_short_name.as_deref()
    }

    fn format_long_name(&self) -> Option<&str> {
        self.container.format_long_name.as_deref()
    }

    fn stream_at(&self, index: usize) -> Option<RawStream<'_>> {
        self.container.streams.get(index).map(|stream| RawStream {
            id: stream.id,
            time_base: stream.time_base,
            duration: stream.duration,
            avg_frame_rate: stream.avg_frame_rate,
            codec_parameters: stream.parameters.as_raw(),
        })
    }
}

impl Drop for MemoryContext {
    fn drop(&mut self) {
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::MediaType;

    fn engine() -> MemoryEngine {
        MemoryEngine::new()
            .with_container(
                "/media/clip.mkv",
                MemoryContainer::new("matroska,webm", "Matroska / WebM").with_stream(
                    MemoryStream::new(
                        CodecParameters::new(MediaType::Video, CodecId::Native(27))
                            .with_dimensions(640, 360),
                    ),
                ),
            )
            .with_container("/media/noise.bin", MemoryContainer::unrecognized())
            .with_codec_name(27, "h264")
    }

    #[test]
    fn dropping_a_context_counts_as_closed() {
        let engine = engine();
        let stats = engine.stats();

        let context = engine.open_format(Path::new("/media/clip.mkv")).unwrap();
        assert_eq!(stats.live(), 1);
        drop(context);

        assert_eq!(stats.opened(), 1);
        assert_eq!(stats.closed(), 1);
        assert_eq!(stats.live(), 0);
    }

    #[test]
    fn unknown_and_unrecognized_sources_open_nothing() {
        let engine = engine();

        let missing = engine.open_format(Path::new("/media/absent.mkv"));
        assert!(matches!(missing, Err(EngineError::NotFound(_))));

        let noise = engine.open_format(Path::new("/media/noise.bin"));
        assert!(matches!(noise, Err(EngineError::UnrecognizedFormat(_))));

        assert_eq!(engine.stats().opened(), 0);
    }

    #[test]
    fn codec_names_resolve_by_id() {
        let engine = engine();
        assert_eq!(engine.codec_name(&CodecId::Native(27)).as_deref(), Some("h264"));
        assert_eq!(engine.codec_name(&CodecId::Native(28)), None);
        assert_eq!(engine.codec_name(&CodecId::Named("opus".into())).as_deref(), Some("opus"));
        assert_eq!(engine.codec_name(&CodecId::None), None);
    }

    #[test]
    fn stream_at_borrows_the_stored_parameters() {
        let engine = engine();
        let mut context = engine.open_format(Path::new("/media/clip.mkv")).unwrap();
        context.find_stream_info().unwrap();
        assert!(context.is_analysed());

        let stream = context.stream_at(0).unwrap();
        assert_eq!(stream.codec_parameters.properties.width, 640);
        assert!(context.stream_at(1).is_none());
        assert_eq!(context.stream_count(), 1);
    }
}
