// ============================================================================
// mediaprobe-core/src/probe/mod.rs
// ============================================================================
//
// CONTAINER PROBE: Opening Sources and Building MediaInfo
//
// The probe drives a demuxing engine through one source: open and detect the
// format, run stream discovery, read container-level values, derive one
// descriptor per stream, then close the source. The result is either a fully
// populated `MediaInfo` or an error, never anything in between.
//
// RESOURCE HANDLING:
// The engine context lives inside a `ContainerHandle` that is owned by the
// probe call. Every early return drops the handle, which closes the context,
// so no failure path leaks it. The descriptors copy everything they need
// before the handle goes away.
//
// AI-ASSISTANT-INFO: Container probe, handle ownership and bounded fields

// ---- External crate imports ----
use rayon::prelude::*;

// ---- Internal crate imports ----
use crate::config::ProbeConfig;
use crate::engine::{DemuxEngine, FfprobeEngine, FormatContext, NO_TIMESTAMP};
use crate::error::{ProbeError, ProbeResult};
use crate::info::{ContainerFields, DURATION_UNKNOWN, MediaInfo, ProbeWarning};
use crate::stream::StreamDescriptor;

// ---- Standard library imports ----
use std::fs;
use std::mem;
use std::path::{Path, PathBuf};

mod session;

pub use session::ProbeSession;

// ============================================================================
// CONTAINER HANDLE
// ============================================================================

/// An opened and analysed source. Dropping it closes the engine context.
#[derive(Debug)]
pub struct ContainerHandle<C: FormatContext> {
    context: C,
    source: PathBuf,
    engine: &'static str,
}

impl<C: FormatContext> ContainerHandle<C> {
    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl<C: FormatContext> Drop for ContainerHandle<C> {
    fn drop(&mut self) {
        log::debug!("Closing {} ({})", self.source.display(), self.engine);
    }
}

// ============================================================================
// CONTAINER PROBE
// ============================================================================

/// Probes sources through a [`DemuxEngine`].
///
/// # Examples
///
/// ```rust
/// use mediaprobe_core::{CodecId, CodecParameters, ContainerProbe, MediaKind, MediaType};
/// use mediaprobe_core::engine::{MemoryContainer, MemoryEngine, MemoryStream};
///
/// let engine = MemoryEngine::new().with_container(
///     "/media/clip.mkv",
///     MemoryContainer::new("matroska,webm", "Matroska / WebM").with_stream(MemoryStream::new(
///         CodecParameters::new(MediaType::Video, CodecId::Named("vp9".into()))
///             .with_dimensions(1280, 720),
///     )),
/// );
///
/// let info = ContainerProbe::new(engine).probe("/media/clip.mkv").unwrap();
/// assert_eq!(info.stream_count(), 1);
/// assert_eq!(info.streams()[0].media_kind(), MediaKind::Video);
/// assert_eq!(info.streams()[0].codec_name(), "vp9");
/// ```
#[derive(Debug, Clone)]
pub struct ContainerProbe<E: DemuxEngine> {
    engine: E,
    config: ProbeConfig,
}

impl ContainerProbe<FfprobeEngine> {
    /// Probe backed by the ffprobe executable named in `config`.
    pub fn ffprobe(config: ProbeConfig) -> Self {
        Self::with_config(FfprobeEngine::from_config(&config), config)
    }
}

impl<E: DemuxEngine> ContainerProbe<E> {
    pub fn new(engine: E) -> Self {
        Self::with_config(engine, ProbeConfig::default())
    }

    pub fn with_config(engine: E, config: ProbeConfig) -> Self {
        Self { engine, config }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Opens `source` and runs the engine's stream discovery pass.
    ///
    /// # Errors
    ///
    /// * `ProbeError::Open` - the source is missing, unreadable or not a known container
    /// * `ProbeError::StreamInfo` - stream discovery failed; the context is closed first
    pub fn open(&self, source: impl AsRef<Path>) -> ProbeResult<ContainerHandle<E::Context>> {
        let source = source.as_ref();
        log::debug!("Opening {} with {}", source.display(), self.engine.name());

        let context = self
            .engine
            .open_format(source)
            .map_err(|e| ProbeError::Open {
                path: source.to_path_buf(),
                source: e,
            })?;

        let mut handle = ContainerHandle {
            context,
            source: source.to_path_buf(),
            engine: self.engine.name(),
        };

        // On failure the handle is dropped here and the context closed.
        handle
            .context
            .find_stream_info()
            .map_err(|e| ProbeError::StreamInfo {
                path: source.to_path_buf(),
                source: e,
            })?;

        Ok(handle)
    }

    /// Probes `source` into a self-contained [`MediaInfo`].
    pub fn probe(&self, source: impl AsRef<Path>) -> ProbeResult<MediaInfo> {
        let handle = self.open(source)?;
        let result = self.extract(&handle);
        drop(handle);

        let info = result?;
        log::info!(
            "Probed {}: {} ({} streams)",
            info.source(),
            info.format_short_name(),
            info.stream_count()
        );
        Ok(info)
    }

    fn extract(&self, handle: &ContainerHandle<E::Context>) -> ProbeResult<MediaInfo> {
        let context = handle.context();

        let reported = context.stream_count();
        let stream_count = u32::try_from(reported).map_err(|_| ProbeError::Format {
            field: "stream_count",
            detail: format!("engine reported {} streams", reported),
        })?;

        let mut warnings = Vec::new();
        let source = bounded(
            "source",
            &handle.source().to_string_lossy(),
            self.config.max_source_len,
            &mut warnings,
        );
        let format_short_name = bounded(
            "format_short_name",
            context.format_short_name().unwrap_or(""),
            self.config.max_format_name_len,
            &mut warnings,
        );
        let format_long_name = bounded(
            "format_long_name",
            context.format_long_name().unwrap_or(""),
            self.config.max_format_name_len,
            &mut warnings,
        );

        let duration = match context.duration() {
            NO_TIMESTAMP => DURATION_UNKNOWN,
            d if d < 0 => DURATION_UNKNOWN,
            d => d,
        };
        let start_time = Some(context.start_time()).filter(|&t| t != NO_TIMESTAMP);

        let mut streams = Vec::new();
        streams
            .try_reserve_exact(stream_count as usize)
            .map_err(|_| ProbeError::Allocation {
                bytes: (stream_count as usize).saturating_mul(mem::size_of::<StreamDescriptor>()),
            })?;

        for index in 0..stream_count {
            let raw = context
                .stream_at(index as usize)
                .ok_or_else(|| ProbeError::Format {
                    field: "streams",
                    detail: format!("stream {} of {} is missing", index, stream_count),
                })?;
            streams.push(StreamDescriptor::derive(&raw, index, &self.engine)?);
        }

        let fields = ContainerFields {
            source,
            file_size: fs::metadata(handle.source())
                .ok()
                .filter(|meta| meta.is_file())
                .map(|meta| meta.len()),
            duration,
            start_time,
            bit_rate: context.bit_rate().max(0),
            format_short_name,
            format_long_name,
            warnings,
        };

        MediaInfo::assemble(fields, streams)
    }
}

impl<E: DemuxEngine + Sync> ContainerProbe<E> {
    /// Probes several sources in parallel. Results keep the order of `sources`.
    pub fn probe_all<P: AsRef<Path> + Sync>(&self, sources: &[P]) -> Vec<ProbeResult<MediaInfo>> {
        sources
            .par_iter()
            .map(|source| self.probe(source))
            .collect()
    }
}

/// Copies `value`, cutting it to at most `limit` bytes on a char boundary.
fn bounded(
    field: &'static str,
    value: &str,
    limit: usize,
    warnings: &mut Vec<ProbeWarning>,
) -> String {
    if value.len() <= limit {
        return value.to_string();
    }

    let mut end = limit;
    while !value.is_char_boundary(end) {
        end -= 1;
    }

    log::warn!(
        "{} is {} bytes long, keeping the first {}",
        field,
        value.len(),
        end
    );
    warnings.push(ProbeWarning::Truncated {
        field,
        original_len: value.len(),
        kept_len: end,
    });
    value[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_keeps_short_values() {
        let mut warnings = Vec::new();
        assert_eq!(bounded("source", "clip.mkv", 512, &mut warnings), "clip.mkv");
        assert!(warnings.is_empty());
    }

    #[test]
    fn bounded_cuts_on_a_char_boundary() {
        let mut warnings = Vec::new();
        // A 3-byte limit falls inside the second two-byte "é".
        let kept = bounded("format_long_name", "ééé", 3, &mut warnings);
        assert_eq!(kept, "é");
        assert_eq!(
            warnings,
            vec![ProbeWarning::Truncated {
                field: "format_long_name",
                original_len: 6,
                kept_len: 2,
            }]
        );
    }
}
