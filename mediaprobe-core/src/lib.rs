//! Container probing: identify a media file's container format, enumerate its
//! streams and extract typed codec parameters without decoding any payload.
//!
//! The actual demultiplexing is done by a [`DemuxEngine`]. This crate ships
//! an engine that runs the `ffprobe` executable, an in-memory engine, and with
//! the `ffmpeg-native` feature an engine that links libavformat.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use mediaprobe_core::{ContainerProbe, MediaKind, ProbeConfig, field_order_to_str};
//!
//! let probe = ContainerProbe::ffprobe(ProbeConfig::from_env());
//! let info = probe.probe("/path/to/movie.mkv").unwrap();
//!
//! println!("{} ({})", info.format_long_name(), info.stream_count());
//! for stream in info.streams_of(MediaKind::Video) {
//!     println!(
//!         "#{} {} {}x{} {}",
//!         stream.stream_index(),
//!         stream.codec_name(),
//!         stream.width(),
//!         stream.height(),
//!         field_order_to_str(stream.field_order()),
//!     );
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod info;
pub mod params;
pub mod probe;
pub mod stream;
pub mod utils;

// Re-exports for public API
pub use config::{ProbeConfig, ProbeConfigBuilder};
pub use engine::{DemuxEngine, FfprobeEngine, FormatContext, MemoryEngine, RawStream};
#[cfg(feature = "ffmpeg-native")]
pub use engine::NativeEngine;
pub use error::{EngineError, EngineResult, ProbeError, ProbeResult};
pub use info::{DURATION_UNKNOWN, MediaInfo, ProbeWarning, release};
pub use params::{CodecId, CodecParameters, CodecProperties, MediaType, Rational, RawCodecParameters};
pub use probe::{ContainerHandle, ContainerProbe, ProbeSession};
pub use stream::{
    FIELD_ORDER_NOT_APPLICABLE, FieldOrder, MediaKind, StreamDescriptor, UNKNOWN_CODEC_NAME,
    field_order_to_str,
};
pub use utils::{format_bit_rate, format_bytes, format_duration_ms};
