// ============================================================================
// mediaprobe-core/src/stream.rs
// ============================================================================
//
// STREAM DESCRIPTORS: Typed View of One Logical Track
//
// A `StreamDescriptor` is derived once per stream while probing. It owns a
// deep copy of the stream's codec parameters and exposes the fields that
// matter for its media kind. Fields of the other kind hold fixed sentinels:
// zero for numbers, `None` for the channel layout and
// `FIELD_ORDER_NOT_APPLICABLE` for the field order.
//
// AI-ASSISTANT-INFO: Stream descriptor derivation and field order naming

// ---- External crate imports ----
use serde::Serialize;

// ---- Internal crate imports ----
use crate::engine::{DemuxEngine, NO_TIMESTAMP, RawStream};
use crate::error::ProbeResult;
use crate::params::{CodecParameters, MediaType, Rational};

// ---- Standard library imports ----
use std::fmt;

/// Field order stored for streams that are not video.
///
/// Distinct from code 0, which is a valid "unknown" order for video.
pub const FIELD_ORDER_NOT_APPLICABLE: i32 = -1;

/// Codec name used when the engine cannot name a codec.
pub const UNKNOWN_CODEC_NAME: &str = "unknown";

// ============================================================================
// FIELD ORDER
// ============================================================================

/// Video field order, numbered like FFmpeg's `AVFieldOrder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldOrder {
    Unknown,
    Progressive,
    /// Top coded first, top displayed first
    TopTop,
    /// Bottom coded first, bottom displayed first
    BottomBottom,
    /// Top coded first, bottom displayed first
    TopBottom,
    /// Bottom coded first, top displayed first
    BottomTop,
}

impl FieldOrder {
    /// Returns `None` for codes outside 0..=5, including the not-applicable sentinel.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(FieldOrder::Unknown),
            1 => Some(FieldOrder::Progressive),
            2 => Some(FieldOrder::TopTop),
            3 => Some(FieldOrder::BottomBottom),
            4 => Some(FieldOrder::TopBottom),
            5 => Some(FieldOrder::BottomTop),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            FieldOrder::Unknown => 0,
            FieldOrder::Progressive => 1,
            FieldOrder::TopTop => 2,
            FieldOrder::BottomBottom => 3,
            FieldOrder::TopBottom => 4,
            FieldOrder::BottomTop => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldOrder::Unknown => "Unknown",
            FieldOrder::Progressive => "Progressive",
            FieldOrder::TopTop => "TT (top coded first, top displayed first)",
            FieldOrder::BottomBottom => "BB (bottom coded first, bottom displayed first)",
            FieldOrder::TopBottom => "TB (top coded first, bottom displayed first)",
            FieldOrder::BottomTop => "BT (bottom coded first, top displayed first)",
        }
    }
}

impl fmt::Display for FieldOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display name for a field order code. Total over all integers: anything
/// that is not a known code, the not-applicable sentinel included, is `"N/A"`.
pub fn field_order_to_str(code: i32) -> &'static str {
    FieldOrder::from_code(code).map_or("N/A", FieldOrder::as_str)
}

// ============================================================================
// MEDIA KIND
// ============================================================================

/// Coarse classification of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
    Other,
}

impl From<MediaType> for MediaKind {
    fn from(media_type: MediaType) -> Self {
        match media_type {
            MediaType::Video => MediaKind::Video,
            MediaType::Audio => MediaKind::Audio,
            _ => MediaKind::Other,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Other => "other",
        })
    }
}

// ============================================================================
// STREAM DESCRIPTOR
// ============================================================================

/// One logical track of a probed container.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamDescriptor {
    stream_index: u32,
    /// Format-specific stream id, e.g. an MPEG-TS PID
    id: i32,
    media_kind: MediaKind,
    media_type: MediaType,
    codec_name: String,
    width: i32,
    height: i32,
    field_order: i32,
    sample_rate: i32,
    channel_count: i32,
    channel_layout: Option<String>,
    time_base: Rational,
    /// In `time_base` units, `None` when the engine reports no duration
    duration: Option<i64>,
    avg_frame_rate: Rational,
    codec_parameters: CodecParameters,
}

impl StreamDescriptor {
    /// Builds the descriptor for the stream at `index`.
    ///
    /// Fails only when copying the codec parameters runs out of memory.
    pub fn derive<E: DemuxEngine + ?Sized>(
        raw: &RawStream<'_>,
        index: u32,
        engine: &E,
    ) -> ProbeResult<Self> {
        let codec_parameters = CodecParameters::try_from_raw(&raw.codec_parameters)?;
        let props = codec_parameters.properties();
        let media_type = props.media_type;
        let media_kind = MediaKind::from(media_type);

        let codec_name = engine
            .codec_name(&props.codec_id)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNKNOWN_CODEC_NAME.to_string());

        let (width, height, field_order) = match media_kind {
            MediaKind::Video => (
                non_negative(index, "width", props.width),
                non_negative(index, "height", props.height),
                props.field_order,
            ),
            _ => (0, 0, FIELD_ORDER_NOT_APPLICABLE),
        };

        let (sample_rate, channel_count, channel_layout) = match media_kind {
            MediaKind::Audio => (
                non_negative(index, "sample_rate", props.sample_rate),
                non_negative(index, "channels", props.channels),
                props.channel_layout.clone(),
            ),
            _ => (0, 0, None),
        };

        log::debug!(
            "Stream #{}: {} {} ({})",
            index,
            media_kind,
            codec_name,
            codec_parameters.extradata().len()
        );

        Ok(Self {
            stream_index: index,
            id: raw.id,
            media_kind,
            media_type,
            codec_name,
            width,
            height,
            field_order,
            sample_rate,
            channel_count,
            channel_layout,
            time_base: raw.time_base,
            duration: (raw.duration != NO_TIMESTAMP).then_some(raw.duration),
            avg_frame_rate: raw.avg_frame_rate,
            codec_parameters,
        })
    }

    pub fn stream_index(&self) -> u32 {
        self.stream_index
    }

    pub fn media_kind(&self) -> MediaKind {
        self.media_kind
    }

    /// The engine's media type tag, finer than [`MediaKind`].
    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn codec_name(&self) -> &str {
        &self.codec_name
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Raw field order code, [`FIELD_ORDER_NOT_APPLICABLE`] for non-video streams.
    pub fn field_order(&self) -> i32 {
        self.field_order
    }

    pub fn field_order_str(&self) -> &'static str {
        field_order_to_str(self.field_order)
    }

    pub fn sample_rate(&self) -> i32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> i32 {
        self.channel_count
    }

    /// Channel layout name such as `"stereo"`. Always `None` for non-audio
    /// streams, and for audio streams whose engine reports no layout.
    pub fn channel_layout(&self) -> Option<&str> {
        self.channel_layout.as_deref()
    }

    pub fn time_base(&self) -> Rational {
        self.time_base
    }

    pub fn duration(&self) -> Option<i64> {
        self.duration
    }

    /// Stream duration in milliseconds, when both duration and time base are usable.
    pub fn duration_ms(&self) -> Option<u64> {
        let duration = self.duration?;
        if duration < 0 || self.time_base.den <= 0 || self.time_base.num <= 0 {
            return None;
        }
        let ms = i128::from(duration) * i128::from(self.time_base.num) * 1000
            / i128::from(self.time_base.den);
        u64::try_from(ms).ok()
    }

    pub fn avg_frame_rate(&self) -> Rational {
        self.avg_frame_rate
    }

    pub fn codec_parameters(&self) -> &CodecParameters {
        &self.codec_parameters
    }
}

fn non_negative(index: u32, field: &str, value: i32) -> i32 {
    if value < 0 {
        log::warn!("Stream #{}: engine reported {} {}, using 0", index, field, value);
        0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryEngine;
    use crate::params::{CodecId, RawCodecParameters};

    fn raw(params: &CodecParameters) -> RawStream<'_> {
        RawStream {
            id: 1,
            time_base: Rational::new(1, 90_000),
            duration: 900_000,
            avg_frame_rate: Rational::new(30_000, 1001),
            codec_parameters: params.as_raw(),
        }
    }

    fn engine() -> MemoryEngine {
        MemoryEngine::new()
            .with_codec_name(27, "h264")
            .with_codec_name(86018, "aac")
    }

    #[test]
    fn field_order_names_are_total() {
        assert_eq!(field_order_to_str(0), "Unknown");
        assert_eq!(field_order_to_str(1), "Progressive");
        assert!(field_order_to_str(2).starts_with("TT"));
        assert!(field_order_to_str(3).starts_with("BB"));
        assert!(field_order_to_str(4).starts_with("TB"));
        assert!(field_order_to_str(5).starts_with("BT"));
        for code in [-1, 6, 99, i32::MIN, i32::MAX] {
            assert_eq!(field_order_to_str(code), "N/A");
        }
        assert_eq!(field_order_to_str(FIELD_ORDER_NOT_APPLICABLE), "N/A");
    }

    #[test]
    fn field_order_codes_round_trip_through_the_enum() {
        for code in 0..=5 {
            assert_eq!(FieldOrder::from_code(code).map(FieldOrder::code), Some(code));
        }
    }

    #[test]
    fn video_stream_keeps_picture_fields_only() {
        let params = CodecParameters::new(MediaType::Video, CodecId::Native(27))
            .with_dimensions(1280, 720)
            .with_field_order(2)
            .with_audio(44_100, 2)
            .with_channel_layout("stereo");

        let stream = StreamDescriptor::derive(&raw(&params), 0, &engine()).unwrap();
        assert_eq!(stream.media_kind(), MediaKind::Video);
        assert_eq!(stream.codec_name(), "h264");
        assert_eq!((stream.width(), stream.height()), (1280, 720));
        assert_eq!(stream.field_order(), 2);
        assert_eq!(stream.sample_rate(), 0);
        assert_eq!(stream.channel_count(), 0);
        assert_eq!(stream.channel_layout(), None);
        assert_eq!(stream.duration_ms(), Some(10_000));
    }

    #[test]
    fn audio_stream_gets_picture_sentinels() {
        let params = CodecParameters::new(MediaType::Audio, CodecId::Native(86018))
            .with_audio(48_000, 6)
            .with_channel_layout("5.1(side)")
            .with_dimensions(1, 1);

        let stream = StreamDescriptor::derive(&raw(&params), 1, &engine()).unwrap();
        assert_eq!(stream.media_kind(), MediaKind::Audio);
        assert_eq!((stream.width(), stream.height()), (0, 0));
        assert_eq!(stream.field_order(), FIELD_ORDER_NOT_APPLICABLE);
        assert_eq!(stream.field_order_str(), "N/A");
        assert_eq!(stream.sample_rate(), 48_000);
        assert_eq!(stream.channel_count(), 6);
        assert_eq!(stream.channel_layout(), Some("5.1(side)"));
    }

    #[test]
    fn other_kinds_zero_every_typed_field() {
        let params = CodecParameters::new(MediaType::Subtitle, CodecId::Native(94213));
        let stream = StreamDescriptor::derive(&raw(&params), 2, &engine()).unwrap();

        assert_eq!(stream.media_kind(), MediaKind::Other);
        assert_eq!(stream.media_type(), MediaType::Subtitle);
        assert_eq!(stream.codec_name(), UNKNOWN_CODEC_NAME);
        assert_eq!(stream.width(), 0);
        assert_eq!(stream.sample_rate(), 0);
        assert_eq!(stream.field_order(), FIELD_ORDER_NOT_APPLICABLE);
    }

    #[test]
    fn negative_dimensions_are_clamped() {
        let params =
            CodecParameters::new(MediaType::Video, CodecId::None).with_dimensions(-16, 480);
        let stream = StreamDescriptor::derive(&raw(&params), 0, &engine()).unwrap();
        assert_eq!((stream.width(), stream.height()), (0, 480));
    }

    #[test]
    fn descriptor_outlives_the_borrowed_extradata() {
        let stream = {
            let extradata = vec![0x01, 0x42, 0xc0, 0x1e];
            let raw = RawStream {
                id: 0,
                time_base: Rational::new(1, 1000),
                duration: NO_TIMESTAMP,
                avg_frame_rate: Rational::default(),
                codec_parameters: RawCodecParameters {
                    properties: CodecParameters::new(MediaType::Video, CodecId::None)
                        .properties()
                        .clone(),
                    extradata: &extradata,
                },
            };
            StreamDescriptor::derive(&raw, 0, &engine()).unwrap()
        };
        assert_eq!(stream.codec_parameters().extradata(), &[0x01, 0x42, 0xc0, 0x1e]);
        assert_eq!(stream.duration(), None);
        assert_eq!(stream.duration_ms(), None);
    }
}
