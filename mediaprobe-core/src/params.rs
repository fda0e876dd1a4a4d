//! Codec parameter types shared by the engines and the probe.
//!
//! Engines hand out [`RawCodecParameters`], which borrow their extension data
//! from the engine's own context. The probe turns them into
//! [`CodecParameters`], an owned deep copy that stays valid after the context
//! is closed.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::{ProbeError, ProbeResult};

// ============================================================================
// RATIONAL
// ============================================================================

/// A rational number as used for time bases, frame rates and aspect ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// Returns the value as a float, or `None` when the denominator is zero.
    pub fn as_f64(&self) -> Option<f64> {
        if self.den == 0 {
            None
        } else {
            Some(f64::from(self.num) / f64::from(self.den))
        }
    }

    /// Parses `"num/den"` or `"num:den"`.
    pub fn parse(text: &str) -> Option<Self> {
        let (num, den) = text.split_once(['/', ':'])?;
        Some(Self {
            num: num.trim().parse().ok()?,
            den: den.trim().parse().ok()?,
        })
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.num, self.den)
    }
}

// ============================================================================
// MEDIA TYPE
// ============================================================================

/// Media type tag reported by the engine, numbered like FFmpeg's `AVMediaType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Unknown,
    Video,
    Audio,
    Data,
    Subtitle,
    Attachment,
}

impl MediaType {
    /// Maps an `AVMediaType` code. Codes outside the known range are `Unknown`.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => MediaType::Video,
            1 => MediaType::Audio,
            2 => MediaType::Data,
            3 => MediaType::Subtitle,
            4 => MediaType::Attachment,
            _ => MediaType::Unknown,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            MediaType::Unknown => -1,
            MediaType::Video => 0,
            MediaType::Audio => 1,
            MediaType::Data => 2,
            MediaType::Subtitle => 3,
            MediaType::Attachment => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Unknown => "unknown",
            MediaType::Video => "video",
            MediaType::Audio => "audio",
            MediaType::Data => "data",
            MediaType::Subtitle => "subtitle",
            MediaType::Attachment => "attachment",
        }
    }
}

impl From<&str> for MediaType {
    fn from(s: &str) -> Self {
        match s {
            "video" => MediaType::Video,
            "audio" => MediaType::Audio,
            "data" => MediaType::Data,
            "subtitle" => MediaType::Subtitle,
            "attachment" => MediaType::Attachment,
            _ => MediaType::Unknown,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// CODEC IDENTIFIER
// ============================================================================

/// Engine-specific codec identifier.
///
/// The linked FFmpeg engine reports numeric `AVCodecID` values; the ffprobe
/// engine only sees the codec's short name. Either way the identifier is
/// turned into a display name by [`crate::DemuxEngine::codec_name`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecId {
    #[default]
    None,
    Native(u32),
    Named(String),
}

// ============================================================================
// CODEC PROPERTIES
// ============================================================================

/// Codec properties common to raw and owned parameters.
///
/// Numeric fields that do not apply to a stream's media type are zero, named
/// ones are `None`. Names follow FFmpeg's spelling (`"yuv420p"`, `"bt709"`).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CodecProperties {
    pub media_type: MediaType,
    pub codec_id: CodecId,
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub codec_tag: u32,
    #[serde(skip_serializing_if = "is_zero_i64")]
    pub bit_rate: i64,
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub bits_per_raw_sample: i32,
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub level: i32,
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub width: i32,
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub height: i32,
    pub sample_aspect_ratio: Rational,
    pub frame_rate: Rational,
    /// Raw `AVFieldOrder` code (0 = unknown).
    pub field_order: i32,
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub sample_rate: i32,
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub channels: i32,
    /// Channel layout description, e.g. `"stereo"` or `"5.1(side)"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_layout: Option<String>,
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub initial_padding: i32,
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub trailing_padding: i32,
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub seek_preroll: i32,
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub bits_per_coded_sample: i32,
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub block_align: i32,
    #[serde(skip_serializing_if = "is_zero_i32")]
    pub frame_size: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Pixel format for video, sample format for audio.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_primaries: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_transfer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_space: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chroma_location: Option<String>,
}

fn is_zero_i32(value: &i32) -> bool {
    *value == 0
}

fn is_zero_i64(value: &i64) -> bool {
    *value == 0
}

fn is_zero_u32(value: &u32) -> bool {
    *value == 0
}

// ============================================================================
// RAW (BORROWED) PARAMETERS
// ============================================================================

/// Codec parameters as reported by an engine.
///
/// The extension data borrows from the engine context, so a value of this
/// type cannot outlive the context that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCodecParameters<'a> {
    pub properties: CodecProperties,
    pub extradata: &'a [u8],
}

// ============================================================================
// OWNED PARAMETERS
// ============================================================================

/// Owned snapshot of one stream's codec parameters.
///
/// Holds its own copy of the extension data and has no reference into any
/// engine context.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CodecParameters {
    #[serde(flatten)]
    properties: CodecProperties,
    #[serde(rename = "extradata_size", serialize_with = "serialize_len")]
    extradata: Vec<u8>,
}

#[allow(clippy::ptr_arg)]
fn serialize_len<S: Serializer>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(bytes.len() as u64)
}

impl CodecParameters {
    /// Creates parameters with only the media type and codec set.
    pub fn new(media_type: MediaType, codec_id: CodecId) -> Self {
        Self {
            properties: CodecProperties {
                media_type,
                codec_id,
                ..Default::default()
            },
            extradata: Vec::new(),
        }
    }

    /// Deep-copies engine-reported parameters.
    ///
    /// The extension buffer is reserved fallibly so that an exhausted
    /// allocator surfaces as `ProbeError::Allocation` instead of aborting.
    pub fn try_from_raw(raw: &RawCodecParameters<'_>) -> ProbeResult<Self> {
        let mut extradata = Vec::new();
        extradata
            .try_reserve_exact(raw.extradata.len())
            .map_err(|_| ProbeError::Allocation {
                bytes: raw.extradata.len(),
            })?;
        extradata.extend_from_slice(raw.extradata);

        Ok(Self {
            properties: raw.properties.clone(),
            extradata,
        })
    }

    /// Borrows these parameters in the engine-facing form.
    pub fn as_raw(&self) -> RawCodecParameters<'_> {
        RawCodecParameters {
            properties: self.properties.clone(),
            extradata: &self.extradata,
        }
    }

    pub fn properties(&self) -> &CodecProperties {
        &self.properties
    }

    pub fn media_type(&self) -> MediaType {
        self.properties.media_type
    }

    pub fn codec_id(&self) -> &CodecId {
        &self.properties.codec_id
    }

    /// Decoder initialization data (e.g. an `avcC` record for H.264).
    pub fn extradata(&self) -> &[u8] {
        &self.extradata
    }

    // ---- Construction helpers ----

    pub fn with_dimensions(mut self, width: i32, height: i32) -> Self {
        self.properties.width = width;
        self.properties.height = height;
        self
    }

    pub fn with_field_order(mut self, field_order: i32) -> Self {
        self.properties.field_order = field_order;
        self
    }

    pub fn with_audio(mut self, sample_rate: i32, channels: i32) -> Self {
        self.properties.sample_rate = sample_rate;
        self.properties.channels = channels;
        self
    }

    pub fn with_frame_rate(mut self, frame_rate: Rational) -> Self {
        self.properties.frame_rate = frame_rate;
        self
    }

    pub fn with_channel_layout(mut self, layout: &str) -> Self {
        self.properties.channel_layout = Some(layout.to_string());
        self
    }

    pub fn with_profile(mut self, profile: &str) -> Self {
        self.properties.profile = Some(profile.to_string());
        self
    }

    /// Sets the pixel or sample format name.
    pub fn with_format(mut self, format: &str) -> Self {
        self.properties.format = Some(format.to_string());
        self
    }

    pub fn with_extradata(mut self, extradata: Vec<u8>) -> Self {
        self.extradata = extradata;
        self
    }
}
