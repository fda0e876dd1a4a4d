// ============================================================================
// mediaprobe-core/src/engine/ffprobe.rs
// ============================================================================
//
// FFPROBE ENGINE: Demuxing Through the ffprobe Executable
//
// Runs `ffprobe -print_format json -show_format -show_streams` once per source
// and serves the report through the `FormatContext` trait. The format section
// answers `open_format`; the stream section is converted into typed codec
// parameters by `find_stream_info`, which is also where malformed stream data
// is reported.
//
// Extension data is requested with `-show_data` and arrives as a hexdump,
// one 16-byte row per line:
//
//   00000000: 0164 0028 ffe1 0004 6764 0028 0100 0468  .d.(....gd.(...h
//
// AI-ASSISTANT-INFO: ffprobe-backed demuxing engine and report parsing

// ---- External crate imports ----
use serde::Deserialize;

// ---- Internal crate imports ----
use crate::config::ProbeConfig;
use crate::engine::{
    DemuxEngine, FormatContext, NO_TIMESTAMP, RawStream, TIME_BASE, check_local_source,
};
use crate::error::{EngineError, EngineResult, process_failed_error};
use crate::params::{CodecId, CodecProperties, MediaType, Rational, RawCodecParameters};

// ---- Standard library imports ----
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Width of the hex column in an ffprobe data dump, including the trailing
/// separator space. The ASCII rendering starts right after it.
const HEXDUMP_HEX_WIDTH: usize = 41;

/// ffprobe's diagnostic for an input it could not find (`ENOENT`).
const NO_SUCH_FILE: &str = "No such file or directory";

// ============================================================================
// REPORT STRUCTURES
// ============================================================================

#[derive(Debug, Deserialize)]
struct FfprobeReport {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FfprobeFormat {
    nb_streams: Option<u64>,
    format_name: Option<String>,
    format_long_name: Option<String>,
    start_time: Option<String>,
    duration: Option<String>,
    bit_rate: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FfprobeStream {
    index: u64,
    id: Option<String>,
    codec_name: Option<String>,
    codec_type: Option<String>,
    codec_tag: Option<String>,
    width: Option<i64>,
    height: Option<i64>,
    sample_aspect_ratio: Option<String>,
    field_order: Option<String>,
    level: Option<i64>,
    bits_per_raw_sample: Option<String>,
    sample_rate: Option<String>,
    channels: Option<i64>,
    channel_layout: Option<String>,
    bits_per_sample: Option<i64>,
    initial_padding: Option<i64>,
    profile: Option<String>,
    pix_fmt: Option<String>,
    sample_fmt: Option<String>,
    color_range: Option<String>,
    color_space: Option<String>,
    color_transfer: Option<String>,
    color_primaries: Option<String>,
    chroma_location: Option<String>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    time_base: Option<String>,
    duration_ts: Option<i64>,
    bit_rate: Option<String>,
    extradata: Option<String>,
    extradata_size: Option<u64>,
}

/// A stream after `find_stream_info` converted it.
#[derive(Debug, Clone)]
struct ParsedStream {
    id: i32,
    time_base: Rational,
    duration: i64,
    avg_frame_rate: Rational,
    properties: CodecProperties,
    extradata: Vec<u8>,
}

// ============================================================================
// ENGINE
// ============================================================================

/// Demuxing engine that shells out to ffprobe.
///
/// ffprobe runs its own stream discovery inside the subprocess, so a source
/// it cannot analyse fails in `open_format` and reaches callers as
/// `ProbeError::Open` carrying `EngineError::ProcessFailed`. With this engine
/// `ProbeError::StreamInfo` only reports stream data in the report that could
/// not be converted, such as a malformed extradata dump.
///
/// Plain paths are checked for existence before ffprobe starts; URLs and
/// protocol inputs (`https:`, `pipe:`) go straight to ffprobe.
#[derive(Debug, Clone)]
pub struct FfprobeEngine {
    binary: PathBuf,
    probe_size: Option<u64>,
    analyze_duration: Option<u64>,
    read_extradata: bool,
}

impl Default for FfprobeEngine {
    fn default() -> Self {
        Self::from_config(&ProbeConfig::default())
    }
}

impl FfprobeEngine {
    /// Engine using `ffprobe` from `PATH` with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self {
            binary: config.ffprobe_path.clone(),
            probe_size: config.probe_size,
            analyze_duration: config.analyze_duration,
            read_extradata: config.read_extradata,
        }
    }

    fn command(&self, source: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args([
            "-v",
            "error",
            "-hide_banner",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ]);
        if self.read_extradata {
            cmd.arg("-show_data");
        }
        if let Some(bytes) = self.probe_size {
            cmd.arg("-probesize").arg(bytes.to_string());
        }
        if let Some(micros) = self.analyze_duration {
            cmd.arg("-analyzeduration").arg(micros.to_string());
        }
        cmd.arg(source);
        cmd
    }
}

impl DemuxEngine for FfprobeEngine {
    type Context = FfprobeContext;

    fn name(&self) -> &'static str {
        "ffprobe"
    }

    fn open_format(&self, source: &Path) -> EngineResult<FfprobeContext> {
        check_local_source(source)?;

        let mut cmd = self.command(source);
        log::debug!("Running: {:?}", cmd);

        let output = cmd.output().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                EngineError::ToolNotFound(self.binary.display().to_string())
            }
            _ => EngineError::Io(e),
        })?;

        if !output.status.success() {
            return Err(match process_failed_error(output.status, &output.stderr) {
                EngineError::ProcessFailed { ref stderr, .. }
                    if stderr.ends_with(NO_SUCH_FILE) =>
                {
                    EngineError::NotFound(source.to_path_buf())
                }
                other => other,
            });
        }

        FfprobeContext::from_json(source, &output.stdout)
    }

    fn codec_name(&self, codec_id: &CodecId) -> Option<String> {
        match codec_id {
            CodecId::Named(name) if !name.is_empty() && name != "none" => Some(name.clone()),
            _ => None,
        }
    }
}

// ============================================================================
// CONTEXT
// ============================================================================

/// Parsed ffprobe report for one source.
#[derive(Debug)]
pub struct FfprobeContext {
    format: FfprobeFormat,
    pending: Vec<FfprobeStream>,
    streams: Vec<ParsedStream>,
}

impl FfprobeContext {
    /// Builds a context from ffprobe's JSON output.
    pub(crate) fn from_json(source: &Path, json: &[u8]) -> EngineResult<Self> {
        let report: FfprobeReport = serde_json::from_slice(json)
            .map_err(|e| EngineError::Parse(format!("ffprobe JSON output: {}", e)))?;

        let format = report.format.ok_or_else(|| {
            EngineError::UnrecognizedFormat(format!(
                "ffprobe reported no container format for {}",
                source.display()
            ))
        })?;

        Ok(Self {
            format,
            pending: report.streams,
            streams: Vec::new(),
        })
    }
}

impl FormatContext for FfprobeContext {
    fn find_stream_info(&mut self) -> EngineResult<()> {
        let pending = std::mem::take(&mut self.pending);
        let mut parsed = Vec::with_capacity(pending.len());
        for stream in pending {
            parsed.push(parse_stream(stream).map_err(|e| match e {
                EngineError::Parse(detail) => EngineError::Analysis(detail),
                other => other,
            })?);
        }
        self.streams.extend(parsed);
        Ok(())
    }

    fn stream_count(&self) -> u64 {
        self.format
            .nb_streams
            .unwrap_or((self.streams.len() + self.pending.len()) as u64)
    }

    fn duration(&self) -> i64 {
        self.format
            .duration
            .as_deref()
            .and_then(seconds_to_micros)
            .unwrap_or(NO_TIMESTAMP)
    }

    fn start_time(&self) -> i64 {
        self.format
            .start_time
            .as_deref()
            .and_then(seconds_to_micros)
            .unwrap_or(NO_TIMESTAMP)
    }

    fn bit_rate(&self) -> i64 {
        parse_number(self.format.bit_rate.as_deref()).unwrap_or(0)
    }

    fn format_short_name(&self) -> Option<&str> {
        self.format.format_name.as_deref()
    }

    fn format_long_name(&self) -> Option<&str> {
        self.format.format_long_name.as_deref()
    }

    fn stream_at(&self, index: usize) -> Option<RawStream<'_>> {
        self.streams.get(index).map(|stream| RawStream {
            id: stream.id,
            time_base: stream.time_base,
            duration: stream.duration,
            avg_frame_rate: stream.avg_frame_rate,
            codec_parameters: RawCodecParameters {
                properties: stream.properties.clone(),
                extradata: &stream.extradata,
            },
        })
    }
}

// ============================================================================
// CONVERSION HELPERS
// ============================================================================

fn parse_stream(stream: FfprobeStream) -> EngineResult<ParsedStream> {
    let extradata = match stream.extradata.as_deref() {
        Some(dump) => decode_hexdump(dump).ok_or_else(|| {
            EngineError::Parse(format!("stream {}: malformed extradata dump", stream.index))
        })?,
        None => Vec::new(),
    };

    if let (Some(expected), Some(_)) = (stream.extradata_size, stream.extradata.as_ref()) {
        if expected != extradata.len() as u64 {
            return Err(EngineError::Parse(format!(
                "stream {}: extradata_size is {} but the dump holds {} bytes",
                stream.index,
                expected,
                extradata.len()
            )));
        }
    }

    let media_type = stream
        .codec_type
        .as_deref()
        .map(MediaType::from)
        .unwrap_or_default();
    let format = match media_type {
        MediaType::Audio => stream.sample_fmt,
        _ => stream.pix_fmt,
    };

    let properties = CodecProperties {
        media_type,
        codec_id: stream
            .codec_name
            .map(CodecId::Named)
            .unwrap_or(CodecId::None),
        codec_tag: stream.codec_tag.as_deref().and_then(parse_hex_u32).unwrap_or(0),
        bit_rate: parse_number(stream.bit_rate.as_deref()).unwrap_or(0),
        bits_per_raw_sample: parse_number(stream.bits_per_raw_sample.as_deref()).unwrap_or(0),
        level: narrow(stream.level),
        width: narrow(stream.width),
        height: narrow(stream.height),
        sample_aspect_ratio: parse_rational(stream.sample_aspect_ratio.as_deref()),
        frame_rate: parse_rational(stream.r_frame_rate.as_deref()),
        field_order: stream.field_order.as_deref().map(field_order_code).unwrap_or(0),
        sample_rate: parse_number(stream.sample_rate.as_deref()).unwrap_or(0),
        channels: narrow(stream.channels),
        channel_layout: stream.channel_layout,
        initial_padding: narrow(stream.initial_padding),
        bits_per_coded_sample: narrow(stream.bits_per_sample),
        profile: stream.profile,
        format,
        color_range: stream.color_range,
        color_primaries: stream.color_primaries,
        color_transfer: stream.color_transfer,
        color_space: stream.color_space,
        chroma_location: stream.chroma_location,
        ..Default::default()
    };

    Ok(ParsedStream {
        id: stream.id.as_deref().and_then(parse_stream_id).unwrap_or(0),
        time_base: parse_rational(stream.time_base.as_deref()),
        duration: stream.duration_ts.unwrap_or(NO_TIMESTAMP),
        avg_frame_rate: parse_rational(stream.avg_frame_rate.as_deref()),
        properties,
        extradata,
    })
}

/// Maps ffprobe's field order names onto `AVFieldOrder` codes.
fn field_order_code(name: &str) -> i32 {
    match name {
        "progressive" => 1,
        "tt" => 2,
        "bb" => 3,
        "tb" => 4,
        "bt" => 5,
        _ => 0,
    }
}

/// Converts a decimal seconds string such as `"10.021333"` to microseconds
/// without going through floating point. `"N/A"` and junk yield `None`.
fn seconds_to_micros(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut micros = 0i64;
    let mut scale = TIME_BASE / 10;
    for digit in fraction.bytes().take(6) {
        micros += i64::from(digit - b'0') * scale;
        scale /= 10;
    }

    let value = whole.checked_mul(TIME_BASE)?.checked_add(micros)?;
    Some(if negative { -value } else { value })
}

/// Decodes the hex column of an ffprobe data dump.
fn decode_hexdump(dump: &str) -> Option<Vec<u8>> {
    let mut bytes = Vec::new();
    for line in dump.lines().filter(|line| !line.trim().is_empty()) {
        let (_, row) = line.split_once(": ")?;
        let hex: Vec<u8> = row
            .bytes()
            .take(HEXDUMP_HEX_WIDTH)
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        if hex.len() % 2 != 0 {
            return None;
        }
        for pair in hex.chunks(2) {
            let text = std::str::from_utf8(pair).ok()?;
            bytes.push(u8::from_str_radix(text, 16).ok()?);
        }
    }
    Some(bytes)
}

fn parse_hex_u32(text: &str) -> Option<u32> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    u32::from_str_radix(digits, 16).ok()
}

/// Stream ids are printed in hex (`"0x1"`) by most demuxers.
fn parse_stream_id(text: &str) -> Option<i32> {
    let value = match text.strip_prefix("0x") {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => text.parse().ok()?,
    };
    i32::try_from(value).ok()
}

fn parse_number<T: std::str::FromStr>(text: Option<&str>) -> Option<T> {
    text.and_then(|t| t.trim().parse().ok())
}

fn parse_rational(text: Option<&str>) -> Rational {
    text.and_then(Rational::parse).unwrap_or_default()
}

fn narrow(value: Option<i64>) -> i32 {
    value.and_then(|v| i32::try_from(v).ok()).unwrap_or(0)
}
