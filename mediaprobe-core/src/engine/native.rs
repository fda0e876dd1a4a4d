// ============================================================================
// mediaprobe-core/src/engine/native.rs
// ============================================================================
//
// NATIVE ENGINE: Demuxing Through Linked libavformat
//
// Opens sources in-process with `avformat_open_input` and reads stream data
// straight out of the `AVFormatContext`. Extension data is borrowed from the
// context's `AVCodecParameters` until the probe copies it.
//
// All unsafe FFmpeg access is confined to this module. A `NativeContext` owns
// exactly one format context and closes it in `Drop`.
//
// AI-ASSISTANT-INFO: libavformat-backed demuxing engine (feature ffmpeg-native)

// ---- External crate imports ----
use ffmpeg_next::ffi;

// ---- Internal crate imports ----
use crate::config::ProbeConfig;
use crate::engine::{DemuxEngine, FormatContext, RawStream, check_local_source};
use crate::error::{EngineError, EngineResult};
use crate::params::{CodecId, CodecProperties, MediaType, Rational, RawCodecParameters};

// ---- Standard library imports ----
use std::ffi::{CStr, CString};
use std::io;
use std::os::raw::c_char;
use std::path::Path;
use std::ptr;

fn ffmpeg_error(ret: i32, context: &str) -> EngineError {
    EngineError::Ffmpeg {
        context: context.to_string(),
        code: ret,
        message: ffmpeg_next::Error::from(ret).to_string(),
    }
}

fn check_ffmpeg(ret: i32, context: &str) -> EngineResult<()> {
    if ret < 0 {
        return Err(ffmpeg_error(ret, context));
    }
    Ok(())
}

fn c_string(text: &str) -> EngineResult<CString> {
    CString::new(text).map_err(|e| EngineError::Io(io::Error::new(io::ErrorKind::InvalidInput, e)))
}

/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn borrowed_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

fn rational(value: ffi::AVRational) -> Rational {
    Rational::new(value.num, value.den)
}

/// Whether an FFmpeg return code is `AVERROR(ENOENT)`.
fn is_not_found(ret: i32) -> bool {
    ret < 0
        && ret
            .checked_neg()
            .is_some_and(|errno| io::Error::from_raw_os_error(errno).kind() == io::ErrorKind::NotFound)
}

fn owned_name(ptr: *const c_char) -> Option<String> {
    unsafe { borrowed_str(ptr) }.map(str::to_string)
}

/// `AVSampleFormat` names, indexed by code.
const SAMPLE_FORMAT_NAMES: [&str; 12] = [
    "u8", "s16", "s32", "flt", "dbl", "u8p", "s16p", "s32p", "fltp", "dblp", "s64", "s64p",
];

fn sample_format_name(code: i32) -> Option<String> {
    usize::try_from(code)
        .ok()
        .and_then(|i| SAMPLE_FORMAT_NAMES.get(i))
        .map(|name| name.to_string())
}

/// Looks up an `AVPixelFormat` code by walking the descriptor table.
fn pixel_format_name(code: i32) -> Option<String> {
    if code < 0 {
        return None;
    }
    let mut descriptor: *const ffi::AVPixFmtDescriptor = ptr::null();
    loop {
        descriptor = unsafe { ffi::av_pix_fmt_desc_next(descriptor) };
        if descriptor.is_null() {
            return None;
        }
        let id = unsafe { ffi::av_pix_fmt_desc_get_id(descriptor) };
        if id as i32 == code {
            return owned_name(unsafe { (*descriptor).name });
        }
    }
}

fn channel_layout_name(layout: &ffi::AVChannelLayout) -> Option<String> {
    if layout.nb_channels <= 0 {
        return None;
    }
    let mut buf = [0 as c_char; 64];
    let ret = unsafe { ffi::av_channel_layout_describe(layout, buf.as_mut_ptr(), buf.len()) };
    if ret < 0 {
        return None;
    }
    owned_name(buf.as_ptr())
}

// ============================================================================
// ENGINE
// ============================================================================

/// Demuxing engine backed by the linked FFmpeg libraries.
#[derive(Debug, Clone, Default)]
pub struct NativeEngine {
    probe_size: Option<u64>,
    analyze_duration: Option<u64>,
    read_extradata: bool,
}

impl NativeEngine {
    /// Initialises FFmpeg and creates an engine with default settings.
    pub fn new() -> EngineResult<Self> {
        Self::from_config(&ProbeConfig::default())
    }

    pub fn from_config(config: &ProbeConfig) -> EngineResult<Self> {
        ffmpeg_next::init().map_err(|e| EngineError::Ffmpeg {
            context: "ffmpeg init".to_string(),
            code: i32::from(e),
            message: e.to_string(),
        })?;
        Ok(Self {
            probe_size: config.probe_size,
            analyze_duration: config.analyze_duration,
            read_extradata: config.read_extradata,
        })
    }

    fn open_options(&self) -> EngineResult<*mut ffi::AVDictionary> {
        let mut options: *mut ffi::AVDictionary = ptr::null_mut();
        let entries = [
            ("probesize", self.probe_size),
            ("analyzeduration", self.analyze_duration),
        ];
        for (key, value) in entries {
            let Some(value) = value else { continue };
            let key = c_string(key)?;
            let value = c_string(&value.to_string())?;
            let ret = unsafe { ffi::av_dict_set(&mut options, key.as_ptr(), value.as_ptr(), 0) };
            if let Err(e) = check_ffmpeg(ret, "av_dict_set") {
                unsafe { ffi::av_dict_free(&mut options) };
                return Err(e);
            }
        }
        Ok(options)
    }
}

impl DemuxEngine for NativeEngine {
    type Context = NativeContext;

    fn name(&self) -> &'static str {
        "libavformat"
    }

    fn open_format(&self, source: &Path) -> EngineResult<NativeContext> {
        check_local_source(source)?;

        let c_path = CString::new(source.as_os_str().as_encoded_bytes())
            .map_err(|e| EngineError::Io(io::Error::new(io::ErrorKind::InvalidInput, e)))?;
        let mut options = self.open_options()?;
        let mut fmt_ctx: *mut ffi::AVFormatContext = ptr::null_mut();

        let ret = unsafe {
            ffi::avformat_open_input(&mut fmt_ctx, c_path.as_ptr(), ptr::null(), &mut options)
        };
        unsafe { ffi::av_dict_free(&mut options) };

        if ret < 0 {
            return Err(match ffmpeg_next::Error::from(ret) {
                ffmpeg_next::Error::InvalidData => EngineError::UnrecognizedFormat(format!(
                    "{} matched no known container",
                    source.display()
                )),
                _ if is_not_found(ret) => EngineError::NotFound(source.to_path_buf()),
                _ => ffmpeg_error(ret, "avformat_open_input"),
            });
        }

        log::debug!("libavformat opened {}", source.display());
        Ok(NativeContext {
            ctx: fmt_ctx,
            read_extradata: self.read_extradata,
        })
    }

    fn codec_name(&self, codec_id: &CodecId) -> Option<String> {
        let CodecId::Native(id) = codec_id else {
            return None;
        };
        let mut descriptor: *const ffi::AVCodecDescriptor = ptr::null();
        loop {
            descriptor = unsafe { ffi::avcodec_descriptor_next(descriptor) };
            if descriptor.is_null() {
                return None;
            }
            let desc = unsafe { &*descriptor };
            if desc.id as u32 == *id {
                return unsafe { borrowed_str(desc.name) }.map(str::to_string);
            }
        }
    }
}

// ============================================================================
// CONTEXT
// ============================================================================

/// An open `AVFormatContext`.
#[derive(Debug)]
pub struct NativeContext {
    ctx: *mut ffi::AVFormatContext,
    read_extradata: bool,
}

impl NativeContext {
    fn format(&self) -> &ffi::AVFormatContext {
        // Non-null from construction until drop.
        unsafe { &*self.ctx }
    }

    fn input_format(&self) -> Option<&ffi::AVInputFormat> {
        let iformat = self.format().iformat;
        if iformat.is_null() {
            None
        } else {
            Some(unsafe { &*iformat })
        }
    }
}

impl FormatContext for NativeContext {
    fn find_stream_info(&mut self) -> EngineResult<()> {
        let ret = unsafe { ffi::avformat_find_stream_info(self.ctx, ptr::null_mut()) };
        check_ffmpeg(ret, "avformat_find_stream_info")
    }

    fn stream_count(&self) -> u64 {
        u64::from(self.format().nb_streams)
    }

    fn duration(&self) -> i64 {
        self.format().duration
    }

    fn start_time(&self) -> i64 {
        self.format().start_time
    }

    fn bit_rate(&self) -> i64 {
        self.format().bit_rate
    }

    fn format_short_name(&self) -> Option<&str> {
        self.input_format()
            .and_then(|f| unsafe { borrowed_str(f.name) })
    }

    fn format_long_name(&self) -> Option<&str> {
        self.input_format()
            .and_then(|f| unsafe { borrowed_str(f.long_name) })
    }

    fn stream_at(&self, index: usize) -> Option<RawStream<'_>> {
        let format = self.format();
        if format.streams.is_null() || index >= format.nb_streams as usize {
            return None;
        }
        let stream_ptr = unsafe { *format.streams.add(index) };
        if stream_ptr.is_null() {
            return None;
        }
        let stream = unsafe { &*stream_ptr };
        if stream.codecpar.is_null() {
            return None;
        }
        let par = unsafe { &*stream.codecpar };

        let has_extradata = !par.extradata.is_null() && par.extradata_size > 0;
        let extradata: &[u8] = if self.read_extradata && has_extradata {
            unsafe { std::slice::from_raw_parts(par.extradata, par.extradata_size as usize) }
        } else {
            &[]
        };

        let media_type = MediaType::from_code(par.codec_type as i32);
        let is_video = media_type == MediaType::Video;
        let is_audio = media_type == MediaType::Audio;

        let properties = CodecProperties {
            media_type,
            codec_id: CodecId::Native(par.codec_id as u32),
            codec_tag: par.codec_tag,
            bit_rate: par.bit_rate,
            bits_per_raw_sample: par.bits_per_raw_sample,
            level: par.level,
            width: par.width,
            height: par.height,
            sample_aspect_ratio: rational(par.sample_aspect_ratio),
            frame_rate: rational(par.framerate),
            field_order: par.field_order as i32,
            sample_rate: par.sample_rate,
            channels: par.ch_layout.nb_channels,
            channel_layout: if is_audio {
                channel_layout_name(&par.ch_layout)
            } else {
                None
            },
            initial_padding: par.initial_padding,
            trailing_padding: par.trailing_padding,
            seek_preroll: par.seek_preroll,
            bits_per_coded_sample: par.bits_per_coded_sample,
            block_align: par.block_align,
            frame_size: par.frame_size,
            profile: owned_name(unsafe { ffi::avcodec_profile_name(par.codec_id, par.profile) }),
            format: match media_type {
                MediaType::Video => pixel_format_name(par.format),
                MediaType::Audio => sample_format_name(par.format),
                _ => None,
            },
            color_range: is_video
                .then(|| owned_name(unsafe { ffi::av_color_range_name(par.color_range) }))
                .flatten(),
            color_primaries: is_video
                .then(|| owned_name(unsafe { ffi::av_color_primaries_name(par.color_primaries) }))
                .flatten(),
            color_transfer: is_video
                .then(|| owned_name(unsafe { ffi::av_color_transfer_name(par.color_trc) }))
                .flatten(),
            color_space: is_video
                .then(|| owned_name(unsafe { ffi::av_color_space_name(par.color_space) }))
                .flatten(),
            chroma_location: is_video
                .then(|| owned_name(unsafe { ffi::av_chroma_location_name(par.chroma_location) }))
                .flatten(),
        };

        Some(RawStream {
            id: stream.id,
            time_base: rational(stream.time_base),
            duration: stream.duration,
            avg_frame_rate: rational(stream.avg_frame_rate),
            codec_parameters: RawCodecParameters {
                properties,
                extradata,
            },
        })
    }
}

impl Drop for NativeContext {
    fn drop(&mut self) {
        if !self.ctx.is_null() {
            unsafe { ffi::avformat_close_input(&mut self.ctx) };
        }
    }
}
