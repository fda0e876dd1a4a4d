// ============================================================================
// mediaprobe-cli/src/output.rs
// ============================================================================
//
// TEXT OUTPUT: Human-Readable Rendering of Probe Results
//
// Colors are applied only when stdout is a terminal that supports them and
// NO_COLOR is unset.
//
// AI-ASSISTANT-INFO: Terminal rendering of MediaInfo

use mediaprobe_core::{
    MediaInfo, MediaKind, StreamDescriptor, format_bit_rate, format_bytes, format_duration_ms,
};
use owo_colors::{OwoColorize, Stream};
use std::fmt::Display;

/// Print a heading with colored styling and clear separation
pub fn print_heading(text: &str) {
    let line = "=".repeat(60);
    println!("{}", line.if_supports_color(Stream::Stdout, |l| l.bright_blue()));
    println!(
        " {}",
        text.if_supports_color(Stream::Stdout, |t| t.bold())
    );
    println!("{}", line.if_supports_color(Stream::Stdout, |l| l.bright_blue()));
}

/// Print an info line with label and value, with the label colored
pub fn print_info<T: Display>(label: &str, value: T) {
    println!(
        "{:<10} {}",
        format!("{label}:").if_supports_color(Stream::Stdout, |l| l.bright_cyan()),
        value
    );
}

pub fn print_warning(message: &str) {
    eprintln!(
        "{} {}",
        "warning:".if_supports_color(Stream::Stderr, |w| w.yellow()),
        message
    );
}

pub fn print_error(message: &str) {
    eprintln!(
        "{} {}",
        "error:".if_supports_color(Stream::Stderr, |e| e.bright_red()),
        message
    );
}

/// One-line summary of a stream, e.g. `#0 video: h264, 1920x1080, Progressive, 25 fps`.
pub fn describe_stream(stream: &StreamDescriptor) -> String {
    let details = match stream.media_kind() {
        MediaKind::Video => {
            let mut text = format!(
                "{}x{}, {}",
                stream.width(),
                stream.height(),
                stream.field_order_str()
            );
            if let Some(fps) = stream.avg_frame_rate().as_f64().filter(|fps| *fps > 0.0) {
                text.push_str(&format!(", {} fps", format_frame_rate(fps)));
            }
            text
        }
        MediaKind::Audio => {
            let mut text = format!(
                "{} Hz, {} channels",
                stream.sample_rate(),
                stream.channel_count()
            );
            if let Some(layout) = stream.channel_layout() {
                text.push_str(&format!(" ({layout})"));
            }
            text
        }
        MediaKind::Other => stream.media_type().to_string(),
    };
    format!(
        "#{} {}: {}, {}",
        stream.stream_index(),
        stream.media_kind(),
        stream.codec_name(),
        details
    )
}

/// Whole rates print without decimals, others like 29.97 with two.
fn format_frame_rate(fps: f64) -> String {
    if fps.fract() == 0.0 {
        format!("{fps:.0}")
    } else {
        format!("{fps:.2}")
    }
}

/// Prints the text report for one probed file.
pub fn print_media_info(info: &MediaInfo) {
    print_heading(info.source());

    print_info(
        "Format",
        format!("{} ({})", info.format_short_name(), info.format_long_name()),
    );
    print_info(
        "Duration",
        info.duration_ms()
            .map(format_duration_ms)
            .unwrap_or_else(|| "N/A".to_string()),
    );
    if let Some(size) = info.file_size() {
        print_info("Size", format_bytes(size));
    }
    print_info("Bit rate", format_bit_rate(info.bit_rate()));
    print_info("Streams", info.stream_count());

    for stream in info.streams() {
        println!("  {}", describe_stream(stream));
    }
    for warning in info.warnings() {
        print_warning(&format!("{}: {}", info.source(), warning));
    }
    println!();
}
