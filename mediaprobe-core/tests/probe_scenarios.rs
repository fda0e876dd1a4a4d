use mediaprobe_core::engine::{MemoryContainer, MemoryEngine, MemoryStream};
use mediaprobe_core::*;
use std::path::Path;

// --- Test Helper Functions ---

const H264: u32 = 27;
const AAC: u32 = 86018;

/// 1 video stream (1920x1080 progressive) and 1 audio stream (48 kHz stereo).
fn two_stream_container() -> MemoryContainer {
    MemoryContainer::new("mov,mp4,m4a,3gp,3g2,mj2", "QuickTime / MOV")
        .with_duration(10_021_333)
        .with_start_time(0)
        .with_bit_rate(5_075_916)
        .with_stream(
            MemoryStream::new(
                CodecParameters::new(MediaType::Video, CodecId::Native(H264))
                    .with_dimensions(1920, 1080)
                    .with_field_order(1)
                    .with_frame_rate(Rational::new(25, 1))
                    .with_profile("High")
                    .with_format("yuv420p")
                    .with_extradata(vec![0x01, 0x64, 0x00, 0x28, 0xff, 0xe1]),
            )
            .with_id(1)
            .with_timing(Rational::new(1, 12800), 128_000),
        )
        .with_stream(
            MemoryStream::new(
                CodecParameters::new(MediaType::Audio, CodecId::Native(AAC))
                    .with_audio(48_000, 2)
                    .with_channel_layout("stereo")
                    .with_profile("LC")
                    .with_format("fltp")
                    .with_extradata(vec![0x11, 0x90]),
            )
            .with_id(2)
            .with_timing(Rational::new(1, 48_000), 480_000),
        )
}

fn engine() -> MemoryEngine {
    MemoryEngine::new()
        .with_codec_name(H264, "h264")
        .with_codec_name(AAC, "aac")
        .with_container("/media/sample.mp4", two_stream_container())
        .with_container("/media/noise.bin", MemoryContainer::unrecognized())
}

fn assert_descriptor_invariants(info: &MediaInfo) {
    assert_eq!(info.stream_count() as usize, info.streams().len());
    for (position, stream) in info.streams().iter().enumerate() {
        assert_eq!(stream.stream_index() as usize, position);
        if stream.media_kind() != MediaKind::Video {
            assert_eq!(stream.width(), 0);
            assert_eq!(stream.height(), 0);
            assert_eq!(stream.field_order(), FIELD_ORDER_NOT_APPLICABLE);
        }
        if stream.media_kind() != MediaKind::Audio {
            assert_eq!(stream.sample_rate(), 0);
            assert_eq!(stream.channel_count(), 0);
            assert_eq!(stream.channel_layout(), None);
        }
    }
}

// --- End-to-end scenarios ---

#[test]
fn test_two_stream_file() {
    let engine = engine();
    let stats = engine.stats();
    let probe = ContainerProbe::new(engine);

    let info = probe.probe("/media/sample.mp4").unwrap();

    assert_eq!(info.stream_count(), 2);
    assert_eq!(info.format_short_name(), "mov,mp4,m4a,3gp,3g2,mj2");
    assert_eq!(info.format_long_name(), "QuickTime / MOV");
    assert_eq!(info.duration(), 10_021_333);
    assert_eq!(info.duration_ms(), Some(10_021));
    assert_eq!(info.bit_rate(), 5_075_916);
    assert!(info.warnings().is_empty());

    let video = &info.streams()[0];
    assert_eq!(video.media_kind(), MediaKind::Video);
    assert_eq!(video.codec_name(), "h264");
    assert_eq!(video.width(), 1920);
    assert_eq!(video.height(), 1080);
    assert_eq!(video.field_order(), 1);
    assert_eq!(field_order_to_str(video.field_order()), "Progressive");
    assert_eq!(video.duration_ms(), Some(10_000));

    let audio = &info.streams()[1];
    assert_eq!(audio.media_kind(), MediaKind::Audio);
    assert_eq!(audio.codec_name(), "aac");
    assert_eq!(audio.sample_rate(), 48_000);
    assert_eq!(audio.channel_count(), 2);
    assert_eq!(audio.channel_layout(), Some("stereo"));
    assert_eq!(video.channel_layout(), None);

    assert_descriptor_invariants(&info);
    assert_eq!(stats.live(), 0, "probe must close the context it opened");
}

#[test]
fn test_nonexistent_path_is_open_error() {
    let engine = engine();
    let stats = engine.stats();
    let probe = ContainerProbe::new(engine);

    let result = probe.probe("/media/does-not-exist.mkv");
    assert!(matches!(
        result,
        Err(ProbeError::Open {
            source: EngineError::NotFound(_),
            ..
        })
    ));
    assert_eq!(stats.opened(), 0);

    // Releasing the aggregate that was never built is a no-op.
    let mut never_built = result.ok();
    release(&mut never_built);
    assert!(never_built.is_none());
}

#[test]
fn test_unrecognized_container_is_open_error() {
    let probe = ContainerProbe::new(engine());
    let err = probe.probe("/media/noise.bin").unwrap_err();
    assert!(matches!(
        err,
        ProbeError::Open {
            source: EngineError::UnrecognizedFormat(_),
            ..
        }
    ));
}

// --- Failure paths release the handle ---

#[test]
fn test_stream_info_failure_closes_the_context() {
    let mut container = two_stream_container();
    container.stream_info_failure = Some("could not find codec parameters".to_string());
    let engine = MemoryEngine::new().with_container("/media/broken.ts", container);
    let stats = engine.stats();
    let probe = ContainerProbe::new(engine);

    let err = probe.open("/media/broken.ts").unwrap_err();
    assert!(matches!(err, ProbeError::StreamInfo { .. }));
    assert!(err.to_string().contains("could not find codec parameters"));
    assert_eq!(stats.opened(), 1);
    assert_eq!(stats.closed(), 1);

    assert!(probe.probe("/media/broken.ts").is_err());
    assert_eq!(stats.live(), 0);
}

#[test]
fn test_stream_count_overflow_is_format_error() {
    let mut container = two_stream_container();
    container.reported_stream_count = Some(u64::from(u32::MAX) + 1);
    let engine = MemoryEngine::new().with_container("/media/huge.mkv", container);
    let stats = engine.stats();
    let probe = ContainerProbe::new(engine);

    let err = probe.probe("/media/huge.mkv").unwrap_err();
    assert!(matches!(err, ProbeError::Format { field: "stream_count", .. }));
    assert_eq!(stats.live(), 0);
}

#[test]
fn test_unreservable_stream_table_fails_cleanly() {
    let mut container = MemoryContainer::new("mpegts", "MPEG-TS (MPEG-2 Transport Stream)");
    container.reported_stream_count = Some(u64::from(u32::MAX));
    let engine = MemoryEngine::new().with_container("/media/huge.ts", container);
    let stats = engine.stats();

    let err = ContainerProbe::new(engine).probe("/media/huge.ts").unwrap_err();
    // An overcommitting allocator may grant the reservation; the first missing
    // stream then fails the probe instead.
    assert!(
        matches!(
            err,
            ProbeError::Allocation { .. } | ProbeError::Format { field: "streams", .. }
        ),
        "unexpected error: {err:?}"
    );
    assert_eq!(stats.opened(), 1);
    assert_eq!(stats.live(), 0);
}

#[test]
fn test_missing_enumerated_stream_is_format_error() {
    let mut container = two_stream_container();
    container.reported_stream_count = Some(3);
    let engine = MemoryEngine::new().with_container("/media/short.mkv", container);
    let stats = engine.stats();

    let err = ContainerProbe::new(engine).probe("/media/short.mkv").unwrap_err();
    assert!(matches!(err, ProbeError::Format { field: "streams", .. }));
    assert_eq!(stats.live(), 0);
}

// --- Container-level defaults ---

#[test]
fn test_unset_values_use_sentinels() {
    let mut container = MemoryContainer::new("", "")
        .with_stream(MemoryStream::new(CodecParameters::new(
            MediaType::Data,
            CodecId::Native(0x18000),
        )))
        .with_stream(MemoryStream::new(CodecParameters::new(
            MediaType::Unknown,
            CodecId::None,
        )));
    container.format_short_name = None;
    container.format_long_name = None;
    let engine = MemoryEngine::new().with_container("/media/raw.dat", container);

    let info = ContainerProbe::new(engine).probe("/media/raw.dat").unwrap();
    assert_eq!(info.duration(), DURATION_UNKNOWN);
    assert_eq!(info.duration_ms(), None);
    assert_eq!(info.start_time(), None);
    assert_eq!(info.format_short_name(), "");
    assert_eq!(info.format_long_name(), "");
    for stream in info.streams() {
        assert_eq!(stream.media_kind(), MediaKind::Other);
        assert_eq!(stream.codec_name(), UNKNOWN_CODEC_NAME);
    }
    assert_descriptor_invariants(&info);
}

#[test]
fn test_negative_duration_is_unknown() {
    let container = two_stream_container().with_duration(-40);
    let engine = MemoryEngine::new().with_container("/media/odd.mkv", container);
    let info = ContainerProbe::new(engine).probe("/media/odd.mkv").unwrap();
    assert_eq!(info.duration(), DURATION_UNKNOWN);
}

#[test]
fn test_long_names_are_truncated_with_warnings() {
    let long_name = "x".repeat(300);
    let source = format!("/media/{}.mkv", "n".repeat(600));
    let container = MemoryContainer::new("matroska,webm", &long_name);
    let engine = MemoryEngine::new().with_container(&source, container);

    let info = ContainerProbe::new(engine).probe(&source).unwrap();
    assert_eq!(info.source().len(), 512);
    assert_eq!(info.format_long_name().len(), 128);
    assert_eq!(info.format_short_name(), "matroska,webm");

    let fields: Vec<&str> = info
        .warnings()
        .iter()
        .map(|w| match w {
            ProbeWarning::Truncated { field, .. } => *field,
        })
        .collect();
    assert_eq!(fields, ["source", "format_long_name"]);
}

#[test]
fn test_truncation_limits_are_configurable() {
    let config = ProbeConfigBuilder::new().max_format_name_len(4).build();
    let probe = ContainerProbe::with_config(engine(), config);

    let info = probe.probe("/media/sample.mp4").unwrap();
    assert_eq!(info.format_short_name(), "mov,");
    assert_eq!(info.format_long_name(), "Quic");
    assert_eq!(info.warnings().len(), 2);
}

// --- Ownership and teardown ---

#[test]
fn test_aggregate_outlives_the_engine() {
    let info = {
        let probe = ContainerProbe::new(engine());
        probe.probe("/media/sample.mp4").unwrap()
    };
    let video = info.stream(0).unwrap();
    assert_eq!(
        video.codec_parameters().extradata(),
        &[0x01, 0x64, 0x00, 0x28, 0xff, 0xe1]
    );
    assert_eq!(info.stream(1).unwrap().codec_parameters().extradata(), &[0x11, 0x90]);
}

#[test]
fn test_handle_close_leaves_copied_parameters_intact() {
    let probe = ContainerProbe::new(engine());
    let handle = probe.open("/media/sample.mp4").unwrap();

    let raw = handle.context().stream_at(0).unwrap();
    let copy = CodecParameters::try_from_raw(&raw.codec_parameters).unwrap();
    drop(handle);

    assert_eq!(copy.properties().width, 1920);
    assert_eq!(copy.extradata().len(), 6);
    assert_eq!(probe.engine().stats().live(), 0);
}

#[test]
fn test_double_release_is_safe() {
    let probe = ContainerProbe::new(engine());
    let mut info = probe.probe("/media/sample.mp4").unwrap();

    info.release();
    info.release();
    assert!(info.is_released());
    assert_eq!(info.stream_count(), 0);
    assert!(info.streams().is_empty());

    let mut slot = Some(probe.probe("/media/sample.mp4").unwrap());
    release(&mut slot);
    release(&mut slot);
    assert!(slot.is_none());
}

#[test]
fn test_clones_are_independent() {
    let probe = ContainerProbe::new(engine());
    let original = probe.probe("/media/sample.mp4").unwrap();
    let mut copy = original.clone();

    copy.release();
    assert_eq!(original.stream_count(), 2);
    assert_eq!(original.streams()[0].codec_parameters().extradata().len(), 6);
}

// --- Concurrency ---

#[test]
fn test_probe_all_keeps_input_order() {
    let engine = engine();
    let stats = engine.stats();
    let probe = ContainerProbe::new(engine);

    let sources = [
        Path::new("/media/sample.mp4"),
        Path::new("/media/noise.bin"),
        Path::new("/media/sample.mp4"),
        Path::new("/media/absent.mkv"),
    ];
    let results = probe.probe_all(&sources);

    assert_eq!(results.len(), 4);
    assert!(results[0].as_ref().is_ok_and(|info| info.stream_count() == 2));
    assert!(matches!(results[1], Err(ProbeError::Open { .. })));
    assert!(results[2].is_ok());
    assert!(matches!(results[3], Err(ProbeError::Open { .. })));
    assert_eq!(stats.opened(), 2);
    assert_eq!(stats.live(), 0);
}

#[test]
fn test_shared_engine_by_reference() {
    let engine = engine();
    let first = ContainerProbe::new(&engine);
    let second = ContainerProbe::new(&engine);

    let a = first.probe("/media/sample.mp4").unwrap();
    let b = second.probe("/media/sample.mp4").unwrap();
    assert_eq!(a, b);
    assert_eq!(engine.stats().opened(), 2);
}

#[test]
fn test_aggregates_cross_threads() {
    let probe = ContainerProbe::new(engine());
    let info = probe.probe("/media/sample.mp4").unwrap();

    let handle = std::thread::spawn(move || info.streams()[1].sample_rate());
    assert_eq!(handle.join().unwrap(), 48_000);
}

// --- JSON report ---

#[test]
fn test_json_report_fields() {
    let probe = ContainerProbe::new(engine());
    let info = probe.probe("/media/sample.mp4").unwrap();
    let json: serde_json::Value = serde_json::from_str(&info.to_json_pretty().unwrap()).unwrap();

    assert_eq!(json["stream_count"], 2);
    assert_eq!(json["format_long_name"], "QuickTime / MOV");
    assert_eq!(json["streams"][0]["media_kind"], "video");
    assert_eq!(json["streams"][0]["field_order"], 1);
    assert_eq!(json["streams"][0]["codec_parameters"]["extradata_size"], 6);
    assert_eq!(json["streams"][1]["media_kind"], "audio");
    assert_eq!(json["streams"][1]["channel_count"], 2);
    assert_eq!(json["streams"][1]["field_order"], -1);
    assert_eq!(json["streams"][1]["channel_layout"], "stereo");
    assert!(json["streams"][0]["channel_layout"].is_null());

    let video_params = &json["streams"][0]["codec_parameters"];
    assert_eq!(video_params["profile"], "High");
    assert_eq!(video_params["format"], "yuv420p");
    let audio_params = &json["streams"][1]["codec_parameters"];
    assert_eq!(audio_params["channel_layout"], "stereo");
    assert_eq!(audio_params["format"], "fltp");
}
