//! Encoding policy and command construction tests.

use convid::probe::{parse_ffprobe_json, AudioTrack, MediaInfo, VideoTrack};
use convid_av::{build_transcode_command, select_plan, EncodingPolicy, Preset, SourceProbe};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn source(
    video: &str,
    width: u32,
    height: u32,
    audio: &str,
    kbps: Option<u64>,
    ch: u32,
) -> SourceProbe {
    SourceProbe {
        video_codec: video.to_string(),
        video_bitrate: None,
        width,
        height,
        frame_rate: 25.0,
        audio_codec: audio.to_string(),
        audio_bitrate: kbps.map(|k| k * 1000),
        audio_channels: ch,
    }
}

fn media(video: &str, audio: Option<(&str, u64, u32)>) -> MediaInfo {
    MediaInfo {
        file_path: PathBuf::from("/videos/in.avi"),
        file_size: 0,
        container: "avi".to_string(),
        duration: Some(Duration::from_secs(60)),
        video_tracks: vec![VideoTrack {
            index: 0,
            codec: video.to_string(),
            width: 720,
            height: 576,
            frame_rate: Some(25.0),
            bit_rate: None,
        }],
        audio_tracks: audio
            .map(|(codec, kbps, channels)| {
                vec![AudioTrack {
                    index: 1,
                    codec: codec.to_string(),
                    channels,
                    sample_rate: Some(48000),
                    bit_rate: Some(kbps * 1000),
                    language: None,
                }]
            })
            .unwrap_or_default(),
    }
}

#[test]
fn plan_is_deterministic() {
    let probe = source("mpeg4", 640, 480, "mp3", Some(192), 2);
    let first = select_plan(&probe);
    for _ in 0..10 {
        assert_eq!(select_plan(&probe), first);
    }
}

#[test]
fn known_families_select_table_rows() {
    let plan = select_plan(&source("mpeg2video", 720, 576, "ac3", Some(448), 6));
    assert_eq!((plan.video_crf, plan.video_preset), (18, Preset::Slow));
    assert_eq!(plan.audio_bitrate_kbps, 358);
    assert_eq!(plan.audio_channels, 6);
    assert!(!plan.copy_video);
    assert!(!plan.copy_audio);

    let plan = select_plan(&source("hevc", 3840, 2160, "flac", Some(1000), 2));
    assert_eq!((plan.video_crf, plan.video_preset), (22, Preset::Medium));
    assert_eq!(plan.audio_bitrate_kbps, 320);
}

#[test]
fn unknown_codecs_fall_back() {
    let policy = EncodingPolicy::default();
    let probe = source("some_new_codec", 1920, 1080, "mystery", Some(96), 2);
    assert_eq!(policy.select_plan(&probe), policy.fallback_plan(2));
}

#[test]
fn h264_and_sufficient_aac_are_copied() {
    let plan = select_plan(&source("h264", 1920, 1080, "aac", Some(256), 2));
    assert!(plan.copy_video);
    assert!(plan.copy_audio);
    assert_eq!(plan.to_string(), "video: copy, audio: copy");
}

#[test]
fn command_maps_every_stream() {
    let info = media("msmpeg4v3", Some(("mp3", 128, 2)));
    let policy = EncodingPolicy::default();
    let cmd = build_transcode_command(
        Path::new("ffmpeg"),
        &info,
        &policy,
        Path::new("/videos/in.mp4"),
    );
    let args = cmd.args_lossy();

    assert!(args.windows(2).any(|w| w == ["-map", "0:0"]));
    assert!(args.windows(2).any(|w| w == ["-map", "0:1"]));
    assert!(args.windows(2).any(|w| w == ["-c:v:0", "libx264"]));
    assert!(args.windows(2).any(|w| w == ["-c:a:0", "aac"]));
    assert!(args.windows(2).any(|w| w == ["-movflags", "+faststart"]));
    assert_eq!(args.last().map(String::as_str), Some("/videos/in.mp4"));
    assert!(cmd.has_audio);
}

#[test]
fn command_without_audio_is_video_only() {
    let info = media("mpeg4", None);
    let cmd = build_transcode_command(
        Path::new("ffmpeg"),
        &info,
        &EncodingPolicy::default(),
        Path::new("out.mp4"),
    );
    assert!(!cmd.has_audio);
    assert!(!cmd.args_lossy().iter().any(|a| a.starts_with("-c:a")));
}

#[test]
fn ffprobe_json_feeds_the_policy() {
    let json = r#"{
        "streams": [
            {"index": 0, "codec_type": "video", "codec_name": "wmv3", "width": 1280, "height": 720, "r_frame_rate": "30000/1001"},
            {"index": 1, "codec_type": "audio", "codec_name": "wmav2", "channels": 2, "bit_rate": "192000"}
        ],
        "format": {"format_name": "asf", "duration": "42.5"}
    }"#;
    let info = parse_ffprobe_json(Path::new("clip.wmv"), json).unwrap();
    let plan = select_plan(&info.source_probe());

    assert_eq!((plan.video_crf, plan.video_preset), (19, Preset::Slow));
    // wmav2 is a legacy lossy codec: 192k * 0.8
    assert_eq!(plan.audio_bitrate_kbps, 153);
}
