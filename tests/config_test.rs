//! Configuration loading tests.

use convid::config::{load_config, load_config_or_default, DEFAULT_EXTENSIONS};
use convid_av::Preset;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn load_full_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("convid.toml");
    fs::write(
        &path,
        r#"
[tools]
ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"

[conversion]
extensions = ["avi", "wmv"]
output_dir = "/srv/converted"
overwrite = true
recursive = false

[policy.video]
copy_h264 = false

[policy.video.uhd]
efficient = { crf = 24, preset = "slower" }
legacy = { crf = 21, preset = "slower" }

[policy.audio]
never_exceed_lossy_source = false
copy_aac = false
"#,
    )
    .unwrap();

    let config = load_config(&path).unwrap();

    assert_eq!(
        config.tools.ffmpeg_path,
        Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"))
    );
    assert!(config.tools.ffprobe_path.is_none());
    assert_eq!(config.conversion.extensions, vec!["avi", "wmv"]);
    assert_eq!(
        config.conversion.output_dir,
        Some(PathBuf::from("/srv/converted"))
    );
    assert!(config.conversion.overwrite);
    assert!(!config.conversion.recursive);
    assert!(!config.policy.video.copy_h264);
    assert_eq!(config.policy.video.uhd.efficient.preset, Preset::Slower);
    assert!(!config.policy.audio.never_exceed_lossy_source);
    assert!(!config.policy.audio.copy_aac);
    // Untouched sections keep defaults.
    assert_eq!(config.policy.audio.default_kbps.surround, 512);
}

#[test]
fn explicit_path_must_exist() {
    let dir = tempdir().unwrap();
    let err = load_config_or_default(Some(dir.path().join("missing.toml").as_path())).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to read config file"));
}

#[test]
fn malformed_toml_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[conversion\nextensions = ").unwrap();

    let err = load_config(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse config"));
}

#[test]
fn audio_floor_above_ceiling_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("convid.toml");
    fs::write(
        &path,
        r#"
[policy.audio.floor_kbps]
mono = 32
stereo = 400
surround = 192
"#,
    )
    .unwrap();

    let err = load_config(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("floor"));
}

#[test]
fn defaults_cover_common_containers() {
    for ext in ["avi", "mkv", "wmv", "flv", "mov", "mp4", "vob", "rmvb"] {
        assert!(DEFAULT_EXTENSIONS.contains(&ext), "missing {}", ext);
    }
}
