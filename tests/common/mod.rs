//! Shared helpers for integration tests.
//!
//! Provides [`FakeConverter`], a scripted [`Converter`] for runner tests, and
//! [`FakeTools`], shell-script stand-ins for ffprobe and ffmpeg used by the
//! CLI tests.

#![allow(dead_code)]

use convid::batch::{ConvertError, Converter};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Create an empty file, including parent directories.
pub fn touch(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, b"").unwrap();
}

/// What [`FakeConverter`] does for a given file name.
#[derive(Debug, Clone)]
pub enum Scripted {
    Succeed,
    Unreadable(&'static str),
    Fail(&'static str),
}

/// Converter that follows a script keyed by file name and records calls.
///
/// Files without an entry succeed and get an empty output written.
#[derive(Default)]
pub struct FakeConverter {
    script: HashMap<String, Scripted>,
    pub converted: RefCell<Vec<PathBuf>>,
    pub described: RefCell<Vec<PathBuf>>,
}

impl FakeConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, file_name: &str, behaviour: Scripted) -> Self {
        self.script.insert(file_name.to_string(), behaviour);
        self
    }

    fn behaviour(&self, input: &Path) -> Scripted {
        let name = input.file_name().unwrap().to_string_lossy().to_string();
        self.script.get(&name).cloned().unwrap_or(Scripted::Succeed)
    }

    pub fn converted_names(&self) -> Vec<String> {
        self.converted
            .borrow()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }
}

impl Converter for FakeConverter {
    fn describe(&self, input: &Path, output: &Path) -> Result<String, ConvertError> {
        self.described.borrow_mut().push(input.to_path_buf());
        match self.behaviour(input) {
            Scripted::Unreadable(msg) => Err(ConvertError::Unreadable(msg.to_string())),
            _ => Ok(format!(
                "ffmpeg -i {} {}",
                input.display(),
                output.display()
            )),
        }
    }

    fn convert(
        &self,
        input: &Path,
        output: &Path,
        progress: &mut dyn FnMut(f64),
    ) -> Result<PathBuf, ConvertError> {
        self.converted.borrow_mut().push(input.to_path_buf());
        match self.behaviour(input) {
            Scripted::Succeed => {
                progress(50.0);
                progress(100.0);
                touch(output);
                Ok(output.to_path_buf())
            }
            Scripted::Unreadable(msg) => Err(ConvertError::Unreadable(msg.to_string())),
            Scripted::Fail(msg) => Err(ConvertError::Failed(msg.to_string())),
        }
    }
}

/// ffprobe output for a 10 second 640x480 MPEG-4 Part 2 / MP3 AVI.
pub const FFPROBE_AVI_JSON: &str = r#"{
  "streams": [
    {
      "index": 0,
      "codec_name": "mpeg4",
      "codec_type": "video",
      "width": 640,
      "height": 480,
      "r_frame_rate": "25/1",
      "bit_rate": "1200000"
    },
    {
      "index": 1,
      "codec_name": "mp3",
      "codec_type": "audio",
      "sample_rate": "44100",
      "channels": 2,
      "bit_rate": "128000"
    }
  ],
  "format": {
    "format_name": "avi",
    "duration": "10.000000",
    "size": "1500000"
  }
}"#;

/// Executable ffprobe/ffmpeg scripts plus a config file pointing at them.
#[cfg(unix)]
pub struct FakeTools {
    pub dir: PathBuf,
    pub config: PathBuf,
}

#[cfg(unix)]
impl FakeTools {
    /// Write the scripts into `dir`. The fake ffmpeg emits progress and
    /// creates its last argument; the fake ffprobe prints [`FFPROBE_AVI_JSON`].
    pub fn install(dir: &Path) -> Self {
        let ffprobe = dir.join("ffprobe");
        write_script(
            &ffprobe,
            &format!("#!/bin/sh\ncat <<'EOF'\n{}\nEOF\n", FFPROBE_AVI_JSON),
        );

        let ffmpeg = dir.join("ffmpeg");
        write_script(
            &ffmpeg,
            "#!/bin/sh\n\
             for last; do :; done\n\
             echo out_time_us=5000000\n\
             echo progress=continue\n\
             echo out_time_us=10000000\n\
             echo progress=end\n\
             printf converted > \"$last\"\n",
        );

        let config = dir.join("convid.toml");
        std::fs::write(
            &config,
            format!(
                "[tools]\nffmpeg_path = {:?}\nffprobe_path = {:?}\n",
                ffmpeg.to_string_lossy(),
                ffprobe.to_string_lossy()
            ),
        )
        .unwrap();

        Self {
            dir: dir.to_path_buf(),
            config,
        }
    }
}

#[cfg(unix)]
fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    std::fs::write(path, body).unwrap();
    let mut perms = std::fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).unwrap();
}
