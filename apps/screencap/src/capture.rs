use std::{ffi::OsString, path::PathBuf};

use crate::profile::{CaptureMode, Input};

/// Answers collected for one session. Read-only once the prompts finish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub output: PathBuf,
    pub mode: CaptureMode,
    pub framerate: u32,
    pub video_quality: u8,
    pub audio_quality: u8,
    /// Set when the capture goes to an intermediate file that is remuxed afterwards.
    pub temp: Option<PathBuf>,
    pub video_input: Input,
    pub audio_input: Input,
}

impl SessionConfig {
    /// The file the capture phase writes to.
    pub fn capture_target(&self) -> &PathBuf {
        self.temp.as_ref().unwrap_or(&self.output)
    }

    /// Argument vector for the capture phase.
    ///
    /// With audio present, `-q:v` trails both input blocks. The encoder
    /// otherwise applies it to the wrong stream.
    pub fn capture_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![];
        if self.mode.has_video() {
            args.extend(
                [
                    "-f",
                    self.video_input.format.as_str(),
                    "-framerate",
                    self.framerate.to_string().as_str(),
                    "-i",
                    self.video_input.source.as_str(),
                ]
                .map(OsString::from),
            );
        }
        if self.mode.has_audio() {
            args.extend(
                [
                    "-f",
                    self.audio_input.format.as_str(),
                    "-i",
                    self.audio_input.source.as_str(),
                    "-q:a",
                    self.audio_quality.to_string().as_str(),
                ]
                .map(OsString::from),
            );
        }
        if self.mode.has_video() {
            args.push("-q:v".into());
            args.push(self.video_quality.to_string().into());
        }
        args.push(self.capture_target().into());
        args
    }

    /// Argument vector for the remux pass, if this session needs one.
    pub fn remux_args(&self) -> Option<Vec<OsString>> {
        let temp = self.temp.as_ref()?;
        let mut args: Vec<OsString> = vec!["-i".into(), temp.into()];
        args.extend(["-c:v", "copy", "-c:a", "copy"].map(OsString::from));
        args.push(self.output.clone().into());
        Some(args)
    }
}
