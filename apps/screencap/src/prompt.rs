use std::{
    io::{self, Write},
    path::Path,
};

use chrono::Local;
use tokio::sync::mpsc;

use crate::{
    capture::SessionConfig,
    keys::{KeyAction, KeyMap},
    output,
    profile::{CaptureMode, Profile, resolve_quality},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Line(String),
    /// The abort signal fired, or the key stream closed.
    Aborted,
    Quit,
}

impl Answer {
    fn into_line(self) -> Option<String> {
        match self {
            Answer::Line(line) => Some(line),
            _ => None,
        }
    }
}

/// Line prompt over the raw keystroke stream.
///
/// The abort is one-shot: once it fires every later question answers
/// [`Answer::Aborted`] without reading input.
pub struct Prompter<'a, W> {
    keys: &'a mut mpsc::Receiver<u8>,
    keymap: &'a KeyMap,
    out: W,
    aborted: bool,
    // Set after CR submits a line, so the LF of a CRLF pair is not a second answer.
    after_cr: bool,
}

impl<'a, W: Write> Prompter<'a, W> {
    pub fn new(keys: &'a mut mpsc::Receiver<u8>, keymap: &'a KeyMap, out: W) -> Self {
        Self {
            keys,
            keymap,
            out,
            aborted: false,
            after_cr: false,
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub async fn ask(&mut self, query: &str) -> io::Result<Answer> {
        if self.aborted {
            return Ok(Answer::Aborted);
        }
        write!(self.out, "{query}")?;
        self.out.flush()?;

        let mut line: Vec<u8> = vec![];
        loop {
            let Some(byte) = self.keys.recv().await else {
                self.aborted = true;
                self.newline()?;
                return Ok(Answer::Aborted);
            };
            if std::mem::take(&mut self.after_cr) && byte == b'\n' {
                continue;
            }
            match self.keymap.classify(byte, false) {
                KeyAction::Start => {
                    self.aborted = true;
                    self.newline()?;
                    return Ok(Answer::Aborted);
                }
                KeyAction::Quit => {
                    self.newline()?;
                    return Ok(Answer::Quit);
                }
                _ => {}
            }
            match byte {
                b'\r' | b'\n' => {
                    self.after_cr = byte == b'\r';
                    self.newline()?;
                    return Ok(Answer::Line(String::from_utf8_lossy(&line).into_owned()));
                }
                0x7f | 0x08 => {
                    if pop_char(&mut line) {
                        self.out.write_all(b"\x08 \x08")?;
                    }
                }
                0x20..=0x7e | 0x80..=0xff => {
                    line.push(byte);
                    self.out.write_all(&[byte])?;
                }
                _ => continue,
            }
            self.out.flush()?;
        }
    }

    fn newline(&mut self) -> io::Result<()> {
        self.out.write_all(b"\r\n")?;
        self.out.flush()
    }

    /// Runs the profile's prompt sequence. `None` means the user quit.
    pub async fn collect(
        &mut self,
        profile: &Profile,
        media_dir: &Path,
    ) -> io::Result<Option<SessionConfig>> {
        let now = Local::now();

        let mut mode = profile.mode;
        if profile.ask_mode {
            let query = format!("mode (v/a/va): ({}) ", profile.mode.answer());
            match self.ask(&query).await? {
                Answer::Quit => return Ok(None),
                answer => {
                    if let Some(line) = answer.into_line() {
                        mode = CaptureMode::from_answer(&line).unwrap_or(profile.mode);
                    }
                }
            }
        }

        let query = format!(
            "file-entry: ({}.{}) ",
            output::DATE_TOKEN,
            profile.extension
        );
        let entry = match self.ask(&query).await? {
            Answer::Quit => return Ok(None),
            answer => answer.into_line().unwrap_or_default(),
        };
        let output = output::resolve(&entry, &profile.extension, media_dir, &now);

        let mut framerate = profile.framerate.default;
        let mut video_quality = profile.video_quality;
        if mode.has_video() {
            let query = format!("fps: ({}) ", profile.framerate.default);
            match self.ask(&query).await? {
                Answer::Quit => return Ok(None),
                answer => {
                    if let Some(line) = answer.into_line() {
                        framerate = profile.framerate.resolve(&line);
                    }
                }
            }

            let query = format!(
                "video quality (1-31): ({}) ",
                Profile::displayed_quality(profile.video_quality)
            );
            match self.ask(&query).await? {
                Answer::Quit => return Ok(None),
                answer => {
                    if let Some(line) = answer.into_line() {
                        video_quality = resolve_quality(&line, profile.video_quality);
                    }
                }
            }
        }

        if profile.ask_audio && mode == CaptureMode::Video {
            match self.ask("with audio (y/n): (n) ").await? {
                Answer::Quit => return Ok(None),
                answer => {
                    let line = answer.into_line().unwrap_or_default();
                    if matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
                        mode = CaptureMode::Both;
                    }
                }
            }
        }

        let mut audio_quality = profile.audio_quality;
        if mode.has_audio() {
            let query = format!(
                "audio quality (1-31): ({}) ",
                Profile::displayed_quality(profile.audio_quality)
            );
            match self.ask(&query).await? {
                Answer::Quit => return Ok(None),
                answer => {
                    if let Some(line) = answer.into_line() {
                        audio_quality = resolve_quality(&line, profile.audio_quality);
                    }
                }
            }
        }

        let temp = (mode == CaptureMode::Both)
            .then(|| output::temp_path(&profile.intermediate_extension, &now));

        Ok(Some(SessionConfig {
            output,
            mode,
            framerate,
            video_quality,
            audio_quality,
            temp,
            video_input: profile.video_input.clone(),
            audio_input: profile.audio_input.clone(),
        }))
    }
}

/// Removes the last UTF-8 character from `line`.
fn pop_char(line: &mut Vec<u8>) -> bool {
    let Some(len) = line.len().checked_sub(1) else {
        return false;
    };
    let start = (0..=len)
        .rev()
        .find(|&i| line[i] & 0b1100_0000 != 0b1000_0000)
        .unwrap_or(0);
    line.truncate(start);
    true
}
