use std::collections::HashMap;

use crate::keys::KeyMap;

/// Highest value on the user facing quality scale. Encoder values are `32 - user`.
pub const QUALITY_SCALE_MAX: u8 = 31;

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureMode {
    Video,
    Audio,
    #[default]
    Both,
}

impl CaptureMode {
    /// Matches the mode grammar (`v`, `a`, `va`, `av`) case-insensitively.
    pub fn from_answer(answer: &str) -> Option<Self> {
        match answer.trim().to_ascii_lowercase().as_str() {
            "v" => Some(CaptureMode::Video),
            "a" => Some(CaptureMode::Audio),
            "va" | "av" => Some(CaptureMode::Both),
            _ => None,
        }
    }

    pub fn has_video(self) -> bool {
        matches!(self, CaptureMode::Video | CaptureMode::Both)
    }

    pub fn has_audio(self) -> bool {
        matches!(self, CaptureMode::Audio | CaptureMode::Both)
    }

    pub fn answer(self) -> &'static str {
        match self {
            CaptureMode::Video => "v",
            CaptureMode::Audio => "a",
            CaptureMode::Both => "va",
        }
    }
}

/// A capture input: the encoder's `-f` selector and the `-i` source id.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Input {
    pub format: String,
    pub source: String,
}

impl Input {
    fn new(format: &str, source: impl Into<String>) -> Self {
        Self {
            format: format.to_string(),
            source: source.into(),
        }
    }

    #[cfg(target_os = "windows")]
    pub fn screen() -> Self {
        Input::new("gdigrab", "desktop")
    }

    #[cfg(target_os = "macos")]
    pub fn screen() -> Self {
        Input::new("avfoundation", "1:none")
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    pub fn screen() -> Self {
        let display = std::env::var("DISPLAY").unwrap_or_else(|_| ":0.0".to_string());
        Input::new("x11grab", display)
    }

    #[cfg(target_os = "windows")]
    pub fn microphone() -> Self {
        Input::new("dshow", "audio=default")
    }

    #[cfg(target_os = "macos")]
    pub fn microphone() -> Self {
        Input::new("avfoundation", "none:0")
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    pub fn microphone() -> Self {
        Input::new("pulse", "default")
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Framerate {
    pub default: u32,
    pub min: u32,
    pub max: u32,
}

impl Default for Framerate {
    fn default() -> Self {
        Self {
            default: 30,
            min: 1,
            max: 120,
        }
    }
}

impl Framerate {
    /// Strictly parsed answer inside `min..=max`, otherwise the default.
    pub fn resolve(&self, answer: &str) -> u32 {
        match answer.trim().parse::<u32>() {
            Ok(fps) if (self.min..=self.max).contains(&fps) => fps,
            _ => self.default,
        }
    }
}

/// Maps an answer on the 1-31 scale to the encoder's native scale.
///
/// Anything unparsable or out of range yields `default` untouched, it is
/// never derived from a sentinel user value.
pub fn resolve_quality(answer: &str, default: u8) -> u8 {
    match answer.trim().parse::<u8>() {
        Ok(q) if (1..=QUALITY_SCALE_MAX).contains(&q) => QUALITY_SCALE_MAX + 1 - q,
        _ => default,
    }
}

/// One variant of the capture session: prompt set, defaults, inputs and keys.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct Profile {
    pub ask_mode: bool,
    pub ask_audio: bool,
    pub mode: CaptureMode,
    pub framerate: Framerate,
    pub video_quality: u8,
    pub audio_quality: u8,
    pub extension: String,
    pub intermediate_extension: String,
    pub stop_command: String,
    pub keys: KeyMap,
    pub video_input: Input,
    pub audio_input: Input,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            ask_mode: true,
            ask_audio: false,
            mode: CaptureMode::Both,
            framerate: Framerate::default(),
            video_quality: 1,
            audio_quality: 1,
            extension: "mp4".to_string(),
            intermediate_extension: "mkv".to_string(),
            stop_command: "q\n".to_string(),
            keys: KeyMap::default(),
            video_input: Input::screen(),
            audio_input: Input::microphone(),
        }
    }
}

impl Profile {
    pub const DEFAULT_NAME: &'static str = "av";

    /// Single pass screen capture with no mode prompt.
    pub fn video() -> Self {
        Self {
            ask_mode: false,
            mode: CaptureMode::Video,
            framerate: Framerate {
                default: 60,
                min: 1,
                max: 240,
            },
            extension: "avi".to_string(),
            keys: KeyMap {
                stop: vec![b'q', 0x03, 0x04, b' ', b'\n', b'\r'],
                ..KeyMap::default()
            },
            ..Self::default()
        }
    }

    pub fn builtin() -> HashMap<String, Profile> {
        HashMap::from([
            ("video".to_string(), Profile::video()),
            (Profile::DEFAULT_NAME.to_string(), Profile::default()),
        ])
    }

    /// Value shown to the user for an encoder-native quality default.
    pub fn displayed_quality(encoder_value: u8) -> u8 {
        (QUALITY_SCALE_MAX + 1).saturating_sub(encoder_value)
    }
}
