/// Ctrl+S
pub const START: u8 = 0x13;
/// Ctrl+C
pub const QUIT: u8 = 0x03;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Start,
    Quit,
    Stop,
    Confirm,
    Ignored,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct KeyMap {
    pub start: u8,
    pub quit: u8,
    pub stop: Vec<u8>,
    pub confirm: Vec<u8>,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            start: START,
            quit: QUIT,
            // Ctrl+D, space, Enter. Enter arrives as CR in raw mode.
            stop: vec![0x04, b' ', b'\n', b'\r'],
            confirm: vec![b'y', b'Y'],
        }
    }
}

impl KeyMap {
    /// Classifies a single input byte. `recording` is true once an encoder
    /// process exists.
    pub fn classify(&self, byte: u8, recording: bool) -> KeyAction {
        if byte == self.start {
            KeyAction::Start
        } else if byte == self.quit && !recording {
            KeyAction::Quit
        } else if recording && self.stop.contains(&byte) {
            KeyAction::Stop
        } else if recording && self.confirm.contains(&byte) {
            KeyAction::Confirm
        } else {
            KeyAction::Ignored
        }
    }
}
