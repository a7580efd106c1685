use std::{
    fmt::Display,
    io::{self, Write},
};

use nu_ansi_term::{Color, Style};

use crate::{keys::KeyMap, profile::Profile};

// Raw mode does not translate `\n`, so every line ends in CRLF.
const NEWLINE: &str = "\r\n";

fn divider_line(color: Color) -> String {
    color.paint("▌").to_string()
}

pub fn header(out: &mut impl Write, text: impl Display, color: Color) -> io::Result<()> {
    write!(
        out,
        "{}{}{NEWLINE}",
        divider_line(color),
        Style::new()
            .bold()
            .on(color)
            .fg(Color::Black)
            .paint(format!(" {text} "))
    )?;
    out.flush()
}

pub fn intro(out: &mut impl Write, profile: &Profile) -> io::Result<()> {
    write!(out, "{NEWLINE}")?;
    header(out, "Screen capture", Color::Purple)?;
    write!(
        out,
        "This program starts a capture with custom settings using the encoder.{NEWLINE}"
    )?;
    write!(
        out,
        "Press {} at any time to quit or {} to start the recording.{NEWLINE}{NEWLINE}",
        key_name(profile.keys.quit),
        key_name(profile.keys.start)
    )?;
    out.flush()
}

pub fn stop_hint(keys: &KeyMap) -> String {
    let mut names: Vec<_> = keys.stop.iter().map(|&b| key_name(b)).collect();
    names.dedup();
    format!("press {} to stop", names.join(", "))
}

pub fn key_name(byte: u8) -> String {
    match byte {
        b' ' => "Space".to_string(),
        b'\r' | b'\n' => "Enter".to_string(),
        0x01..=0x1a => format!("^{}", (b'A' + byte - 1) as char),
        0x21..=0x7e => (byte as char).to_string(),
        _ => format!("0x{byte:02x}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{QUIT, START};

    #[test]
    fn key_names() {
        assert_eq!(key_name(START), "^S");
        assert_eq!(key_name(QUIT), "^C");
        assert_eq!(key_name(0x04), "^D");
        assert_eq!(key_name(b'q'), "q");
        assert_eq!(key_name(0x7f), "0x7f");
    }

    #[test]
    fn stop_hint_lists_keys() {
        assert_eq!(
            stop_hint(&KeyMap::default()),
            "press ^D, Space, Enter to stop"
        );
    }

    #[test]
    fn header_ends_with_crlf() {
        let mut out = vec![];
        header(&mut out, "Saved", Color::Green).unwrap();
        assert!(out.ends_with(b"\r\n"));
    }
}
