use std::io::{self, IsTerminal, Read};

use tokio::sync::mpsc;

use crate::error::Error;

/// Process-wide raw mode. Enabled once at startup and restored only by
/// [`Terminal::exit`], the single way this program ends a session.
pub struct Terminal {
    raw: bool,
}

impl Terminal {
    pub fn enable() -> Result<Self, Error> {
        let raw = io::stdin().is_terminal();
        if raw {
            crossterm::terminal::enable_raw_mode().map_err(Error::Terminal)?;
        } else {
            tracing::warn!("stdin is not a terminal, keys are read line buffered");
        }
        Ok(Self { raw })
    }

    pub fn exit(self, code: i32) -> ! {
        if self.raw {
            let _ = crossterm::terminal::disable_raw_mode();
        }
        std::process::exit(code)
    }
}

/// Reads stdin byte by byte on a dedicated thread. The channel closes when
/// stdin reaches EOF.
pub fn spawn_key_reader() -> mpsc::Receiver<u8> {
    let (tx, rx) = mpsc::channel(64);
    std::thread::spawn(move || {
        let mut stdin = io::stdin().lock();
        let mut buf = [0u8; 64];
        loop {
            match stdin.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    for &byte in &buf[..n] {
                        if tx.blocking_send(byte).is_err() {
                            return;
                        }
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    tracing::debug!(?err, "stdin read failed");
                    break;
                }
            }
        }
    });
    rx
}
