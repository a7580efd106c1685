use std::{io, path::PathBuf};

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    #[error("failed to read config {}", path.display())]
    ConfigRead { source: io::Error, path: PathBuf },
    #[error("toml parsing failed")]
    Toml(#[from] toml::de::Error),
    #[error("profile \"{0}\" not found")]
    #[diagnostic(help = "built-in profiles are `video` and `av`")]
    UnknownProfile(String),
    #[error("encoder binary not found")]
    #[diagnostic(
        help = "install ffmpeg, put it on PATH, or pass --encoder <path>",
        code = "screencap::encoder_not_found"
    )]
    EncoderNotFound,
    #[error("terminal error: {0}")]
    Terminal(io::Error),
}

#[derive(Error, Diagnostic, Debug)]
pub enum ProcessError {
    #[error("error while running `{cmd}` for the {phase} phase")]
    #[diagnostic(
        help = "try checking the encoder path and arguments",
        code = "screencap::spawn_error"
    )]
    Spawn {
        source: io::Error,
        cmd: String,
        phase: &'static str,
    },
    #[error("process missing stdin")]
    ProcessMissingStdin,
    #[error("process missing stderr")]
    ProcessMissingStderr,
}
