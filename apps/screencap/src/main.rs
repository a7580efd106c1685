use std::{io, path::PathBuf};

use clap::Parser;
use screencap::{config::Config, output, process::Encoder, session::Session, term};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Session profile, `av` or `video` unless the config adds more
    #[arg(short, long)]
    profile: Option<String>,
    /// Encoder binary, defaults to `ffmpeg` on PATH
    #[arg(short, long)]
    encoder: Option<PathBuf>,
    /// Path to the config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> miette::Result<()> {
    let _ = tracing_subscriber::fmt::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive("warn".parse().expect("invalid filter"))
                .from_env_lossy(),
        )
        .try_init();

    let args = Cli::parse();
    let config = Config::load(args.config)?;
    let profile = config.profile(args.profile.as_deref())?;
    let encoder = Encoder::new(config.encoder(args.encoder)?);

    let terminal = term::Terminal::enable()?;
    let mut keys = term::spawn_key_reader();
    let mut session = Session::new(profile, encoder, output::media_dir(), io::stdout());
    let code = session.run(&mut keys).await;
    terminal.exit(code)
}
