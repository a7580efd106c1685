use std::{
    ffi::OsString,
    io::{self, Write},
    path::PathBuf,
    process::ExitStatus,
};

use nu_ansi_term::Color;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::{
    capture::SessionConfig,
    error::ProcessError,
    keys::KeyAction,
    process::{EncoderProcess, Launcher, exit_code},
    profile::Profile,
    prompt::Prompter,
    ui,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    AwaitingStart,
    Recording,
    Stopping,
    Remuxing,
    Exited(i32),
}

enum Event {
    Exited(io::Result<ExitStatus>),
    Key(Option<u8>),
}

/// Drives one capture session: prompts, the capture process, then the
/// optional remux pass. At most one encoder process is active at a time.
pub struct Session<L, W> {
    profile: Profile,
    launcher: L,
    media_dir: PathBuf,
    out: W,
    state: State,
    active: Option<EncoderProcess>,
}

impl<L: Launcher, W: Write> Session<L, W> {
    pub fn new(profile: Profile, launcher: L, media_dir: PathBuf, out: W) -> Self {
        Self {
            profile,
            launcher,
            media_dir,
            out,
            state: State::Idle,
            active: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    fn transition(&mut self, next: State) {
        debug!(from = ?self.state, to = ?next, "session transition");
        self.state = next;
    }

    /// Runs the whole session and returns the process exit code.
    pub async fn run(&mut self, keys: &mut mpsc::Receiver<u8>) -> i32 {
        self.transition(State::AwaitingStart);
        if let Err(err) = ui::intro(&mut self.out, &self.profile) {
            warn!(?err, "failed to write intro");
        }

        let collected = Prompter::new(keys, &self.profile.keys, &mut self.out)
            .collect(&self.profile, &self.media_dir)
            .await;
        let config = match collected {
            Ok(Some(config)) => config,
            Ok(None) => return self.exit(0),
            Err(err) => {
                error!(?err, "prompt failed");
                return self.exit(1);
            }
        };
        info!(?config, "session configured");

        let code = self.capture(&config, keys).await;
        if code != 0 {
            remove_temp(&config).await;
            self.report(&config, code);
            return self.exit(code);
        }

        let Some(args) = config.remux_args() else {
            self.report(&config, code);
            return self.exit(code);
        };
        let code = self.remux(args, keys).await;
        remove_temp(&config).await;
        self.report(&config, code);
        self.exit(code)
    }

    async fn capture(&mut self, config: &SessionConfig, keys: &mut mpsc::Receiver<u8>) -> i32 {
        let args = config.capture_args();
        info!(?args, "starting capture");
        discard_pending(keys);
        if let Err(err) = self.start(&args, "capture") {
            return self.fatal(err);
        }
        self.transition(State::Recording);
        let hint = ui::stop_hint(&self.profile.keys);
        if let Err(err) = ui::header(&mut self.out, format!("Recording, {hint}"), Color::Red) {
            warn!(?err, "failed to write header");
        }
        self.wait_active(keys).await
    }

    async fn remux(&mut self, args: Vec<OsString>, keys: &mut mpsc::Receiver<u8>) -> i32 {
        self.transition(State::Remuxing);
        info!(?args, "starting remux");
        discard_pending(keys);
        if let Err(err) = self.start(&args, "remux") {
            return self.fatal(err);
        }
        self.wait_active(keys).await
    }

    fn start(&mut self, args: &[OsString], phase: &'static str) -> Result<(), ProcessError> {
        let process = EncoderProcess::spawn(&self.launcher, args, phase)?;
        debug!(pid = ?process.id(), phase, "encoder started");
        self.active = Some(process);
        Ok(())
    }

    /// Reacts to keys until the active process exits, then releases it.
    async fn wait_active(&mut self, keys: &mut mpsc::Receiver<u8>) -> i32 {
        let mut keys_open = true;
        let status = loop {
            let Some(process) = self.active.as_mut() else {
                break Err(io::Error::other("no active encoder"));
            };
            let event = tokio::select! {
                status = process.wait() => Event::Exited(status),
                key = keys.recv(), if keys_open => Event::Key(key),
            };
            match event {
                Event::Exited(status) => break status,
                Event::Key(None) => keys_open = false,
                Event::Key(Some(byte)) => {
                    self.handle_key(byte).await;
                }
            }
        };
        if let Some(process) = self.active.take() {
            process.finish().await;
        }
        match status {
            Ok(status) => {
                debug!(?status, "encoder exited");
                exit_code(&status)
            }
            Err(err) => {
                error!(?err, "failed to wait for encoder");
                1
            }
        }
    }

    /// Applies a keystroke to the active encoder. Without one every key is ignored.
    pub async fn handle_key(&mut self, byte: u8) -> KeyAction {
        let Some(process) = self.active.as_mut() else {
            return KeyAction::Ignored;
        };
        let action = self.profile.keys.classify(byte, true);
        let res = match action {
            KeyAction::Stop if matches!(self.state, State::Recording | State::Stopping) => {
                process.send(self.profile.stop_command.as_bytes()).await
            }
            KeyAction::Confirm => process.send(&[byte]).await,
            _ => return KeyAction::Ignored,
        };
        if let Err(err) = res {
            warn!(?err, "failed to write to encoder stdin");
        }
        if action == KeyAction::Stop {
            self.transition(State::Stopping);
        }
        action
    }

    fn fatal(&mut self, err: ProcessError) -> i32 {
        error!(%err, "cannot initialize encoder");
        eprint!("Cannot initialize the encoder correctly: {err}\r\n");
        1
    }

    fn report(&mut self, config: &SessionConfig, code: i32) {
        let res = if code == 0 {
            ui::header(
                &mut self.out,
                format!("Saved {}", config.output.display()),
                Color::Green,
            )
        } else {
            ui::header(
                &mut self.out,
                format!("Encoder exited with code {code}"),
                Color::Red,
            )
        };
        if let Err(err) = res {
            warn!(?err, "failed to write header");
        }
    }

    fn exit(&mut self, code: i32) -> i32 {
        self.transition(State::Exited(code));
        code
    }
}

/// Drops keys typed while no encoder was running. They never reach the next one.
fn discard_pending(keys: &mut mpsc::Receiver<u8>) {
    let mut dropped = 0;
    while keys.try_recv().is_ok() {
        dropped += 1;
    }
    if dropped > 0 {
        debug!(dropped, "discarded keys typed before the encoder started");
    }
}

/// Deletes the intermediate file. Failures never change the exit code.
async fn remove_temp(config: &SessionConfig) {
    let Some(temp) = &config.temp else {
        return;
    };
    if let Err(err) = tokio::fs::remove_file(temp).await {
        warn!(?err, path = %temp.display(), "failed to remove intermediate file");
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::keys::START;
    use std::process::Stdio;
    use tokio::process::{Child, Command};

    struct Sh(&'static str);

    impl Launcher for Sh {
        fn program(&self) -> String {
            "sh".to_string()
        }

        fn launch(&self, _args: &[OsString]) -> io::Result<Child> {
            Command::new("sh")
                .args(["-c", self.0])
                .stdin(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()
        }
    }

    fn session(script: &'static str) -> Session<Sh, io::Sink> {
        Session::new(
            Profile::video(),
            Sh(script),
            PathBuf::from("/tmp"),
            io::sink(),
        )
    }

    #[tokio::test]
    async fn keys_without_process_are_ignored() {
        let mut session = session("exit 0");
        assert_eq!(session.handle_key(b' ').await, KeyAction::Ignored);
        assert_eq!(session.handle_key(b'y').await, KeyAction::Ignored);
        assert_eq!(session.state(), State::Idle);
    }

    #[tokio::test]
    async fn stop_moves_to_stopping() {
        let mut session = session("read cmd; exit 0");
        session.start(&[], "capture").unwrap();
        session.transition(State::Recording);
        assert_eq!(session.handle_key(b'x').await, KeyAction::Ignored);
        assert_eq!(session.state(), State::Recording);
        assert_eq!(session.handle_key(b'q').await, KeyAction::Stop);
        assert_eq!(session.state(), State::Stopping);
        let (_tx, mut rx) = mpsc::channel(1);
        assert_eq!(session.wait_active(&mut rx).await, 0);
        assert!(session.active.is_none());
    }

    #[tokio::test]
    async fn confirm_is_forwarded_verbatim() {
        for state in [State::Recording, State::Stopping] {
            let mut session = session(r#"c=$(head -c 1); [ "$c" = Y ] && exit 0; exit 6"#);
            session.start(&[], "capture").unwrap();
            session.transition(state);
            assert_eq!(session.handle_key(b'Y').await, KeyAction::Confirm);
            let (_tx, mut rx) = mpsc::channel(1);
            assert_eq!(session.wait_active(&mut rx).await, 0, "state {state:?}");
        }
    }

    #[tokio::test]
    async fn keys_typed_before_spawn_are_discarded() {
        let (tx, mut rx) = mpsc::channel(4);
        tx.send(b' ').await.unwrap();
        tx.send(b'y').await.unwrap();
        discard_pending(&mut rx);
        assert!(rx.try_recv().is_err());
        tx.send(b'q').await.unwrap();
        assert_eq!(rx.recv().await, Some(b'q'));
    }

    #[tokio::test]
    async fn stop_is_ignored_while_remuxing() {
        let mut session = session("head -c 1 >/dev/null; exit 0");
        session.start(&[], "remux").unwrap();
        session.transition(State::Remuxing);
        assert_eq!(session.handle_key(b' ').await, KeyAction::Ignored);
        assert_eq!(session.handle_key(b'Y').await, KeyAction::Confirm);
        let (_tx, mut rx) = mpsc::channel(1);
        assert_eq!(session.wait_active(&mut rx).await, 0);
    }

    #[tokio::test]
    async fn nonzero_capture_is_propagated() {
        let mut session = session("exit 7");
        let (tx, mut rx) = mpsc::channel(4);
        tx.send(START).await.unwrap();
        assert_eq!(session.run(&mut rx).await, 7);
        assert_eq!(session.state(), State::Exited(7));
    }

    #[tokio::test]
    async fn quit_before_recording() {
        let mut session = session("exit 7");
        let (tx, mut rx) = mpsc::channel(4);
        tx.send(0x03).await.unwrap();
        assert_eq!(session.run(&mut rx).await, 0);
        assert_eq!(session.state(), State::Exited(0));
    }
}
