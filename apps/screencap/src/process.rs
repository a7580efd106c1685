use std::{
    ffi::OsString,
    io,
    path::PathBuf,
    process::{ExitStatus, Stdio},
};

use tokio::{
    io::AsyncWriteExt,
    process::{Child, ChildStdin, Command},
    task::JoinHandle,
};

use crate::error::ProcessError;

/// Starts encoder processes from an argument vector.
pub trait Launcher {
    fn program(&self) -> String;
    fn launch(&self, args: &[OsString]) -> io::Result<Child>;
}

impl<T: Launcher + ?Sized> Launcher for &T {
    fn program(&self) -> String {
        (**self).program()
    }

    fn launch(&self, args: &[OsString]) -> io::Result<Child> {
        (**self).launch(args)
    }
}

/// Runs the encoder binary with piped stdin and stderr.
#[derive(Debug, Clone)]
pub struct Encoder {
    pub path: PathBuf,
}

impl Encoder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Launcher for Encoder {
    fn program(&self) -> String {
        self.path.display().to_string()
    }

    fn launch(&self, args: &[OsString]) -> io::Result<Child> {
        Command::new(&self.path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
    }
}

/// A running encoder: its stdin for textual commands and a task copying
/// its stderr to ours.
#[derive(Debug)]
pub struct EncoderProcess {
    child: Child,
    stdin: ChildStdin,
    forward: JoinHandle<io::Result<u64>>,
}

impl EncoderProcess {
    pub fn spawn(
        launcher: &impl Launcher,
        args: &[OsString],
        phase: &'static str,
    ) -> Result<Self, ProcessError> {
        let child = launcher
            .launch(args)
            .map_err(|source| ProcessError::Spawn {
                source,
                cmd: launcher.program(),
                phase,
            })?;
        Self::attach(child)
    }

    /// Takes ownership of the child's streams. Missing streams are fatal.
    pub fn attach(mut child: Child) -> Result<Self, ProcessError> {
        let stdin = child
            .stdin
            .take()
            .ok_or(ProcessError::ProcessMissingStdin)?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or(ProcessError::ProcessMissingStderr)?;
        let forward = tokio::spawn(async move {
            let mut out = tokio::io::stderr();
            tokio::io::copy(&mut stderr, &mut out).await
        });
        Ok(Self {
            child,
            stdin,
            forward,
        })
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Writes `bytes` to the encoder's stdin verbatim.
    pub async fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stdin.write_all(bytes).await?;
        self.stdin.flush().await
    }

    /// Waits for exit. Cancel safe.
    pub async fn wait(&mut self) -> io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// Waits for the stderr copy to drain once the process has exited.
    pub async fn finish(self) {
        drop(self.stdin);
        match self.forward.await {
            Ok(Err(err)) => tracing::debug!(?err, "stderr forwarding stopped"),
            Err(err) => tracing::debug!(?err, "stderr forwarding task failed"),
            Ok(Ok(_)) => {}
        }
    }
}

/// Exit code of a finished process, `1` when there is none.
pub fn exit_code(status: &ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
