//! # Executor: one external process group and its parsed output.
//!
//! [`Executor`] runs `sh -c <command>` as the leader of a new process group so
//! stop/continue/terminate signals reach the whole pipeline, not just the shell.
//!
//! ## Output classification
//! ```text
//! stdout ──► first JSON value
//!              ├─ decode error ── format=Json ──────────────► Err(Decode)
//!              ├─ object/array ── format!=Text ─► structured:
//!              │                    object: strict Header? ──► store, skip outer '['
//!              │                    array : block list ──────► forward
//!              │                    then: [..] , [..] , ... ► forward each until EOF / ']'
//!              └─ otherwise ────────────────────► text: one block per line (format!=None)
//! ```
//!
//! ## Rules
//! - `wait` runs the underlying wait exactly once; later calls get the cached result.
//! - `signal` targets the process group and is a no-op before start or after exit.
//! - a structured stream closed with `]` terminates the group; plain EOF does not.
//! - stderr is forwarded line by line to the current tracing span at error level.

mod format;
mod reader;

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::OnceCell;
use tracing::{debug, error, Instrument};

pub use format::OutputFormat;

use crate::error::ExecError;
use crate::protocol::{Block, BlockSender, Header};
use reader::JsonStream;

/// Supervises one external command.
pub struct Executor {
    command: String,
    pending: Mutex<Option<Command>>,
    pid: OnceLock<i32>,
    child: Mutex<Option<Child>>,
    stdin: Mutex<Option<ChildStdin>>,
    stdout: Mutex<Option<ChildStdout>>,
    header: OnceLock<Header>,
    exit: OnceCell<Result<ExitStatus, Arc<std::io::Error>>>,
}

impl Executor {
    /// Prepares `sh -c <command>`; nothing runs until [`start`](Self::start) or [`run`](Self::run).
    pub fn new(command: impl Into<String>) -> Self {
        let command = command.into();
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .process_group(0);

        Self {
            command,
            pending: Mutex::new(Some(cmd)),
            pid: OnceLock::new(),
            child: Mutex::new(None),
            stdin: Mutex::new(None),
            stdout: Mutex::new(None),
            header: OnceLock::new(),
            exit: OnceCell::new(),
        }
    }

    fn configure(mut self, f: impl FnOnce(&mut Command)) -> Self {
        if let Some(cmd) = self.pending.get_mut().as_mut() {
            f(cmd);
        }
        self
    }

    /// Working directory for the process; empty paths are ignored.
    pub fn workdir(self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        if dir.as_os_str().is_empty() {
            return self;
        }
        self.configure(|cmd| {
            cmd.current_dir(dir);
        })
    }

    /// Adds environment variables on top of the inherited environment.
    pub fn envs<I, K, V>(self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<std::ffi::OsStr>,
        V: AsRef<std::ffi::OsStr>,
    {
        self.configure(|cmd| {
            cmd.envs(vars);
        })
    }

    /// Adds `KEY=VALUE` assignments; entries without `=` set an empty value.
    pub fn env_assignments(self, assignments: &[String]) -> Self {
        let pairs: Vec<(String, String)> = assignments
            .iter()
            .map(|a| match a.split_once('=') {
                Some((k, v)) => (k.to_string(), v.to_string()),
                None => (a.clone(), String::new()),
            })
            .collect();
        self.envs(pairs)
    }

    /// Gives the process a stdin pipe, retrievable once via [`stdin`](Self::stdin).
    pub fn piped_stdin(self) -> Self {
        self.configure(|cmd| {
            cmd.stdin(Stdio::piped());
        })
    }

    /// Header decoded from structured output, if the process sent one.
    pub fn header(&self) -> Option<Header> {
        self.header.get().copied()
    }

    /// Starts the process if it has not been started yet.
    pub fn start(&self) -> Result<(), ExecError> {
        let Some(mut cmd) = self.pending.lock().take() else {
            return Ok(());
        };
        let mut child = cmd.spawn().map_err(ExecError::Spawn)?;
        if let Some(pid) = child.id() {
            let _ = self.pid.set(pid as i32);
        }
        debug!(command = %self.command, pid = ?child.id(), "process started");

        *self.stdin.lock() = child.stdin.take();
        *self.stdout.lock() = child.stdout.take();
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(
                async move {
                    let mut lines = BufReader::new(stderr).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        error!("(stderr) {line}");
                    }
                }
                .in_current_span(),
            );
        }
        *self.child.lock() = Some(child);
        Ok(())
    }

    /// Takes the write side of the process's stdin, starting the process if needed.
    ///
    /// Returns `None` without [`piped_stdin`](Self::piped_stdin) or on a second call.
    pub fn stdin(&self) -> Result<Option<ChildStdin>, ExecError> {
        self.start()?;
        Ok(self.stdin.lock().take())
    }

    /// Runs the process to completion, forwarding parsed output to `out`.
    ///
    /// Returns after the process has exited. A nonzero exit status is not an
    /// error here; check [`exit_status`](Self::exit_status).
    pub async fn run(&self, out: &BlockSender, format: OutputFormat) -> Result<(), ExecError> {
        self.start()?;
        if self.pid.get().is_none() {
            return Err(ExecError::NotStarted);
        }
        let stdout = self.stdout.lock().take().ok_or(ExecError::AlreadyRunning)?;

        let res = self.read_output(stdout, out, format).await;
        if res.is_err() {
            let _ = self.signal(libc::SIGTERM);
        }
        let waited = self.wait().await;
        res.and(waited.map(|_| ()))
    }

    async fn read_output(
        &self,
        mut stdout: ChildStdout,
        out: &BlockSender,
        format: OutputFormat,
    ) -> Result<(), ExecError> {
        if format == OutputFormat::None {
            tokio::io::copy(&mut stdout, &mut tokio::io::sink()).await?;
            return Ok(());
        }

        let mut stream = JsonStream::new(stdout);
        let first = match stream.next_value::<Value>().await {
            Ok(Some(v)) => Some(v),
            Ok(None) => return Ok(()),
            Err(e) if format == OutputFormat::Json => return Err(e),
            Err(_) => None,
        };

        match first {
            Some(v @ (Value::Object(_) | Value::Array(_))) if format != OutputFormat::Text => {
                self.stream_blocks(stream, v, out).await
            }
            _ => {
                let text = stream.into_text().await?;
                if let Some(blocks) = text_blocks(&text) {
                    send(out, blocks).await?;
                }
                Ok(())
            }
        }
    }

    async fn stream_blocks<R: AsyncRead + Unpin>(
        &self,
        mut stream: JsonStream<R>,
        first: Value,
        out: &BlockSender,
    ) -> Result<(), ExecError> {
        stream.compact();
        match first {
            Value::Object(_) => match serde_json::from_value::<Header>(first.clone()) {
                Ok(header) => {
                    let _ = self.header.set(header);
                    stream.skip_outer_bracket().await?;
                }
                Err(_) => return Err(ExecError::UnexpectedValue(first.to_string())),
            },
            list => send(out, serde_json::from_value(list)?).await?,
        }

        loop {
            match stream.peek_skipping(b",").await? {
                None => return Ok(()),
                Some(b']') => {
                    debug!("stream closed, terminating");
                    return self.signal(libc::SIGTERM);
                }
                Some(_) => {}
            }
            match stream.next_value::<Vec<Block>>().await {
                Ok(Some(blocks)) => {
                    stream.compact();
                    send(out, blocks).await?;
                }
                Ok(None) => return Ok(()),
                Err(_) if self.exited() => return Ok(()),
                Err(e) => return Err(e),
            }
        }
    }

    /// Delivers `sig` to the whole process group.
    pub fn signal(&self, sig: i32) -> Result<(), ExecError> {
        let Some(&pid) = self.pid.get() else {
            return Ok(());
        };
        if pid <= 1 || self.exited() {
            return Ok(());
        }
        // SAFETY: kill(2) takes plain integers; a negative pid addresses the group.
        let rc = unsafe { libc::kill(-pid, sig) };
        if rc == -1 {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() == Some(libc::ESRCH) {
                return Ok(());
            }
            return Err(ExecError::Io(err));
        }
        Ok(())
    }

    /// Terminates the process group and waits for the shell to exit.
    ///
    /// A stopped group is continued after SIGTERM so it can act on it.
    pub async fn shutdown(&self) -> Result<(), ExecError> {
        if self.pid.get().is_none() {
            return Ok(());
        }
        self.signal(libc::SIGTERM)?;
        self.signal(libc::SIGCONT)?;
        self.wait().await.map(|_| ())
    }

    /// Waits for exit once; every later call returns the cached result.
    pub async fn wait(&self) -> Result<ExitStatus, ExecError> {
        if self.pid.get().is_none() {
            return Err(ExecError::NotStarted);
        }
        let res = self
            .exit
            .get_or_init(|| async {
                let child = self.child.lock().take();
                match child {
                    Some(mut child) => child.wait().await.map_err(Arc::new),
                    None => Err(Arc::new(std::io::Error::other("process handle missing"))),
                }
            })
            .await;
        res.clone().map_err(ExecError::Wait)
    }

    /// Exit status, if the process has been waited for.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.exit.get().and_then(|r| r.as_ref().ok().copied())
    }

    fn exited(&self) -> bool {
        self.exit.initialized()
    }
}

async fn send(out: &BlockSender, blocks: Vec<Block>) -> Result<(), ExecError> {
    out.send(blocks).await.map_err(|_| ExecError::OutputClosed)
}

/// One block per line of `text`, or `None` when there is nothing visible.
fn text_blocks(text: &str) -> Option<Vec<Block>> {
    let text = text.trim_matches(|c| c == '\n' || c == '\r');
    if text.trim().is_empty() {
        return None;
    }
    Some(
        text.lines()
            .map(|line| Block::text(line.trim_matches(|c| c == ' ' || c == '\r')))
            .collect(),
    )
}
