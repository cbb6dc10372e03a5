//! # `exec` widget: runs a command and shows its output.
//!
//! ```text
//! start ──► run ──► wait for trigger ──► (paused? wait for resume) ──► run ──► ...
//!                     ├─ interval tick
//!                     ├─ SIGRTMIN+signal
//!                     ├─ click (events_update)
//!                     └─ shutdown ──► return
//! ```
//!
//! A command with no trigger runs once. With `retry`, a failed one-shot run is
//! repeated after an exponential backoff starting at `retry` seconds.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::json;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::{watch, Notify};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{Widget, WidgetDescriptor, WidgetRef, WidgetSpec};
use crate::error::WidgetError;
use crate::executor::{Executor, OutputFormat};
use crate::policies::BackoffPolicy;
use crate::protocol::{Block, BlockSender, ClickEvent};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExecParams {
    command: String,
    /// Seconds between runs; 0 disables ticking.
    #[serde(default)]
    interval: u64,
    /// Seconds before retrying a failed one-shot run.
    #[serde(default)]
    retry: Option<u64>,
    #[serde(default)]
    events_update: bool,
    /// Offset from SIGRTMIN that triggers a run.
    #[serde(default)]
    signal: Option<i32>,
    #[serde(default)]
    output_format: OutputFormat,
    #[serde(default)]
    workdir: String,
    #[serde(default)]
    env: Vec<String>,
}

pub struct ExecWidget {
    command: String,
    interval: Option<Duration>,
    retry: Option<BackoffPolicy>,
    events_update: bool,
    signal: Option<i32>,
    format: OutputFormat,
    workdir: PathBuf,
    env: Vec<String>,

    update: Notify,
    paused: watch::Sender<bool>,
    running: Mutex<Option<Arc<Executor>>>,
    token: CancellationToken,
}

pub(super) fn descriptor() -> WidgetDescriptor {
    WidgetDescriptor::new(
        "exec",
        json!({"interval": 0, "events_update": false, "output_format": "auto"}),
        build,
    )
}

fn build(p: ExecParams, spec: &WidgetSpec) -> Result<WidgetRef, WidgetError> {
    if p.command.trim().is_empty() {
        return Err(WidgetError::Config("missing 'command'".into()));
    }
    let signal = match p.signal {
        Some(n) => {
            let (min, max) = (libc::SIGRTMIN(), libc::SIGRTMAX());
            match min.checked_add(n).filter(|s| n >= 0 && *s <= max) {
                Some(sig) => Some(sig),
                None => {
                    return Err(WidgetError::Config(format!(
                        "signal should be between 0 and {}",
                        max - min
                    )))
                }
            }
        }
        None => None,
    };
    let workdir = if p.workdir.is_empty() {
        spec.workdir.clone()
    } else {
        spec.workdir.join(&p.workdir)
    };

    Ok(Arc::new(ExecWidget {
        command: p.command,
        interval: (p.interval > 0).then(|| Duration::from_secs(p.interval)),
        retry: p
            .retry
            .filter(|s| *s > 0)
            .map(|s| BackoffPolicy::starting_at(Duration::from_secs(s))),
        events_update: p.events_update,
        signal,
        format: p.output_format,
        workdir,
        env: p.env,
        update: Notify::new(),
        paused: watch::Sender::new(false),
        running: Mutex::new(None),
        token: CancellationToken::new(),
    }))
}

impl ExecWidget {
    fn one_shot(&self) -> bool {
        self.interval.is_none() && self.signal.is_none() && !self.events_update
    }

    async fn run_once(&self, out: &BlockSender) -> Result<(), WidgetError> {
        let exc = Arc::new(
            Executor::new(&self.command)
                .workdir(&self.workdir)
                .env_assignments(&self.env),
        );
        {
            let mut running = self.running.lock();
            if self.token.is_cancelled() {
                return Ok(());
            }
            exc.start()?;
            *running = Some(Arc::clone(&exc));
        }
        let res = exc.run(out, self.format).await;
        *self.running.lock() = None;
        res?;

        match exc.exit_status() {
            Some(status) if !status.success() => Err(WidgetError::Failed(format!(
                "process exited unexpectedly: {status}"
            ))),
            _ => Ok(()),
        }
    }

    fn signal_running(&self, sig: i32) -> Result<(), WidgetError> {
        let running = self.running.lock().clone();
        if let Some(exc) = running {
            exc.signal(sig)?;
        }
        Ok(())
    }
}

#[async_trait]
impl Widget for ExecWidget {
    async fn produce(&self, out: BlockSender) -> Result<(), WidgetError> {
        let mut ticker = self.interval.map(|period| {
            let mut t = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            t.set_missed_tick_behavior(MissedTickBehavior::Delay);
            t
        });
        let mut rt_signal = match self.signal {
            Some(sig) => Some(signal(SignalKind::from_raw(sig)).map_err(|e| {
                WidgetError::Failed(format!("failed to listen for signal {sig}: {e}"))
            })?),
            None => None,
        };
        let mut paused = self.paused.subscribe();
        let mut attempt = 0u32;

        loop {
            let res = self.run_once(&out).await;
            if self.token.is_cancelled() {
                return Ok(());
            }

            if self.one_shot() {
                match (res, self.retry) {
                    (Ok(()), _) => return Ok(()),
                    (Err(e), Some(backoff)) => {
                        let delay = backoff.next(attempt);
                        attempt = attempt.saturating_add(1);
                        warn!(error = %e, ?delay, "command failed, retrying");
                        if out.send(vec![Block::error(e.to_string())]).await.is_err() {
                            return Ok(());
                        }
                        tokio::select! {
                            _ = self.token.cancelled() => return Ok(()),
                            _ = tokio::time::sleep(delay) => continue,
                        }
                    }
                    (Err(e), None) => return Err(e),
                }
            }

            if let Err(e) = res {
                debug!(error = %e, label = e.as_label(), "command failed");
                if out.send(vec![Block::error(e.to_string())]).await.is_err() {
                    return Ok(());
                }
            }

            tokio::select! {
                _ = self.token.cancelled() => return Ok(()),
                _ = async {
                    match ticker.as_mut() {
                        Some(t) => { t.tick().await; }
                        None => std::future::pending::<()>().await,
                    }
                } => {}
                _ = async {
                    match rt_signal.as_mut() {
                        Some(s) => { s.recv().await; }
                        None => std::future::pending::<()>().await,
                    }
                } => {}
                _ = self.update.notified() => {}
            }

            tokio::select! {
                _ = self.token.cancelled() => return Ok(()),
                _ = async {
                    let _ = paused.wait_for(|p| !*p).await;
                } => {}
            }
        }
    }

    async fn event(&self, _event: &ClickEvent, _blocks: &[Block]) -> Result<(), WidgetError> {
        if self.events_update {
            self.update.notify_one();
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), WidgetError> {
        self.paused.send_replace(true);
        self.signal_running(libc::SIGSTOP)
    }

    async fn resume(&self) -> Result<(), WidgetError> {
        self.paused.send_replace(false);
        self.signal_running(libc::SIGCONT)
    }

    async fn shutdown(&self) -> Result<(), WidgetError> {
        self.token.cancel();
        let running = self.running.lock().clone();
        if let Some(exc) = running {
            exc.shutdown().await?;
        }
        Ok(())
    }
}
