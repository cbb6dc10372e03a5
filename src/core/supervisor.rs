//! # Supervisor: runs widgets, aggregates their output, routes clicks.
//!
//! ```text
//! widget[0].produce ──► queue(1) ─┐
//! widget[1].produce ──► queue(1) ─┼─► fan-in ──► aggregator ──► StatusWriter ──► stdout
//! widget[N].produce ──► queue(1) ─┘   (w, blocks)   │  overlay + rename
//!                          ▲                        │  publish (write lock)
//!                          │                        │  render visible widgets in order
//!                          │          set_labels ───┘
//!                          │
//! stdin ──► input reader ──► dispatch::route ──► widget.event / binding commands
//!
//! SIGUSR1/SIGCONT ──► stop_all / resume_all
//! SIGINT/SIGTERM/SIGQUIT, stdin EOF ──► shutdown(): widget.shutdown() ×N (bounded)
//!                                         └─► runtime token cancelled
//! ```
//!
//! ## Rules
//! - Each widget's `produce` is called once; nothing is restarted.
//! - A failing or panicking widget only affects its own slot.
//! - The stream header is written before any widget runs.

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};

use super::config::SupervisorConfig;
use super::conditions::visible;
use super::dispatch;
use super::fanin::{fan_in, FanIn};
use super::guard::{isolate, PANIC_TEXT};
use super::instance::WidgetInstance;
use super::shutdown;
use super::state::WidgetState;
use crate::error::RuntimeError;
use crate::protocol::{parse_line, Block, BlockReceiver, Header, StatusWriter};

/// Owns the widget instances and drives the status stream.
pub struct Supervisor {
    cfg: SupervisorConfig,
    widgets: Vec<Arc<WidgetInstance>>,
    receivers: Mutex<Option<Vec<BlockReceiver>>>,
    labels: watch::Sender<HashSet<String>>,
    producers: Mutex<Vec<JoinHandle<()>>>,
    token: CancellationToken,
    shut_down: AtomicBool,
}

impl Supervisor {
    pub(crate) fn new_internal(
        cfg: SupervisorConfig,
        widgets: Vec<(WidgetInstance, BlockReceiver)>,
    ) -> Arc<Self> {
        let (widgets, receivers): (Vec<_>, Vec<_>) = widgets
            .into_iter()
            .map(|(inst, rx)| (Arc::new(inst), rx))
            .unzip();
        Arc::new(Self {
            cfg,
            widgets,
            receivers: Mutex::new(Some(receivers)),
            labels: watch::Sender::new(HashSet::new()),
            producers: Mutex::new(Vec::new()),
            token: CancellationToken::new(),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Number of widget slots.
    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Replaces the active visibility labels and re-renders the bar.
    pub fn set_labels<I, S>(&self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels
            .send_replace(labels.into_iter().map(Into::into).collect());
    }

    /// Lifecycle state of every widget, in bar order.
    pub fn states(&self) -> Vec<WidgetState> {
        self.widgets.iter().map(|w| w.state()).collect()
    }

    /// Runs on stdin/stdout until a termination signal or end of input.
    ///
    /// The configured stop/continue signals pause and resume every widget.
    pub async fn run(self: &Arc<Self>) -> Result<(), RuntimeError> {
        let mut control = shutdown::ControlSignals::new(self.cfg.stop_signal, self.cfg.cont_signal)?;
        let me = Arc::clone(self);
        let token = self.token.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => return,
                    sig = control.recv() => match sig {
                        Some(shutdown::Control::Stop) => me.stop_all().await,
                        Some(shutdown::Control::Resume) => me.resume_all().await,
                        None => return,
                    },
                }
            }
        });

        let signalled = async {
            if let Err(e) = shutdown::wait_for_shutdown_signal().await {
                error!(error = %e, "failed to listen for termination signals");
                std::future::pending::<()>().await;
            }
        };
        self.run_with(tokio::io::stdin(), tokio::io::stdout(), signalled)
            .await
    }

    /// Runs against arbitrary transports until `stop` completes or `input` ends.
    ///
    /// Shuts every widget down before returning; a shutdown timeout is
    /// reported as [`RuntimeError::ShutdownTimedOut`].
    pub async fn run_with<R, W, F>(
        self: &Arc<Self>,
        input: R,
        output: W,
        stop: F,
    ) -> Result<(), RuntimeError>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
        F: Future<Output = ()>,
    {
        let receivers = self
            .receivers
            .lock()
            .take()
            .ok_or(RuntimeError::AlreadyStarted)?;

        let mut writer = StatusWriter::new(output);
        writer
            .begin(&Header::new(self.cfg.stop_signal, self.cfg.cont_signal))
            .await?;
        info!(widgets = self.len(), "status stream started");

        let aggregator = tokio::spawn(Arc::clone(self).aggregate(fan_in(receivers), writer));
        self.spawn_producers();
        let input_done = CancellationToken::new();
        tokio::spawn(Arc::clone(self).read_events(input, input_done.clone()));

        tokio::select! {
            _ = stop => info!("termination requested"),
            _ = input_done.cancelled() => info!("event input closed"),
            _ = self.token.cancelled() => {}
        }

        let res = self.shutdown().await;
        match aggregator.await {
            Ok(Err(e)) => {
                error!(error = %e, "status stream failed");
                return Err(e.into());
            }
            Err(e) => error!(error = %e, "aggregator task failed"),
            Ok(Ok(())) => {}
        }
        res
    }

    fn spawn_producers(&self) {
        let mut handles = self.producers.lock();
        for inst in &self.widgets {
            let inst = Arc::clone(inst);
            let span = inst.span.clone();
            handles.push(tokio::spawn(
                async move {
                    inst.set_state(WidgetState::Running);
                    debug!("widget started");
                    let failure = match isolate(inst.widget.produce(inst.tx.clone())).await {
                        Ok(Ok(())) => None,
                        Ok(Err(e)) => {
                            error!(error = %e, label = e.as_label(), "widget failed");
                            Some(e.to_string())
                        }
                        Err(panic) => {
                            error!(panic = %panic, "widget panicked");
                            Some(PANIC_TEXT.to_string())
                        }
                    };
                    inst.set_state(WidgetState::Terminated);
                    if let Some(text) = failure {
                        let _ = inst.tx.send(vec![Block::error(text)]).await;
                    }
                    debug!("widget finished");
                }
                .instrument(span),
            ));
        }
    }

    async fn aggregate<W>(self: Arc<Self>, mut input: FanIn, mut writer: StatusWriter<W>) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let mut labels = self.labels.subscribe();
        loop {
            tokio::select! {
                _ = self.token.cancelled() => return Ok(()),
                item = input.next() => match item {
                    Some((w, blocks)) => self.widgets[w].publish(blocks).await,
                    None => {
                        self.token.cancelled().await;
                        return Ok(());
                    }
                },
                changed = labels.changed() => {
                    if changed.is_err() {
                        return Ok(());
                    }
                }
            }
            let active = labels.borrow_and_update().clone();
            writer.update(&self.render(&active).await).await?;
        }
    }

    async fn render(&self, active: &HashSet<String>) -> Vec<Block> {
        let mut all = Vec::new();
        for inst in &self.widgets {
            if visible(&inst.spec.labels, active) {
                all.extend(inst.output.read().await.iter().cloned());
            }
        }
        all
    }

    async fn read_events<R>(self: Arc<Self>, input: R, done: CancellationToken)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let mut lines = BufReader::new(input).lines();
        loop {
            let line = tokio::select! {
                _ = self.token.cancelled() => return,
                line = lines.next_line() => line,
            };
            match line {
                Ok(Some(line)) => match parse_line(&line) {
                    None => {}
                    Some(Ok(event)) => dispatch::route(&self.widgets, event).await,
                    Some(Err(e)) => warn!(error = %e, line = %line, "invalid click event"),
                },
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, "reading events failed");
                    break;
                }
            }
        }
        done.cancel();
    }

    /// Calls every widget's `stop` concurrently.
    pub async fn stop_all(&self) {
        info!("stopping widgets");
        join_all(self.widgets.iter().map(|inst| async move {
            inst.set_state(WidgetState::Stopped);
            match isolate(inst.widget.stop()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = %e, label = e.as_label(), "widget stop failed"),
                Err(panic) => error!(panic = %panic, "widget stop panicked"),
            }
        }
        .instrument(inst.span.clone())))
        .await;
    }

    /// Calls every widget's `resume` concurrently.
    pub async fn resume_all(&self) {
        info!("resuming widgets");
        join_all(self.widgets.iter().map(|inst| async move {
            inst.set_state(WidgetState::Running);
            match isolate(inst.widget.resume()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(error = %e, label = e.as_label(), "widget resume failed"),
                Err(panic) => error!(panic = %panic, "widget resume panicked"),
            }
        }
        .instrument(inst.span.clone())))
        .await;
    }

    /// Shuts every widget down, each bounded by `shutdown_timeout`, then stops the runtime.
    ///
    /// Only the first call does any work.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let timeout = self.cfg.shutdown_timeout;
        info!(?timeout, "shutting down widgets");

        let stuck: Vec<String> = join_all(self.widgets.iter().map(|inst| async move {
            let res = tokio::time::timeout(timeout, isolate(inst.widget.shutdown())).await;
            inst.set_state(WidgetState::Terminated);
            match res {
                Ok(Ok(Ok(()))) => None,
                Ok(Ok(Err(e))) => {
                    error!(error = %e, label = e.as_label(), "widget shutdown failed");
                    None
                }
                Ok(Err(panic)) => {
                    error!(panic = %panic, "widget shutdown panicked");
                    None
                }
                Err(_) => {
                    warn!(?timeout, "widget shutdown timed out");
                    Some(inst.spec.label())
                }
            }
        }
        .instrument(inst.span.clone())))
        .await
        .into_iter()
        .flatten()
        .collect();

        self.token.cancel();
        for handle in self.producers.lock().drain(..) {
            handle.abort();
        }

        if stuck.is_empty() {
            Ok(())
        } else {
            Err(RuntimeError::ShutdownTimedOut { timeout, stuck })
        }
    }
}
