//! # Click routing.
//!
//! ```text
//! stdin line ──► parse_line ──► decode identity ──► stale check (read lock)
//!                  (skip)          (log, drop)         (drop if mismatch)
//!                                                            │ spawn
//!                                                            ▼
//!                                  widget.event(original event, snapshot)
//!                                  matching bindings ──► Executor ──► widget queue
//! ```

use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tracing::{debug, error, warn, Instrument};

use super::conditions::modifiers_match;
use super::guard::{isolate, PANIC_TEXT};
use super::instance::WidgetInstance;
use super::routing;
use crate::error::{ExecError, WidgetError};
use crate::executor::Executor;
use crate::protocol::{Block, ClickEvent};
use crate::widgets::EventBinding;

/// Routes one decoded click to the widget that produced the clicked block.
pub(crate) async fn route(widgets: &[Arc<WidgetInstance>], event: ClickEvent) {
    let id = match routing::decode(&event.name, &event.instance, widgets.len()) {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, label = e.as_label(), "dropping event");
            return;
        }
    };
    let inst = Arc::clone(&widgets[id.widget]);

    let (block, snapshot) = {
        let output = inst.output.read().await;
        match output.get(id.output) {
            Some(b) if b.name == event.name && b.instance == event.instance => {
                (b.clone(), output.clone())
            }
            _ => {
                debug!(parent: &inst.span, name = %event.name, instance = %event.instance, "stale event");
                return;
            }
        }
    };

    let original = ClickEvent {
        name: id.name,
        instance: id.instance,
        ..event
    };
    let span = inst.span.clone();
    tokio::spawn(handle(inst, original, block, snapshot).instrument(span));
}

async fn handle(inst: Arc<WidgetInstance>, event: ClickEvent, block: Block, snapshot: Vec<Block>) {
    match isolate(inst.widget.event(&event, &snapshot)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, label = e.as_label(), "widget event failed"),
        Err(panic) => {
            error!(panic = %panic, "widget event panicked");
            let _ = inst.tx.send(vec![Block::error(PANIC_TEXT)]).await;
        }
    }

    for binding in inst.spec.events.iter().filter(|b| matches(b, &event)) {
        debug!(command = %binding.command, button = event.button, "running event command");
        if let Err(e) = run_binding(&inst, binding, &event, &block).await {
            error!(error = %e, label = e.as_label(), command = %binding.command, "event command failed");
            let _ = inst.tx.send(vec![Block::error(format!("event error: {e}"))]).await;
        }
    }
}

fn matches(binding: &EventBinding, event: &ClickEvent) -> bool {
    (binding.button == 0 || binding.button == event.button)
        && (binding.name.is_empty() || binding.name == event.name)
        && (binding.instance.is_empty() || binding.instance == event.instance)
        && modifiers_match(&binding.modifiers, &event.modifiers)
}

async fn run_binding(
    inst: &WidgetInstance,
    binding: &EventBinding,
    event: &ClickEvent,
    block: &Block,
) -> Result<(), WidgetError> {
    let exc = Executor::new(&binding.command)
        .workdir(inst.spec.workdir.join(&binding.workdir))
        .envs(event.env())
        .env_assignments(&binding.env)
        .envs(block.custom_env())
        .piped_stdin();

    if let Some(mut stdin) = exc.stdin()? {
        let mut payload = serde_json::to_vec(event)?;
        payload.push(b'\n');
        match stdin.write_all(&payload).await {
            Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => {
                return Err(ExecError::from(e).into())
            }
            _ => {}
        }
    }

    exc.run(&inst.tx, binding.output_format).await?;
    match exc.exit_status() {
        Some(status) if !status.success() => Err(WidgetError::Failed(format!(
            "process exited unexpectedly: {status}"
        ))),
        _ => Ok(()),
    }
}
