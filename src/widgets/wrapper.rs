//! # `wrapper` widget: embeds another i3bar status program.
//!
//! The child's header, stop/continue signals and click events are honored:
//! clicks are written to its stdin as the infinite JSON array i3bar would send.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::io::AsyncWriteExt;
use tokio::process::ChildStdin;
use tokio::sync::Mutex;

use super::{Widget, WidgetDescriptor, WidgetRef, WidgetSpec};
use crate::error::{ExecError, WidgetError};
use crate::executor::{Executor, OutputFormat};
use crate::protocol::{Block, BlockSender, ClickEvent};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WrapperParams {
    command: String,
    #[serde(default)]
    workdir: String,
    #[serde(default)]
    env: Vec<String>,
}

struct EventPipe {
    stdin: ChildStdin,
    opened: bool,
}

pub struct WrapperWidget {
    exc: Executor,
    events: Mutex<Option<EventPipe>>,
}

pub(super) fn descriptor() -> WidgetDescriptor {
    WidgetDescriptor::new("wrapper", json!({}), build)
}

fn build(p: WrapperParams, spec: &WidgetSpec) -> Result<WidgetRef, WidgetError> {
    if p.command.trim().is_empty() {
        return Err(WidgetError::Config("missing 'command'".into()));
    }
    let exc = Executor::new(p.command)
        .workdir(spec.workdir.join(p.workdir))
        .env_assignments(&p.env)
        .piped_stdin();
    Ok(Arc::new(WrapperWidget {
        exc,
        events: Mutex::new(None),
    }))
}

#[async_trait]
impl Widget for WrapperWidget {
    async fn produce(&self, out: BlockSender) -> Result<(), WidgetError> {
        if let Some(stdin) = self.exc.stdin()? {
            *self.events.lock().await = Some(EventPipe {
                stdin,
                opened: false,
            });
        }
        let res = self.exc.run(&out, OutputFormat::Json).await;
        self.events.lock().await.take();
        res?;

        Err(WidgetError::Failed(match self.exc.exit_status() {
            Some(status) => format!("process exited unexpectedly: {status}"),
            None => "process exited unexpectedly".to_string(),
        }))
    }

    async fn event(&self, event: &ClickEvent, _blocks: &[Block]) -> Result<(), WidgetError> {
        if !self.exc.header().is_some_and(|h| h.click_events) {
            return Ok(());
        }
        let mut guard = self.events.lock().await;
        let Some(pipe) = guard.as_mut() else {
            return Ok(());
        };
        if !pipe.opened {
            pipe.opened = true;
            pipe.stdin.write_all(b"[").await.map_err(ExecError::from)?;
        }
        let mut msg = serde_json::to_vec(event)?;
        msg.extend_from_slice(b",\n");
        pipe.stdin.write_all(&msg).await.map_err(ExecError::from)?;
        pipe.stdin.flush().await.map_err(ExecError::from)?;
        Ok(())
    }

    async fn stop(&self) -> Result<(), WidgetError> {
        let sig = self
            .exc
            .header()
            .map(|h| h.stop_signal)
            .filter(|s| *s != 0)
            .unwrap_or(libc::SIGSTOP);
        Ok(self.exc.signal(sig)?)
    }

    async fn resume(&self) -> Result<(), WidgetError> {
        let sig = self
            .exc
            .header()
            .map(|h| h.cont_signal)
            .filter(|s| *s != 0)
            .unwrap_or(libc::SIGCONT);
        Ok(self.exc.signal(sig)?)
    }

    async fn shutdown(&self) -> Result<(), WidgetError> {
        self.events.lock().await.take();
        Ok(self.exc.shutdown().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    fn wrapper(command: &str) -> WidgetRef {
        descriptor()
            .build(&WidgetSpec::new("wrapper", json!({ "command": command })))
            .unwrap()
    }

    #[tokio::test]
    async fn exit_is_reported() {
        let w = wrapper(r#"printf '{"version":1}\n[\n[{"full_text":"up"}]\n'"#);
        let (tx, mut rx) = mpsc::channel(4);
        let err = w.produce(tx).await.unwrap_err();
        assert_eq!(rx.recv().await.unwrap()[0].full_text, "up");
        assert_eq!(err.to_string(), "process exited unexpectedly: exit status: 0");
    }

    #[tokio::test]
    async fn forwards_clicks_when_requested() {
        // Echoes the button of every click it receives.
        let script = r#"printf '{"version":1,"click_events":true}\n[\n[]\n'
while read -r line; do
  b=$(printf '%s' "$line" | sed 's/.*"button":\([0-9]*\).*/\1/')
  printf ',[{"full_text":"b%s"}]\n' "$b"
done"#;
        let w = wrapper(script);
        let (tx, mut rx) = mpsc::channel(4);
        let runner = {
            let w = Arc::clone(&w);
            tokio::spawn(async move { w.produce(tx).await })
        };
        assert!(rx.recv().await.unwrap().is_empty());

        let click = ClickEvent {
            button: 3,
            ..ClickEvent::default()
        };
        w.event(&click, &[]).await.unwrap();
        assert_eq!(rx.recv().await.unwrap()[0].full_text, "b3");

        w.shutdown().await.unwrap();
        assert!(runner.await.unwrap().is_err());
    }

    #[tokio::test]
    async fn stop_and_resume_use_header_signals() {
        let script = format!(
            r#"trap 'echo "[{{\"full_text\":\"paused\"}}],"' USR1
trap 'echo "[{{\"full_text\":\"resumed\"}}],"' USR2
printf '{{"version":1,"stop_signal":{stop},"cont_signal":{cont}}}\n[\n[{{"full_text":"ready"}}],\n'
while true; do sleep 0.05; done"#,
            stop = libc::SIGUSR1,
            cont = libc::SIGUSR2,
        );
        let w = wrapper(&script);
        let (tx, mut rx) = mpsc::channel(4);
        let runner = {
            let w = Arc::clone(&w);
            tokio::spawn(async move { w.produce(tx).await })
        };
        assert_eq!(rx.recv().await.unwrap()[0].full_text, "ready");

        w.stop().await.unwrap();
        let paused = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(paused[0].full_text, "paused");

        w.resume().await.unwrap();
        let resumed = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(resumed[0].full_text, "resumed");

        w.shutdown().await.unwrap();
        assert!(runner.await.unwrap().is_err());
    }

    #[tokio::test]
    async fn stop_defaults_to_sigstop_without_header() {
        let w = wrapper(
            r#"echo '[{"full_text":"first"}]'; sleep 0.3; echo ',[{"full_text":"second"}]'; sleep 60"#,
        );
        let (tx, mut rx) = mpsc::channel(4);
        let runner = {
            let w = Arc::clone(&w);
            tokio::spawn(async move { w.produce(tx).await })
        };
        assert_eq!(rx.recv().await.unwrap()[0].full_text, "first");

        w.stop().await.unwrap();
        assert!(timeout(Duration::from_secs(1), rx.recv()).await.is_err());

        w.resume().await.unwrap();
        let second = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(second[0].full_text, "second");

        w.shutdown().await.unwrap();
        assert!(runner.await.unwrap().is_err());
    }
}
