//! Panic isolation at widget call boundaries.
//!
//! [`isolate`] only recovers the panic message; frames are logged by the hook
//! installed with [`install_panic_hook`], which runs inside the panicking
//! widget's span.

use std::any::Any;
use std::backtrace::Backtrace;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::error;

/// Text of the block shown in place of a widget that panicked.
pub(crate) const PANIC_TEXT: &str = "widget panic";

/// Polls `fut`, turning a panic into `Err(message)`.
pub(crate) async fn isolate<F: Future>(fut: F) -> Result<F::Output, String> {
    AssertUnwindSafe(fut)
        .catch_unwind()
        .await
        .map_err(|payload| panic_message(payload.as_ref()))
}

/// Routes panic reports through `tracing`, always with a captured backtrace.
///
/// Replaces the default hook, which writes to stderr and only prints frames
/// when `RUST_BACKTRACE` is set.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| l.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        let backtrace = Backtrace::force_capture();
        error!(
            panic = %panic_message(info.payload()),
            %location,
            "panic\n{backtrace}"
        );
    }));
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tracing::Instrument;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Capture(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn catches_panics() {
        assert_eq!(isolate(async { 7 }).await, Ok(7));
        let res = isolate(async {
            if true {
                panic!("boom {}", 1);
            }
        })
        .await;
        assert_eq!(res, Err("boom 1".to_string()));
    }

    #[tokio::test]
    async fn hook_logs_panics_with_backtrace() {
        let capture = Capture::default();
        let sink = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        let _default = tracing::subscriber::set_default(subscriber);
        install_panic_hook();

        let res = isolate(
            async {
                if true {
                    panic!("kaboom");
                }
            }
            .instrument(tracing::info_span!("widget", kind = %"boom")),
        )
        .await;
        let _ = std::panic::take_hook();

        assert_eq!(res, Err("kaboom".to_string()));
        let logs = String::from_utf8(capture.0.lock().clone()).unwrap();
        assert!(logs.contains("panic=kaboom"), "{logs}");
        assert!(logs.contains("widget{kind=boom}"), "{logs}");
        assert!(logs.contains("src/core/guard.rs"), "{logs}");
        assert!(logs.contains(" 0: "), "{logs}");
    }
}
