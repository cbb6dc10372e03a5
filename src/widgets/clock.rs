use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::format::{Item, StrftimeItems};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;
use tokio::time::MissedTickBehavior;

use super::{Widget, WidgetDescriptor, WidgetRef, WidgetSpec};
use crate::error::WidgetError;
use crate::protocol::{Block, BlockSender};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClockParams {
    interval: u64,
    format: String,
}

/// Local time, refreshed every `interval` seconds.
pub struct ClockWidget {
    interval: Duration,
    format: String,
}

pub(super) fn descriptor() -> WidgetDescriptor {
    WidgetDescriptor::new(
        "clock",
        json!({"interval": 1, "format": "%b %e %a %H:%M:%S"}),
        build,
    )
}

fn build(p: ClockParams, _: &WidgetSpec) -> Result<WidgetRef, WidgetError> {
    if p.interval == 0 {
        return Err(WidgetError::Config("'interval' must be positive".into()));
    }
    if StrftimeItems::new(&p.format).any(|item| matches!(item, Item::Error)) {
        return Err(WidgetError::Config(format!("invalid format '{}'", p.format)));
    }
    Ok(Arc::new(ClockWidget {
        interval: Duration::from_secs(p.interval),
        format: p.format,
    }))
}

impl ClockWidget {
    fn now(&self) -> Vec<Block> {
        vec![Block::text(Local::now().format(&self.format).to_string())]
    }
}

#[async_trait]
impl Widget for ClockWidget {
    async fn produce(&self, out: BlockSender) -> Result<(), WidgetError> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if out.send(self.now()).await.is_err() {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn formats_current_time() {
        let w = descriptor()
            .build(&WidgetSpec::new("clock", json!({"format": "%Y"})))
            .unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::channel(1);
        let task = tokio::spawn(async move { w.produce(tx).await });
        let blocks = rx.recv().await.unwrap();
        assert_eq!(blocks[0].full_text, Local::now().format("%Y").to_string());
        drop(rx);
        task.await.unwrap().unwrap();
    }

    #[test]
    fn rejects_bad_params() {
        for params in [json!({"interval": 0}), json!({"format": "%Q"})] {
            assert!(descriptor().build(&WidgetSpec::new("clock", params)).is_err());
        }
    }
}
