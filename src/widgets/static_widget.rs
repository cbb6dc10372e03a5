use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::{Widget, WidgetDescriptor, WidgetRef, WidgetSpec};
use crate::error::WidgetError;
use crate::protocol::{Block, BlockSender};

/// Blocks given inline or as a JSON string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BlockSource {
    List(Vec<Block>),
    Json(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StaticParams {
    blocks: Option<BlockSource>,
}

/// Publishes a fixed block list once.
#[derive(Debug, Clone)]
pub struct StaticWidget {
    blocks: Vec<Block>,
}

impl StaticWidget {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Widget standing in for one that could not be constructed.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(vec![Block::error(message)])
    }
}

#[async_trait]
impl Widget for StaticWidget {
    async fn produce(&self, out: BlockSender) -> Result<(), WidgetError> {
        let _ = out.send(self.blocks.clone()).await;
        Ok(())
    }
}

pub(super) fn descriptor() -> WidgetDescriptor {
    WidgetDescriptor::new("static", Value::Object(Default::default()), build)
}

fn build(params: StaticParams, _: &WidgetSpec) -> Result<WidgetRef, WidgetError> {
    let blocks = match params.blocks {
        Some(BlockSource::List(blocks)) => blocks,
        Some(BlockSource::Json(text)) if !text.trim().is_empty() => serde_json::from_str(&text)?,
        _ => Vec::new(),
    };
    if blocks.is_empty() {
        return Err(WidgetError::Config("missing 'blocks'".into()));
    }
    Ok(Arc::new(StaticWidget::new(blocks)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn sends_blocks_once() {
        let w = descriptor()
            .build(&WidgetSpec::new("static", json!({"blocks": [{"full_text": "a"}]})))
            .unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::channel(2);
        w.produce(tx).await.unwrap();
        assert_eq!(rx.recv().await.unwrap()[0].full_text, "a");
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn accepts_json_text() {
        let spec = WidgetSpec::new("static", json!({"blocks": r#"[{"full_text":"x"}]"#}));
        assert!(descriptor().build(&spec).is_ok());
    }

    #[test]
    fn requires_blocks() {
        let err = descriptor()
            .build(&WidgetSpec::new("static", json!({})))
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "missing 'blocks'");
    }
}
