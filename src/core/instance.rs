use parking_lot::Mutex;
use tokio::sync::{mpsc, RwLock};
use tracing::{info_span, Span};

use super::routing::{encode_instance, encode_name};
use super::state::WidgetState;
use crate::protocol::{Block, BlockReceiver, BlockSender};
use crate::widgets::{WidgetRef, WidgetSpec};

/// One widget slot on the bar.
pub(crate) struct WidgetInstance {
    pub(crate) spec: WidgetSpec,
    pub(crate) widget: WidgetRef,
    /// Sender side of the widget's single-slot queue.
    pub(crate) tx: BlockSender,
    /// Last published output, already overlaid and renamed.
    pub(crate) output: RwLock<Vec<Block>>,
    state: Mutex<WidgetState>,
    pub(crate) span: Span,
}

impl WidgetInstance {
    pub(crate) fn new(spec: WidgetSpec, widget: WidgetRef) -> (Self, BlockReceiver) {
        let (tx, rx) = mpsc::channel(1);
        let span = info_span!("widget", id = %spec.label(), kind = %spec.kind);
        let inst = Self {
            spec,
            widget,
            tx,
            output: RwLock::new(Vec::new()),
            state: Mutex::new(WidgetState::Created),
            span,
        };
        (inst, rx)
    }

    pub(crate) fn state(&self) -> WidgetState {
        *self.state.lock()
    }

    pub(crate) fn set_state(&self, to: WidgetState) -> WidgetState {
        let mut state = self.state.lock();
        *state = state.transition(to);
        *state
    }

    /// Applies templates and the routing identity to a freshly produced list.
    pub(crate) fn prepare(&self, blocks: Vec<Block>) -> Vec<Block> {
        let w = self.spec.index;
        let templates = &self.spec.templates;
        blocks
            .into_iter()
            .enumerate()
            .map(|(i, block)| {
                let block = match templates.len() {
                    0 => block,
                    1 => block.overlay(&templates[0]),
                    n if i < n => block.overlay(&templates[i]),
                    _ => block,
                };
                Block {
                    name: encode_name(w, &block.name),
                    instance: encode_instance(w, i, &block.instance),
                    ..block
                }
            })
            .collect()
    }

    /// Replaces the published output.
    pub(crate) async fn publish(&self, blocks: Vec<Block>) {
        *self.output.write().await = self.prepare(blocks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::StaticWidget;
    use serde_json::Value;
    use std::sync::Arc;

    fn instance(index: usize, templates: Vec<Block>) -> WidgetInstance {
        let mut spec = WidgetSpec::new("static", Value::Null);
        spec.index = index;
        spec.templates = templates;
        WidgetInstance::new(spec, Arc::new(StaticWidget::new(Vec::new()))).0
    }

    #[test]
    fn single_template_applies_everywhere() {
        let tpl = Block {
            color: Some("#00ff00".into()),
            ..Block::default()
        };
        let out = instance(2, vec![tpl]).prepare(vec![
            Block::text("a"),
            Block {
                color: Some("#123456".into()),
                ..Block::text("b")
            },
        ]);
        assert_eq!(out[0].color.as_deref(), Some("#00ff00"));
        assert_eq!(out[1].color.as_deref(), Some("#123456"));
        assert_eq!(out[1].name, "app-2-");
        assert_eq!(out[1].instance, "app-2-1-");
    }

    #[test]
    fn positional_templates() {
        let t = |c: &str| Block {
            color: Some(c.into()),
            ..Block::default()
        };
        let out = instance(0, vec![t("#1"), t("#2")]).prepare(vec![
            Block::text("a"),
            Block::text("b"),
            Block::text("c"),
        ]);
        let colors: Vec<_> = out.iter().map(|b| b.color.clone()).collect();
        assert_eq!(colors, vec![Some("#1".into()), Some("#2".into()), None]);
    }

    #[test]
    fn keeps_original_identity_inside_encoding() {
        let block = Block {
            name: "cpu".into(),
            instance: "core-1".into(),
            ..Block::text("x")
        };
        let out = instance(4, vec![]).prepare(vec![block]);
        assert_eq!(out[0].name, "app-4-cpu");
        assert_eq!(out[0].instance, "app-4-0-core-1");
    }
}
