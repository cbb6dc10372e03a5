//! Fan-in of every widget queue into one stream tagged with the widget index.

use futures::stream::{self, BoxStream, SelectAll, StreamExt};

use crate::protocol::{Block, BlockReceiver};

pub(crate) type FanIn = SelectAll<BoxStream<'static, (usize, Vec<Block>)>>;

/// Merges `receivers`; item `(w, blocks)` came from `receivers[w]`.
///
/// Order is preserved per queue only.
pub(crate) fn fan_in(receivers: Vec<BlockReceiver>) -> FanIn {
    stream::select_all(receivers.into_iter().enumerate().map(|(w, rx)| {
        stream::unfold(rx, move |mut rx| async move {
            let blocks = rx.recv().await?;
            Some(((w, blocks), rx))
        })
        .boxed()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Block;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn keeps_per_queue_order() {
        let (tx0, rx0) = mpsc::channel(4);
        let (tx1, rx1) = mpsc::channel(4);
        for i in 0..3 {
            tx0.send(vec![Block::text(format!("a{i}"))]).await.unwrap();
            tx1.send(vec![Block::text(format!("b{i}"))]).await.unwrap();
        }
        drop((tx0, tx1));

        let items: Vec<(usize, Vec<Block>)> = fan_in(vec![rx0, rx1]).collect().await;
        let of = |w: usize| -> Vec<String> {
            items
                .iter()
                .filter(|(i, _)| *i == w)
                .map(|(_, b)| b[0].full_text.clone())
                .collect()
        };
        assert_eq!(of(0), vec!["a0", "a1", "a2"]);
        assert_eq!(of(1), vec!["b0", "b1", "b2"]);
    }
}
