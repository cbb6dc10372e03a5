//! # Outgoing status stream.
//!
//! ```text
//! {"version":1,"stop_signal":10,"cont_signal":18,"click_events":true}
//! [
//! [],[{"full_text":"a",...}]
//! ,[{"full_text":"b",...}]
//! ```
//! The outer array is never closed.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::{Block, Header};

/// Writes the header, the array preamble, and one update per call.
pub struct StatusWriter<W> {
    out: W,
}

impl<W: AsyncWrite + Unpin> StatusWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Writes the header line followed by `[` and the empty first element.
    pub async fn begin(&mut self, header: &Header) -> std::io::Result<()> {
        let mut buf = serde_json::to_vec(header).map_err(std::io::Error::other)?;
        buf.extend_from_slice(b"\n[\n[]");
        self.out.write_all(&buf).await?;
        self.out.flush().await
    }

    /// Writes `,` and one full status line.
    pub async fn update(&mut self, blocks: &[Block]) -> std::io::Result<()> {
        let mut buf = Vec::with_capacity(64 * blocks.len().max(1));
        buf.push(b',');
        serde_json::to_writer(&mut buf, blocks).map_err(std::io::Error::other)?;
        buf.push(b'\n');
        self.out.write_all(&buf).await?;
        self.out.flush().await
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn header_then_preamble_then_updates() {
        let mut w = StatusWriter::new(Vec::new());
        w.begin(&Header::new(10, 18)).await.unwrap();
        w.update(&[]).await.unwrap();
        w.update(&[Block::text("X")]).await.unwrap();

        let text = String::from_utf8(w.into_inner()).unwrap();
        let mut lines = text.lines();
        let header: Header = serde_json::from_str(lines.next().unwrap()).unwrap();
        assert!(header.click_events);
        assert_eq!(lines.next(), Some("["));
        assert_eq!(lines.next(), Some("[],[]"));
        assert_eq!(lines.next(), Some(r#",[{"full_text":"X"}]"#));
        assert_eq!(lines.next(), None);
    }
}
