//! Incremental JSON value reader over an async byte stream.
//!
//! Bytes are buffered until a complete value can be decoded. Consumed bytes are
//! kept until [`JsonStream::compact`] so the whole output can still be
//! reinterpreted as text after the first value was inspected.

use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::ExecError;

const CHUNK: usize = 4096;

enum Step<T> {
    Value(T, usize),
    NeedMore(serde_json::Error),
    Fail(serde_json::Error),
    End,
}

pub(crate) struct JsonStream<R> {
    reader: R,
    buf: Vec<u8>,
    pos: usize,
    eof: bool,
}

impl<R: AsyncRead + Unpin> JsonStream<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(CHUNK),
            pos: 0,
            eof: false,
        }
    }

    /// Reads one more chunk; `false` once the stream is exhausted.
    async fn fill(&mut self) -> std::io::Result<bool> {
        if self.eof {
            return Ok(false);
        }
        let mut chunk = [0u8; CHUNK];
        let n = self.reader.read(&mut chunk).await?;
        if n == 0 {
            self.eof = true;
            return Ok(false);
        }
        self.buf.extend_from_slice(&chunk[..n]);
        Ok(true)
    }

    /// Skips whitespace and any byte in `skip`, returning the next byte without consuming it.
    pub(crate) async fn peek_skipping(&mut self, skip: &[u8]) -> std::io::Result<Option<u8>> {
        loop {
            while let Some(&b) = self.buf.get(self.pos) {
                if b.is_ascii_whitespace() || skip.contains(&b) {
                    self.pos += 1;
                } else {
                    return Ok(Some(b));
                }
            }
            if !self.fill().await? {
                return Ok(None);
            }
        }
    }

    /// Decodes the next top-level value. `Ok(None)` at a clean end of stream.
    pub(crate) async fn next_value<T: DeserializeOwned>(&mut self) -> Result<Option<T>, ExecError> {
        if self.peek_skipping(&[]).await?.is_none() {
            return Ok(None);
        }
        loop {
            let step = {
                let mut it =
                    serde_json::Deserializer::from_slice(&self.buf[self.pos..]).into_iter::<T>();
                match it.next() {
                    Some(Ok(v)) => Step::Value(v, it.byte_offset()),
                    Some(Err(e)) if e.is_eof() => Step::NeedMore(e),
                    Some(Err(e)) => Step::Fail(e),
                    None => Step::End,
                }
            };
            match step {
                Step::Value(v, used) => {
                    self.pos += used;
                    return Ok(Some(v));
                }
                Step::NeedMore(e) => {
                    if !self.fill().await? {
                        return Err(e.into());
                    }
                }
                Step::Fail(e) => return Err(e.into()),
                Step::End => {
                    if !self.fill().await? {
                        return Ok(None);
                    }
                }
            }
        }
    }

    /// Consumes the opening `[` of an infinite block-list array, if one follows.
    ///
    /// `[` followed by `[` (or end of stream) is the outer array; `[` followed by
    /// anything else starts a block list and is left in place.
    pub(crate) async fn skip_outer_bracket(&mut self) -> std::io::Result<()> {
        if self.peek_skipping(&[]).await? != Some(b'[') {
            return Ok(());
        }
        let start = self.pos;
        self.pos += 1;
        match self.peek_skipping(&[]).await? {
            Some(b'[') | None => {}
            Some(_) => self.pos = start,
        }
        Ok(())
    }

    /// Drops bytes that were already decoded.
    pub(crate) fn compact(&mut self) {
        self.buf.drain(..self.pos);
        self.pos = 0;
    }

    /// Reads the rest of the stream and returns everything buffered as text.
    pub(crate) async fn into_text(mut self) -> std::io::Result<String> {
        if !self.eof {
            self.reader.read_to_end(&mut self.buf).await?;
        }
        Ok(String::from_utf8_lossy(&self.buf).into_owned())
    }
}
