/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use tokio::io::{AsyncBufRead, AsyncRead, ReadBuf};

use super::{HttpBodyLimitExceeded, HttpBodyType};
use crate::{HttpChunkedLine, HttpHeaderLine};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NextReadType {
    EndOfFile,
    FixedLength,
    ChunkSize,
    ChunkDataEnd,
    Trailer,
    LimitExceeded,
}

/// Decode the body of a http message.
///
/// Content-Length bodies are cut at the declared length, chunked bodies are
/// decoded into a continuous stream, with the trailer section consumed and
/// discarded. The underlying reader is never read beyond the end of the body,
/// so the next message on the same connection is left untouched.
pub struct HttpBodyReader<'a, R> {
    stream: &'a mut R,
    body_type: HttpBodyType,
    next_read_type: NextReadType,
    body_line_max_len: usize,
    body_max_size: u64,

    left_size: u64,
    line_cache: Vec<u8>,

    read_size: u64,
    finished: bool,
}

impl<'a, R> HttpBodyReader<'a, R>
where
    R: AsyncBufRead + Unpin,
{
    const DEFAULT_LINE_SIZE: usize = 64;

    pub fn new(stream: &'a mut R, body_type: HttpBodyType, body_line_max_len: usize) -> Self {
        Self::with_limit(stream, body_type, body_line_max_len, u64::MAX)
    }

    pub fn with_limit(
        stream: &'a mut R,
        body_type: HttpBodyType,
        body_line_max_len: usize,
        body_max_size: u64,
    ) -> Self {
        let mut left_size = 0;
        let next_read_type = match body_type {
            HttpBodyType::ContentLength(size) => {
                if size > body_max_size {
                    NextReadType::LimitExceeded
                } else if size == 0 {
                    NextReadType::EndOfFile
                } else {
                    left_size = size;
                    NextReadType::FixedLength
                }
            }
            HttpBodyType::Chunked => NextReadType::ChunkSize,
        };
        HttpBodyReader {
            stream,
            body_type,
            next_read_type,
            body_line_max_len,
            body_max_size,
            left_size,
            line_cache: Vec::with_capacity(Self::DEFAULT_LINE_SIZE),
            read_size: 0,
            finished: false,
        }
    }

    #[inline]
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// the decoded body size that has been read out
    #[inline]
    pub fn read_size(&self) -> u64 {
        self.read_size
    }

    fn poll_fixed(&mut self, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        if buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }

        let mut reader = Pin::new(&mut *self.stream);
        let data = ready!(reader.as_mut().poll_fill_buf(cx))?;
        if data.is_empty() {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "reader closed while reading body data",
            )));
        }

        let to_copy = usize::try_from(self.left_size)
            .unwrap_or(usize::MAX)
            .min(buf.remaining())
            .min(data.len());
        buf.put_slice(&data[..to_copy]);
        reader.consume(to_copy);

        self.left_size -= to_copy as u64;
        self.read_size += to_copy as u64;
        if self.left_size == 0 {
            self.next_read_type = match self.body_type {
                HttpBodyType::ContentLength(_) => NextReadType::EndOfFile,
                HttpBodyType::Chunked => NextReadType::ChunkDataEnd,
            };
        }
        Poll::Ready(Ok(()))
    }

    /// Read a whole line into the line cache
    fn poll_line(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let mut reader = Pin::new(&mut *self.stream);
        loop {
            let data = ready!(reader.as_mut().poll_fill_buf(cx))?;
            if data.is_empty() {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "reader closed while reading chunk line",
                )));
            }

            let (found, len) = match memchr::memchr(b'\n', data) {
                Some(p) => (true, p + 1),
                None => (false, data.len()),
            };
            if self.line_cache.len() + len > self.body_line_max_len {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("chunk line too long (> {})", self.body_line_max_len),
                )));
            }
            self.line_cache.extend_from_slice(&data[..len]);
            reader.as_mut().consume(len);
            if found {
                return Poll::Ready(Ok(()));
            }
        }
    }

    fn line_is_empty(&self) -> bool {
        matches!(self.line_cache.as_slice(), b"\r\n" | b"\n")
    }

    fn handle_chunk_size_line(&mut self) -> io::Result<()> {
        let chunk = HttpChunkedLine::parse(&self.line_cache)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if chunk.chunk_size == 0 {
            self.next_read_type = NextReadType::Trailer;
        } else {
            if self.read_size.saturating_add(chunk.chunk_size) > self.body_max_size {
                self.next_read_type = NextReadType::LimitExceeded;
                return Err(HttpBodyLimitExceeded {
                    max_size: self.body_max_size,
                }
                .into());
            }
            self.left_size = chunk.chunk_size;
            self.next_read_type = NextReadType::FixedLength;
        }
        Ok(())
    }

    fn handle_chunk_end_line(&mut self) -> io::Result<()> {
        if !self.line_is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "invalid chunk data ending",
            ));
        }
        self.next_read_type = NextReadType::ChunkSize;
        Ok(())
    }

    fn handle_trailer_line(&mut self) -> io::Result<()> {
        if self.line_is_empty() {
            self.next_read_type = NextReadType::EndOfFile;
        } else {
            // trailer fields are checked but not kept
            HttpHeaderLine::parse(&self.line_cache)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        }
        Ok(())
    }
}

impl<R> AsyncRead for HttpBodyReader<'_, R>
where
    R: AsyncBufRead + Unpin,
{
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let me = &mut *self;

        loop {
            match me.next_read_type {
                NextReadType::EndOfFile => {
                    me.finished = true;
                    return Poll::Ready(Ok(()));
                }
                NextReadType::LimitExceeded => {
                    return Poll::Ready(Err(HttpBodyLimitExceeded {
                        max_size: me.body_max_size,
                    }
                    .into()));
                }
                NextReadType::FixedLength => return me.poll_fixed(cx, buf),
                NextReadType::ChunkSize => {
                    ready!(me.poll_line(cx))?;
                    let r = me.handle_chunk_size_line();
                    me.line_cache.clear();
                    r?;
                }
                NextReadType::ChunkDataEnd => {
                    ready!(me.poll_line(cx))?;
                    let r = me.handle_chunk_end_line();
                    me.line_cache.clear();
                    r?;
                }
                NextReadType::Trailer => {
                    ready!(me.poll_line(cx))?;
                    let r = me.handle_trailer_line();
                    me.line_cache.clear();
                    r?;
                }
            }
        }
    }
}
