/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use std::future::{self, Future};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::{Buf, BufMut, BytesMut};
use memchr::memmem::Finder;
use tokio::io::{AsyncBufRead, AsyncRead, ReadBuf};

use super::{MultipartBoundary, MultipartError, MultipartPartHeaders};

#[derive(Clone, Copy, Debug)]
pub struct MultipartDecodeConfig {
    pub max_part_header_size: usize,
    /// max bytes taken from the underlying reader at a time
    pub read_chunk_size: usize,
}

impl Default for MultipartDecodeConfig {
    fn default() -> Self {
        MultipartDecodeConfig {
            max_part_header_size: 16384,
            read_chunk_size: 16384,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DecodeStage {
    Preamble,
    Delimiter,
    PartHeaders,
    PartBody,
    End,
}

/// Consumer of the parts, called once for each part in document order
pub trait MultipartPartHandler: Send {
    fn handle_part<R>(
        &mut self,
        headers: &MultipartPartHeaders,
        body: &mut MultipartPartReader<'_, R>,
    ) -> impl Future<Output = Result<(), MultipartError>> + Send
    where
        R: AsyncBufRead + Send + Unpin;
}

/// Streaming decoder of a multipart body.
///
/// Only the bytes that may still be part of a delimiter are kept back, all other
/// part content is handed to the part reader as soon as it has been scanned.
/// The buffer is limited to the delimiter length plus one read chunk.
pub struct MultipartDecoder<R> {
    reader: R,
    finder: Finder<'static>,
    delimiter_len: usize,
    buf: BytesMut,
    stage: DecodeStage,
    config: MultipartDecodeConfig,
    part_count: usize,
    part_read_size: u64,
}

impl<R> MultipartDecoder<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(reader: R, boundary: &MultipartBoundary, config: MultipartDecodeConfig) -> Self {
        let delimiter = boundary.delimiter();
        let mut buf = BytesMut::with_capacity(config.read_chunk_size + delimiter.len());
        // the opening delimiter may have no leading CRLF
        buf.put_slice(b"\r\n");
        MultipartDecoder {
            reader,
            finder: Finder::new(delimiter).into_owned(),
            delimiter_len: delimiter.len(),
            buf,
            stage: DecodeStage::Preamble,
            config,
            part_count: 0,
            part_read_size: 0,
        }
    }

    /// The count of parts that have been found
    #[inline]
    pub fn part_count(&self) -> usize {
        self.part_count
    }

    #[inline]
    pub fn finished(&self) -> bool {
        self.stage == DecodeStage::End
    }

    fn poll_fill(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<bool>> {
        let mut reader = Pin::new(&mut self.reader);
        let data = ready!(reader.as_mut().poll_fill_buf(cx))?;
        if data.is_empty() {
            return Poll::Ready(Ok(false));
        }
        let len = data.len().min(self.config.read_chunk_size);
        self.buf.extend_from_slice(&data[..len]);
        reader.consume(len);
        Poll::Ready(Ok(true))
    }

    async fn fill(&mut self) -> Result<(), MultipartError> {
        if future::poll_fn(|cx| self.poll_fill(cx)).await? {
            Ok(())
        } else {
            Err(MultipartError::Unterminated)
        }
    }

    /// Length of the buffer tail which is a prefix of the delimiter
    fn partial_delimiter_len(&self) -> usize {
        let delimiter = self.finder.needle();
        let len = self.buf.len();
        let start = len - len.min(self.delimiter_len - 1);
        for i in start..len {
            if self.buf[i] == b'\r' && delimiter.starts_with(&self.buf[i..]) {
                return len - i;
            }
        }
        0
    }

    /// The count of leading bytes that are sure not to be part of a delimiter,
    /// or `None` if the buffer starts with a full delimiter
    fn releasable_len(&self) -> Option<usize> {
        match self.finder.find(&self.buf) {
            Some(0) => None,
            Some(p) => Some(p),
            None => Some(self.buf.len() - self.partial_delimiter_len()),
        }
    }

    fn poll_part_body(
        &mut self,
        cx: &mut Context<'_>,
        out: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.stage != DecodeStage::PartBody || out.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }

        loop {
            let Some(releasable) = self.releasable_len() else {
                self.buf.advance(self.delimiter_len);
                self.stage = DecodeStage::Delimiter;
                return Poll::Ready(Ok(()));
            };
            if releasable > 0 {
                let n = releasable.min(out.remaining());
                out.put_slice(&self.buf[..n]);
                self.buf.advance(n);
                self.part_read_size += n as u64;
                return Poll::Ready(Ok(()));
            }

            if !ready!(self.poll_fill(cx))? {
                return Poll::Ready(Err(MultipartError::Unterminated.into()));
            }
        }
    }

    async fn skip_preamble(&mut self) -> Result<(), MultipartError> {
        loop {
            if let Some(p) = self.finder.find(&self.buf) {
                self.buf.advance(p + self.delimiter_len);
                self.stage = DecodeStage::Delimiter;
                return Ok(());
            }
            let keep = self.partial_delimiter_len();
            self.buf.advance(self.buf.len() - keep);
            self.fill().await?;
        }
    }

    async fn skip_part_body(&mut self) -> Result<(), MultipartError> {
        while self.stage == DecodeStage::PartBody {
            match self.releasable_len() {
                Some(0) => self.fill().await?,
                Some(n) => self.buf.advance(n),
                None => {
                    self.buf.advance(self.delimiter_len);
                    self.stage = DecodeStage::Delimiter;
                }
            }
        }
        Ok(())
    }

    /// Check the bytes after a delimiter, return false if it's the closing one
    async fn read_delimiter_end(&mut self) -> Result<bool, MultipartError> {
        while self.buf.len() < 2 {
            self.fill().await?;
        }
        if self.buf.starts_with(b"--") {
            self.buf.advance(2);
            self.stage = DecodeStage::End;
            return Ok(false);
        }

        // skip transport padding
        loop {
            match self.buf.iter().position(|c| !matches!(c, b' ' | b'\t')) {
                Some(p) => {
                    self.buf.advance(p);
                    break;
                }
                None => {
                    self.buf.clear();
                    self.fill().await?;
                }
            }
        }

        if self.buf[0] == b'\r' {
            while self.buf.len() < 2 {
                self.fill().await?;
            }
            if self.buf[1] != b'\n' {
                return Err(MultipartError::InvalidDelimiter);
            }
            self.buf.advance(2);
        } else if self.buf[0] == b'\n' {
            self.buf.advance(1);
        } else {
            return Err(MultipartError::InvalidDelimiter);
        }
        self.stage = DecodeStage::PartHeaders;
        Ok(true)
    }

    async fn read_part_headers(&mut self) -> Result<MultipartPartHeaders, MultipartError> {
        let max_size = self.config.max_part_header_size;
        let mut headers = MultipartPartHeaders::default();
        let mut header_size = 0;

        loop {
            match memchr::memchr(b'\n', &self.buf) {
                Some(p) => {
                    let line = self.buf.split_to(p + 1);
                    header_size += line.len();
                    if header_size > max_size {
                        return Err(MultipartError::HeaderTooLarge(max_size));
                    }
                    if matches!(&line[..], b"\r\n" | b"\n") {
                        break;
                    }
                    headers.parse_line(&line)?;
                }
                None => {
                    if header_size + self.buf.len() > max_size {
                        return Err(MultipartError::HeaderTooLarge(max_size));
                    }
                    self.fill().await?;
                }
            }
        }

        self.stage = DecodeStage::PartBody;
        self.part_count += 1;
        self.part_read_size = 0;
        Ok(headers)
    }

    /// Move to the next part and get its headers, the unread body of the
    /// current part will be discarded. `None` is returned after the closing
    /// delimiter.
    pub async fn next_part(&mut self) -> Result<Option<MultipartPartHeaders>, MultipartError> {
        loop {
            match self.stage {
                DecodeStage::Preamble => self.skip_preamble().await?,
                DecodeStage::PartBody => self.skip_part_body().await?,
                DecodeStage::Delimiter => {
                    if !self.read_delimiter_end().await? {
                        return Ok(None);
                    }
                }
                DecodeStage::PartHeaders => return self.read_part_headers().await.map(Some),
                DecodeStage::End => return Ok(None),
            }
        }
    }

    /// Get a reader of the current part body, which ends at the next delimiter
    pub fn part_reader(&mut self) -> MultipartPartReader<'_, R> {
        MultipartPartReader { decoder: self }
    }

    /// Run the handler on every part, return the part count
    pub async fn decode_with<H>(&mut self, handler: &mut H) -> Result<usize, MultipartError>
    where
        H: MultipartPartHandler,
        R: Send,
    {
        while let Some(headers) = self.next_part().await? {
            let mut body = self.part_reader();
            handler.handle_part(&headers, &mut body).await?;
        }
        Ok(self.part_count)
    }
}

/// Body of a single part, only valid until the decoder moves to the next part
pub struct MultipartPartReader<'a, R> {
    decoder: &'a mut MultipartDecoder<R>,
}

impl<R> MultipartPartReader<'_, R>
where
    R: AsyncBufRead + Unpin,
{
    /// Bytes of the current part that have been read out
    #[inline]
    pub fn read_size(&self) -> u64 {
        self.decoder.part_read_size
    }

    /// The delimiter after this part has been reached
    #[inline]
    pub fn finished(&self) -> bool {
        self.decoder.stage != DecodeStage::PartBody
    }
}

impl<R> AsyncRead for MultipartPartReader<'_, R>
where
    R: AsyncBufRead + Unpin,
{
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.decoder.poll_part_body(cx, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{HttpBodyReader, HttpBodyType};
    use bytes::Bytes;
    use tokio::io::{AsyncReadExt, BufReader, Result};
    use tokio_util::io::StreamReader;

    const FORM_BODY: &[u8] = b"--X\r\n\
        Content-Disposition: form-data; name=\"text\"\r\n\
        \r\n\
        hello\r\n\
        --X\r\n\
        Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\
        Content-Type: text/plain\r\n\
        \r\n\
        abc\r\n\
        --X--\r\n";

    fn split_stream(data: &[u8], split_size: usize) -> BufReader<impl AsyncRead + Send + Unpin> {
        let parts = data
            .chunks(split_size)
            .map(|c| Result::Ok(Bytes::copy_from_slice(c)))
            .collect::<Vec<_>>();
        BufReader::new(StreamReader::new(tokio_stream::iter(parts)))
    }

    #[derive(Default)]
    struct CollectedParts {
        parts: Vec<(String, Option<String>, Vec<u8>)>,
    }

    impl MultipartPartHandler for CollectedParts {
        async fn handle_part<R>(
            &mut self,
            headers: &MultipartPartHeaders,
            body: &mut MultipartPartReader<'_, R>,
        ) -> std::result::Result<(), MultipartError>
        where
            R: AsyncBufRead + Send + Unpin,
        {
            let mut data = Vec::new();
            body.read_to_end(&mut data).await?;
            assert!(body.finished());
            assert_eq!(body.read_size(), data.len() as u64);
            self.parts.push((
                headers.name().to_string(),
                headers.filename().map(|s| s.to_string()),
                data,
            ));
            Ok(())
        }
    }

    async fn collect(
        body: &[u8],
        boundary: &str,
        split_size: usize,
    ) -> std::result::Result<Vec<(String, Option<String>, Vec<u8>)>, MultipartError> {
        let boundary = MultipartBoundary::new(boundary).unwrap();
        let stream = split_stream(body, split_size);
        let mut decoder =
            MultipartDecoder::new(stream, &boundary, MultipartDecodeConfig::default());
        let mut handler = CollectedParts::default();
        let count = decoder.decode_with(&mut handler).await?;
        assert_eq!(count, handler.parts.len());
        assert!(decoder.finished());
        Ok(handler.parts)
    }

    #[tokio::test]
    async fn form_data() {
        let parts = collect(FORM_BODY, "X", FORM_BODY.len()).await.unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], ("text".to_string(), None, b"hello".to_vec()));
        assert_eq!(
            parts[1],
            (
                "file".to_string(),
                Some("a.txt".to_string()),
                b"abc".to_vec()
            )
        );
    }

    #[tokio::test]
    async fn split_delimiter() {
        let expected = collect(FORM_BODY, "X", FORM_BODY.len()).await.unwrap();
        for split in [1, 2, 3, 7, 11] {
            let parts = collect(FORM_BODY, "X", split).await.unwrap();
            assert_eq!(parts, expected);
        }
    }

    #[tokio::test]
    async fn content_like_delimiter() {
        let body = b"preamble text\r\n--boundary\r\n\
            Content-Disposition: form-data; name=\"a\"\r\n\
            \r\n\
            \r\n--bound\r\r\n--boundar\r\n\r\n\
            --boundary \t\r\n\
            \r\n\
            \r\n\
            --boundary--epilogue";
        for split in [1, 5, body.len()] {
            let parts = collect(body, "boundary", split).await.unwrap();
            assert_eq!(parts.len(), 2);
            assert_eq!(parts[0].0, "a");
            assert_eq!(parts[0].2.as_slice(), b"\r\n--bound\r\r\n--boundar\r\n");
            assert_eq!(parts[1].0, "");
            assert!(parts[1].1.is_none());
            assert!(parts[1].2.is_empty());
        }
    }

    #[tokio::test]
    async fn large_part() {
        let content = (0..100_000u32)
            .map(|i| b"0123456789\r\n-"[(i % 13) as usize])
            .collect::<Vec<_>>();
        let mut body = Vec::new();
        body.extend_from_slice(b"--abc\r\nContent-Disposition: form-data; name=\"big\"\r\n\r\n");
        body.extend_from_slice(&content);
        body.extend_from_slice(b"\r\n--abc--\r\n");

        let boundary = MultipartBoundary::new("abc").unwrap();
        let config = MultipartDecodeConfig {
            max_part_header_size: 1024,
            read_chunk_size: 1000,
        };
        let mut decoder = MultipartDecoder::new(split_stream(&body, 4096), &boundary, config);
        let headers = decoder.next_part().await.unwrap().unwrap();
        assert_eq!(headers.name(), "big");

        let mut body_reader = decoder.part_reader();
        let mut read = Vec::new();
        let mut buf = [0u8; 333];
        loop {
            let n = body_reader.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            assert!(decoder_buffered(&body_reader) <= 1000 + 6);
            read.extend_from_slice(&buf[..n]);
        }
        assert_eq!(read, content);
        assert!(decoder.next_part().await.unwrap().is_none());
    }

    fn decoder_buffered<R>(reader: &MultipartPartReader<'_, R>) -> usize {
        reader.decoder.buf.len()
    }

    #[tokio::test]
    async fn skip_unread_part() {
        let boundary = MultipartBoundary::new("X").unwrap();
        let mut decoder = MultipartDecoder::new(
            split_stream(FORM_BODY, 3),
            &boundary,
            MultipartDecodeConfig::default(),
        );
        let headers = decoder.next_part().await.unwrap().unwrap();
        assert_eq!(headers.name(), "text");
        let mut first = [0u8; 2];
        decoder.part_reader().read_exact(&mut first).await.unwrap();
        assert_eq!(&first, b"he");

        let headers = decoder.next_part().await.unwrap().unwrap();
        assert_eq!(headers.filename(), Some("a.txt"));
        assert_eq!(headers.content_type(), Some("text/plain"));
        assert!(decoder.next_part().await.unwrap().is_none());
        assert_eq!(decoder.part_count(), 2);
    }

    #[tokio::test]
    async fn unterminated() {
        let body = b"--X\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nhello\r\n--X";
        for split in [1, body.len()] {
            let e = collect(body, "X", split).await.unwrap_err();
            assert!(matches!(e, MultipartError::Unterminated));
        }

        let body = b"--X\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nhello";
        let e = collect(body, "X", body.len()).await.unwrap_err();
        assert!(matches!(e, MultipartError::Unterminated));

        let e = collect(b"no delimiter here", "X", 4).await.unwrap_err();
        assert!(matches!(e, MultipartError::Unterminated));

        let e = collect(b"", "X", 1).await.unwrap_err();
        assert!(matches!(e, MultipartError::Unterminated));
    }

    #[tokio::test]
    async fn invalid_delimiter() {
        let body = b"--X\r\n\r\nhello\r\n--Xabc\r\n\r\n--X--";
        let e = collect(body, "X", body.len()).await.unwrap_err();
        assert!(matches!(e, MultipartError::InvalidDelimiter));
    }

    #[tokio::test]
    async fn header_too_large() {
        let mut body = b"--X\r\nX-Long: ".to_vec();
        body.extend_from_slice(&[b'a'; 200]);
        body.extend_from_slice(b"\r\n\r\nhello\r\n--X--");

        let boundary = MultipartBoundary::new("X").unwrap();
        let config = MultipartDecodeConfig {
            max_part_header_size: 128,
            read_chunk_size: 64,
        };
        let mut decoder = MultipartDecoder::new(split_stream(&body, 16), &boundary, config);
        let e = decoder.next_part().await.unwrap_err();
        assert!(matches!(e, MultipartError::HeaderTooLarge(128)));
    }

    #[tokio::test]
    async fn over_chunked_body() {
        let mut chunked = Vec::new();
        for chunk in FORM_BODY.chunks(9) {
            chunked.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
            chunked.extend_from_slice(chunk);
            chunked.extend_from_slice(b"\r\n");
        }
        chunked.extend_from_slice(b"0\r\n\r\n");

        let mut stream = split_stream(&chunked, 5);
        let body = HttpBodyReader::new(&mut stream, HttpBodyType::Chunked, 1024);
        let boundary = MultipartBoundary::new("X").unwrap();
        let mut decoder = MultipartDecoder::new(
            BufReader::new(body),
            &boundary,
            MultipartDecodeConfig::default(),
        );
        let mut handler = CollectedParts::default();
        assert_eq!(decoder.decode_with(&mut handler).await.unwrap(), 2);
        assert_eq!(handler.parts[1].2.as_slice(), b"abc");
    }

    #[tokio::test]
    async fn body_limit() {
        let mut stream = split_stream(FORM_BODY, FORM_BODY.len());
        let body =
            HttpBodyReader::with_limit(&mut stream, HttpBodyType::ContentLength(200), 1024, 100);
        let boundary = MultipartBoundary::new("X").unwrap();
        let mut decoder = MultipartDecoder::new(
            BufReader::new(body),
            &boundary,
            MultipartDecodeConfig::default(),
        );
        let mut handler = CollectedParts::default();
        let e = decoder.decode_with(&mut handler).await.unwrap_err();
        assert!(e.is_body_limit());
    }
}
