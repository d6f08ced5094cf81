/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use std::io::Write;

use bytes::BufMut;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Version, header};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use g3_io_ext::LimitedWriteExt;

use super::HttpResponseError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ResponseFraming {
    ContentLength(u64),
    Chunked,
    /// the body ends when the connection closes
    ReadToEnd,
}

/// Write a http response to the client.
///
/// The status and headers can be changed until the header is sent, which happens
/// explicitly by `send_header` or implicitly at the first body write. Chunked
/// framing is used if no content length has been set before that, except for
/// HTTP/1.0 clients, for which the connection will be closed to end the body.
pub struct HttpResponseWriter<'a> {
    writer: &'a mut (dyn AsyncWrite + Send + Unpin),
    version: Version,
    status: StatusCode,
    headers: HeaderMap,
    framing: Option<ResponseFraming>,
    keep_alive: bool,
    head_only: bool,
    header_sent: bool,
    body_written: u64,
    finished: bool,
}

impl<'a> HttpResponseWriter<'a> {
    pub fn new(
        writer: &'a mut (dyn AsyncWrite + Send + Unpin),
        version: Version,
        keep_alive: bool,
    ) -> Self {
        HttpResponseWriter {
            writer,
            version,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            framing: None,
            keep_alive,
            head_only: false,
            header_sent: false,
            body_written: 0,
            finished: false,
        }
    }

    /// Only the header will be sent, as the response to a HEAD request
    pub fn set_head_only(&mut self) {
        self.head_only = true;
    }

    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[inline]
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    #[inline]
    pub fn header_sent(&self) -> bool {
        self.header_sent
    }

    #[inline]
    pub fn finished(&self) -> bool {
        self.finished
    }

    #[inline]
    pub fn body_written(&self) -> u64 {
        self.body_written
    }

    fn check_header_mutable(&self) -> Result<(), HttpResponseError> {
        if self.header_sent {
            Err(HttpResponseError::HeaderAlreadySent)
        } else {
            Ok(())
        }
    }

    pub fn set_status(&mut self, status: StatusCode) -> Result<(), HttpResponseError> {
        self.check_header_mutable()?;
        self.status = status;
        Ok(())
    }

    /// Set a header, framing and connection headers are managed by the writer itself
    pub fn set_header(
        &mut self,
        name: HeaderName,
        value: HeaderValue,
    ) -> Result<(), HttpResponseError> {
        self.check_header_mutable()?;
        self.headers.insert(name, value);
        Ok(())
    }

    pub fn set_content_type(&mut self, content_type: &'static str) -> Result<(), HttpResponseError> {
        self.set_header(
            header::CONTENT_TYPE,
            HeaderValue::from_static(content_type),
        )
    }

    pub fn set_content_length(&mut self, size: u64) -> Result<(), HttpResponseError> {
        self.check_header_mutable()?;
        self.framing = Some(ResponseFraming::ContentLength(size));
        Ok(())
    }

    pub fn set_chunked_transfer_encoding(&mut self) -> Result<(), HttpResponseError> {
        self.check_header_mutable()?;
        self.framing = Some(ResponseFraming::Chunked);
        Ok(())
    }

    pub fn set_keep_alive(&mut self, keep_alive: bool) -> Result<(), HttpResponseError> {
        self.check_header_mutable()?;
        self.keep_alive = keep_alive;
        Ok(())
    }

    /// Send the interim response for `Expect: 100-continue`
    pub async fn send_continue(&mut self) -> Result<(), HttpResponseError> {
        self.check_header_mutable()?;
        self.writer
            .write_all_flush(b"HTTP/1.1 100 Continue\r\n\r\n")
            .await?;
        Ok(())
    }

    fn fix_framing(&mut self) -> ResponseFraming {
        let framing = match self.framing {
            Some(ResponseFraming::Chunked) | None if self.version == Version::HTTP_10 => {
                ResponseFraming::ReadToEnd
            }
            Some(framing) => framing,
            None => ResponseFraming::Chunked,
        };
        if framing == ResponseFraming::ReadToEnd {
            self.keep_alive = false;
        }
        self.framing = Some(framing);
        framing
    }

    fn serialize_header(&self, framing: ResponseFraming) -> Vec<u8> {
        let mut buf = Vec::<u8>::with_capacity(256);
        let _ = write!(
            buf,
            "{:?} {} {}\r\n",
            self.version,
            self.status.as_str(),
            self.status.canonical_reason().unwrap_or("Unknown")
        );
        for (name, value) in self.headers.iter() {
            if *name == header::CONTENT_LENGTH
                || *name == header::TRANSFER_ENCODING
                || *name == header::CONNECTION
            {
                continue;
            }
            buf.put_slice(name.as_ref());
            buf.put_slice(b": ");
            buf.put_slice(value.as_bytes());
            buf.put_slice(b"\r\n");
        }
        match framing {
            ResponseFraming::ContentLength(size) => {
                let _ = write!(buf, "Content-Length: {size}\r\n");
            }
            ResponseFraming::Chunked => buf.put_slice(b"Transfer-Encoding: chunked\r\n"),
            ResponseFraming::ReadToEnd => {}
        }
        if !self.keep_alive {
            buf.put_slice(b"Connection: close\r\n");
        } else if self.version == Version::HTTP_10 {
            buf.put_slice(b"Connection: keep-alive\r\n");
        }
        buf.put_slice(b"\r\n");
        buf
    }

    /// Commit the status and headers, the body framing will be fixed after this call
    pub async fn send_header(&mut self) -> Result<(), HttpResponseError> {
        self.check_header_mutable()?;
        let framing = self.fix_framing();
        let buf = self.serialize_header(framing);
        self.header_sent = true;
        self.writer.write_all(&buf).await?;
        Ok(())
    }

    /// Write a piece of body, the header will be sent first if not yet done
    pub async fn write_body(&mut self, data: &[u8]) -> Result<(), HttpResponseError> {
        if self.finished {
            return Err(HttpResponseError::AlreadyFinished);
        }
        if !self.header_sent {
            self.send_header().await?;
        }

        match self.framing {
            Some(ResponseFraming::ContentLength(declared)) => {
                let attempted = self.body_written + data.len() as u64;
                if attempted > declared {
                    return Err(HttpResponseError::BodyOverflow {
                        declared,
                        attempted,
                    });
                }
                if !self.head_only {
                    self.writer.write_all(data).await?;
                }
            }
            Some(ResponseFraming::Chunked) => {
                if data.is_empty() {
                    // an empty chunk would end the body
                    return Ok(());
                }
                if !self.head_only {
                    let mut buf = Vec::with_capacity(data.len() + 16);
                    let _ = write!(buf, "{:x}\r\n", data.len());
                    buf.put_slice(data);
                    buf.put_slice(b"\r\n");
                    self.writer.write_all(&buf).await?;
                }
            }
            Some(ResponseFraming::ReadToEnd) | None => {
                if !self.head_only {
                    self.writer.write_all(data).await?;
                }
            }
        }
        self.body_written += data.len() as u64;
        Ok(())
    }

    /// End the response body and flush all data to the client
    pub async fn finish(&mut self) -> Result<(), HttpResponseError> {
        if self.finished {
            return Err(HttpResponseError::AlreadyFinished);
        }
        if !self.header_sent {
            if self.framing.is_none() {
                self.framing = Some(ResponseFraming::ContentLength(0));
            }
            self.send_header().await?;
        }
        self.finished = true;

        match self.framing {
            Some(ResponseFraming::Chunked) if !self.head_only => {
                self.writer.write_all_flush(b"0\r\n\r\n").await?;
            }
            Some(ResponseFraming::ContentLength(declared))
                if !self.head_only && self.body_written < declared =>
            {
                self.keep_alive = false;
                self.writer.flush().await?;
                return Err(HttpResponseError::IncompleteBody {
                    declared,
                    written: self.body_written,
                });
            }
            _ => self.writer.flush().await?,
        }
        Ok(())
    }

    /// Send a full response with a fixed-length body
    pub async fn send_buffer(
        &mut self,
        status: StatusCode,
        content_type: &'static str,
        body: &[u8],
    ) -> Result<(), HttpResponseError> {
        self.set_status(status)?;
        if !body.is_empty() {
            self.set_content_type(content_type)?;
        }
        self.set_content_length(body.len() as u64)?;
        self.write_body(body).await?;
        self.finish().await
    }
}
