/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use atoi::FromRadix10Checked;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Version, header};
use tokio::io::AsyncBufRead;

use g3_io_ext::LimitedBufReadExt;

use super::HttpRequestParseError;
use crate::header::HttpConnectionOption;
use crate::{HttpBodyType, HttpHeaderLine, HttpLineParseError, HttpMethodLine};

#[derive(Clone, Copy, Debug)]
pub struct HttpRequestParseConfig {
    pub max_line_size: usize,
    pub max_header_size: usize,
    pub max_body_size: u64,
}

impl Default for HttpRequestParseConfig {
    fn default() -> Self {
        HttpRequestParseConfig {
            max_line_size: 8192,
            max_header_size: 65536,
            max_body_size: 64 << 20,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct HttpServerRequest {
    pub version: Version,
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    origin_header_size: usize,
    connection: HttpConnectionOption,
    keep_alive: bool,
    content_length: Option<u64>,
    transfer_encoding: Option<String>,
    expect_continue: bool,
}

impl HttpServerRequest {
    fn new(method: Method, uri: String, version: Version) -> Self {
        HttpServerRequest {
            version,
            method,
            uri,
            headers: HeaderMap::new(),
            origin_header_size: 0,
            connection: HttpConnectionOption::default(),
            keep_alive: false,
            content_length: None,
            transfer_encoding: None,
            expect_continue: false,
        }
    }

    #[inline]
    pub fn origin_header_size(&self) -> usize {
        self.origin_header_size
    }

    #[inline]
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// The client is waiting for `100 Continue` before sending the body
    #[inline]
    pub fn expect_continue(&self) -> bool {
        self.expect_continue && self.body_type().is_some()
    }

    pub fn path(&self) -> &str {
        match self.uri.split_once('?') {
            Some((path, _)) => path,
            None => &self.uri,
        }
    }

    pub fn query(&self) -> Option<&str> {
        self.uri.split_once('?').map(|(_, query)| query)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    pub fn body_type(&self) -> Option<HttpBodyType> {
        if self.transfer_encoding.is_some() {
            Some(HttpBodyType::Chunked)
        } else {
            match self.content_length {
                Some(0) | None => None,
                Some(n) => Some(HttpBodyType::ContentLength(n)),
            }
        }
    }

    pub async fn parse<R>(
        reader: &mut R,
        config: &HttpRequestParseConfig,
    ) -> Result<Self, HttpRequestParseError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut version = Version::HTTP_11;
        HttpServerRequest::parse_with_version(reader, config, &mut version).await
    }

    /// Same as `parse`, and `version` will be set as soon as the request line is accepted,
    /// so the error response to a bad header could use the client's version
    pub async fn parse_with_version<R>(
        reader: &mut R,
        config: &HttpRequestParseConfig,
        version: &mut Version,
    ) -> Result<Self, HttpRequestParseError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut line_buf = Vec::<u8>::with_capacity(1024);
        let mut header_size: usize = 0;

        loop {
            let (found, nr) = reader
                .limited_read_until(b'\n', config.max_line_size, &mut line_buf)
                .await?;
            if nr == 0 {
                return Err(HttpRequestParseError::ClientClosed);
            }
            if !found {
                return if nr < config.max_line_size {
                    Err(HttpRequestParseError::ClientClosed)
                } else {
                    Err(HttpRequestParseError::RequestLineTooLong(
                        config.max_line_size,
                    ))
                };
            }
            header_size += nr;
            if header_size >= config.max_header_size {
                return Err(HttpRequestParseError::TooLargeHeader(
                    config.max_header_size,
                ));
            }
            if is_empty_line(&line_buf) {
                // empty lines before the request line should be ignored
                line_buf.clear();
                continue;
            }
            break;
        }

        let mut req = HttpServerRequest::build_from_method_line(&line_buf)?;
        *version = req.version;

        loop {
            if header_size >= config.max_header_size {
                return Err(HttpRequestParseError::TooLargeHeader(
                    config.max_header_size,
                ));
            }
            line_buf.clear();
            let max_len = config
                .max_line_size
                .min(config.max_header_size - header_size);
            let (found, nr) = reader
                .limited_read_until(b'\n', max_len, &mut line_buf)
                .await?;
            if nr == 0 {
                return Err(HttpRequestParseError::ClientClosed);
            }
            if !found {
                return if nr < max_len {
                    Err(HttpRequestParseError::ClientClosed)
                } else {
                    Err(HttpRequestParseError::TooLargeHeader(
                        config.max_header_size,
                    ))
                };
            }
            header_size += nr;
            if is_empty_line(&line_buf) {
                break;
            }

            let header = HttpHeaderLine::parse(&line_buf)
                .map_err(HttpRequestParseError::InvalidHeaderLine)?;
            req.handle_header(header)?;
        }
        req.origin_header_size = header_size;

        req.post_check(config)?;
        Ok(req)
    }

    fn build_from_method_line(line_buf: &[u8]) -> Result<Self, HttpRequestParseError> {
        let line =
            HttpMethodLine::parse(line_buf).map_err(HttpRequestParseError::InvalidMethodLine)?;

        let version = match line.version {
            Ok(0) => Version::HTTP_10,
            Ok(1) => Version::HTTP_11,
            Ok(n) => {
                return Err(HttpRequestParseError::UnsupportedVersion(format!(
                    "HTTP/1.{n}"
                )));
            }
            Err(s) => return Err(HttpRequestParseError::UnsupportedVersion(s.to_string())),
        };

        let method = Method::from_bytes(line.method.as_bytes())
            .map_err(|_| HttpRequestParseError::UnsupportedMethod(line.method.to_string()))?;
        Ok(HttpServerRequest::new(method, line.uri.to_string(), version))
    }

    fn handle_header(&mut self, header: HttpHeaderLine) -> Result<(), HttpRequestParseError> {
        let name = HeaderName::from_bytes(header.name.as_bytes()).map_err(|_| {
            HttpRequestParseError::InvalidHeaderLine(HttpLineParseError::InvalidHeaderName)
        })?;
        let value = HeaderValue::from_bytes(header.value.as_bytes()).map_err(|_| {
            HttpRequestParseError::InvalidHeaderLine(HttpLineParseError::InvalidHeaderValue)
        })?;

        match name.as_str() {
            "connection" => {
                self.connection
                    .merge(HttpConnectionOption::parse(header.value));
            }
            "transfer-encoding" => {
                if self.transfer_encoding.is_none() {
                    self.transfer_encoding = Some(header.value.to_string());
                }
            }
            "content-length" => {
                if self.content_length.is_none() {
                    self.content_length = Some(parse_content_length(header.value)?);
                }
            }
            "expect" => {
                if self.version == Version::HTTP_11 {
                    if header.value.eq_ignore_ascii_case("100-continue") {
                        self.expect_continue = true;
                    } else {
                        return Err(HttpRequestParseError::UnsupportedExpectation(
                            header.value.to_string(),
                        ));
                    }
                }
            }
            _ => {}
        }

        self.headers.append(name, value);
        Ok(())
    }

    fn post_check(&mut self, config: &HttpRequestParseConfig) -> Result<(), HttpRequestParseError> {
        if let Some(te) = &self.transfer_encoding {
            if self.content_length.is_some() {
                return Err(HttpRequestParseError::AmbiguousFraming);
            }
            if !te.eq_ignore_ascii_case("chunked") {
                return Err(HttpRequestParseError::UnsupportedTransferEncoding(
                    te.to_string(),
                ));
            }
        }
        if let Some(size) = self.content_length {
            if size > config.max_body_size {
                return Err(HttpRequestParseError::BodyTooLarge(config.max_body_size));
            }
        }

        self.keep_alive = if self.connection.close {
            false
        } else {
            match self.version {
                Version::HTTP_10 => self.connection.keep_alive,
                _ => true,
            }
        };
        Ok(())
    }
}

fn is_empty_line(buf: &[u8]) -> bool {
    matches!(buf, b"\r\n" | b"\n")
}

fn parse_content_length(value: &str) -> Result<u64, HttpRequestParseError> {
    let bytes = value.as_bytes();
    match u64::from_radix_10_checked(bytes) {
        (Some(n), used) if used > 0 && used == bytes.len() => Ok(n),
        _ => Err(HttpRequestParseError::InvalidContentLength),
    }
}
