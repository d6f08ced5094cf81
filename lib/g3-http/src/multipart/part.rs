/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use http::{HeaderMap, HeaderName, HeaderValue, header};

use super::MultipartError;
use crate::header::HeaderParameters;
use crate::{HttpHeaderLine, HttpLineParseError};

/// Headers of a single part.
///
/// A part without `Content-Disposition` has an empty name and no filename.
#[derive(Clone, Debug, Default)]
pub struct MultipartPartHeaders {
    headers: HeaderMap,
    disposition: Option<HeaderParameters>,
}

impl MultipartPartHeaders {
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn name(&self) -> &str {
        self.disposition
            .as_ref()
            .and_then(|d| d.get("name"))
            .unwrap_or_default()
    }

    pub fn filename(&self) -> Option<&str> {
        self.disposition.as_ref().and_then(|d| d.get("filename"))
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    pub(crate) fn parse_line(&mut self, line: &[u8]) -> Result<(), MultipartError> {
        let line = HttpHeaderLine::parse(line).map_err(MultipartError::InvalidHeaderLine)?;
        let name = HeaderName::from_bytes(line.name.as_bytes()).map_err(|_| {
            MultipartError::InvalidHeaderLine(HttpLineParseError::InvalidHeaderName)
        })?;
        let value = HeaderValue::from_bytes(line.value.as_bytes()).map_err(|_| {
            MultipartError::InvalidHeaderLine(HttpLineParseError::InvalidHeaderValue)
        })?;

        if name == header::CONTENT_DISPOSITION && self.disposition.is_none() {
            self.disposition = Some(HeaderParameters::parse(line.value));
        }
        self.headers.append(name, value);
        Ok(())
    }
}
