/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use mime::Mime;

use super::MultipartError;

const MAX_BOUNDARY_LEN: usize = 70;

/// The boundary of a multipart body, with the delimiter `CRLF--boundary` prebuilt
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultipartBoundary {
    boundary: String,
    delimiter: Vec<u8>,
}

impl MultipartBoundary {
    pub fn new(boundary: &str) -> Result<Self, MultipartError> {
        if boundary.is_empty() || boundary.len() > MAX_BOUNDARY_LEN {
            return Err(MultipartError::InvalidBoundary);
        }
        if boundary.ends_with(' ') || boundary.bytes().any(|c| c.is_ascii_control()) {
            return Err(MultipartError::InvalidBoundary);
        }

        let mut delimiter = Vec::with_capacity(boundary.len() + 4);
        delimiter.extend_from_slice(b"\r\n--");
        delimiter.extend_from_slice(boundary.as_bytes());
        Ok(MultipartBoundary {
            boundary: boundary.to_string(),
            delimiter,
        })
    }

    /// Get the boundary from a `multipart/*` content type
    pub fn from_content_type(content_type: &str) -> Result<Self, MultipartError> {
        let mime = content_type
            .parse::<Mime>()
            .map_err(|_| MultipartError::NotMultipart)?;
        if mime.type_() != mime::MULTIPART {
            return Err(MultipartError::NotMultipart);
        }
        let boundary = mime
            .get_param(mime::BOUNDARY)
            .ok_or(MultipartError::MissingBoundary)?;
        let boundary = boundary.as_str();
        let boundary = boundary
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(boundary);
        MultipartBoundary::new(boundary)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.boundary
    }

    #[inline]
    pub(crate) fn delimiter(&self) -> &[u8] {
        &self.delimiter
    }
}
