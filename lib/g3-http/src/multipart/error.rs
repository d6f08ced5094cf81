/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use std::io;

use thiserror::Error;

use crate::HttpLineParseError;
use crate::body::{HttpBodyLimitExceeded, body_limit_of_error};

#[derive(Debug, Error)]
pub enum MultipartError {
    #[error("not a multipart content type")]
    NotMultipart,
    #[error("no boundary parameter found")]
    MissingBoundary,
    #[error("invalid boundary")]
    InvalidBoundary,
    #[error("body ended before the closing delimiter")]
    Unterminated,
    #[error("invalid data after delimiter")]
    InvalidDelimiter,
    #[error("too large part header, should be less than {0}")]
    HeaderTooLarge(usize),
    #[error("invalid part header line: {0}")]
    InvalidHeaderLine(HttpLineParseError),
    #[error("body size exceeds the limit {0}")]
    BodyTooLarge(u64),
    #[error("io failed: {0:?}")]
    Io(io::Error),
}

impl MultipartError {
    /// The error is caused by the body size limit rather than the content
    #[inline]
    pub fn is_body_limit(&self) -> bool {
        matches!(self, MultipartError::BodyTooLarge(_))
    }
}

impl From<io::Error> for MultipartError {
    fn from(e: io::Error) -> Self {
        if let Some(max_size) = body_limit_of_error(&e) {
            return MultipartError::BodyTooLarge(max_size);
        }
        if e.get_ref().is_some_and(|inner| inner.is::<MultipartError>()) {
            let kind = e.kind();
            return match e.into_inner().map(|inner| inner.downcast::<MultipartError>()) {
                Some(Ok(e)) => *e,
                _ => MultipartError::Io(io::Error::from(kind)),
            };
        }
        MultipartError::Io(e)
    }
}

impl From<MultipartError> for io::Error {
    fn from(e: MultipartError) -> Self {
        match e {
            MultipartError::Io(e) => e,
            MultipartError::BodyTooLarge(max_size) => HttpBodyLimitExceeded { max_size }.into(),
            e => io::Error::new(io::ErrorKind::InvalidData, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::is_body_limit_error;

    #[test]
    fn io_conversion() {
        let e = io::Error::from(MultipartError::Unterminated);
        assert_eq!(e.kind(), io::ErrorKind::InvalidData);
        assert!(matches!(
            MultipartError::from(e),
            MultipartError::Unterminated
        ));

        let e = io::Error::from(MultipartError::BodyTooLarge(10));
        assert!(is_body_limit_error(&e));
        let e = MultipartError::from(e);
        assert!(e.is_body_limit());

        let e = MultipartError::from(io::Error::from(io::ErrorKind::ConnectionReset));
        assert!(matches!(e, MultipartError::Io(_)));
    }
}
