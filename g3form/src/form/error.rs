/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use std::io;

use http::StatusCode;
use thiserror::Error;

use g3_http::body::is_body_limit_error;
use g3_http::multipart::MultipartError;

#[derive(Debug, Error)]
pub(crate) enum FormBodyError {
    #[error("invalid content type {0}")]
    InvalidContentType(String),
    #[error("multipart decode failed: {0}")]
    Multipart(#[from] MultipartError),
    #[error("urlencoded body should be no more than {0} bytes")]
    UrlencodedTooLarge(usize),
    #[error("read failed: {0:?}")]
    ReadFailed(#[from] io::Error),
}

impl FormBodyError {
    /// The status to reply with, `None` if the connection is broken
    pub(crate) fn status_code(&self) -> Option<StatusCode> {
        match self {
            FormBodyError::InvalidContentType(_) => Some(StatusCode::BAD_REQUEST),
            FormBodyError::Multipart(MultipartError::Io(e)) => io_error_status(e),
            FormBodyError::Multipart(e) => {
                if e.is_body_limit() {
                    Some(StatusCode::PAYLOAD_TOO_LARGE)
                } else {
                    Some(StatusCode::BAD_REQUEST)
                }
            }
            FormBodyError::UrlencodedTooLarge(_) => Some(StatusCode::PAYLOAD_TOO_LARGE),
            FormBodyError::ReadFailed(e) => {
                if is_body_limit_error(e) {
                    Some(StatusCode::PAYLOAD_TOO_LARGE)
                } else {
                    io_error_status(e)
                }
            }
        }
    }
}

fn io_error_status(e: &io::Error) -> Option<StatusCode> {
    match e.kind() {
        io::ErrorKind::TimedOut => Some(StatusCode::REQUEST_TIMEOUT),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use g3_http::body::HttpBodyLimitExceeded;

    #[test]
    fn status() {
        let e = FormBodyError::from(MultipartError::Unterminated);
        assert_eq!(e.status_code(), Some(StatusCode::BAD_REQUEST));

        let e = FormBodyError::from(MultipartError::BodyTooLarge(1024));
        assert_eq!(e.status_code(), Some(StatusCode::PAYLOAD_TOO_LARGE));

        let e = FormBodyError::from(io::Error::from(HttpBodyLimitExceeded { max_size: 1024 }));
        assert_eq!(e.status_code(), Some(StatusCode::PAYLOAD_TOO_LARGE));

        let e = FormBodyError::from(io::Error::from(io::ErrorKind::ConnectionReset));
        assert_eq!(e.status_code(), None);

        let e = FormBodyError::from(io::Error::from(io::ErrorKind::TimedOut));
        assert_eq!(e.status_code(), Some(StatusCode::REQUEST_TIMEOUT));
        let e = FormBodyError::from(MultipartError::from(io::Error::from(
            io::ErrorKind::TimedOut,
        )));
        assert_eq!(e.status_code(), Some(StatusCode::REQUEST_TIMEOUT));
    }
}
