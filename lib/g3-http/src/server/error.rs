/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use std::io;

use http::StatusCode;
use thiserror::Error;

use crate::HttpLineParseError;

#[derive(Debug, Error)]
pub enum HttpRequestParseError {
    #[error("client closed")]
    ClientClosed,
    #[error("too long request line, should be less than {0}")]
    RequestLineTooLong(usize),
    #[error("too large header, should be less than {0}")]
    TooLargeHeader(usize),
    #[error("invalid method line: {0}")]
    InvalidMethodLine(HttpLineParseError),
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),
    #[error("unsupported version: {0}")]
    UnsupportedVersion(String),
    #[error("invalid header line: {0}")]
    InvalidHeaderLine(HttpLineParseError),
    #[error("both content-length and transfer-encoding present")]
    AmbiguousFraming,
    #[error("unsupported transfer-encoding: {0}")]
    UnsupportedTransferEncoding(String),
    #[error("invalid content length")]
    InvalidContentLength,
    #[error("too large body, should be less than {0}")]
    BodyTooLarge(u64),
    #[error("unsupported expectation: {0}")]
    UnsupportedExpectation(String),
    #[error("io failed: {0:?}")]
    IoFailed(#[from] io::Error),
}

impl HttpRequestParseError {
    /// The status code to reply with, `None` if no response should be sent
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            HttpRequestParseError::IoFailed(_) | HttpRequestParseError::ClientClosed => None,
            HttpRequestParseError::RequestLineTooLong(_) => Some(StatusCode::URI_TOO_LONG),
            HttpRequestParseError::TooLargeHeader(_) => {
                Some(StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE)
            }
            HttpRequestParseError::UnsupportedMethod(_)
            | HttpRequestParseError::UnsupportedTransferEncoding(_) => {
                Some(StatusCode::NOT_IMPLEMENTED)
            }
            HttpRequestParseError::UnsupportedVersion(_) => {
                Some(StatusCode::HTTP_VERSION_NOT_SUPPORTED)
            }
            HttpRequestParseError::BodyTooLarge(_) => Some(StatusCode::PAYLOAD_TOO_LARGE),
            HttpRequestParseError::UnsupportedExpectation(_) => {
                Some(StatusCode::EXPECTATION_FAILED)
            }
            _ => Some(StatusCode::BAD_REQUEST),
        }
    }
}

#[derive(Debug, Error)]
pub enum HttpResponseError {
    #[error("response header has already been sent")]
    HeaderAlreadySent,
    #[error("body overflow: declared {declared}, attempted {attempted}")]
    BodyOverflow { declared: u64, attempted: u64 },
    #[error("incomplete body: declared {declared}, written {written}")]
    IncompleteBody { declared: u64, written: u64 },
    #[error("response has already been finished")]
    AlreadyFinished,
    #[error("write failed: {0:?}")]
    WriteFailed(#[from] io::Error),
}
