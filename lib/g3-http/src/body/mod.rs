/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use std::io;

use thiserror::Error;

mod reader;
pub use reader::HttpBodyReader;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpBodyType {
    ContentLength(u64),
    Chunked,
}

/// The error carried inside `io::Error` when a body grows beyond the configured limit
#[derive(Debug, Error)]
#[error("body size exceeds the limit {max_size}")]
pub struct HttpBodyLimitExceeded {
    pub max_size: u64,
}

impl From<HttpBodyLimitExceeded> for io::Error {
    fn from(e: HttpBodyLimitExceeded) -> Self {
        io::Error::other(e)
    }
}

/// Get the size limit if this error is caused by an oversized body
pub fn body_limit_of_error(e: &io::Error) -> Option<u64> {
    e.get_ref()
        .and_then(|inner| inner.downcast_ref::<HttpBodyLimitExceeded>())
        .map(|e| e.max_size)
}

#[inline]
pub fn is_body_limit_error(e: &io::Error) -> bool {
    body_limit_of_error(e).is_some()
}
