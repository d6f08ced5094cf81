/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use atoi::FromRadix16Checked;

use super::HttpLineParseError;

pub struct HttpChunkedLine<'a> {
    pub chunk_size: u64,
    pub extension: Option<&'a str>,
}

impl<'a> HttpChunkedLine<'a> {
    pub fn parse(buf: &'a [u8]) -> Result<HttpChunkedLine<'a>, HttpLineParseError> {
        let (chunk_size, offset) = u64::from_radix_16_checked(buf);
        if offset == 0 {
            return Err(HttpLineParseError::InvalidChunkSize);
        }
        let Some(chunk_size) = chunk_size else {
            return Err(HttpLineParseError::InvalidChunkSize);
        };

        let mut left = &buf[offset..];
        while let Some((b' ' | b'\t', rest)) = left.split_first() {
            left = rest;
        }

        match left.first() {
            None => Err(HttpLineParseError::NotLongEnough),
            Some(b'\r' | b'\n') => Ok(HttpChunkedLine {
                chunk_size,
                extension: None,
            }),
            Some(b';') => {
                let extension = std::str::from_utf8(&left[1..])?.trim();
                Ok(HttpChunkedLine {
                    chunk_size,
                    extension: Some(extension),
                })
            }
            Some(_) => Err(HttpLineParseError::InvalidChunkSize),
        }
    }
}
