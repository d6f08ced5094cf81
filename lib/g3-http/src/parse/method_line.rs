/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use super::HttpLineParseError;

pub struct HttpMethodLine<'a> {
    pub method: &'a str,
    pub uri: &'a str,
    /// minor version of HTTP/1.x, or the raw version string for others
    pub version: Result<u8, &'a str>,
}

impl<'a> HttpMethodLine<'a> {
    pub fn parse(buf: &'a [u8]) -> Result<HttpMethodLine<'a>, HttpLineParseError> {
        let line = std::str::from_utf8(buf)?;
        let line = line
            .strip_suffix('\n')
            .ok_or(HttpLineParseError::NotLongEnough)?;
        let line = line.strip_suffix('\r').unwrap_or(line);

        let Some((method, left)) = line.split_once(' ') else {
            return Err(HttpLineParseError::NoDelimiterFound(' '));
        };
        if method.is_empty() {
            return Err(HttpLineParseError::EmptyToken("method"));
        }

        let Some((uri, version)) = left.split_once(' ') else {
            return Err(HttpLineParseError::NoDelimiterFound(' '));
        };
        if uri.is_empty() {
            return Err(HttpLineParseError::EmptyToken("uri"));
        }
        if version.is_empty() {
            return Err(HttpLineParseError::EmptyToken("version"));
        }

        let version = match version {
            "HTTP/1.0" => Ok(0),
            "HTTP/1.1" => Ok(1),
            s => {
                if !s.starts_with("HTTP/") || s.contains(' ') {
                    return Err(HttpLineParseError::InvalidVersion);
                }
                Err(s)
            }
        };

        Ok(HttpMethodLine {
            method,
            uri,
            version,
        })
    }
}
