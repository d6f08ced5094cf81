/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HttpConnectionOption {
    pub close: bool,
    pub keep_alive: bool,
}

impl HttpConnectionOption {
    /// Parse the comma separated tokens of a `Connection` header value
    pub fn parse(value: &str) -> Self {
        let mut option = HttpConnectionOption::default();
        for v in value.split(',') {
            let v = v.trim();
            if v.eq_ignore_ascii_case("close") {
                option.close = true;
            } else if v.eq_ignore_ascii_case("keep-alive") {
                option.keep_alive = true;
            }
        }
        option
    }

    pub fn merge(&mut self, other: HttpConnectionOption) {
        self.close |= other.close;
        self.keep_alive |= other.keep_alive;
    }
}
