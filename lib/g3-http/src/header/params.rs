/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

/// A header value split into its leading value and `;` separated parameters,
/// as used by `Content-Disposition` and friends.
///
/// Parameter names are compared case-insensitively, quoted values are unquoted
/// and backslash escapes inside quotes are resolved.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderParameters {
    value: String,
    params: Vec<(String, String)>,
}

impl HeaderParameters {
    pub fn parse(s: &str) -> Self {
        let mut chars = s.chars().peekable();

        let mut value = String::new();
        for c in chars.by_ref() {
            if c == ';' {
                break;
            }
            value.push(c);
        }

        let mut params = Vec::new();
        loop {
            let mut name = String::new();
            let mut has_value = false;
            while let Some(c) = chars.next() {
                match c {
                    ';' => break,
                    '=' => {
                        has_value = true;
                        break;
                    }
                    _ => name.push(c),
                }
            }

            let mut v = String::new();
            if has_value {
                while matches!(chars.peek(), Some(' ' | '\t')) {
                    chars.next();
                }
                if chars.peek() == Some(&'"') {
                    chars.next();
                    while let Some(c) = chars.next() {
                        match c {
                            '"' => break,
                            '\\' => {
                                if let Some(e) = chars.next() {
                                    v.push(e);
                                }
                            }
                            _ => v.push(c),
                        }
                    }
                    // skip to the next parameter
                    for c in chars.by_ref() {
                        if c == ';' {
                            break;
                        }
                    }
                } else {
                    for c in chars.by_ref() {
                        if c == ';' {
                            break;
                        }
                        v.push(c);
                    }
                    v = v.trim_end().to_string();
                }
            }

            let name = name.trim();
            if !name.is_empty() {
                params.push((name.to_ascii_lowercase(), v));
            }
            if chars.peek().is_none() {
                break;
            }
        }

        HeaderParameters {
            value: value.trim().to_string(),
            params,
        }
    }

    #[inline]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Get the first parameter with this name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
