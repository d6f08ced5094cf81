/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use std::fmt::Write;

use tokio::io::{AsyncBufRead, AsyncReadExt};
use url::form_urlencoded;

use g3_http::multipart::{
    MultipartError, MultipartPartHandler, MultipartPartHeaders, MultipartPartReader,
};
use g3_http::server::HttpServerRequest;

const UNSPECIFIED_CONTENT_TYPE: &str = "(unspecified)";
const PART_READ_BUF_SIZE: usize = 4096;

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct UploadedPart {
    pub(crate) name: String,
    pub(crate) filename: String,
    pub(crate) content_type: String,
    pub(crate) size: u64,
}

#[derive(Debug, Default)]
pub(crate) struct FormData {
    pub(crate) fields: Vec<(String, String)>,
    pub(crate) uploads: Vec<UploadedPart>,
}

impl FormData {
    pub(crate) fn add_urlencoded(&mut self, input: &[u8]) {
        for (name, value) in form_urlencoded::parse(input) {
            self.fields.push((name.into_owned(), value.into_owned()));
        }
    }

    pub(crate) fn summary_head(&self, req: &HttpServerRequest) -> String {
        let mut s = String::with_capacity(1024);
        let _ = writeln!(s, "Method: {}", req.method);
        let _ = writeln!(s, "URI: {}", req.uri);
        let _ = writeln!(s, "Headers:");
        for (name, value) in req.headers.iter() {
            let _ = writeln!(s, "  {name}: {}", String::from_utf8_lossy(value.as_bytes()));
        }
        s
    }

    pub(crate) fn summary_fields(&self) -> String {
        let mut s = String::with_capacity(256);
        let _ = writeln!(s, "Fields:");
        for (name, value) in &self.fields {
            let _ = writeln!(s, "  {name} = {value}");
        }
        s
    }

    pub(crate) fn summary_uploads(&self) -> String {
        let mut s = String::with_capacity(256);
        let _ = writeln!(s, "Uploads:");
        for part in &self.uploads {
            let _ = writeln!(
                s,
                "  name={} filename={} type={} size={}",
                part.name, part.filename, part.content_type, part.size
            );
        }
        s
    }
}

/// Record every part, and keep small parts without filename as form fields
pub(crate) struct FormPartCollector<'a> {
    data: &'a mut FormData,
    max_field_size: usize,
}

impl<'a> FormPartCollector<'a> {
    pub(crate) fn new(data: &'a mut FormData, max_field_size: usize) -> Self {
        FormPartCollector {
            data,
            max_field_size,
        }
    }
}

impl MultipartPartHandler for FormPartCollector<'_> {
    async fn handle_part<R>(
        &mut self,
        headers: &MultipartPartHeaders,
        body: &mut MultipartPartReader<'_, R>,
    ) -> Result<(), MultipartError>
    where
        R: AsyncBufRead + Send + Unpin,
    {
        let is_field = headers.filename().is_none();
        let mut field_value = Vec::new();
        let mut field_too_large = false;
        let mut buf = vec![0u8; PART_READ_BUF_SIZE];

        loop {
            let nr = body.read(&mut buf).await?;
            if nr == 0 {
                break;
            }
            if is_field && !field_too_large {
                if field_value.len() + nr > self.max_field_size {
                    field_too_large = true;
                    field_value = Vec::new();
                } else {
                    field_value.extend_from_slice(&buf[..nr]);
                }
            }
        }

        let name = headers.name().to_string();
        if is_field && !field_too_large {
            let value = String::from_utf8_lossy(&field_value).into_owned();
            self.data.fields.push((name.clone(), value));
        }
        self.data.uploads.push(UploadedPart {
            name,
            filename: headers.filename().unwrap_or_default().to_string(),
            content_type: headers
                .content_type()
                .unwrap_or(UNSPECIFIED_CONTENT_TYPE)
                .to_string(),
            size: body.read_size(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use g3_http::multipart::{MultipartBoundary, MultipartDecodeConfig, MultipartDecoder};
    use tokio::io::BufReader;

    const BODY: &[u8] = b"--X\r\n\
        Content-Disposition: form-data; name=\"text\"\r\n\
        \r\n\
        hello\r\n\
        --X\r\n\
        Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\
        Content-Type: text/plain\r\n\
        \r\n\
        abc\r\n\
        --X\r\n\
        \r\n\
        anonymous\r\n\
        --X\r\n\
        Content-Disposition: form-data; name=\"big\"\r\n\
        \r\n\
        0123456789abcdef\r\n\
        --X--\r\n";

    #[tokio::test]
    async fn collect_parts() {
        let boundary = MultipartBoundary::new("X").unwrap();
        let reader = BufReader::with_capacity(7, BODY);
        let mut decoder = MultipartDecoder::new(reader, &boundary, MultipartDecodeConfig::default());

        let mut data = FormData::default();
        let mut collector = FormPartCollector::new(&mut data, 10);
        let count = decoder.decode_with(&mut collector).await.unwrap();
        assert_eq!(count, 4);

        assert_eq!(
            data.fields,
            vec![
                ("text".to_string(), "hello".to_string()),
                (String::new(), "anonymous".to_string()),
            ]
        );
        assert_eq!(data.uploads.len(), 4);
        assert_eq!(
            data.uploads[1],
            UploadedPart {
                name: "file".to_string(),
                filename: "a.txt".to_string(),
                content_type: "text/plain".to_string(),
                size: 3,
            }
        );
        assert_eq!(data.uploads[2].content_type, UNSPECIFIED_CONTENT_TYPE);
        assert_eq!(data.uploads[3].size, 16);

        let uploads = data.summary_uploads();
        assert!(uploads.contains("  name=file filename=a.txt type=text/plain size=3\n"));
    }

    #[test]
    fn urlencoded() {
        let mut data = FormData::default();
        data.add_urlencoded(b"a=1&b=hello+world&c=%E4%BD%A0");
        assert_eq!(
            data.fields,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "hello world".to_string()),
                ("c".to_string(), "你".to_string()),
            ]
        );
        let fields = data.summary_fields();
        assert_eq!(fields, "Fields:\n  a = 1\n  b = hello world\n  c = 你\n");
    }
}
