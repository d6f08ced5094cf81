/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use log::{debug, info};
use mime::Mime;
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};

use g3_http::multipart::{MultipartBoundary, MultipartDecoder};
use g3_http::server::{HttpResponseWriter, HttpServerRequest};

use crate::config::ServerConfig;
use crate::serve::{ClientConnectionInfo, HttpRequestHandler, HttpRequestHandlerFactory};

mod collect;
use collect::{FormData, FormPartCollector};

mod error;
use error::FormBodyError;

const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

pub struct FormHandlerFactory {
    config: Arc<ServerConfig>,
}

impl FormHandlerFactory {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        FormHandlerFactory { config }
    }
}

impl HttpRequestHandlerFactory for FormHandlerFactory {
    fn create_handler(
        &self,
        req: &HttpServerRequest,
        client: &ClientConnectionInfo,
    ) -> Option<Box<dyn HttpRequestHandler>> {
        let path = req.path();
        if path == self.config.form_path || path == "/" {
            Some(Box::new(FormRequestHandler {
                config: self.config.clone(),
                client: *client,
            }))
        } else {
            None
        }
    }
}

/// Decode the submitted form and reply with a plain text summary of it
struct FormRequestHandler {
    config: Arc<ServerConfig>,
    client: ClientConnectionInfo,
}

impl FormRequestHandler {
    async fn read_body(
        &self,
        content_type: &str,
        body: &mut (dyn AsyncRead + Send + Unpin),
        data: &mut FormData,
    ) -> Result<(), FormBodyError> {
        let mime = content_type
            .parse::<Mime>()
            .map_err(|_| FormBodyError::InvalidContentType(content_type.to_string()))?;

        if mime.type_() == mime::MULTIPART && mime.subtype() == mime::FORM_DATA {
            let boundary = MultipartBoundary::from_content_type(content_type)?;
            let reader = BufReader::with_capacity(self.config.multipart_read_chunk, body);
            let mut decoder =
                MultipartDecoder::new(reader, &boundary, self.config.multipart_decode_config());
            let mut collector = FormPartCollector::new(data, self.config.max_form_field_size);
            let count = decoder.decode_with(&mut collector).await?;
            debug!("got {count} parts from {}", self.client.peer_addr());
        } else if mime.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str() {
            let max_size = self.config.max_form_field_size;
            let mut buf = Vec::with_capacity(max_size.min(4096));
            body.take(max_size as u64 + 1).read_to_end(&mut buf).await?;
            if buf.len() > max_size {
                return Err(FormBodyError::UrlencodedTooLarge(max_size));
            }
            data.add_urlencoded(&buf);
        }
        Ok(())
    }
}

#[async_trait]
impl HttpRequestHandler for FormRequestHandler {
    async fn handle(
        &mut self,
        req: &HttpServerRequest,
        body: &mut (dyn AsyncRead + Send + Unpin),
        rsp: &mut HttpResponseWriter<'_>,
    ) -> anyhow::Result<()> {
        info!("form request from {}", self.client.peer_addr());

        let mut data = FormData::default();
        if let Some(query) = req.query() {
            data.add_urlencoded(query.as_bytes());
        }
        if let Some(content_type) = req.content_type() {
            if let Err(e) = self.read_body(content_type, body, &mut data).await {
                let Some(status) = e.status_code() else {
                    return Err(e.into());
                };
                debug!("invalid form from {}: {e}", self.client.peer_addr());
                if matches!(
                    status,
                    StatusCode::PAYLOAD_TOO_LARGE | StatusCode::REQUEST_TIMEOUT
                ) {
                    rsp.set_keep_alive(false)?;
                }
                let msg = format!("{e}\n");
                rsp.send_buffer(status, TEXT_PLAIN_UTF8, msg.as_bytes())
                    .await?;
                return Ok(());
            }
        }

        rsp.set_status(StatusCode::OK)?;
        rsp.set_content_type(TEXT_PLAIN_UTF8)?;
        rsp.set_chunked_transfer_encoding()?;
        rsp.write_body(data.summary_head(req).as_bytes()).await?;
        rsp.write_body(data.summary_fields().as_bytes()).await?;
        rsp.write_body(data.summary_uploads().as_bytes()).await?;
        rsp.finish().await?;
        Ok(())
    }
}
