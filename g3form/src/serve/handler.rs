/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use async_trait::async_trait;
use http::StatusCode;
use tokio::io::AsyncRead;

use g3_http::server::{HttpResponseWriter, HttpServerRequest};

use super::ClientConnectionInfo;

/// Producer of the response for a single request.
///
/// The body can be read at most once. Whatever is left unread when `handle`
/// returns will be drained by the connection task.
#[async_trait]
pub trait HttpRequestHandler: Send {
    async fn handle(
        &mut self,
        req: &HttpServerRequest,
        body: &mut (dyn AsyncRead + Send + Unpin),
        rsp: &mut HttpResponseWriter<'_>,
    ) -> anyhow::Result<()>;
}

/// Select the handler for a request, using only the request head.
///
/// `None` means there is no matching handler, and a 404 response will be sent.
pub trait HttpRequestHandlerFactory: Send + Sync {
    fn create_handler(
        &self,
        req: &HttpServerRequest,
        client: &ClientConnectionInfo,
    ) -> Option<Box<dyn HttpRequestHandler>>;
}

pub struct NotFoundHandler;

#[async_trait]
impl HttpRequestHandler for NotFoundHandler {
    async fn handle(
        &mut self,
        _req: &HttpServerRequest,
        _body: &mut (dyn AsyncRead + Send + Unpin),
        rsp: &mut HttpResponseWriter<'_>,
    ) -> anyhow::Result<()> {
        rsp.send_buffer(
            StatusCode::NOT_FOUND,
            "text/plain; charset=utf-8",
            b"Not Found\n",
        )
        .await?;
        Ok(())
    }
}
