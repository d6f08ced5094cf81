/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use http::{Method, StatusCode, Version};
use log::{debug, info, warn};
use tokio::io::{
    AsyncBufRead, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter,
};
use tokio::net::TcpStream;
use tokio::sync::broadcast;

use g3_http::server::{HttpRequestParseError, HttpResponseWriter, HttpServerRequest};
use g3_http::{HttpBodyReader, HttpBodyType};
use g3_io_ext::{IdleTimeoutReader, LimitedBufReadExt};

use super::{
    ClientConnectionInfo, HttpRequestHandler, HttpServer, NotFoundHandler, ServerReloadCommand,
};

const LINGER_TIMEOUT: Duration = Duration::from_secs(2);
const LINGER_MAX_SIZE: u64 = 1 << 20;

pub(super) struct HttpServerTask {
    server: Arc<HttpServer>,
    cc_info: ClientConnectionInfo,
    reload_notifier: broadcast::Receiver<ServerReloadCommand>,
    linger_close: bool,
}

impl Drop for HttpServerTask {
    fn drop(&mut self) {
        self.server.get_server_stats().dec_alive_task();
    }
}

impl HttpServerTask {
    pub(super) fn new(
        server: &Arc<HttpServer>,
        cc_info: ClientConnectionInfo,
        reload_notifier: broadcast::Receiver<ServerReloadCommand>,
    ) -> Self {
        let stats = server.get_server_stats();
        stats.add_task();
        stats.inc_alive_task();
        HttpServerTask {
            server: Arc::clone(server),
            cc_info,
            reload_notifier,
            linger_close: false,
        }
    }

    pub(super) async fn into_running(mut self, stream: TcpStream) {
        let (r, w) = stream.into_split();
        let mut buf_reader = BufReader::new(r);
        let mut buf_writer = BufWriter::new(w);

        debug!(
            "new connection from {} to {}",
            self.cc_info.peer_addr(),
            self.cc_info.local_addr()
        );
        let idle_timeout = self.server.config().idle_timeout;
        loop {
            if self.server.quit_requested() {
                break;
            }

            tokio::select! {
                biased;

                r = self.reload_notifier.recv() => {
                    match r {
                        Ok(ServerReloadCommand::QuitRuntime) => break,
                        Err(broadcast::error::RecvError::Closed) => break,
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    }
                }
                r = tokio::time::timeout(idle_timeout, buf_reader.fill_wait_data()) => {
                    match r {
                        Ok(Ok(true)) => {}
                        Ok(Ok(false)) => break,
                        Ok(Err(e)) => {
                            debug!("failed to read new request from {}: {e}", self.cc_info.peer_addr());
                            break;
                        }
                        Err(_) => {
                            debug!("idle timeout for connection from {}", self.cc_info.peer_addr());
                            break;
                        }
                    }
                }
            }

            match self.run_cycle(&mut buf_reader, &mut buf_writer).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    warn!("connection from {} closed: {e:?}", self.cc_info.peer_addr());
                    break;
                }
            }
        }

        let _ = buf_writer.shutdown().await;
        if self.linger_close {
            // let the client receive the error response before the socket is reset
            let mut left = (&mut buf_reader).take(LINGER_MAX_SIZE);
            let _ = tokio::time::timeout(
                LINGER_TIMEOUT,
                tokio::io::copy(&mut left, &mut tokio::io::sink()),
            )
            .await;
        }
    }

    async fn timed_read_request<R>(
        &self,
        reader: &mut R,
        version: &mut Version,
    ) -> anyhow::Result<Result<HttpServerRequest, HttpRequestParseError>>
    where
        R: AsyncBufRead + Unpin,
    {
        match tokio::time::timeout(
            self.server.config().request_read_timeout,
            HttpServerRequest::parse_with_version(reader, self.server.parse_config(), version),
        )
        .await
        {
            Ok(r) => Ok(r),
            Err(_) => Err(anyhow!("request read timeout")),
        }
    }

    /// Run a full request / response cycle, return whether the connection can be reused
    async fn run_cycle<R, W>(&mut self, reader: &mut R, writer: &mut W) -> anyhow::Result<bool>
    where
        R: AsyncBufRead + Send + Unpin,
        W: AsyncWrite + Send + Unpin,
    {
        let mut version = Version::HTTP_11;
        let req = match self.timed_read_request(reader, &mut version).await? {
            Ok(req) => req,
            Err(HttpRequestParseError::ClientClosed) => return Ok(false),
            Err(e) => {
                if let Some(status) = e.status_code() {
                    debug!("invalid request from {}: {e}", self.cc_info.peer_addr());
                    self.linger_close = true;
                    let mut rsp = HttpResponseWriter::new(writer, version, false);
                    let reason = status.canonical_reason().unwrap_or("Bad Request");
                    rsp.send_buffer(status, "text/plain; charset=utf-8", reason.as_bytes())
                        .await
                        .map_err(|e| anyhow!("failed to send error response: {e}"))?;
                    return Ok(false);
                }
                return Err(anyhow!("failed to read request: {e}"));
            }
        };
        self.server.get_server_stats().add_request();
        info!(
            "Request from {}: {} {}",
            self.cc_info.peer_addr(),
            req.method,
            req.uri
        );

        let mut handler: Box<dyn HttpRequestHandler> = self
            .server
            .handler_factory()
            .create_handler(&req, &self.cc_info)
            .unwrap_or_else(|| Box::new(NotFoundHandler));

        let mut rsp = HttpResponseWriter::new(writer, req.version, req.keep_alive());
        if req.method == Method::HEAD {
            rsp.set_head_only();
        }
        if req.expect_continue() {
            rsp.send_continue()
                .await
                .map_err(|e| anyhow!("failed to send 100 Continue: {e}"))?;
        }

        match req.body_type() {
            Some(body_type) => {
                let config = self.server.config();
                let body_reader = HttpBodyReader::with_limit(
                    reader,
                    body_type,
                    config.body_line_max_size,
                    config.max_body_size,
                );
                let mut body_reader = IdleTimeoutReader::new(body_reader, config.body_read_timeout);
                self.handle_request(handler.as_mut(), &req, &mut body_reader, &mut rsp)
                    .await?;
                self.log_response(&req, &rsp);
                if body_reader.timed_out() {
                    debug!(
                        "request body read timeout for connection from {}",
                        self.cc_info.peer_addr()
                    );
                    self.linger_close = true;
                    return Ok(false);
                }
                if !rsp.keep_alive() {
                    if !body_reader.get_ref().finished() {
                        self.linger_close = true;
                    }
                    return Ok(false);
                }
                if body_reader.get_ref().finished() {
                    Ok(true)
                } else {
                    Ok(self.drain_body(&mut body_reader, body_type).await)
                }
            }
            None => {
                let mut body = tokio::io::empty();
                self.handle_request(handler.as_mut(), &req, &mut body, &mut rsp)
                    .await?;
                self.log_response(&req, &rsp);
                Ok(rsp.keep_alive())
            }
        }
    }

    async fn handle_request(
        &self,
        handler: &mut dyn HttpRequestHandler,
        req: &HttpServerRequest,
        body: &mut (dyn AsyncRead + Send + Unpin),
        rsp: &mut HttpResponseWriter<'_>,
    ) -> anyhow::Result<()> {
        if let Err(e) = handler.handle(req, body, rsp).await {
            if rsp.header_sent() {
                return Err(e.context(format!("failed to handle {} {}", req.method, req.uri)));
            }
            warn!(
                "failed to handle {} {} from {}: {e:?}",
                req.method,
                req.uri,
                self.cc_info.peer_addr()
            );
            rsp.set_keep_alive(false)?;
            rsp.send_buffer(
                StatusCode::INTERNAL_SERVER_ERROR,
                "text/plain; charset=utf-8",
                b"Internal Server Error",
            )
            .await?;
            return Ok(());
        }

        if !rsp.finished() {
            rsp.finish().await?;
        }
        Ok(())
    }

    fn log_response(&self, req: &HttpServerRequest, rsp: &HttpResponseWriter<'_>) {
        debug!(
            "{} {} from {} -> {}, {} body bytes",
            req.method,
            req.uri,
            self.cc_info.peer_addr(),
            rsp.status().as_u16(),
            rsp.body_written()
        );
    }

    async fn drain_body<R>(
        &mut self,
        body_reader: &mut R,
        body_type: HttpBodyType,
    ) -> bool
    where
        R: AsyncRead + Unpin,
    {
        match tokio::io::copy(body_reader, &mut tokio::io::sink()).await {
            Ok(n) => {
                debug!(
                    "drained {n} bytes of unread {body_type:?} body from {}",
                    self.cc_info.peer_addr()
                );
                true
            }
            Err(e) => {
                debug!(
                    "failed to drain request body from {}: {e}",
                    self.cc_info.peer_addr()
                );
                self.linger_close = true;
                false
            }
        }
    }
}
