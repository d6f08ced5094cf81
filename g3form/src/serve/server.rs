/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::anyhow;
use log::{debug, info};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use g3_http::server::HttpRequestParseConfig;

use super::{HttpRequestHandlerFactory, HttpServerRuntime, HttpServerStats, ServerReloadCommand};
use crate::config::ServerConfig;

const TASK_WAIT_INTERVAL: Duration = Duration::from_millis(100);

pub struct HttpServer {
    config: Arc<ServerConfig>,
    parse_config: HttpRequestParseConfig,
    handler_factory: Arc<dyn HttpRequestHandlerFactory>,
    server_stats: Arc<HttpServerStats>,
    quit: AtomicBool,
    reload_sender: broadcast::Sender<ServerReloadCommand>,
}

impl HttpServer {
    pub fn new(
        config: Arc<ServerConfig>,
        handler_factory: Arc<dyn HttpRequestHandlerFactory>,
    ) -> Self {
        let reload_sender = broadcast::Sender::new(16);
        HttpServer {
            parse_config: config.request_parse_config(),
            config,
            handler_factory,
            server_stats: Arc::new(HttpServerStats::default()),
            quit: AtomicBool::new(false),
            reload_sender,
        }
    }

    #[inline]
    pub fn config(&self) -> &Arc<ServerConfig> {
        &self.config
    }

    #[inline]
    pub(super) fn parse_config(&self) -> &HttpRequestParseConfig {
        &self.parse_config
    }

    #[inline]
    pub(super) fn handler_factory(&self) -> &dyn HttpRequestHandlerFactory {
        self.handler_factory.as_ref()
    }

    #[inline]
    pub fn get_server_stats(&self) -> Arc<HttpServerStats> {
        self.server_stats.clone()
    }

    pub(super) fn subscribe_reload(&self) -> broadcast::Receiver<ServerReloadCommand> {
        self.reload_sender.subscribe()
    }

    /// Check this after subscribing, for the quit command sent before that
    pub(super) fn quit_requested(&self) -> bool {
        self.quit.load(Ordering::Acquire)
    }

    /// Create the listening socket for the configured address
    pub fn bind(&self) -> anyhow::Result<TcpListener> {
        let addr = self.config.listen;
        super::listen::new_listen_to(addr, self.config.backlog)
            .map_err(|e| anyhow!("failed to listen on {addr}: {e}"))
    }

    /// Stop accepting new connections and close all connections after the
    /// current request
    pub fn quit(&self) {
        self.quit.store(true, Ordering::Release);
        let _ = self.reload_sender.send(ServerReloadCommand::QuitRuntime);
    }

    /// Serve on the listener until quit, then wait for all connection tasks
    pub async fn run(self: &Arc<Self>, listener: TcpListener) {
        let runtime = HttpServerRuntime::new(self);
        runtime.run(listener, self.subscribe_reload()).await;
        self.wait_all_tasks().await;

        let stats = &self.server_stats;
        info!(
            "server stopped: {} connections accepted, {} accept failures, {} requests served",
            stats.get_accepted(),
            stats.get_accept_failed(),
            stats.get_request_total()
        );
    }

    async fn wait_all_tasks(&self) {
        loop {
            let alive = self.server_stats.get_alive_count();
            if alive <= 0 {
                break;
            }
            debug!("waiting for {alive} connection tasks to finish");
            tokio::time::sleep(TASK_WAIT_INTERVAL).await;
        }
    }
}
