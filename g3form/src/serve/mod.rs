/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use std::net::SocketAddr;

mod handler;
pub use handler::{HttpRequestHandler, HttpRequestHandlerFactory, NotFoundHandler};

mod listen;

mod stats;
pub use stats::HttpServerStats;

mod server;
pub use server::HttpServer;

mod runtime;
use runtime::HttpServerRuntime;

mod task;
use task::HttpServerTask;

#[derive(Clone)]
pub(crate) enum ServerReloadCommand {
    QuitRuntime,
}

#[derive(Clone, Copy, Debug)]
pub struct ClientConnectionInfo {
    peer_addr: SocketAddr,
    local_addr: SocketAddr,
}

impl ClientConnectionInfo {
    pub fn new(peer_addr: SocketAddr, local_addr: SocketAddr) -> Self {
        ClientConnectionInfo {
            peer_addr,
            local_addr,
        }
    }

    #[inline]
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    #[inline]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}
