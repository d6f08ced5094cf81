/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use std::net::SocketAddr;
use std::sync::Arc;

use log::{info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use super::{ClientConnectionInfo, HttpServer, HttpServerTask, ServerReloadCommand};

fn to_canonical(addr: SocketAddr) -> SocketAddr {
    SocketAddr::new(addr.ip().to_canonical(), addr.port())
}

pub(super) struct HttpServerRuntime {
    server: Arc<HttpServer>,
}

impl HttpServerRuntime {
    pub(super) fn new(server: &Arc<HttpServer>) -> Self {
        HttpServerRuntime {
            server: Arc::clone(server),
        }
    }

    pub(super) async fn run(
        self,
        listener: TcpListener,
        mut server_reload_channel: broadcast::Receiver<ServerReloadCommand>,
    ) {
        use broadcast::error::RecvError;

        match listener.local_addr() {
            Ok(addr) => info!("started server on {addr}"),
            Err(_) => info!("started server"),
        }

        let stats = self.server.get_server_stats();
        if !self.server.quit_requested() {
            loop {
                tokio::select! {
                    biased;

                    ev = server_reload_channel.recv() => {
                        match ev {
                            Ok(ServerReloadCommand::QuitRuntime) => {},
                            Err(RecvError::Closed) => {},
                            Err(RecvError::Lagged(dropped)) => {
                                warn!("server reload notify channel overflowed, {dropped} msg dropped");
                                continue
                            },
                        }

                        info!("server will go offline");
                        break;
                    }
                    result = listener.accept() => {
                        match result {
                            Ok((stream, peer_addr)) => {
                                stats.add_accepted();
                                self.run_task(stream, to_canonical(peer_addr));
                            }
                            Err(e) => {
                                stats.add_accept_failed();
                                warn!("server accept: {e:?}");
                            }
                        }
                    }
                }
            }
        }

        drop(listener);
        info!("server offline, {} connections alive", stats.get_alive_count());
    }

    fn run_task(&self, stream: TcpStream, peer_addr: SocketAddr) {
        let local_addr = match stream.local_addr() {
            Ok(addr) => to_canonical(addr),
            Err(e) => {
                warn!("failed to get local address of connection from {peer_addr}: {e}");
                return;
            }
        };
        let cc_info = ClientConnectionInfo::new(peer_addr, local_addr);
        let task = HttpServerTask::new(&self.server, cc_info, self.server.subscribe_reload());
        tokio::spawn(async move {
            task.into_running(stream).await;
        });
    }
}
