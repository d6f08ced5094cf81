/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use std::sync::Arc;

use crate::serve::HttpServer;

#[cfg(unix)]
pub fn register(server: &Arc<HttpServer>) -> anyhow::Result<()> {
    use std::future::poll_fn;

    use anyhow::anyhow;
    use log::info;
    use tokio::signal::unix::{SignalKind, signal};

    for (kind, name) in [
        (SignalKind::interrupt(), "SIGINT"),
        (SignalKind::quit(), "SIGQUIT"),
        (SignalKind::terminate(), "SIGTERM"),
    ] {
        let mut sig =
            signal(kind).map_err(|e| anyhow!("failed to create {name} listener: {e}"))?;
        let server = Arc::clone(server);
        tokio::spawn(async move {
            if poll_fn(|cx| sig.poll_recv(cx)).await.is_some() {
                info!("got {name} signal, quit now");
                server.quit();
            }
        });
    }

    Ok(())
}

#[cfg(not(unix))]
pub fn register(server: &Arc<HttpServer>) -> anyhow::Result<()> {
    use log::{info, warn};

    let server = Arc::clone(server);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(_) => {
                info!("got ctrl-c signal, quit now");
                server.quit();
            }
            Err(e) => warn!("failed to listen for ctrl-c signal: {e}"),
        }
    });

    Ok(())
}
