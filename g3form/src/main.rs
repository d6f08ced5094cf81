/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use std::sync::Arc;

use anyhow::{Context, anyhow};
use log::{debug, error};

use g3form::config::ServerConfig;
use g3form::form::FormHandlerFactory;
use g3form::opts::ProcArgs;
use g3form::serve::HttpServer;

fn main() -> anyhow::Result<()> {
    let Some(proc_args) =
        g3form::opts::parse_clap().context("failed to parse command line options")?
    else {
        return Ok(());
    };

    // set up process logger early, only proc args is used inside
    let _log_guard =
        g3form::log::setup(proc_args.verbose_level).context("failed to setup logger")?;

    let config = load_config(&proc_args).context("failed to load config")?;

    let ret = tokio_run(config);
    match ret {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("{e:?}");
            Err(e)
        }
    }
}

fn load_config(args: &ProcArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config_file {
        Some(file) => {
            let config = ServerConfig::load(file)?;
            debug!("loaded config from {}", file.display());
            config
        }
        None => ServerConfig::default(),
    };
    if let Some(port) = args.port {
        config.set_port(port);
    }
    Ok(config)
}

fn tokio_run(config: ServerConfig) -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow!("failed to start runtime: {e}"))?;
    rt.block_on(serve(config))
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let config = Arc::new(config);
    let factory = FormHandlerFactory::new(config.clone());
    let server = Arc::new(HttpServer::new(config, Arc::new(factory)));

    let listener = server.bind()?;
    g3form::signal::register(&server).context("failed to setup signal handler")?;

    server.run(listener).await;
    Ok(())
}
