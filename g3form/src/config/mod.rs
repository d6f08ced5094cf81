/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2026 G3-OSS developers.
 */

use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, anyhow};
use yaml_rust::{Yaml, YamlLoader, yaml};

use g3_http::multipart::MultipartDecodeConfig;
use g3_http::server::HttpRequestParseConfig;

mod value;

pub const DEFAULT_LISTEN_PORT: u16 = 9980;
const DEFAULT_LISTEN_IP: IpAddr = IpAddr::V6(Ipv6Addr::UNSPECIFIED);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub backlog: u32,
    pub idle_timeout: Duration,
    pub request_read_timeout: Duration,
    pub body_read_timeout: Duration,
    pub max_line_size: usize,
    pub max_header_size: usize,
    pub max_body_size: u64,
    pub body_line_max_size: usize,
    pub multipart_read_chunk: usize,
    pub max_part_header_size: usize,
    pub max_form_field_size: usize,
    pub form_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen: SocketAddr::new(DEFAULT_LISTEN_IP, DEFAULT_LISTEN_PORT),
            backlog: 1024,
            idle_timeout: Duration::from_secs(60),
            request_read_timeout: Duration::from_secs(30),
            body_read_timeout: Duration::from_secs(30),
            max_line_size: 8 << 10,
            max_header_size: 64 << 10,
            max_body_size: 64 << 20,
            body_line_max_size: 1 << 10,
            multipart_read_chunk: 16 << 10,
            max_part_header_size: 16 << 10,
            max_form_field_size: 64 << 10,
            form_path: "/form".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn load(file: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(file)
            .map_err(|e| anyhow!("failed to read {}: {e}", file.display()))?;
        ServerConfig::parse_str(&content)
    }

    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        let docs = YamlLoader::load_from_str(content).context("invalid yaml content")?;
        match docs.first() {
            Some(Yaml::Hash(map)) => ServerConfig::parse(map),
            Some(Yaml::Null) | None => Ok(ServerConfig::default()),
            Some(_) => Err(anyhow!("the root of config should be a map")),
        }
    }

    fn parse(map: &yaml::Hash) -> anyhow::Result<Self> {
        let mut config = ServerConfig::default();
        value::foreach_kv(map, |k, v| config.set(k, v))?;
        config.check()?;
        Ok(config)
    }

    fn set(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match value::normalize_key(k).as_str() {
            "listen" => {
                self.listen = value::as_socket_addr(v)?;
                Ok(())
            }
            "backlog" => {
                self.backlog = value::as_u32(v)?;
                Ok(())
            }
            "idle_timeout" => {
                self.idle_timeout = value::as_duration(v)?;
                Ok(())
            }
            "request_read_timeout" => {
                self.request_read_timeout = value::as_duration(v)?;
                Ok(())
            }
            "body_read_timeout" => {
                self.body_read_timeout = value::as_duration(v)?;
                Ok(())
            }
            "max_line_size" => {
                self.max_line_size = value::as_humanize_usize(v)?;
                Ok(())
            }
            "max_header_size" => {
                self.max_header_size = value::as_humanize_usize(v)?;
                Ok(())
            }
            "max_body_size" => {
                self.max_body_size = value::as_humanize_u64(v)?;
                Ok(())
            }
            "body_line_max_size" => {
                self.body_line_max_size = value::as_humanize_usize(v)?;
                Ok(())
            }
            "multipart_read_chunk" => {
                self.multipart_read_chunk = value::as_humanize_usize(v)?;
                Ok(())
            }
            "max_part_header_size" => {
                self.max_part_header_size = value::as_humanize_usize(v)?;
                Ok(())
            }
            "max_form_field_size" => {
                self.max_form_field_size = value::as_humanize_usize(v)?;
                Ok(())
            }
            "form_path" => {
                self.form_path = value::as_string(v)?;
                Ok(())
            }
            _ => Err(anyhow!("invalid key {k}")),
        }
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.max_line_size == 0 || self.max_header_size == 0 || self.body_line_max_size == 0
        {
            return Err(anyhow!("line and header size limits should not be 0"));
        }
        if self.max_line_size > self.max_header_size {
            return Err(anyhow!(
                "max line size {} is larger than max header size {}",
                self.max_line_size,
                self.max_header_size
            ));
        }
        if self.multipart_read_chunk == 0 {
            return Err(anyhow!("multipart read chunk should not be 0"));
        }
        if self.max_part_header_size == 0 {
            return Err(anyhow!("max part header size should not be 0"));
        }
        if self.body_read_timeout.is_zero() {
            return Err(anyhow!("body read timeout should not be 0"));
        }
        if !self.form_path.starts_with('/') {
            return Err(anyhow!("form path {} should start with '/'", self.form_path));
        }
        Ok(())
    }

    pub fn set_port(&mut self, port: u16) {
        self.listen.set_port(port);
    }

    pub fn request_parse_config(&self) -> HttpRequestParseConfig {
        HttpRequestParseConfig {
            max_line_size: self.max_line_size,
            max_header_size: self.max_header_size,
            max_body_size: self.max_body_size,
        }
    }

    pub fn multipart_decode_config(&self) -> MultipartDecodeConfig {
        MultipartDecodeConfig {
            max_part_header_size: self.max_part_header_size,
            read_chunk_size: self.multipart_read_chunk,
        }
    }
}
