//! Service configuration, read once at startup from a TOML file.
//!
//! `[Service]` with `Host` and `Port` is required; every other section is
//! optional and falls back to the defaults below.

use crate::{
    error::{ServiceError, ServiceResult},
    query::DEFAULT_HEAD_LIMIT,
    schema::DEFAULT_SCORE_COLUMN,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_DB_PATH: &str = "data/results.db";
pub const DEFAULT_TABLE: &str = "suspention_results";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_LOG_LEVEL: &str = "debug";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSection {
    #[serde(rename = "Host")]
    pub host: String,
    #[serde(rename = "Port")]
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path:  String,
    pub table: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_DB_PATH.into(),
            table: DEFAULT_TABLE.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub score_column: String,
    pub head_limit:   usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            score_column: DEFAULT_SCORE_COLUMN.into(),
            head_limit: DEFAULT_HEAD_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir:   String,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: DEFAULT_LOG_DIR.into(),
            level: DEFAULT_LOG_LEVEL.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(rename = "Service")]
    pub service: ServiceSection,
    #[serde(rename = "Store", default)]
    pub store: StoreConfig,
    #[serde(rename = "Pipeline", default)]
    pub pipeline: PipelineConfig,
    #[serde(rename = "Logging", default)]
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    pub fn load(path: impl AsRef<Path>) -> ServiceResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServiceError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> ServiceResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| ServiceError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ServiceResult<()> {
        if self.service.host.trim().is_empty() {
            return Err(ServiceError::Config("Service.Host is empty".into()));
        }
        if !is_identifier(&self.store.table) {
            return Err(ServiceError::Config(format!(
                "Store.table '{}' is not a plain identifier",
                self.store.table
            )));
        }
        if self.pipeline.score_column.trim().is_empty() {
            return Err(ServiceError::Config("Pipeline.score_column is empty".into()));
        }
        Ok(())
    }

    /// Socket address to bind. Host names other than IP literals are
    /// resolved through the system resolver.
    pub fn bind_addr(&self) -> ServiceResult<SocketAddr> {
        use std::net::ToSocketAddrs;
        (self.service.host.as_str(), self.service.port)
            .to_socket_addrs()
            .map_err(|e| {
                ServiceError::Config(format!("cannot resolve {}: {e}", self.service.host))
            })?
            .next()
            .ok_or_else(|| {
                ServiceError::Config(format!("{} resolves to no address", self.service.host))
            })
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
