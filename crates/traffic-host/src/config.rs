//! 主机策略配置。
//!
//! # 教案式说明
//! - **意图 (Why)**：托管域名后缀与自定义主机开关是平台级配置，由运维以 TOML 文件下发；
//! - **契约 (What)**：加载后立即校验并规范化托管域名，非法配置在启动阶段暴露，而非在协调过程中；
//! - **权衡 (Trade-offs)**：`custom_hosts_enabled` 缺省为 `false`，未显式开启时一律以托管主机替换，
//!   避免未经校验的域名被意外发布。

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

const MAX_LABEL_LEN: usize = 63;
const MAX_DOMAIN_LEN: usize = 253;

/// 配置加载与校验错误。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read host policy config `{}`", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse host policy config")]
    Parse(#[from] toml::de::Error),

    #[error("managed domain must not be empty")]
    EmptyManagedDomain,

    #[error("managed domain `{domain}` is invalid: {reason}")]
    InvalidManagedDomain { domain: String, reason: &'static str },
}

impl ConfigError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "host.config.read",
            ConfigError::Parse(_) => "host.config.parse",
            ConfigError::EmptyManagedDomain | ConfigError::InvalidManagedDomain { .. } => {
                "host.config.managed_domain"
            }
        }
    }
}

/// 主机协调引擎的策略配置。
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct HostPolicyConfig {
    /// 托管主机的域名后缀，例如 `apps.example.com`。
    pub managed_domain: String,
    /// 是否允许资源发布用户自定义主机。
    #[serde(default)]
    pub custom_hosts_enabled: bool,
}

impl HostPolicyConfig {
    /// 以代码方式构造并校验配置。
    pub fn new(
        managed_domain: impl Into<String>,
        custom_hosts_enabled: bool,
    ) -> Result<Self, ConfigError> {
        Self {
            managed_domain: managed_domain.into(),
            custom_hosts_enabled,
        }
        .validated()
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validated()
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// 规范化托管域名（去空白、去首尾点、转小写）并逐标签校验。
    pub fn validated(mut self) -> Result<Self, ConfigError> {
        let domain = self
            .managed_domain
            .trim()
            .trim_matches('.')
            .to_ascii_lowercase();
        if domain.is_empty() {
            return Err(ConfigError::EmptyManagedDomain);
        }
        validate_domain(&domain)?;
        self.managed_domain = domain;
        Ok(self)
    }
}

fn validate_domain(domain: &str) -> Result<(), ConfigError> {
    let invalid = |reason| ConfigError::InvalidManagedDomain {
        domain: domain.to_owned(),
        reason,
    };

    if domain.len() > MAX_DOMAIN_LEN {
        return Err(invalid("domain exceeds 253 characters"));
    }
    for label in domain.split('.') {
        if label.is_empty() {
            return Err(invalid("empty label"));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(invalid("label exceeds 63 characters"));
        }
        if !label
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        {
            return Err(invalid("labels may only contain [a-z0-9-]"));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(invalid("labels must not start or end with '-'"));
        }
    }
    Ok(())
}
