//! 域名所有权校验记录及其查询契约。
//!
//! # 教案式说明
//! - **意图 (Why)**：自定义主机只有在租户证明其拥有对应域名后才能对外发布；校验记录由外部存储维护，
//!   引擎只读消费；
//! - **契约 (What)**：记录集合按域名去重；某主机被视为“已校验”当且仅当存在一条 `verified = true`
//!   的记录，其域名等于该主机或是该主机的父域；
//! - **权衡 (Trade-offs)**：父域覆盖子域与常见 DNS TXT 校验语义一致，避免为每个子域重复校验。

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::accessor::TrafficAccessor;

/// 单条域名所有权校验记录。
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DomainVerification {
    pub domain: String,
    #[serde(default)]
    pub verified: bool,
}

impl DomainVerification {
    pub fn verified(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            verified: true,
        }
    }

    pub fn unverified(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            verified: false,
        }
    }
}

/// 以域名为键的校验记录集合。
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DomainVerificationSet {
    records: BTreeMap<String, DomainVerification>,
}

impl DomainVerificationSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入记录；域名会被规范化为小写并去除首尾的点，同名记录后写覆盖先写。
    pub fn insert(&mut self, record: DomainVerification) -> Option<DomainVerification> {
        let domain = normalize(&record.domain);
        self.records.insert(
            domain.clone(),
            DomainVerification {
                domain,
                verified: record.verified,
            },
        )
    }

    pub fn get(&self, domain: &str) -> Option<&DomainVerification> {
        self.records.get(&normalize(domain))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DomainVerification> {
        self.records.values()
    }

    /// 判断主机是否被某条已通过的记录覆盖。
    ///
    /// 自 `host` 本身开始逐级剥离最左侧标签，依次查找；任何一级命中已校验记录即返回 `true`。
    pub fn is_host_verified(&self, host: &str) -> bool {
        let host = normalize(host);
        let mut candidate = host.as_str();
        loop {
            if candidate.is_empty() {
                return false;
            }
            if self.records.get(candidate).is_some_and(|r| r.verified) {
                return true;
            }
            match candidate.split_once('.') {
                Some((_, parent)) => candidate = parent,
                None => return false,
            }
        }
    }
}

impl FromIterator<DomainVerification> for DomainVerificationSet {
    fn from_iter<T: IntoIterator<Item = DomainVerification>>(iter: T) -> Self {
        let mut set = Self::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

fn normalize(domain: &str) -> String {
    domain.trim().trim_matches('.').to_ascii_lowercase()
}

/// 读取校验记录失败。
#[derive(Debug, Error)]
#[error("domain verification lookup failed: {message}")]
pub struct VerificationError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl VerificationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_cause(
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(cause)),
        }
    }
}

/// 域名校验记录的读取方，由外部存储实现并注入引擎。
///
/// 实现方可以执行网络 I/O；超时与取消由调用方在 `evaluate` 外层施加。
#[async_trait]
pub trait DomainVerifier: Send + Sync {
    async fn domain_verifications(
        &self,
        accessor: &dyn TrafficAccessor,
    ) -> Result<DomainVerificationSet, VerificationError>;
}

/// 固定记录集合，适用于演示与测试场景。
#[async_trait]
impl DomainVerifier for DomainVerificationSet {
    async fn domain_verifications(
        &self,
        _accessor: &dyn TrafficAccessor,
    ) -> Result<DomainVerificationSet, VerificationError> {
        Ok(self.clone())
    }
}
