//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义主机协调引擎对外暴露的错误语义；
//! - 每个错误自带协调指令，保证驱动器在拿到错误时仍然知道是否需要先做持久化检查点。
//!
//! ## 设计要求（What）
//! - 所有错误类型实现 `thiserror::Error`，并保留底层 `source` 链；
//! - 引擎内部不存在不可恢复错误，所有失败都交由驱动器按重试/退避策略处理。

use thiserror::Error;

use crate::{reconciler::ReconcileStatus, routes::RouteError, verification::VerificationError};

/// 主机协调错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：区分“只读查询失败”与“下游路由状态可能已部分落地”两类失败，
///   前者无需检查点即可重试，后者必须先持久化当前快照。
/// - **契约 (What)**：通过 [`HostError::directive`] 获得与错误配对的协调指令；
///   通过 [`HostError::code`] 获得稳定的错误码，供告警与指标维度使用。
#[derive(Debug, Error)]
pub enum HostError {
    /// 读取域名所有权校验记录失败。
    ///
    /// - **契约 (What)**：此时自定义主机保持原样，不做破坏性清理；协调继续。
    #[error("error getting domain verifications for `{resource}`")]
    VerificationLookup {
        resource: String,
        #[source]
        source: VerificationError,
    },

    /// 自定义主机处理期间调用下游路由回调失败。
    ///
    /// - **契约 (What)**：`host` 为出错的主机名；路由状态可能已部分应用，需强制检查点。
    #[error("error processing custom host `{host}` for `{resource}`")]
    RouteSync {
        resource: String,
        host: String,
        #[source]
        source: RouteError,
    },

    /// 自定义主机处理所需的前置状态缺失或损坏，例如托管主机注解不存在、簿记注解不是合法 JSON。
    #[error("error processing custom hosts for `{resource}`: {detail}")]
    InvalidState { resource: String, detail: String },
}

impl HostError {
    /// 返回与该错误配对的协调指令。
    ///
    /// - 校验记录查询失败不触及下游状态，返回 [`ReconcileStatus::Continue`]；
    /// - 自定义主机处理失败可能留下部分路由状态，返回 [`ReconcileStatus::Stop`]。
    #[must_use]
    pub fn directive(&self) -> ReconcileStatus {
        match self {
            HostError::VerificationLookup { .. } => ReconcileStatus::Continue,
            HostError::RouteSync { .. } | HostError::InvalidState { .. } => ReconcileStatus::Stop,
        }
    }

    /// 稳定错误码。
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            HostError::VerificationLookup { .. } => "host.verification.lookup",
            HostError::RouteSync { .. } => "host.custom.route_sync",
            HostError::InvalidState { .. } => "host.custom.invalid_state",
        }
    }

    /// 是否属于自定义主机处理失败。
    #[must_use]
    pub fn is_custom_host_processing(&self) -> bool {
        matches!(
            self,
            HostError::RouteSync { .. } | HostError::InvalidState { .. }
        )
    }

    pub(crate) fn invalid_state(resource: impl Into<String>, detail: impl Into<String>) -> Self {
        HostError::InvalidState {
            resource: resource.into(),
            detail: detail.into(),
        }
    }
}
