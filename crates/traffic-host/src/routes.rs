//! 下游流量路由回调契约。
//!
//! 引擎只调用 [`TrafficRoutes`]，不解释其结果，除错误传播外不做任何假设；
//! 回调自身的幂等与错误语义属于外部契约。

use async_trait::async_trait;
use thiserror::Error;

use crate::accessor::ResourceKey;

/// 一次路由操作的目标：哪个资源的哪个主机。
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct RouteTarget {
    pub resource: ResourceKey,
    pub host: String,
    /// 资源的托管主机，便于下游将自定义主机与平台主机关联到同一后端。
    pub managed_host: String,
}

/// 路由回调失败。
#[derive(Debug, Error)]
#[error("traffic route operation failed: {message}")]
pub struct RouteError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl RouteError {
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

/// 幂等的路由创建/更新与删除操作。
///
/// # 契约说明
/// - `create_or_update` 对同一目标重复调用应收敛到同一状态；
/// - `delete` 对不存在的路由应视为成功。
#[async_trait]
pub trait TrafficRoutes: Send + Sync {
    async fn create_or_update(&self, target: &RouteTarget) -> Result<(), RouteError>;

    async fn delete(&self, target: &RouteTarget) -> Result<(), RouteError>;
}
