//! 主机分配与策略引擎。
//!
//! # 教案式说明
//! - **意图 (Why)**：对单个资源决定其可宣告的主机集合，并给出唯一的协调指令；
//!   主机必须先被持久化，证书签发等下游消费者才能基于它行动，否则并发更新冲突可能导致
//!   证书与最终保存的主机不一致。
//! - **执行 (How)**：[`HostStep::select`] 按固定顺序检查守卫条件，只选出一个步骤；
//!   [`HostReconciler::evaluate`] 执行该步骤并返回指令。顺序即语义，不存在隐式的分支贯穿。
//! - **契约 (What)**：
//!   - 首次分配托管主机后无条件返回 [`ReconcileStatus::Stop`]；
//!   - 策略禁止自定义主机时以托管主机替换，返回 [`ReconcileStatus::Continue`]；
//!   - 查询校验记录失败返回的错误携带 `Continue`，自定义主机处理失败返回的错误携带 `Stop`
//!     （见 [`HostError::directive`]）。

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::{
    accessor::TrafficAccessor,
    annotations::{self, CUSTOM_HOSTS_REPLACED, MANAGED_HOST, PENDING_CUSTOM_HOSTS},
    config::HostPolicyConfig,
    custom_hosts::process_custom_hosts,
    error::HostError,
    host_id::{HostIdGenerator, UuidHostIdGenerator},
    routes::TrafficRoutes,
    verification::DomainVerifier,
};

/// 交给驱动器的协调指令。
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ReconcileStatus {
    /// 驱动器须先持久化当前快照，本轮不得进入下游步骤。
    Stop,
    /// 变更（若有）可以随后续步骤一并携带，无需强制检查点。
    Continue,
}

/// 协调步骤的统一契约，驱动器按顺序串联多个实现。
#[async_trait]
pub trait Reconciler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn reconcile(
        &self,
        accessor: &mut dyn TrafficAccessor,
    ) -> Result<ReconcileStatus, HostError>;
}

/// 决策树中被选中的步骤。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HostStep {
    /// 托管主机注解缺失，需要分配。
    AssignManagedHost,
    /// 自定义主机被策略禁止，以托管主机替换。
    EnforceDisabledPolicy,
    /// 自定义主机已开启，按域名校验记录处理。
    ProcessVerifiedHosts,
}

impl HostStep {
    /// 依序检查守卫条件，第一个命中的步骤胜出。
    #[must_use]
    pub fn select(accessor: &dyn TrafficAccessor, config: &HostPolicyConfig) -> Self {
        if !accessor.has_annotation(MANAGED_HOST) {
            return HostStep::AssignManagedHost;
        }
        if !config.custom_hosts_enabled {
            return HostStep::EnforceDisabledPolicy;
        }
        HostStep::ProcessVerifiedHosts
    }
}

/// 主机协调器：持有策略配置与全部注入的协作方。
pub struct HostReconciler {
    config: HostPolicyConfig,
    ids: Arc<dyn HostIdGenerator>,
    verifier: Arc<dyn DomainVerifier>,
    routes: Arc<dyn TrafficRoutes>,
}

impl std::fmt::Debug for HostReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostReconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HostReconciler {
    /// 使用默认的 UUID 标识生成器构造协调器。
    pub fn new(
        config: HostPolicyConfig,
        verifier: Arc<dyn DomainVerifier>,
        routes: Arc<dyn TrafficRoutes>,
    ) -> Self {
        Self {
            config,
            ids: Arc::new(UuidHostIdGenerator),
            verifier,
            routes,
        }
    }

    /// 替换标识生成器，主要用于测试中获得确定的主机名。
    #[must_use]
    pub fn with_id_generator(mut self, ids: Arc<dyn HostIdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    #[must_use]
    pub fn config(&self) -> &HostPolicyConfig {
        &self.config
    }

    /// 对资源快照执行一次协调。
    ///
    /// 成功时返回指令；失败时错误自带指令，驱动器应先按 [`HostError::directive`] 决定是否持久化，
    /// 再按常规重试/退避策略处理错误。
    pub async fn evaluate(
        &self,
        accessor: &mut dyn TrafficAccessor,
    ) -> Result<ReconcileStatus, HostError> {
        let resource = accessor.key().to_string();
        let span = info_span!("host_reconcile", resource = %resource);
        async move {
            let step = HostStep::select(accessor, &self.config);
            debug!(?step, "selected host step");
            let result = match step {
                HostStep::AssignManagedHost => Ok(self.assign_managed_host(accessor)),
                HostStep::EnforceDisabledPolicy => Ok(self.enforce_disabled_policy(accessor)),
                HostStep::ProcessVerifiedHosts => self.process_verified_hosts(accessor).await,
            };
            if let Err(err) = &result {
                warn!(
                    code = err.code(),
                    directive = ?err.directive(),
                    error = %err,
                    "host reconcile failed"
                );
            }
            result
        }
        .instrument(span)
        .await
    }

    fn assign_managed_host(&self, accessor: &mut dyn TrafficAccessor) -> ReconcileStatus {
        let host = format!("{}.{}", self.ids.generate(), self.config.managed_domain);
        info!(host = %host, "assigned managed host");
        accessor.set_annotation(MANAGED_HOST, host);
        // 主机必须先落盘，下游才能基于它签发证书。
        ReconcileStatus::Stop
    }

    /// 以托管主机替换全部自定义主机。
    ///
    /// - 待定主机同样视为被策略撤下：计入审计说明并清除待定注解，重新开启后不会被自动恢复；
    /// - 活跃注解保持不变：禁用期间引擎不调用路由回调，重新开启后的首轮处理据此删除遗留路由。
    fn enforce_disabled_policy(&self, accessor: &mut dyn TrafficAccessor) -> ReconcileStatus {
        let Some(managed_host) = accessor.annotation(MANAGED_HOST).map(str::to_owned) else {
            return ReconcileStatus::Continue;
        };
        let mut replaced = accessor.replace_custom_hosts(&managed_host);

        if let Some(raw) = accessor.remove_annotation(PENDING_CUSTOM_HOSTS) {
            match annotations::decode_host_list(Some(&raw)) {
                Ok(pending) => {
                    for host in pending {
                        if host != managed_host && !replaced.contains(&host) {
                            replaced.push(host);
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, "dropping malformed pending custom hosts annotation");
                }
            }
        }

        if !replaced.is_empty() {
            info!(
                host = %managed_host,
                replaced = ?replaced,
                "replaced custom hosts because custom hosts are disabled"
            );
            accessor.set_annotation(
                CUSTOM_HOSTS_REPLACED,
                annotations::replaced_audit_message(&replaced, &managed_host),
            );
        }
        ReconcileStatus::Continue
    }

    async fn process_verified_hosts(
        &self,
        accessor: &mut dyn TrafficAccessor,
    ) -> Result<ReconcileStatus, HostError> {
        let verifications = self
            .verifier
            .domain_verifications(&*accessor)
            .await
            .map_err(|source| HostError::VerificationLookup {
                resource: accessor.key().to_string(),
                source,
            })?;

        let report = process_custom_hosts(accessor, &verifications, self.routes.as_ref()).await?;
        debug!(
            kept = ?report.kept,
            pending = ?report.pending,
            deleted = ?report.deleted,
            "processed custom hosts"
        );
        Ok(ReconcileStatus::Continue)
    }
}

#[async_trait]
impl Reconciler for HostReconciler {
    fn name(&self) -> &'static str {
        "host reconciler"
    }

    async fn reconcile(
        &self,
        accessor: &mut dyn TrafficAccessor,
    ) -> Result<ReconcileStatus, HostError> {
        self.evaluate(accessor).await
    }
}
