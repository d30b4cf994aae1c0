//! # traffic-host
//!
//! ## 定位与职责（Why）
//! - 作为流量资源协调环路中的一个步骤，决定单个资源可以对外宣告哪些主机名：平台托管主机、
//!   用户自定义主机，或在策略禁止时以托管主机强制替换自定义主机；
//! - 同时向外层驱动器给出唯一的指令（[`ReconcileStatus::Stop`] / [`ReconcileStatus::Continue`]），
//!   告知其是否必须先持久化当前变更，再进入证书签发等下游步骤。
//!
//! ## 架构嵌入（Where）
//! - `accessor` 定义资源能力抽象，`ingress` 提供一个具体实现；
//! - `reconciler` 承载有序决策树，`custom_hosts` 负责基于域名所有权校验的自定义主机处理；
//! - `verification`、`routes`、`host_id` 描述由外部协作方注入的依赖；
//! - `config` 与 `error` 分别负责策略配置加载与错误语义。
//!
//! ## 边界（What）
//! - 引擎只修改内存中的资源快照，从不持久化；持久化、重试与退避属于驱动器职责；
//! - 同一资源同一时刻至多存在一个协调过程，这一独占性由驱动器保证。

pub mod accessor;
pub mod annotations;
pub mod config;
pub mod custom_hosts;
pub mod error;
pub mod host_id;
pub mod ingress;
pub mod reconciler;
pub mod routes;
pub mod verification;

pub use accessor::{ResourceKey, TrafficAccessor};
pub use config::{ConfigError, HostPolicyConfig};
pub use custom_hosts::{CustomHostReport, process_custom_hosts};
pub use error::HostError;
pub use host_id::{HostIdGenerator, UuidHostIdGenerator};
pub use ingress::IngressResource;
pub use reconciler::{HostReconciler, HostStep, ReconcileStatus, Reconciler};
pub use routes::{RouteError, RouteTarget, TrafficRoutes};
pub use verification::{
    DomainVerification, DomainVerificationSet, DomainVerifier, VerificationError,
};
