//! 基于域名所有权校验的自定义主机处理。
//!
//! # 教案式说明
//! - **意图 (Why)**：自定义主机只有在存在有效校验记录时才允许发布；未校验的主机需要从资源上撤下并删除
//!   对应路由，等待校验通过后再自动恢复；用户从声明中移除的主机同样需要删除路由。
//! - **契约 (What)**：
//!   - 保留的主机列表 = 托管主机（若用户声明了它）+ 已校验的自定义主机，按声明顺序去重；
//!   - 未校验主机写入待定注解，校验通过后在下一次处理中恢复；
//!   - 活跃注解记录已成功建立路由的主机，据此识别需删除的历史主机；
//!   - 任一回调失败即返回错误，但返回前总会写回活跃注解，使强制检查点能持久化部分落地的路由状态。
//! - **执行 (How)**：先规划（纯计算），再写回主机列表与待定注解，最后依次执行创建/删除回调。

use std::collections::BTreeSet;

use tracing::debug;

use crate::{
    accessor::TrafficAccessor,
    annotations::{self, ACTIVE_CUSTOM_HOSTS, MANAGED_HOST, PENDING_CUSTOM_HOSTS},
    error::HostError,
    routes::{RouteTarget, TrafficRoutes},
    verification::DomainVerificationSet,
};

/// 一次自定义主机处理的结果摘要。
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CustomHostReport {
    /// 已校验并建立路由的自定义主机。
    pub kept: Vec<String>,
    /// 因缺少校验而暂缓发布的主机。
    pub pending: Vec<String>,
    /// 已删除路由的主机（未校验或已被用户移除）。
    pub deleted: Vec<String>,
}

#[derive(Debug, Default)]
struct HostPlan {
    hosts: Vec<String>,
    keep: Vec<String>,
    pending: Vec<String>,
    delete: Vec<String>,
}

/// 按校验记录协调资源声明的自定义主机，并驱动下游路由回调。
pub async fn process_custom_hosts(
    accessor: &mut dyn TrafficAccessor,
    verifications: &DomainVerificationSet,
    routes: &dyn TrafficRoutes,
) -> Result<CustomHostReport, HostError> {
    let resource = accessor.key();
    let managed_host = accessor
        .annotation(MANAGED_HOST)
        .map(str::to_owned)
        .ok_or_else(|| {
            HostError::invalid_state(resource.to_string(), "managed host annotation is missing")
        })?;
    let previously_pending = read_host_list(accessor, PENDING_CUSTOM_HOSTS)?;
    let previously_active = read_host_list(accessor, ACTIVE_CUSTOM_HOSTS)?;

    let plan = plan(
        accessor.custom_hosts(),
        &managed_host,
        &previously_pending,
        &previously_active,
        verifications,
    );

    if accessor.custom_hosts() != plan.hosts.as_slice() {
        accessor.set_custom_hosts(plan.hosts.clone());
    }
    write_host_list(accessor, PENDING_CUSTOM_HOSTS, &plan.pending)?;

    let mut active: BTreeSet<String> = previously_active.into_iter().collect();
    let mut report = CustomHostReport {
        pending: plan.pending.clone(),
        ..CustomHostReport::default()
    };
    let outcome = sync_routes(
        &plan,
        &resource.to_string(),
        |host| RouteTarget {
            resource: resource.clone(),
            host: host.to_owned(),
            managed_host: managed_host.clone(),
        },
        routes,
        &mut active,
        &mut report,
    )
    .await;

    let active: Vec<String> = active.into_iter().collect();
    let written = write_host_list(accessor, ACTIVE_CUSTOM_HOSTS, &active);

    // 路由失败优先于注解编码失败上报。
    outcome?;
    written?;
    Ok(report)
}

async fn sync_routes(
    plan: &HostPlan,
    resource: &str,
    target: impl Fn(&str) -> RouteTarget,
    routes: &dyn TrafficRoutes,
    active: &mut BTreeSet<String>,
    report: &mut CustomHostReport,
) -> Result<(), HostError> {
    for host in &plan.keep {
        debug!(resource, host = %host, "creating or updating custom host route");
        routes
            .create_or_update(&target(host))
            .await
            .map_err(|source| HostError::RouteSync {
                resource: resource.to_owned(),
                host: host.clone(),
                source,
            })?;
        active.insert(host.clone());
        report.kept.push(host.clone());
    }

    for host in &plan.delete {
        debug!(resource, host = %host, "deleting custom host route");
        routes
            .delete(&target(host))
            .await
            .map_err(|source| HostError::RouteSync {
                resource: resource.to_owned(),
                host: host.clone(),
                source,
            })?;
        active.remove(host);
        report.deleted.push(host.clone());
    }
    Ok(())
}

fn plan(
    declared: &[String],
    managed_host: &str,
    previously_pending: &[String],
    previously_active: &[String],
    verifications: &DomainVerificationSet,
) -> HostPlan {
    let mut plan = HostPlan::default();
    let mut seen = BTreeSet::new();
    let mut managed_declared = false;

    let candidates = declared
        .iter()
        .map(|host| (host, true))
        .chain(previously_pending.iter().map(|host| (host, false)));
    for (raw, from_declaration) in candidates {
        let host = raw.trim().trim_end_matches('.').to_ascii_lowercase();
        if host.is_empty() {
            continue;
        }
        if host == managed_host {
            managed_declared |= from_declaration;
            continue;
        }
        if !seen.insert(host.clone()) {
            continue;
        }
        if verifications.is_host_verified(&host) {
            plan.keep.push(host);
        } else {
            plan.pending.push(host);
        }
    }

    if managed_declared {
        plan.hosts.push(managed_host.to_owned());
    }
    plan.hosts.extend(plan.keep.iter().cloned());

    plan.delete = plan.pending.clone();
    for host in previously_active {
        if !plan.keep.contains(host) && !plan.delete.contains(host) {
            plan.delete.push(host.clone());
        }
    }
    plan
}

fn read_host_list(accessor: &dyn TrafficAccessor, key: &str) -> Result<Vec<String>, HostError> {
    annotations::decode_host_list(accessor.annotation(key)).map_err(|err| {
        HostError::invalid_state(
            accessor.key().to_string(),
            format!("annotation `{key}` is not a JSON host list: {err}"),
        )
    })
}

fn write_host_list(
    accessor: &mut dyn TrafficAccessor,
    key: &str,
    hosts: &[String],
) -> Result<(), HostError> {
    let encoded = annotations::encode_host_list(hosts).map_err(|err| {
        HostError::invalid_state(
            accessor.key().to_string(),
            format!("failed to encode annotation `{key}`: {err}"),
        )
    })?;
    match encoded {
        Some(value) => {
            accessor.set_annotation(key, value);
        }
        None => {
            accessor.remove_annotation(key);
        }
    }
    Ok(())
}
