//! 集成测试共享的协作方替身。
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use traffic_host::{
    DomainVerification, DomainVerificationSet, DomainVerifier, HostIdGenerator, HostPolicyConfig,
    HostReconciler, IngressResource, ResourceKey, RouteError, RouteTarget, TrafficAccessor,
    TrafficRoutes, VerificationError,
};

pub const MANAGED_DOMAIN: &str = "apps.example.com";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RouteCall {
    CreateOrUpdate(String),
    Delete(String),
}

/// 记录全部路由调用，可对指定主机注入失败。
#[derive(Default)]
pub struct RecordingRoutes {
    calls: Mutex<Vec<RouteCall>>,
    fail_create: Mutex<Option<String>>,
    fail_delete: Mutex<Option<String>>,
}

impl RecordingRoutes {
    pub fn calls(&self) -> Vec<RouteCall> {
        self.calls.lock().clone()
    }

    pub fn fail_create_for(&self, host: &str) {
        *self.fail_create.lock() = Some(host.to_owned());
    }

    pub fn fail_delete_for(&self, host: &str) {
        *self.fail_delete.lock() = Some(host.to_owned());
    }
}

#[async_trait]
impl TrafficRoutes for RecordingRoutes {
    async fn create_or_update(&self, target: &RouteTarget) -> Result<(), RouteError> {
        self.calls
            .lock()
            .push(RouteCall::CreateOrUpdate(target.host.clone()));
        if self.fail_create.lock().as_deref() == Some(target.host.as_str()) {
            return Err(RouteError::new(format!("create rejected for {}", target.host)));
        }
        Ok(())
    }

    async fn delete(&self, target: &RouteTarget) -> Result<(), RouteError> {
        self.calls.lock().push(RouteCall::Delete(target.host.clone()));
        if self.fail_delete.lock().as_deref() == Some(target.host.as_str()) {
            return Err(RouteError::with_cause(
                format!("delete rejected for {}", target.host),
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "route is locked"),
            ));
        }
        Ok(())
    }
}

/// 总是失败的校验记录读取方。
pub struct UnavailableVerifier;

#[async_trait]
impl DomainVerifier for UnavailableVerifier {
    async fn domain_verifications(
        &self,
        _accessor: &dyn TrafficAccessor,
    ) -> Result<DomainVerificationSet, VerificationError> {
        Err(VerificationError::with_cause(
            "verification store unavailable",
            std::io::Error::new(std::io::ErrorKind::TimedOut, "store timed out"),
        ))
    }
}

/// 依次产出 `id0`、`id1`…… 的确定性标识生成器。
#[derive(Default)]
pub struct SequentialIds {
    next: AtomicUsize,
}

impl HostIdGenerator for SequentialIds {
    fn generate(&self) -> String {
        format!("id{}", self.next.fetch_add(1, Ordering::SeqCst))
    }
}

pub fn verified(domains: &[&str]) -> DomainVerificationSet {
    domains
        .iter()
        .map(|d| DomainVerification::verified(*d))
        .collect()
}

pub fn resource(hosts: &[&str]) -> IngressResource {
    IngressResource::new(ResourceKey::new("default", "web"))
        .with_hosts(hosts.iter().map(|h| (*h).to_owned()))
}

pub fn reconciler(
    custom_hosts_enabled: bool,
    verifier: Arc<dyn DomainVerifier>,
    routes: Arc<RecordingRoutes>,
) -> HostReconciler {
    let config =
        HostPolicyConfig::new(MANAGED_DOMAIN, custom_hosts_enabled).expect("valid test config");
    HostReconciler::new(config, verifier, routes).with_id_generator(Arc::new(SequentialIds::default()))
}
