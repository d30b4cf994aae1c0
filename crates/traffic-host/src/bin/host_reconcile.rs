//! 本地演练入口：加载策略配置与资源夹具，执行一轮主机协调并打印结果。
//!
//! 用法：`host-reconcile <config.toml> <fixture.json>`
//!
//! 夹具格式：
//! ```json
//! {
//!   "resource": { "namespace": "default", "name": "web", "hosts": ["a.com"] },
//!   "verifications": [{ "domain": "a.com", "verified": true }]
//! }
//! ```
//! 日志级别通过 `RUST_LOG` 控制。

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context as _, bail};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;
use traffic_host::{
    DomainVerification, DomainVerificationSet, HostError, HostPolicyConfig, HostReconciler,
    IngressResource, RouteError, RouteTarget, TrafficRoutes,
};

#[derive(Debug, Deserialize)]
struct Fixture {
    resource: IngressResource,
    #[serde(default)]
    verifications: Vec<DomainVerification>,
}

/// 仅记录日志的路由回调，演练时不触达任何真实下游。
struct LoggingRoutes;

#[async_trait]
impl TrafficRoutes for LoggingRoutes {
    async fn create_or_update(&self, target: &RouteTarget) -> Result<(), RouteError> {
        info!(resource = %target.resource, host = %target.host, "would create or update route");
        Ok(())
    }

    async fn delete(&self, target: &RouteTarget) -> Result<(), RouteError> {
        info!(resource = %target.resource, host = %target.host, "would delete route");
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(config_path), Some(fixture_path)) = (args.next(), args.next()) else {
        bail!("usage: host-reconcile <config.toml> <fixture.json>");
    };

    let config = HostPolicyConfig::from_path(&config_path)
        .with_context(|| format!("loading config from {config_path}"))?;
    let raw = std::fs::read_to_string(&fixture_path)
        .with_context(|| format!("reading fixture {fixture_path}"))?;
    let fixture: Fixture = serde_json::from_str(&raw)
        .with_context(|| format!("parsing fixture {fixture_path}"))?;

    let verifier: DomainVerificationSet = fixture.verifications.into_iter().collect();
    let records = verifier.len();
    let reconciler = HostReconciler::new(config, Arc::new(verifier), Arc::new(LoggingRoutes));
    info!(
        managed_domain = %reconciler.config().managed_domain,
        custom_hosts_enabled = reconciler.config().custom_hosts_enabled,
        verification_records = records,
        "loaded host policy"
    );

    let mut resource = fixture.resource;
    let outcome = futures::executor::block_on(reconciler.evaluate(&mut resource));
    let directive = match &outcome {
        Ok(status) => *status,
        Err(err) => err.directive(),
    };

    println!("directive: {directive:?}");
    if let Err(err) = &outcome {
        println!("error: {}", render_error(err));
    }
    println!("{}", serde_json::to_string_pretty(&resource)?);
    Ok(())
}

fn render_error(err: &HostError) -> String {
    let mut rendered = format!("[{}] {err}", err.code());
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let _ = write!(rendered, ": {cause}");
        source = cause.source();
    }
    rendered
}
