//! 流量资源能力抽象。
//!
//! # 教案式说明
//! - **意图 (Why)**：协调引擎只关心“注解映射 + 自定义主机列表”两项能力，任何可承载二者的资源
//!   （Ingress、Route 等）都可以通过实现 [`TrafficAccessor`] 接入，而无需继承某个具体结构；
//! - **契约 (What)**：实现方只暴露内存快照上的读写能力，持久化由驱动器负责；
//! - **权衡 (Trade-offs)**：注解映射采用 `BTreeMap`，键天然唯一且遍历顺序稳定，便于序列化比对。

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 资源身份，形如 `namespace/name`。
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ResourceKey {
    pub namespace: String,
    pub name: String,
}

impl ResourceKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// 可承载注解与自定义主机列表的流量资源。
///
/// # 契约说明
/// - `custom_hosts` 保持用户声明顺序，可能含重复项；
/// - `set_custom_hosts` 整体替换主机列表，实现方需保证其余字段不受影响；
/// - 提供的默认方法仅依赖上述原语，实现方通常无需覆盖。
pub trait TrafficAccessor: Send + Sync {
    /// 资源身份，用于日志与下游回调。
    fn key(&self) -> ResourceKey;

    fn annotations(&self) -> &BTreeMap<String, String>;

    fn annotations_mut(&mut self) -> &mut BTreeMap<String, String>;

    fn custom_hosts(&self) -> &[String];

    fn set_custom_hosts(&mut self, hosts: Vec<String>);

    fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations().get(key).map(String::as_str)
    }

    fn has_annotation(&self, key: &str) -> bool {
        self.annotations().contains_key(key)
    }

    /// 写入注解；若值未变化则不产生修改，返回是否发生了写入。
    fn set_annotation(&mut self, key: &str, value: String) -> bool {
        let annotations = self.annotations_mut();
        if annotations.get(key) == Some(&value) {
            return false;
        }
        annotations.insert(key.to_owned(), value);
        true
    }

    fn remove_annotation(&mut self, key: &str) -> Option<String> {
        self.annotations_mut().remove(key)
    }

    /// 以单一托管主机替换全部自定义主机，返回被实际移除的主机（按首次出现顺序去重）。
    ///
    /// # 教案式说明
    /// - **契约 (What)**：执行后主机列表要么为空（原本无主机），要么恰为 `[host]`；
    ///   已等于托管主机的条目不计入返回值，因此对已替换的资源重复调用返回空列表且不修改状态。
    /// - **执行 (How)**：先收集与 `host` 不同的条目，再仅在列表形态确实变化时写回。
    fn replace_custom_hosts(&mut self, host: &str) -> Vec<String> {
        let current = self.custom_hosts();
        if current.is_empty() {
            return Vec::new();
        }

        let mut replaced: Vec<String> = Vec::new();
        for existing in current {
            if existing != host && !replaced.contains(existing) {
                replaced.push(existing.clone());
            }
        }

        if current.len() != 1 || current[0] != host {
            self.set_custom_hosts(vec![host.to_owned()]);
        }
        replaced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingress::IngressResource;

    fn resource(hosts: &[&str]) -> IngressResource {
        IngressResource::new(ResourceKey::new("default", "web"))
            .with_hosts(hosts.iter().map(|h| (*h).to_owned()))
    }

    #[test]
    fn replace_collects_each_removed_host_once() {
        let mut res = resource(&["a.com", "b.com", "a.com", "id.apps.example.com"]);
        let replaced = res.replace_custom_hosts("id.apps.example.com");
        assert_eq!(replaced, vec!["a.com".to_owned(), "b.com".to_owned()]);
        assert_eq!(res.custom_hosts(), ["id.apps.example.com".to_owned()]);
    }

    #[test]
    fn replace_on_empty_list_is_noop() {
        let mut res = resource(&[]);
        assert!(res.replace_custom_hosts("id.apps.example.com").is_empty());
        assert!(res.custom_hosts().is_empty());
    }

    #[test]
    fn duplicated_managed_host_collapses_without_reporting() {
        let mut res = resource(&["id.apps.example.com", "id.apps.example.com"]);
        assert!(res.replace_custom_hosts("id.apps.example.com").is_empty());
        assert_eq!(res.custom_hosts(), ["id.apps.example.com".to_owned()]);
    }

    #[test]
    fn set_annotation_reports_unchanged_values() {
        let mut res = resource(&[]);
        assert!(res.set_annotation("k", "v".to_owned()));
        assert!(!res.set_annotation("k", "v".to_owned()));
        assert_eq!(res.annotation("k"), Some("v"));
        assert_eq!(res.remove_annotation("k").as_deref(), Some("v"));
        assert!(!res.has_annotation("k"));
    }

    #[test]
    fn resource_key_displays_as_namespaced_name() {
        assert_eq!(ResourceKey::new("team-a", "shop").to_string(), "team-a/shop");
    }
}
