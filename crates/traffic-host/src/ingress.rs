//! [`TrafficAccessor`] 的一个具体实现：简化的 Ingress 资源快照。
//!
//! 只保留协调引擎关心的字段，可直接从 JSON 反序列化，供演示入口与测试使用。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::accessor::{ResourceKey, TrafficAccessor};

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct IngressResource {
    #[serde(flatten)]
    pub key: ResourceKey,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub hosts: Vec<String>,
}

impl IngressResource {
    pub fn new(key: ResourceKey) -> Self {
        Self {
            key,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_hosts<I>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.hosts = hosts.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }
}

impl TrafficAccessor for IngressResource {
    fn key(&self) -> ResourceKey {
        self.key.clone()
    }

    fn annotations(&self) -> &BTreeMap<String, String> {
        &self.annotations
    }

    fn annotations_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.annotations
    }

    fn custom_hosts(&self) -> &[String] {
        &self.hosts
    }

    fn set_custom_hosts(&mut self, hosts: Vec<String>) {
        self.hosts = hosts;
    }
}
