//! 引擎读写的注解键与簿记注解编解码。

/// 平台分配的托管主机，值形如 `<unique-id>.<managed-domain>`；一经写入不再重新生成。
pub const MANAGED_HOST: &str = "traffic.platform.dev/managed-host";

/// 策略强制替换自定义主机时写入的审计说明。
pub const CUSTOM_HOSTS_REPLACED: &str = "traffic.platform.dev/custom-hosts-replaced";

/// 因缺少域名所有权校验而暂缓发布的自定义主机（JSON 数组）。
pub const PENDING_CUSTOM_HOSTS: &str = "traffic.platform.dev/pending-custom-hosts";

/// 已成功建立下游路由的自定义主机（JSON 数组）。
pub const ACTIVE_CUSTOM_HOSTS: &str = "traffic.platform.dev/active-custom-hosts";

/// 生成替换审计说明。
///
/// 文本面向运维人员，需同时说明被替换的主机与原因（策略而非用户操作）。
pub fn replaced_audit_message(replaced: &[String], managed_host: &str) -> String {
    format!(
        "replaced custom hosts [{}] with managed host {managed_host} because custom hosts are not allowed by policy",
        replaced.join(", ")
    )
}

/// 解析主机列表注解；缺省视为空列表。
pub fn decode_host_list(raw: Option<&str>) -> Result<Vec<String>, serde_json::Error> {
    match raw {
        None => Ok(Vec::new()),
        Some(value) if value.trim().is_empty() => Ok(Vec::new()),
        Some(value) => serde_json::from_str(value),
    }
}

/// 编码主机列表注解；空列表返回 `Ok(None)`，调用方据此删除注解。
///
/// 编码失败如实上抛，不与“空列表”混同，否则调用方会误删仍然有效的注解。
pub fn encode_host_list(hosts: &[String]) -> Result<Option<String>, serde_json::Error> {
    if hosts.is_empty() {
        return Ok(None);
    }
    serde_json::to_string(hosts).map(Some)
}
