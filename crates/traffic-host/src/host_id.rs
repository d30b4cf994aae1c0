//! 托管主机标识生成。

use uuid::Uuid;

/// 全局唯一标识生成器。
///
/// 输出将作为 DNS 标签使用，实现方须保证只含小写字母、数字与连字符，且长度不超过 63。
pub trait HostIdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// 基于随机 v4 UUID 的默认实现，输出 32 位小写十六进制。
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidHostIdGenerator;

impl HostIdGenerator for UuidHostIdGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

impl<F> HostIdGenerator for F
where
    F: Fn() -> String + Send + Sync,
{
    fn generate(&self) -> String {
        self()
    }
}
