//! 分配器配置。
//!
//! # 模块定位（Why）
//! - 默认字节序与 slab 容量在构造时确定、之后不可变；集中放在一个可反序列化的结构里，
//!   宿主可以从 TOML 配置片段直接加载，再交给 [`DirectBufferAllocator`](crate::DirectBufferAllocator)
//!   或 [`AllocatorRegistry`](crate::AllocatorRegistry) 构造。
//!
//! # 契约说明（What）
//! - 缺省字段取默认值：大端、1 MiB；
//! - `slab_capacity` 必须大于 0，由 [`DirectBufferConfig::validate`] 校验；
//! - 未知字段视为配置错误，避免拼写错误被静默忽略。

use serde::Deserialize;

use crate::{
    error::{BufferError, Result},
    order::ByteOrder,
};

/// 参考配置下的 slab 容量：1 MiB。
pub const DEFAULT_SLAB_CAPACITY: usize = 1_048_576;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirectBufferConfig {
    /// 未显式指定字节序时使用的默认值。
    pub default_order: ByteOrder,
    /// 每块 slab 的字节数，同时也是绕过切分的阈值。
    pub slab_capacity: usize,
}

impl Default for DirectBufferConfig {
    fn default() -> Self {
        Self {
            default_order: ByteOrder::BigEndian,
            slab_capacity: DEFAULT_SLAB_CAPACITY,
        }
    }
}

impl DirectBufferConfig {
    pub fn new(default_order: ByteOrder, slab_capacity: usize) -> Self {
        Self {
            default_order,
            slab_capacity,
        }
    }

    /// 解析 TOML 片段并校验。
    ///
    /// ```
    /// use spark_direct_buffer::{ByteOrder, DirectBufferConfig};
    ///
    /// let config = DirectBufferConfig::from_toml_str(
    ///     r#"
    ///     default_order = "little-endian"
    ///     slab_capacity = 65536
    ///     "#,
    /// )
    /// .unwrap();
    /// assert_eq!(config.default_order, ByteOrder::LittleEndian);
    /// assert_eq!(config.slab_capacity, 65536);
    /// ```
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).map_err(|err| {
            BufferError::invalid_argument("config", format!("malformed buffer config: {err}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.slab_capacity == 0 {
            return Err(BufferError::invalid_argument(
                "slab_capacity",
                format!(
                    "slab capacity must be greater than 0: {}",
                    self.slab_capacity
                ),
            ));
        }
        Ok(())
    }
}
