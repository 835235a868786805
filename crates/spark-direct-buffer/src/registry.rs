//! 按字节序索引的分配器注册表。
//!
//! # 模块定位（Why）
//! - 进程通常只需要两份分配器：大端一份、小端一份；
//!   注册表在启动时构造一次，随后以显式参数（或克隆的 `Arc`）传给各个消费方，
//!   不依赖隐藏的全局可变状态。
//!
//! # 契约说明（What）
//! - 构造后不可变，不持有除已分配 slab 之外的资源，无需关闭；
//! - 每份分配器的默认字节序即其键，[`AllocatorRegistry::instance`] 默认返回大端分配器；
//! - 字节序来自外部输入、可能缺失时使用 [`AllocatorRegistry::resolve`]，缺失即参数非法。

use std::sync::Arc;

use crate::{
    allocator::DirectBufferAllocator,
    config::DirectBufferConfig,
    error::{BufferError, Result},
    order::{ByteOrder, ByteOrderMap},
};

#[derive(Clone, Debug)]
pub struct AllocatorRegistry {
    allocators: ByteOrderMap<Arc<DirectBufferAllocator>>,
    default_order: ByteOrder,
}

impl Default for AllocatorRegistry {
    /// 两个字节序均使用 1 MiB slab。
    fn default() -> Self {
        Self {
            allocators: ByteOrderMap::from_fn(|order| {
                Arc::new(DirectBufferAllocator::with_order(order))
            }),
            default_order: ByteOrder::BigEndian,
        }
    }
}

impl AllocatorRegistry {
    /// 以统一的 slab 容量构造两份分配器。
    ///
    /// # 错误
    /// - `slab_capacity == 0` 时返回 [`BufferError::InvalidArgument`]。
    pub fn new(slab_capacity: usize) -> Result<Self> {
        let allocators = ByteOrderMap::try_from_fn(|order| {
            DirectBufferAllocator::new(order, slab_capacity).map(Arc::new)
        })?;
        Ok(Self {
            allocators,
            default_order: ByteOrder::BigEndian,
        })
    }

    /// 按配置构造；`default_order` 决定 [`instance`](Self::instance) 返回哪一份。
    pub fn from_config(config: &DirectBufferConfig) -> Result<Self> {
        let mut registry = Self::new(config.slab_capacity)?;
        registry.default_order = config.default_order;
        Ok(registry)
    }

    /// 默认字节序对应的分配器。
    pub fn instance(&self) -> &Arc<DirectBufferAllocator> {
        self.get(self.default_order)
    }

    pub fn get(&self, order: ByteOrder) -> &Arc<DirectBufferAllocator> {
        &self.allocators[order]
    }

    /// 解析可能缺失的字节序。
    pub fn resolve(&self, order: Option<ByteOrder>) -> Result<&Arc<DirectBufferAllocator>> {
        order
            .map(|order| self.get(order))
            .ok_or_else(|| BufferError::invalid_argument("order", "byte order is unset"))
    }

    pub fn default_order(&self) -> ByteOrder {
        self.default_order
    }

    pub fn slab_capacity(&self) -> usize {
        self.allocators[self.default_order].slab_capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_SLAB_CAPACITY;

    #[test]
    fn default_registry_uses_reference_capacity() {
        let registry = AllocatorRegistry::default();
        assert_eq!(registry.slab_capacity(), DEFAULT_SLAB_CAPACITY);
        assert_eq!(registry.instance().default_order(), ByteOrder::BigEndian);
        for order in ByteOrder::ALL {
            assert_eq!(registry.get(order).default_order(), order);
        }
    }

    #[test]
    fn lookups_return_the_same_instance() {
        let registry = AllocatorRegistry::new(4096).expect("构造注册表");
        let first = registry.get(ByteOrder::LittleEndian);
        let second = registry.resolve(Some(ByteOrder::LittleEndian)).expect("解析小端");
        assert!(Arc::ptr_eq(first, second));
        assert!(!Arc::ptr_eq(first, registry.instance()));
    }

    #[test]
    fn unset_order_is_invalid() {
        let registry = AllocatorRegistry::default();
        assert!(matches!(
            registry.resolve(None),
            Err(BufferError::InvalidArgument { argument: "order", .. })
        ));
        assert!(AllocatorRegistry::new(0).is_err());
    }

    #[test]
    fn config_selects_default_instance() {
        let config = DirectBufferConfig::new(ByteOrder::LittleEndian, 512);
        let registry = AllocatorRegistry::from_config(&config).expect("按配置构造");
        assert_eq!(registry.default_order(), ByteOrder::LittleEndian);
        assert_eq!(registry.instance().default_order(), ByteOrder::LittleEndian);
        assert_eq!(registry.slab_capacity(), 512);
    }

    #[test]
    fn clones_share_allocators() {
        let registry = AllocatorRegistry::new(64).expect("构造注册表");
        let cloned = registry.clone();
        let _slice = registry.get(ByteOrder::BigEndian).buffer(ByteOrder::BigEndian, 8);
        assert_eq!(
            cloned.get(ByteOrder::BigEndian).arena_snapshot(ByteOrder::BigEndian).cursor,
            8
        );
    }
}
