use core::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, trace};

use crate::{
    arena::{ArenaSnapshot, SlabArena},
    buffer::DirectBuf,
    config::{DEFAULT_SLAB_CAPACITY, DirectBufferConfig},
    error::{BufferError, Result},
    order::{ByteOrder, ByteOrderMap},
    region::NativeRegion,
};

/// `DirectBufferAllocator` 是直接内存缓冲的公开入口。
///
/// # 模块角色（Why）
/// - 大量小块直接内存逐个分配，回收效率远低于普通堆内存，容易在回收追上之前耗尽地址空间；
///   本类型把小请求切分自少数几块大 slab，使真实分配次数与逻辑缓冲数量脱钩；
/// - 同时负责三类分流：空请求返回共享空缓冲，大请求绕过 slab 独立分配，其余交给对应字节序的竞技场。
///
/// # 核心机制（How）
/// - 以组合代替继承：内部持有 `ByteOrderMap<SlabArena>`，两个字节序各自独立加锁；
/// - `AllocatorMetrics` 通过原子计数记录绕行分配、零拷贝包装等旁路事件，竞技场统计由快照提供。
///
/// # 契约说明（What）
/// - **线程安全**：满足 `Send + Sync`，可通过 `Arc` 在线程间共享；
/// - **阈值**：`capacity >= slab_capacity` 的请求一律独立分配，请求永不跨 slab 拆分；
/// - **错误**：所有校验在分配或拷贝之前完成，失败时不留下任何部分分配。
///
/// # 设计权衡（Trade-offs）
/// - slab 不做压缩或回收，内存增长没有上限；slab 的释放完全交给切片的引用计数；
/// - 切片超出容量写入时会扩容到新内存，不会越界侵入相邻切片，但也就离开了 slab。
#[derive(Debug)]
pub struct DirectBufferAllocator {
    default_order: ByteOrder,
    slab_capacity: usize,
    arenas: ByteOrderMap<SlabArena>,
    metrics: AllocatorMetrics,
}

impl Default for DirectBufferAllocator {
    /// 大端、1 MiB slab。
    fn default() -> Self {
        Self::with_arenas(ByteOrder::BigEndian, DEFAULT_SLAB_CAPACITY)
    }
}

impl DirectBufferAllocator {
    /// 以指定默认字节序与 slab 容量构造分配器。
    ///
    /// # 错误
    /// - `slab_capacity == 0` 时返回 [`BufferError::InvalidArgument`]。
    pub fn new(default_order: ByteOrder, slab_capacity: usize) -> Result<Self> {
        DirectBufferConfig::new(default_order, slab_capacity).validate()?;
        Ok(Self::with_arenas(default_order, slab_capacity))
    }

    /// 指定默认字节序，slab 容量取 1 MiB。
    pub fn with_order(default_order: ByteOrder) -> Self {
        Self::with_arenas(default_order, DEFAULT_SLAB_CAPACITY)
    }

    pub fn from_config(config: &DirectBufferConfig) -> Result<Self> {
        Self::new(config.default_order, config.slab_capacity)
    }

    // 调用方已保证 slab_capacity > 0。
    fn with_arenas(default_order: ByteOrder, slab_capacity: usize) -> Self {
        Self {
            default_order,
            slab_capacity,
            arenas: ByteOrderMap::from_fn(|order| SlabArena::unchecked(order, slab_capacity)),
            metrics: AllocatorMetrics::default(),
        }
    }

    pub fn default_order(&self) -> ByteOrder {
        self.default_order
    }

    pub fn slab_capacity(&self) -> usize {
        self.slab_capacity
    }

    /// 按默认字节序获取缓冲。
    pub fn default_buffer(&self, capacity: usize) -> DirectBuf {
        self.buffer(self.default_order, capacity)
    }

    /// 获取容量为 `capacity`、字节序为 `order` 的空缓冲。
    ///
    /// # 逻辑（How）
    /// 1. `capacity == 0`：返回共享空缓冲；
    /// 2. `capacity >= slab_capacity`：独立分配恰好 `capacity` 字节，不触碰竞技场；
    /// 3. 其余：从 `order` 对应的竞技场切分，并复位读写游标后返回。
    pub fn buffer(&self, order: ByteOrder, capacity: usize) -> DirectBuf {
        if capacity == 0 {
            self.metrics.empty_returns.fetch_add(1, Ordering::Relaxed);
            return DirectBuf::empty();
        }
        if capacity >= self.slab_capacity {
            return self.dedicated(order, capacity);
        }
        let mut slice = self.arenas[order].carve(capacity);
        slice.clear();
        slice
    }

    fn dedicated(&self, order: ByteOrder, capacity: usize) -> DirectBuf {
        self.metrics
            .dedicated_allocations
            .fetch_add(1, Ordering::Relaxed);
        self.metrics
            .dedicated_bytes
            .fetch_add(capacity as u64, Ordering::Relaxed);
        debug!(
            order = %order,
            capacity,
            slab_capacity = self.slab_capacity,
            "dedicated allocation bypasses slab"
        );
        DirectBuf::dedicated(order, capacity)
    }

    /// 复制 `src[offset..offset + length]` 到一块新缓冲。
    ///
    /// # 契约（What）
    /// - `length == 0` 时直接返回共享空缓冲，不检查区间；
    /// - `offset + length` 超过 `src.len()`（包括算术溢出）时返回 [`BufferError::IndexOutOfRange`]；
    /// - 结果总是独立副本，修改它不会影响 `src`。
    pub fn buffer_from_slice(
        &self,
        order: ByteOrder,
        src: &[u8],
        offset: usize,
        length: usize,
    ) -> Result<DirectBuf> {
        if length == 0 {
            self.metrics.empty_returns.fetch_add(1, Ordering::Relaxed);
            return Ok(DirectBuf::empty());
        }
        let end = offset
            .checked_add(length)
            .ok_or_else(|| BufferError::index_out_of_range("length", usize::MAX, src.len()))?;
        if end > src.len() {
            return Err(BufferError::index_out_of_range("length", end, src.len()));
        }

        let mut buf = self.buffer(order, length);
        buf.put_slice(&src[offset..end])?;
        Ok(buf)
    }

    /// 以默认字节序复制整个切片。
    pub fn copy_from_slice(&self, src: &[u8]) -> Result<DirectBuf> {
        self.buffer_from_slice(self.default_order, src, 0, src.len())
    }

    /// 把外部内存区域转换为缓冲。
    ///
    /// - 可写的直接内存：零拷贝包装，不经过竞技场；
    /// - 其它区域：按区域自身字节序分配 `remaining()` 字节并复制，见 [`copy_region`](Self::copy_region)。
    pub fn buffer_from_region(&self, region: NativeRegion) -> Result<DirectBuf> {
        match region.into_direct() {
            Ok((storage, position, order)) => {
                self.metrics.wrapped_regions.fetch_add(1, Ordering::Relaxed);
                trace!(order = %order, len = storage.len(), position, "region wrapped");
                Ok(DirectBuf::wrapped_at(order, storage, position))
            }
            Err(mut region) => self.copy_region(&mut region),
        }
    }

    /// 复制区域的可读字节，复制前后区域的读位置保持不变。
    pub fn copy_region(&self, region: &mut NativeRegion) -> Result<DirectBuf> {
        let length = region.remaining();
        let mut buf = self.buffer(region.order(), length);
        if length == 0 {
            return Ok(buf);
        }

        let position = region.position();
        let written = buf.write_region(region);
        region.restore_position(position);
        written?;

        self.metrics.copied_regions.fetch_add(1, Ordering::Relaxed);
        trace!(order = %region.order(), len = length, position, "region copied");
        Ok(buf)
    }

    /// 指定字节序竞技场的快照。
    pub fn arena_snapshot(&self, order: ByteOrder) -> ArenaSnapshot {
        self.arenas[order].snapshot()
    }

    pub fn stats(&self) -> AllocatorStats {
        AllocatorStats {
            dedicated_allocations: self.metrics.dedicated_allocations.load(Ordering::Relaxed),
            dedicated_bytes: self.metrics.dedicated_bytes.load(Ordering::Relaxed),
            empty_returns: self.metrics.empty_returns.load(Ordering::Relaxed),
            wrapped_regions: self.metrics.wrapped_regions.load(Ordering::Relaxed),
            copied_regions: self.metrics.copied_regions.load(Ordering::Relaxed),
            arenas: ByteOrderMap::from_fn(|order| self.arena_snapshot(order)),
        }
    }
}

/// 分配器统计快照。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocatorStats {
    pub dedicated_allocations: u64,
    pub dedicated_bytes: u64,
    pub empty_returns: u64,
    pub wrapped_regions: u64,
    pub copied_regions: u64,
    pub arenas: ByteOrderMap<ArenaSnapshot>,
}

#[derive(Debug, Default)]
struct AllocatorMetrics {
    dedicated_allocations: AtomicU64,
    dedicated_bytes: AtomicU64,
    empty_returns: AtomicU64,
    wrapped_regions: AtomicU64,
    copied_regions: AtomicU64,
}
