//! 单一字节序的 slab 切分竞技场。
//!
//! # 模块定位（Why）
//! - 整个分配器中只有这里需要互斥：读取当前 slab、检查剩余空间、推进游标或替换 slab
//!   必须作为一个原子单元完成，否则两个调用方可能算出重叠的偏移。
//! - 每个字节序各持有一个竞技场与一把锁，大端与小端流量互不争用。
//!
//! # 设计权衡（Trade-offs）
//! - 与 `SlabBufferPool` 一致使用 `spin::Mutex`：临界区只做指针与游标记账；
//!   新 slab 的分配同样发生在锁内，以竞争下的分配延迟换取实现的简单。
//! - 统计计数放在锁保护的状态里，快照与游标天然一致，无需额外原子变量。

use core::fmt;

use spin::Mutex;
use tracing::{debug, trace};

use crate::{
    buffer::DirectBuf,
    error::{BufferError, Result},
    order::ByteOrder,
    slab::Slab,
};

/// 竞技场状态的只读快照。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaSnapshot {
    pub order: ByteOrder,
    pub slab_capacity: usize,
    /// 当前 slab 的编号；首次分配前为 `None`。
    pub current_slab: Option<u64>,
    /// 当前 slab 已切出的字节数。
    pub cursor: usize,
    pub slabs_allocated: u64,
    pub slices_issued: u64,
    pub bytes_issued: u64,
}

#[derive(Debug, Default)]
struct ArenaState {
    current: Option<Slab>,
    slabs_allocated: u64,
    slices_issued: u64,
    bytes_issued: u64,
}

impl ArenaState {
    /// 安装一块新 slab 并返回其可变引用，旧 slab 仅由已发出的切片继续持有。
    fn install(&mut self, capacity: usize) -> &mut Slab {
        self.slabs_allocated += 1;
        self.current
            .insert(Slab::allocate(self.slabs_allocated, capacity))
    }
}

/// 为单一字节序产出互不重叠切片的竞技场。
///
/// # 契约说明（What）
/// - **前置条件**：`0 < capacity <= slab_capacity`；超出 slab 容量的请求应由上层绕行，
///   此处以 [`BufferError::InvalidArgument`] 拒绝且不触碰任何状态；
/// - **后置条件**：返回切片在其 slab 内占据 `[cursor, cursor + capacity)`，之后的任何切分都不会覆盖；
///   同一 slab 生命周期内偏移单调不减；剩余空间不足时整体换用新 slab，请求永不跨 slab 拆分。
pub struct SlabArena {
    order: ByteOrder,
    slab_capacity: usize,
    state: Mutex<ArenaState>,
}

impl SlabArena {
    pub fn new(order: ByteOrder, slab_capacity: usize) -> Result<Self> {
        if slab_capacity == 0 {
            return Err(BufferError::invalid_argument(
                "slab_capacity",
                "slab capacity must be greater than 0: 0",
            ));
        }
        Ok(Self::unchecked(order, slab_capacity))
    }

    /// 跳过容量校验，调用方需保证 `slab_capacity > 0`。
    pub(crate) fn unchecked(order: ByteOrder, slab_capacity: usize) -> Self {
        Self {
            order,
            slab_capacity,
            state: Mutex::new(ArenaState::default()),
        }
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn slab_capacity(&self) -> usize {
        self.slab_capacity
    }

    /// 切出 `capacity` 字节的切片。
    ///
    /// 返回的缓冲读游标为 0、写游标位于末尾（即整段可见），调用方按需 `clear`。
    pub fn allocate(&self, capacity: usize) -> Result<DirectBuf> {
        if capacity == 0 || capacity > self.slab_capacity {
            return Err(BufferError::invalid_argument(
                "capacity",
                format!(
                    "arena requests must be within 1..={}: {capacity}",
                    self.slab_capacity
                ),
            ));
        }
        Ok(self.carve(capacity))
    }

    /// 已校验 `1..=slab_capacity` 之后的切分路径，不会失败。
    pub(crate) fn carve(&self, capacity: usize) -> DirectBuf {
        debug_assert!(capacity > 0 && capacity <= self.slab_capacity);
        let mut state = self.state.lock();
        let hit = state.current.as_mut().and_then(|slab| {
            slab.carve(capacity)
                .map(|(offset, slice)| (slab.id(), offset, slice))
        });
        let (slab_id, offset, slice) = match hit {
            Some(carved) => carved,
            None => {
                let abandoned = state
                    .current
                    .as_ref()
                    .map(|slab| (slab.id(), slab.cursor()));
                let slab = state.install(self.slab_capacity);
                let slab_id = slab.id();
                let (offset, slice) = slab.carve_front(capacity);
                match abandoned {
                    Some((abandoned_slab, abandoned_cursor)) => debug!(
                        order = %self.order,
                        slab_id,
                        abandoned_slab,
                        abandoned_cursor,
                        slab_capacity = self.slab_capacity,
                        request = capacity,
                        "slab rollover"
                    ),
                    None => debug!(
                        order = %self.order,
                        slab_id,
                        slab_capacity = self.slab_capacity,
                        "slab installed"
                    ),
                }
                (slab_id, offset, slice)
            }
        };
        state.slices_issued += 1;
        state.bytes_issued += capacity as u64;
        drop(state);

        trace!(order = %self.order, slab_id, offset, len = capacity, "slice carved");
        DirectBuf::slab_slice(self.order, slice, slab_id, offset)
    }

    pub fn snapshot(&self) -> ArenaSnapshot {
        let state = self.state.lock();
        ArenaSnapshot {
            order: self.order,
            slab_capacity: self.slab_capacity,
            current_slab: state.current.as_ref().map(Slab::id),
            cursor: state.current.as_ref().map_or(0, Slab::cursor),
            slabs_allocated: state.slabs_allocated,
            slices_issued: state.slices_issued,
            bytes_issued: state.bytes_issued,
        }
    }
}

impl fmt::Debug for SlabArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlabArena")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}
