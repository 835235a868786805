use core::fmt;

use bytes::BytesMut;

/// 一块预分配的大内存及其切分游标。
///
/// # 教案式说明
/// - **意图 (Why)**：把大量小缓冲的真实分配摊薄到少数几次大分配上。
/// - **结构 (How)**：`tail` 保存尚未切出的尾部；每次 [`Slab::carve`] 通过
///   `BytesMut::split_to` 从头部切下一段。切出的片段与 `tail` 共享同一块分配的引用计数，
///   最后一个持有者释放时整块内存才归还，slab 自身从不显式释放。
/// - **契约 (What)**：
///   - 游标 `cursor = capacity - tail.len()`，只增不减；
///   - 已切出的区间不会再被任何后续切分覆盖；
///   - slab 一旦被替换便不再复用。
pub struct Slab {
    id: u64,
    capacity: usize,
    tail: BytesMut,
}

impl Slab {
    /// 分配一块容量为 `capacity` 的全新 slab。
    pub fn allocate(id: u64, capacity: usize) -> Self {
        Self {
            id,
            capacity,
            tail: BytesMut::zeroed(capacity),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 已切出的字节数。
    pub fn cursor(&self) -> usize {
        self.capacity - self.tail.len()
    }

    pub fn remaining(&self) -> usize {
        self.tail.len()
    }

    /// 从游标处切下 `len` 字节，返回 `(offset, slice)`；剩余空间不足时返回 `None` 且状态不变。
    pub fn carve(&mut self, len: usize) -> Option<(usize, BytesMut)> {
        if len > self.tail.len() {
            return None;
        }
        Some(self.carve_front(len))
    }

    /// 无条件切分；调用方保证 `len <= remaining()`。
    pub(crate) fn carve_front(&mut self, len: usize) -> (usize, BytesMut) {
        debug_assert!(len <= self.tail.len());
        let offset = self.cursor();
        (offset, self.tail.split_to(len))
    }
}

impl fmt::Debug for Slab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 不输出内存内容。
        f.debug_struct("Slab")
            .field("id", &self.id)
            .field("capacity", &self.capacity)
            .field("cursor", &self.cursor())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carve_advances_cursor_monotonically() {
        let mut slab = Slab::allocate(1, 16);
        let (first, a) = slab.carve(5).expect("首次切分");
        let (second, b) = slab.carve(11).expect("恰好用尽剩余空间");
        assert_eq!((first, a.len()), (0, 5));
        assert_eq!((second, b.len()), (5, 11));
        assert_eq!(slab.cursor(), 16);
        assert_eq!(slab.remaining(), 0);
        assert!(slab.carve(1).is_none());
        assert_eq!(slab.cursor(), 16, "失败的切分不得移动游标");
    }

    #[test]
    fn slices_share_one_allocation_without_overlap() {
        let mut slab = Slab::allocate(7, 8);
        let (_, mut a) = slab.carve(4).expect("切分 a");
        let (_, b) = slab.carve(4).expect("切分 b");
        // 同一块分配上相邻的两段。
        assert_eq!(a.as_ptr().wrapping_add(4), b.as_ptr());
        a.copy_from_slice(&[9; 4]);
        assert_eq!(&b[..], &[0; 4]);
        assert_eq!(a.capacity(), 4);
    }

    #[test]
    fn fresh_slab_holds_a_full_capacity_carve() {
        let mut slab = Slab::allocate(2, 12);
        let (offset, whole) = slab.carve_front(12);
        assert_eq!((offset, whole.len()), (0, 12));
        assert_eq!(slab.remaining(), 0);
    }
}
