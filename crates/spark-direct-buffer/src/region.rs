//! 外部提供的内存区域。
//!
//! # 模块定位（Why）
//! - 传输层常常已经持有一段内存（socket 读缓冲、mmap 区域、协议栈交来的只读帧），
//!   希望把它交给分配器换成统一的 [`DirectBuf`](crate::DirectBuf)；
//! - 区域自带字节序与读位置，分配器据此决定零拷贝包装还是复制。
//!
//! # 契约说明（What）
//! - 可读区间为 `[position, len)`；
//! - 只有“可写且位于直接内存”的区域才能零拷贝包装，其余一律复制；
//! - 复制路径会保存并恢复 `position`，调用方看到的区域状态与复制前一致。

use bytes::{Bytes, BytesMut};

use crate::{
    error::{BufferError, Result},
    order::ByteOrder,
};

#[derive(Debug)]
enum RegionStorage {
    /// 可写的直接内存。
    Direct(BytesMut),
    /// 只读视图，可能与其它持有者共享。
    ReadOnly(Bytes),
    /// 普通堆数组。
    Heap(Vec<u8>),
}

/// 调用方交给分配器的一段外部内存。
#[derive(Debug)]
pub struct NativeRegion {
    storage: RegionStorage,
    order: ByteOrder,
    position: usize,
    mark: Option<usize>,
}

impl NativeRegion {
    /// 可写的直接内存区域，`storage` 中已有字节全部可读。
    pub fn direct(storage: BytesMut, order: ByteOrder) -> Self {
        Self::with_storage(RegionStorage::Direct(storage), order)
    }

    /// 只读区域。
    pub fn read_only(storage: Bytes, order: ByteOrder) -> Self {
        Self::with_storage(RegionStorage::ReadOnly(storage), order)
    }

    /// 普通堆数组区域。
    pub fn heap(storage: Vec<u8>, order: ByteOrder) -> Self {
        Self::with_storage(RegionStorage::Heap(storage), order)
    }

    fn with_storage(storage: RegionStorage, order: ByteOrder) -> Self {
        Self {
            storage,
            order,
            position: 0,
            mark: None,
        }
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// 是否位于直接（非堆）内存。
    pub fn is_direct(&self) -> bool {
        !matches!(self.storage, RegionStorage::Heap(_))
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self.storage, RegionStorage::ReadOnly(_))
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// 移动读位置，越过 `len` 时返回越界错误。
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        let len = self.len();
        if position > len {
            return Err(BufferError::index_out_of_range("position", position, len));
        }
        self.position = position;
        if self.mark.is_some_and(|mark| mark > position) {
            self.mark = None;
        }
        Ok(())
    }

    /// 剩余可读字节数。
    pub fn remaining(&self) -> usize {
        self.len() - self.position
    }

    /// 记住当前读位置。
    pub fn mark(&mut self) {
        self.mark = Some(self.position);
    }

    /// 回到最近一次 [`mark`](Self::mark) 的位置；未标记时报告非法参数。
    pub fn reset(&mut self) -> Result<()> {
        match self.mark {
            Some(mark) => {
                self.position = mark;
                Ok(())
            }
            None => Err(BufferError::invalid_argument(
                "mark",
                "reset called on a region without mark",
            )),
        }
    }

    /// 可读区间视图。
    pub fn readable(&self) -> &[u8] {
        &self.bytes()[self.position..]
    }

    /// 消费 `len` 个可读字节。
    pub(crate) fn advance(&mut self, len: usize) -> Result<()> {
        if len > self.remaining() {
            return Err(BufferError::index_out_of_range(
                "length",
                self.position + len,
                self.len(),
            ));
        }
        self.position += len;
        Ok(())
    }

    /// 恢复此前保存的读位置。
    pub(crate) fn restore_position(&mut self, position: usize) {
        debug_assert!(position <= self.len());
        self.position = position.min(self.len());
    }

    /// 若为可写直接内存，交出底层存储与读位置；否则原样返回。
    pub(crate) fn into_direct(self) -> core::result::Result<(BytesMut, usize, ByteOrder), Self> {
        match self.storage {
            RegionStorage::Direct(storage) => Ok((storage, self.position, self.order)),
            storage => Err(Self { storage, ..self }),
        }
    }

    fn bytes(&self) -> &[u8] {
        match &self.storage {
            RegionStorage::Direct(buf) => buf,
            RegionStorage::ReadOnly(bytes) => bytes,
            RegionStorage::Heap(vec) => vec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_follows_storage() {
        let direct = NativeRegion::direct(BytesMut::from(&b"ab"[..]), ByteOrder::BigEndian);
        assert!(direct.is_direct() && !direct.is_read_only());
        let shared = NativeRegion::read_only(Bytes::from_static(b"ab"), ByteOrder::BigEndian);
        assert!(shared.is_direct() && shared.is_read_only());
        let heap = NativeRegion::heap(b"ab".to_vec(), ByteOrder::LittleEndian);
        assert!(!heap.is_direct());
        assert_eq!(heap.order(), ByteOrder::LittleEndian);
    }

    #[test]
    fn position_mark_and_reset() {
        let mut region = NativeRegion::heap((0u8..10).collect(), ByteOrder::BigEndian);
        region.set_position(3).expect("移动读位置");
        assert_eq!(region.remaining(), 7);
        region.mark();
        assert_eq!(&region.readable()[..4], &[3, 4, 5, 6]);
        region.advance(4).expect("消费四个字节");
        assert_eq!(region.position(), 7);
        assert!(region.advance(4).is_err(), "超出剩余字节必须失败");
        region.reset().expect("回到标记");
        assert_eq!(region.position(), 3);
        assert!(region.set_position(11).is_err());
    }

    #[test]
    fn reset_without_mark_fails() {
        let mut region = NativeRegion::heap(vec![1], ByteOrder::BigEndian);
        assert!(matches!(
            region.reset(),
            Err(BufferError::InvalidArgument { argument: "mark", .. })
        ));
    }

    #[test]
    fn into_direct_only_releases_direct_storage() {
        let heap = NativeRegion::heap(vec![1, 2], ByteOrder::BigEndian);
        let heap = heap.into_direct().expect_err("堆区域不得被零拷贝交出");
        assert_eq!(heap.readable(), &[1, 2]);

        let mut direct = NativeRegion::direct(BytesMut::from(&[1u8, 2, 3][..]), ByteOrder::LittleEndian);
        direct.set_position(1).expect("移动读位置");
        let (storage, position, order) = direct.into_direct().expect("直接内存可交出");
        assert_eq!((&storage[..], position, order), (&[1u8, 2, 3][..], 1, ByteOrder::LittleEndian));
    }
}
