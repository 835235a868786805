//! `DirectBuf`：分配器交付给调用方的缓冲类型。
//!
//! # 模块定位（Why）
//! - 分配器本身只负责“取得内存”，但调用方需要一个带读写游标、按字节序读写多字节数值的容器；
//!   这里以 `bytes::BytesMut`/`bytes::Bytes` 为底座，提供最薄的一层适配。
//! - 切片与 slab 之间的共享所有权完全交给 `bytes` 的引用计数：最后一个视图释放时整块 slab 才会归还。
//!
//! # 设计概要（How）
//! - 可写存储使用 `BytesMut`，其 `len()` 即写游标；读游标单独记录，`clear` 同时复位两者；
//! - 只读存储使用 `Bytes`，目前仅用于共享空缓冲，任何写入都会得到 [`BufferError::ReadOnly`]；
//! - 超出容量的写入会触发 `BytesMut` 扩容，扩容总是落在新的内存上，不会侵入相邻切片。

use core::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{
    error::{BufferError, Result},
    order::ByteOrder,
    region::NativeRegion,
};

/// 共享空缓冲的底层存储。
static EMPTY: [u8; 0] = [];

/// 描述缓冲内存的来源，便于观测与测试校验非重叠性。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferOrigin {
    /// 从 slab 切出的片段，占据 `[offset, offset + len)`。
    Slab {
        slab_id: u64,
        offset: usize,
        len: usize,
    },
    /// 绕过 slab 的独立分配。
    Dedicated,
    /// 零拷贝包装的外部存储。
    Wrapped,
    /// 全局共享的零长度缓冲。
    SharedEmpty,
}

impl BufferOrigin {
    /// 若来自 slab，返回 `(slab_id, offset, len)`。
    pub fn slab_range(&self) -> Option<(u64, usize, usize)> {
        match *self {
            BufferOrigin::Slab {
                slab_id,
                offset,
                len,
            } => Some((slab_id, offset, len)),
            _ => None,
        }
    }
}

enum Storage {
    Owned(BytesMut),
    Shared(Bytes),
}

/// 带读写游标与默认字节序的缓冲。
///
/// # 契约说明（What）
/// - `reader_index <= writer_index <= capacity` 始终成立（扩容后 `capacity` 随之增长）；
/// - 多字节读写遵循缓冲自身的 [`ByteOrder`]；
/// - 单个缓冲不支持无同步的多线程并发修改，由 `&mut self` 借用规则保证；
///   来自同一 slab 的不同缓冲互不重叠，可在不同线程上并发使用。
pub struct DirectBuf {
    storage: Storage,
    reader_index: usize,
    order: ByteOrder,
    origin: BufferOrigin,
}

macro_rules! ordered_accessors {
    ($($ty:ty => $get:ident / $get_le:ident, $put:ident / $put_le:ident;)*) => {
        $(
            #[doc = concat!("按缓冲字节序读取一个 `", stringify!($ty), "`，数据不足时读游标保持不变。")]
            pub fn $get(&mut self) -> Result<$ty> {
                let order = self.order;
                self.read_with(core::mem::size_of::<$ty>(), |mut src: &[u8]| match order {
                    ByteOrder::BigEndian => src.$get(),
                    ByteOrder::LittleEndian => src.$get_le(),
                })
            }

            #[doc = concat!("按缓冲字节序写入一个 `", stringify!($ty), "`。")]
            pub fn $put(&mut self, value: $ty) -> Result<()> {
                let order = self.order;
                let buf = self.writable_mut(stringify!($put))?;
                match order {
                    ByteOrder::BigEndian => buf.$put(value),
                    ByteOrder::LittleEndian => buf.$put_le(value),
                }
                Ok(())
            }
        )*
    };
}

impl DirectBuf {
    /// slab 切片：`slice` 的长度等于请求容量，写游标位于末尾，需要调用方 `clear` 后使用。
    pub(crate) fn slab_slice(order: ByteOrder, slice: BytesMut, slab_id: u64, offset: usize) -> Self {
        let len = slice.len();
        Self {
            storage: Storage::Owned(slice),
            reader_index: 0,
            order,
            origin: BufferOrigin::Slab {
                slab_id,
                offset,
                len,
            },
        }
    }

    /// 容量恰为 `capacity` 的独立缓冲。
    pub(crate) fn dedicated(order: ByteOrder, capacity: usize) -> Self {
        Self {
            storage: Storage::Owned(BytesMut::with_capacity(capacity)),
            reader_index: 0,
            order,
            origin: BufferOrigin::Dedicated,
        }
    }

    /// 零拷贝包装外部存储，可读区间为 `[reader_index, storage.len())`。
    pub(crate) fn wrapped_at(order: ByteOrder, storage: BytesMut, reader_index: usize) -> Self {
        debug_assert!(reader_index <= storage.len());
        Self {
            storage: Storage::Owned(storage),
            reader_index,
            order,
            origin: BufferOrigin::Wrapped,
        }
    }

    /// 将已有的字节存储直接包装为缓冲，不拷贝、不经过分配器。
    ///
    /// 存储中已有的字节全部视为可读数据。
    pub fn wrap(order: ByteOrder, storage: BytesMut) -> Self {
        Self::wrapped_at(order, storage, 0)
    }

    /// 全局共享的零长度只读缓冲。
    ///
    /// 所有实例都指向同一段 `'static` 存储，不发生分配，可随意别名。
    pub fn empty() -> Self {
        Self {
            storage: Storage::Shared(Bytes::from_static(&EMPTY)),
            reader_index: 0,
            order: ByteOrder::BigEndian,
            origin: BufferOrigin::SharedEmpty,
        }
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn origin(&self) -> BufferOrigin {
        self.origin
    }

    /// 是否为共享空缓冲。
    pub fn is_shared_empty(&self) -> bool {
        matches!(self.origin, BufferOrigin::SharedEmpty)
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self.storage, Storage::Shared(_))
    }

    /// 当前容量上限（包含已写入字节）。
    pub fn capacity(&self) -> usize {
        match &self.storage {
            Storage::Owned(buf) => buf.capacity(),
            Storage::Shared(bytes) => bytes.len(),
        }
    }

    pub fn reader_index(&self) -> usize {
        self.reader_index
    }

    pub fn writer_index(&self) -> usize {
        match &self.storage {
            Storage::Owned(buf) => buf.len(),
            Storage::Shared(bytes) => bytes.len(),
        }
    }

    pub fn readable_bytes(&self) -> usize {
        self.writer_index() - self.reader_index
    }

    /// 不触发扩容即可写入的字节数。
    pub fn writable_bytes(&self) -> usize {
        match &self.storage {
            Storage::Owned(buf) => buf.capacity() - buf.len(),
            Storage::Shared(_) => 0,
        }
    }

    pub fn is_readable(&self) -> bool {
        self.readable_bytes() > 0
    }

    /// 可读区间的只读视图。
    pub fn as_slice(&self) -> &[u8] {
        match &self.storage {
            Storage::Owned(buf) => &buf[self.reader_index..],
            Storage::Shared(bytes) => &bytes[self.reader_index..],
        }
    }

    /// 复位读写游标，容量保持不变。
    pub fn clear(&mut self) {
        self.reader_index = 0;
        if let Storage::Owned(buf) = &mut self.storage {
            buf.clear();
        }
    }

    /// 追加写入整个切片。
    pub fn put_slice(&mut self, src: &[u8]) -> Result<()> {
        if src.is_empty() {
            return Ok(());
        }
        self.writable_mut("put_slice")?.put_slice(src);
        Ok(())
    }

    pub fn put_u8(&mut self, value: u8) -> Result<()> {
        self.writable_mut("put_u8")?.put_u8(value);
        Ok(())
    }

    pub fn get_u8(&mut self) -> Result<u8> {
        self.read_with(1, |src| src[0])
    }

    ordered_accessors! {
        u16 => get_u16 / get_u16_le, put_u16 / put_u16_le;
        u32 => get_u32 / get_u32_le, put_u32 / put_u32_le;
        u64 => get_u64 / get_u64_le, put_u64 / put_u64_le;
        i16 => get_i16 / get_i16_le, put_i16 / put_i16_le;
        i32 => get_i32 / get_i32_le, put_i32 / put_i32_le;
        i64 => get_i64 / get_i64_le, put_i64 / put_i64_le;
    }

    /// 读取 `dst.len()` 字节到目标切片。
    pub fn read_into(&mut self, dst: &mut [u8]) -> Result<()> {
        self.read_with(dst.len(), |src| dst.copy_from_slice(src))
    }

    /// 跳过 `len` 个可读字节。
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_with(len, |_| ())
    }

    /// 拷贝可读区间为 `Vec<u8>`，不移动游标。
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }

    /// 冻结为只读 `Bytes`，与原存储共享内存，仅包含可读区间。
    pub fn freeze(self) -> Bytes {
        match self.storage {
            Storage::Owned(buf) => buf.freeze().slice(self.reader_index..),
            Storage::Shared(bytes) => bytes.slice(self.reader_index..),
        }
    }

    /// 写入区域的全部可读字节并消费它们，返回写入字节数。
    pub(crate) fn write_region(&mut self, region: &mut NativeRegion) -> Result<usize> {
        let len = region.remaining();
        self.put_slice(region.readable())?;
        region.advance(len)?;
        Ok(len)
    }

    fn writable_mut(&mut self, operation: &'static str) -> Result<&mut BytesMut> {
        match &mut self.storage {
            Storage::Owned(buf) => Ok(buf),
            Storage::Shared(_) => Err(BufferError::ReadOnly { operation }),
        }
    }

    fn read_with<T>(&mut self, len: usize, read: impl FnOnce(&[u8]) -> T) -> Result<T> {
        let readable = self.readable_bytes();
        if len > readable {
            return Err(BufferError::index_out_of_range(
                "reader_index",
                self.reader_index.saturating_add(len),
                self.writer_index(),
            ));
        }
        let value = read(&self.as_slice()[..len]);
        self.reader_index += len;
        Ok(value)
    }
}

impl AsRef<[u8]> for DirectBuf {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl fmt::Debug for DirectBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectBuf")
            .field("order", &self.order)
            .field("origin", &self.origin)
            .field("reader_index", &self.reader_index)
            .field("writer_index", &self.writer_index())
            .field("capacity", &self.capacity())
            .finish()
    }
}
