//! `spark-direct-buffer` 为网络 I/O 栈提供基于 slab 切片的直接内存缓冲分配器。
//!
//! # 模块定位（Why）
//! - 直接内存的回收远比普通堆内存迟缓且不可预测，频繁分配小块直接内存会在回收追上之前
//!   耗尽地址空间；
//! - 本 crate 预先分配少量大块 slab，再从中切出彼此独立的小缓冲，
//!   让真实分配次数与上层请求的缓冲数量脱钩。
//!
//! # 设计概要（How）
//! - [`SlabArena`]：每个字节序一个，独占当前 slab 与游标，串行化“切分或换块”的决策；
//! - [`DirectBufferAllocator`]：公开入口，按容量在共享空缓冲、slab 切片与独立分配之间分流，
//!   并负责字节切片与外部内存区域的适配；
//! - [`AllocatorRegistry`]：启动时构造一次的“字节序 → 分配器”映射，显式传递给消费方；
//! - [`DirectBuf`]：交付给调用方的缓冲，底层为 `bytes::BytesMut`，slab 的释放交给其引用计数。
//!
//! # 命名约定（Consistency）
//! - “slab”指一次大分配，“切片”（slice）指从 slab 切出的视图，“竞技场”（arena）指按字节序划分的切分者。
//!
//! ```
//! use spark_direct_buffer::{AllocatorRegistry, ByteOrder};
//!
//! let registry = AllocatorRegistry::default();
//! let allocator = registry.get(ByteOrder::LittleEndian);
//! let mut buf = allocator.buffer(ByteOrder::LittleEndian, 64);
//! buf.put_u32(0xCAFE_BABE).unwrap();
//! assert_eq!(buf.as_slice(), &[0xBE, 0xBA, 0xFE, 0xCA]);
//! ```

mod allocator;
mod arena;
mod buffer;
mod config;
mod error;
mod order;
mod region;
mod registry;
mod slab;

pub use allocator::{AllocatorStats, DirectBufferAllocator};
pub use arena::{ArenaSnapshot, SlabArena};
pub use buffer::{BufferOrigin, DirectBuf};
pub use config::{DEFAULT_SLAB_CAPACITY, DirectBufferConfig};
pub use error::{BufferError, Result, codes};
pub use order::{ByteOrder, ByteOrderMap};
pub use region::NativeRegion;
pub use registry::AllocatorRegistry;
pub use slab::Slab;
