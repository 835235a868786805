//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义直接内存分配器对外暴露的错误语义，所有校验失败均在分配或拷贝发生之前同步返回；
//! - 为每个错误变体提供稳定错误码，便于上层编解码/传输层做统一的告警与分类。
//!
//! ## 设计要求（What）
//! - 所有错误类型实现 `thiserror::Error`，兼容 `std::error::Error`；
//! - 错误信息需携带非法取值与参数名，调用方无需检查内部状态即可定位问题；
//! - 本模块不定义“内存耗尽”错误：宿主的 OOM 处理不属于分配器的错误域。

use std::borrow::Cow;

use thiserror::Error;

/// crate 内统一使用的结果别名。
pub type Result<T, E = BufferError> = core::result::Result<T, E>;

/// 稳定错误码表。
///
/// 与传输层 `OperationKind` 的命名保持一致：`spark.<域>.<语义>`，一经发布不得修改。
pub mod codes {
    pub const INVALID_ARGUMENT: &str = "spark.buffer.invalid_argument";
    pub const INDEX_OUT_OF_RANGE: &str = "spark.buffer.index_out_of_range";
    pub const DEFECT_STATE: &str = "spark.buffer.defect_state";
    pub const READ_ONLY: &str = "spark.buffer.read_only";
}

/// 直接内存分配器的错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：区分“调用方参数错误”“越界访问”“程序缺陷”三类失败，
///   让调用方据此决定直接拒绝请求还是上报缺陷；这些错误都不是瞬时错误，内部不做重试。
/// - **契约 (What)**：
///   - 所有变体满足 `Send + Sync + 'static`，可安全跨线程传播；
///   - `argument`/`operation` 使用 `&'static str` 记录参数或操作名，`reason`/`detail` 保存可读上下文；
///   - [`BufferError::code`] 返回稳定错误码。
/// - **设计权衡 (Trade-offs)**：`reason` 使用 `Cow<'static, str>`，常量文案零分配，
///   需要拼接取值时才落到堆上。
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum BufferError {
    /// 参数缺失或取值非法，例如未设置字节序、slab 容量为 0。
    #[error("invalid argument `{argument}`: {reason}")]
    InvalidArgument {
        argument: &'static str,
        reason: Cow<'static, str>,
    },

    /// 请求的区间超出源数据或缓冲的可读范围。
    ///
    /// - `value`：调用方请求到达的位置（如 `offset + length`）；
    /// - `bound`：实际允许的上界。
    #[error("index out of range for `{argument}`: {value} exceeds bound {bound}")]
    IndexOutOfRange {
        argument: &'static str,
        value: usize,
        bound: usize,
    },

    /// 进入了假定不可达的分支，表示调用方绕过了 [`ByteOrder`](crate::ByteOrder) 枚举。
    ///
    /// 该错误代表程序缺陷而非可恢复的运行时状态。
    #[error("defect state: {detail}")]
    DefectState { detail: Cow<'static, str> },

    /// 对只读缓冲（共享空缓冲或只读视图）执行了写操作。
    #[error("buffer is read-only, `{operation}` rejected")]
    ReadOnly { operation: &'static str },
}

impl BufferError {
    /// 构造参数非法错误。
    pub fn invalid_argument(argument: &'static str, reason: impl Into<Cow<'static, str>>) -> Self {
        BufferError::InvalidArgument {
            argument,
            reason: reason.into(),
        }
    }

    /// 构造越界错误。
    pub fn index_out_of_range(argument: &'static str, value: usize, bound: usize) -> Self {
        BufferError::IndexOutOfRange {
            argument,
            value,
            bound,
        }
    }

    /// 构造缺陷状态错误。
    pub fn defect(detail: impl Into<Cow<'static, str>>) -> Self {
        BufferError::DefectState {
            detail: detail.into(),
        }
    }

    /// 返回错误对应的稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            BufferError::InvalidArgument { .. } => codes::INVALID_ARGUMENT,
            BufferError::IndexOutOfRange { .. } => codes::INDEX_OUT_OF_RANGE,
            BufferError::DefectState { .. } => codes::DEFECT_STATE,
            BufferError::ReadOnly { .. } => codes::READ_ONLY,
        }
    }

    /// 是否属于调用方参数问题（非法参数或越界）。
    ///
    /// 缺陷状态与只读写入都返回 `false`，前者需要修复代码，后者是对缓冲的误用。
    pub fn is_argument_error(&self) -> bool {
        matches!(
            self,
            BufferError::InvalidArgument { .. } | BufferError::IndexOutOfRange { .. }
        )
    }
}
