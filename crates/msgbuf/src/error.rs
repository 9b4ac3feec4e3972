use core::fmt;

/// 缓冲层统一的 `Result` 别名，默认错误类型为 [`MsgBufError`]。
pub type Result<T, E = MsgBufError> = core::result::Result<T, E>;

/// `MsgBufError` 枚举缓冲层全部可观察的失败形态。
///
/// # 设计背景（Why）
/// - 游标操作的失败原因只有三类：底层存储申请失败、头部预留耗尽、读区间字节不足。
///   封闭枚举让调用方可以穷尽匹配并针对每种形态实施兜底策略，而不是解析字符串。
/// - 每个变体都附带稳定错误码（见 [`codes`]），遵循 `<域>.<语义>` 命名约定，
///   便于在跨组件日志中检索与聚合。
///
/// # 契约说明（What）
/// - 变体携带的 `requested`/`available` 用于排障时还原现场；二者均以字节计。
/// - 错误产生时缓冲自身保持未修改：游标、容量与既有内容与操作前完全一致。
/// - 类型实现 `Copy`，可廉价传播与比较；`Display` 输出 `[code] 描述` 形式。
///
/// # 设计取舍与风险（Trade-offs）
/// - 不携带底层 `TryReserveError`：分配失败的根因对调用方不可操作，
///   保留它只会把 `alloc` 的内部类型泄漏进公共签名。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgBufError {
    /// 底层存储申请或扩容失败。
    OutOfMemory {
        /// 失败时期望达到的总容量（字节）；算术溢出时饱和为 `usize::MAX`。
        requested: usize,
    },
    /// 头部预留空间不足，无法继续向前扩展。
    InsufficientHeadroom {
        /// 请求写入的字节数。
        requested: usize,
        /// 剩余可用的头部空间。
        available: usize,
    },
    /// 读区间内没有足够的字节可供消费。
    InsufficientData {
        /// 请求消费的字节数。
        requested: usize,
        /// 读区间当前持有的字节数。
        available: usize,
    },
}

impl MsgBufError {
    /// 返回该错误对应的稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            MsgBufError::OutOfMemory { .. } => codes::BUFFER_OUT_OF_MEMORY,
            MsgBufError::InsufficientHeadroom { .. } => codes::BUFFER_INSUFFICIENT_HEADROOM,
            MsgBufError::InsufficientData { .. } => codes::BUFFER_INSUFFICIENT_DATA,
        }
    }
}

impl fmt::Display for MsgBufError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MsgBufError::OutOfMemory { requested } => {
                write!(f, "[{}] 无法把底层存储扩展到 {requested} 字节", self.code())
            }
            MsgBufError::InsufficientHeadroom {
                requested,
                available,
            } => {
                write!(
                    f,
                    "[{}] 头部预留不足：请求 {requested} 字节，剩余 {available} 字节",
                    self.code()
                )
            }
            MsgBufError::InsufficientData {
                requested,
                available,
            } => {
                write!(
                    f,
                    "[{}] 数据不足：请求 {requested} 字节，读区间仅有 {available} 字节",
                    self.code()
                )
            }
        }
    }
}

impl core::error::Error for MsgBufError {}

/// 缓冲层的稳定错误码集合。
///
/// # 契约说明（What）
/// - **使用前提**：错误码仅随 [`MsgBufError`](crate::MsgBufError) 一同产生，
///   调用方不应依据码值反向构造错误。
/// - **返回承诺**：码值一经发布不再变更；新增失败形态时只追加新码，
///   日志与告警侧可放心建立长期索引。
pub mod codes {
    /// 底层存储申请或扩容失败。
    pub const BUFFER_OUT_OF_MEMORY: &str = "buffer.out_of_memory";
    /// 头部预留空间不足。
    pub const BUFFER_INSUFFICIENT_HEADROOM: &str = "buffer.insufficient_headroom";
    /// 读区间内数据不足。
    pub const BUFFER_INSUFFICIENT_DATA: &str = "buffer.insufficient_data";
}
