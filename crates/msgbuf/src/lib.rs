#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![doc = "msgbuf: 面向消息流水线的双端可增长字节缓冲。"]
#![doc = ""]
#![doc = "== 设计初衷 =="]
#![doc = "- **Why**：消息在协议栈中自内向外组装——负载先写、头部后贴。把头部空间预留在负载前方，各层前插只付游标移动的成本；"]
#![doc = "- **What**：提供 `MsgBuf` 单一所有权缓冲：头部预留固定、尾部弹性按页扩容、四向游标操作全部以借用切片交还视图；"]
#![doc = "- **How**：依赖 `no_std + alloc` 环境，底层是一段完整初始化的 `Vec<u8>` 加两个偏移，不做指针运算，失败路径全部显式返回。"]

#[cfg(not(feature = "alloc"))]
compile_error!(
    "msgbuf 依赖堆分配能力：请启用默认特性或通过 `--features alloc` 显式打开该功能。"
);

extern crate alloc;

mod buffer;
#[cfg(feature = "dump")]
mod dump;
pub mod error;

pub use buffer::{DEFAULT_HEADROOM, MsgBuf, PAGE_SIZE};
pub use error::{MsgBufError, Result};
