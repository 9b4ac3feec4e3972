use alloc::string::String;

use crate::MsgBuf;

const BYTES_PER_LINE: usize = 16;
const ASCII_COLUMN: usize = 50;
const LINE_WIDTH: usize = 80;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

impl MsgBuf {
    /// 把读区间以十六进制表格形式写入调试日志。
    ///
    /// # 设计动机（Why）
    /// - 线缆旁路抓包在组装早期帮不上忙：此时消息尚未离开进程。
    ///   直接转储读区间是定位组装错位最快的手段。
    /// - 输出走 `tracing::debug!`（target 为 `msgbuf`），由订阅端决定去向与开关；
    ///   该方法连同 `tracing` 依赖仅在启用 `dump` Feature 时编译。
    ///
    /// # 契约说明（What）
    /// - 先输出一条 `label` 事件，再按每行 16 字节输出：
    ///   十六进制列从第 0 列起、每字节占 3 列，可打印字符列从第 50 列起，
    ///   不可打印字节以 `.` 占位，行宽固定 80 列。
    /// - 只读访问，不移动游标；空缓冲仅输出 `label`。
    pub fn dump(&self, label: &str) {
        tracing::debug!(target: "msgbuf", "{label}");
        for chunk in self.as_slice().chunks(BYTES_PER_LINE) {
            tracing::debug!(target: "msgbuf", "{}", render_line(chunk));
        }
    }
}

/// 渲染一行转储：`chunk` 最多 16 字节。
fn render_line(chunk: &[u8]) -> String {
    debug_assert!(chunk.len() <= BYTES_PER_LINE);
    let mut line = [b' '; LINE_WIDTH];
    for (i, byte) in chunk.iter().enumerate() {
        line[i * 3] = HEX_DIGITS[(byte >> 4) as usize];
        line[i * 3 + 1] = HEX_DIGITS[(byte & 0x0f) as usize];
        line[ASCII_COLUMN + i] = if byte.is_ascii_graphic() || *byte == b' ' {
            *byte
        } else {
            b'.'
        };
    }
    // 写入的全部是 ASCII，lossy 转换不会产生替换字符。
    String::from_utf8_lossy(&line).into_owned()
}
