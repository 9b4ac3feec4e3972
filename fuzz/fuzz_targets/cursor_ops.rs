#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use msgbuf::{MsgBuf, MsgBufError};
use std::collections::VecDeque;

/// Fuzz 指令：描述一条针对双端缓冲的操作序列。
///
/// - **Why**：游标操作的失败路径承诺零副作用，任何一次"部分生效"都会让上层
///   组装出错位的消息。本结构穷举四向操作与入队、深拷贝的交错组合，
///   帮助 Fuzzer 快速逼近越界与状态撕裂类缺陷。
/// - **How**：以 `VecDeque` 镜像读区间、以计数器镜像头部余量，每步操作后
///   核对长度、余量与几何不变量，结束时整体消费并逐字节比对。
/// - **What**：Fuzzer 生成任意初始布局与任意长度的指令流；模型与实现一旦
///   分歧立即 panic。
#[derive(Debug, Arbitrary)]
struct CursorCase {
    headroom: u16,
    capacity: u16,
    ops: Vec<CursorOp>,
}

/// 具体缓冲操作。
#[derive(Debug, Arbitrary)]
enum CursorOp {
    /// 向头部预留区前插数据。
    PushHead { data: Vec<u8> },
    /// 从读区间前端消费若干字节。
    PullHead { len: u16 },
    /// 向尾部追加数据，必要时触发扩容。
    PushTail { data: Vec<u8> },
    /// 从读区间尾端回收若干字节。
    PullTail { len: u16 },
    /// 以另一只缓冲为来源执行入队。
    Queue { data: Vec<u8> },
    /// 深拷贝并校验内容与元数据等价。
    Clone,
}

fuzz_target!(|case: CursorCase| {
    let headroom = usize::from(case.headroom) % 512;
    let capacity = usize::from(case.capacity) % 1024;
    let Ok(mut buff) = MsgBuf::alloc_with_headroom(capacity, headroom) else {
        return;
    };

    let mut live: VecDeque<u8> = VecDeque::new();
    let mut free_head = headroom;

    for op in case.ops {
        match op {
            CursorOp::PushHead { data } => match buff.push_head(data.len()) {
                Ok(view) => {
                    assert!(data.len() <= free_head, "预留不足时前插必须失败");
                    view.copy_from_slice(&data);
                    free_head -= data.len();
                    for byte in data.iter().rev() {
                        live.push_front(*byte);
                    }
                }
                Err(err) => {
                    assert!(data.len() > free_head, "预留足够时前插不得失败");
                    assert!(matches!(err, MsgBufError::InsufficientHeadroom { .. }));
                }
            },
            CursorOp::PullHead { len } => {
                let len = usize::from(len) % (live.len() + 17);
                match buff.pull_head(len) {
                    Ok(view) => {
                        assert!(len <= live.len(), "数据不足时前端消费必须失败");
                        let expected: Vec<u8> = live.drain(..len).collect();
                        assert_eq!(view, expected.as_slice());
                        free_head += len;
                    }
                    Err(err) => {
                        assert!(len > live.len(), "数据足够时前端消费不得失败");
                        assert!(matches!(err, MsgBufError::InsufficientData { .. }));
                    }
                }
            }
            CursorOp::PushTail { data } => {
                let view = buff.push_tail(data.len()).expect("尾部追加不应失败");
                view.copy_from_slice(&data);
                live.extend(data.iter().copied());
            }
            CursorOp::PullTail { len } => {
                let len = usize::from(len) % (live.len() + 17);
                match buff.pull_tail(len) {
                    Ok(view) => {
                        assert!(len <= live.len(), "数据不足时尾端回收必须失败");
                        let split = live.len() - len;
                        let expected: Vec<u8> = live.split_off(split).into_iter().collect();
                        assert_eq!(view, expected.as_slice());
                    }
                    Err(err) => {
                        assert!(len > live.len(), "数据足够时尾端回收不得失败");
                        assert!(matches!(err, MsgBufError::InsufficientData { .. }));
                    }
                }
            }
            CursorOp::Queue { data } => {
                let Ok(mut src) = MsgBuf::alloc(data.len()) else {
                    return;
                };
                src.append(&data).expect("来源写入不应失败");
                buff.queue(&src).expect("入队不应失败");
                assert_eq!(src.as_slice(), data.as_slice(), "入队不得修改来源");
                live.extend(data.iter().copied());
            }
            CursorOp::Clone => {
                let copy = buff.try_clone().expect("深拷贝不应失败");
                assert_eq!(copy.as_slice(), buff.as_slice());
                assert_eq!(copy.fd, buff.fd);
                assert_eq!(copy.id, buff.id);
            }
        }

        assert_eq!(buff.len(), live.len(), "读区间长度与模型分歧");
        assert_eq!(buff.headroom(), free_head, "头部余量与模型分歧");
        assert_eq!(
            buff.headroom() + buff.len() + buff.tailroom(),
            buff.capacity(),
            "三个区间必须精确铺满底层存储"
        );
    }

    let remaining = buff.len();
    let drained = buff.pull_head(remaining).expect("整体消费不应失败");
    let expected: Vec<u8> = live.into_iter().collect();
    assert_eq!(drained, expected.as_slice(), "最终内容与模型分歧");
});
