use alloc::vec::Vec;
use core::fmt;

use bytes::Bytes;

use crate::error::{MsgBufError, Result};

/// 尾部扩容的页粒度（字节）。扩容后的总容量始终对齐到该值的整数倍。
pub const PAGE_SIZE: usize = 4096;

/// [`MsgBuf::alloc`] 为头部写入预留的默认空间（字节）。
pub const DEFAULT_HEADROOM: usize = PAGE_SIZE;

/// `MsgBuf` 是面向消息组装的双端可增长字节缓冲。
///
/// # 设计动机（Why）
/// - 协议栈逐层组装消息时，负载先行写入、各层头部随后前插；若每次前插都要整体搬移，
///   组装成本将随层数线性放大。`MsgBuf` 在负载前方预留头部空间，使前插只移动游标。
/// - 尾部追加是高频路径且长度难以预估，因此尾部采用弹性扩容；头部预留一经分配即固定，
///   耗尽时直接报错。这种不对称让"头部预留多大"成为显式的容量规划问题，
///   而不是运行期的隐式搬移。
///
/// # 结构解析（How）
/// - 底层为一段始终完整初始化的 `Vec<u8>`（`store.len()` 即逻辑容量），
///   配合 `head`/`tail` 两个偏移划分出三个区间：
///   `[0, head)` 为头部预留，`[head, tail)` 为读区间（有效数据），
///   `[tail, store.len())` 为尾部空闲。
/// - 四类游标操作只移动偏移并返回对应区间的切片视图；唯一会重新分配的是
///   尾部越界时的 [`push_tail`](Self::push_tail)，扩容后两个偏移保持不变。
///
/// # 契约说明（What）
/// - 不变量：`head <= tail <= store.len()` 恒成立，所有操作要么完整生效、
///   要么报错且缓冲可观察状态完全不变。
/// - 返回的切片借用 `&self`/`&mut self`，下一次可变操作前必须释放；
///   该约束由借用检查静态保证，不存在运行期校验开销。
/// - `fd` 与 `id` 为调用方自有元数据，缓冲只负责随 [`try_clone`](Self::try_clone)
///   原样携带，永不解释。
///
/// # 设计取舍与风险（Trade-offs）
/// - 存储保持全量零初始化，舍弃未初始化内存的微小收益，换取纯安全代码与
///   确定性的视图内容（新预留区间总是可读的）。
/// - 句柄之间不共享存储：克隆即深拷贝。需要零拷贝分发时应在组装完成后
///   [`freeze`](Self::freeze) 为 [`Bytes`] 再克隆。
pub struct MsgBuf {
    /// 调用方自有的描述符（如套接字），缓冲不解释其含义。
    pub fd: i32,
    /// 调用方自有的消息标识，缓冲不解释其含义。
    pub id: u32,
    store: Vec<u8>,
    head: usize,
    tail: usize,
}

impl MsgBuf {
    /// 分配一个空缓冲：尾部可写 `capacity` 字节，头部预留 [`DEFAULT_HEADROOM`] 字节。
    ///
    /// # 契约说明（What）
    /// - **输入**：`capacity` 为希望立刻可用的尾部空间，可为 0。
    /// - **后置条件**：`len() == 0`、`headroom() == DEFAULT_HEADROOM`、
    ///   `tailroom() == capacity`，元数据初始化为 `fd = -1`、`id = 0`。
    /// - **失败**：总容量溢出或底层分配失败时返回
    ///   [`MsgBufError::OutOfMemory`]，不产生任何分配残留。
    pub fn alloc(capacity: usize) -> Result<Self> {
        Self::alloc_with_headroom(capacity, DEFAULT_HEADROOM)
    }

    /// 分配一个空缓冲并显式指定头部预留大小。
    ///
    /// # 设计动机（Why）
    /// - 头部预留不具备弹性，默认一页的预留对深层协议栈绰绰有余，
    ///   但嵌入式或海量小消息场景需要把这笔开销压到实际头部尺寸。
    ///
    /// # 契约说明（What）
    /// - **后置条件**：`headroom() == headroom`、`tailroom() == capacity`、
    ///   `capacity() == capacity + headroom`。
    /// - **失败**：`capacity + headroom` 溢出 `usize` 或分配失败时返回
    ///   [`MsgBufError::OutOfMemory`]。
    pub fn alloc_with_headroom(capacity: usize, headroom: usize) -> Result<Self> {
        let total = capacity
            .checked_add(headroom)
            .ok_or(MsgBufError::OutOfMemory {
                requested: usize::MAX,
            })?;
        let mut store = Vec::new();
        store
            .try_reserve_exact(total)
            .map_err(|_| MsgBufError::OutOfMemory { requested: total })?;
        store.resize(total, 0);
        Ok(Self {
            fd: -1,
            id: 0,
            store,
            head: headroom,
            tail: headroom,
        })
    }

    /// 读区间当前持有的字节数。
    pub fn len(&self) -> usize {
        self.tail - self.head
    }

    /// 读区间是否为空。
    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// 底层存储的总容量（字节）。
    pub fn capacity(&self) -> usize {
        self.store.len()
    }

    /// 头部仍可前插的字节数。
    pub fn headroom(&self) -> usize {
        self.head
    }

    /// 尾部在不触发扩容的前提下仍可追加的字节数。
    pub fn tailroom(&self) -> usize {
        self.store.len() - self.tail
    }

    /// 以只读切片形式借出整个读区间。
    pub fn as_slice(&self) -> &[u8] {
        &self.store[self.head..self.tail]
    }

    /// 以可变切片形式借出整个读区间。
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.store[self.head..self.tail]
    }

    /// 向头部预留区前插 `len` 字节，返回新纳入读区间的可写视图。
    ///
    /// # 契约说明（What）
    /// - **前置条件**：`len <= headroom()`。头部预留一经分配即固定，
    ///   本操作永不扩容；预留不足返回
    ///   [`MsgBufError::InsufficientHeadroom`] 且缓冲不变。
    /// - **后置条件**：`head` 前移 `len`，视图覆盖 `[head, head + len)`，
    ///   内容为确定的历史字节（首次使用时为 0），调用方随后覆写。
    pub fn push_head(&mut self, len: usize) -> Result<&mut [u8]> {
        if len > self.head {
            return Err(MsgBufError::InsufficientHeadroom {
                requested: len,
                available: self.head,
            });
        }
        self.head -= len;
        self.check_rep();
        Ok(&mut self.store[self.head..self.head + len])
    }

    /// 从读区间前端消费 `len` 字节，返回被移出区间的只读视图。
    ///
    /// # 契约说明（What）
    /// - **前置条件**：`len <= len()`，否则返回 [`MsgBufError::InsufficientData`]
    ///   且缓冲不变。
    /// - **后置条件**：`head` 后移 `len`；被消费的字节仍驻留在原分配中，
    ///   视图在下一次可变操作前有效。消费过的空间计入 `headroom()`，
    ///   可再次被 [`push_head`](Self::push_head) 使用。
    pub fn pull_head(&mut self, len: usize) -> Result<&[u8]> {
        if len > self.len() {
            return Err(MsgBufError::InsufficientData {
                requested: len,
                available: self.len(),
            });
        }
        let start = self.head;
        self.head += len;
        self.check_rep();
        Ok(&self.store[start..self.head])
    }

    /// 向尾部追加 `len` 字节，必要时先扩容，返回新纳入读区间的可写视图。
    ///
    /// # 行为概览（How）
    /// - 尾部空闲足够时仅后移 `tail`；不足时把总容量扩到
    ///   `(当前容量 + 缺口)` 向上对齐 [`PAGE_SIZE`] 的值，再后移 `tail`。
    ///   页粒度对齐把连续小追加的重分配次数压到对数级。
    ///
    /// # 契约说明（What）
    /// - **后置条件**：视图覆盖 `[旧 tail, 旧 tail + len)`；扩容不影响
    ///   `head`、已有内容与 `headroom()`。
    /// - **失败**：新容量溢出 `usize` 或分配失败时返回
    ///   [`MsgBufError::OutOfMemory`]，此时游标、容量与内容均保持原样。
    pub fn push_tail(&mut self, len: usize) -> Result<&mut [u8]> {
        let new_tail = self
            .tail
            .checked_add(len)
            .ok_or(MsgBufError::OutOfMemory {
                requested: usize::MAX,
            })?;
        if new_tail > self.store.len() {
            self.grow(new_tail - self.store.len())?;
        }
        let start = self.tail;
        self.tail = new_tail;
        self.check_rep();
        Ok(&mut self.store[start..new_tail])
    }

    /// 从读区间尾端收回 `len` 字节，返回被移出区间的只读视图。
    ///
    /// # 契约说明（What）
    /// - **前置条件**：`len <= len()`，即尾部回收最多到 `head` 为止，
    ///   否则返回 [`MsgBufError::InsufficientData`] 且缓冲不变。
    /// - **后置条件**：`tail` 前移 `len`，回收的空间计入 `tailroom()`；
    ///   视图在下一次可变操作前有效。
    pub fn pull_tail(&mut self, len: usize) -> Result<&[u8]> {
        if len > self.len() {
            return Err(MsgBufError::InsufficientData {
                requested: len,
                available: self.len(),
            });
        }
        let end = self.tail;
        self.tail -= len;
        self.check_rep();
        Ok(&self.store[self.tail..end])
    }

    /// 深拷贝出一个内容等价的新缓冲。
    ///
    /// # 契约说明（What）
    /// - **后置条件**：新缓冲与源不共享存储；`fd`/`id` 原样复制；
    ///   读区间字节逐一相等。头部预留重置为 [`DEFAULT_HEADROOM`]，
    ///   尾部容量按 `len()` 精确申请，布局不保证与源一致。
    /// - **失败**：分配失败时返回 [`MsgBufError::OutOfMemory`]，
    ///   已申请的中间存储随即释放，无泄漏。
    pub fn try_clone(&self) -> Result<Self> {
        let mut copy = Self::alloc(self.len())?;
        copy.fd = self.fd;
        copy.id = self.id;
        copy.push_tail(self.len())?.copy_from_slice(self.as_slice());
        Ok(copy)
    }

    /// 把 `src` 的整个读区间追加到本缓冲尾部，`src` 保持不变。
    ///
    /// # 契约说明（What）
    /// - 等价于 `push_tail(src.len())` 加一次整体拷贝；失败语义与
    ///   [`push_tail`](Self::push_tail) 相同，失败时本缓冲不变。
    /// - `src` 以共享借用传入，自追加在借用层面即不可表达。
    pub fn queue(&mut self, src: &MsgBuf) -> Result<()> {
        self.push_tail(src.len())?.copy_from_slice(src.as_slice());
        Ok(())
    }

    /// 追加一段字节到尾部，等价于 `push_tail` 加整体拷贝。
    pub fn append(&mut self, src: &[u8]) -> Result<()> {
        self.push_tail(src.len())?.copy_from_slice(src);
        Ok(())
    }

    /// 前插一段字节到头部，等价于 `push_head` 加整体拷贝。
    pub fn prepend(&mut self, src: &[u8]) -> Result<()> {
        self.push_head(src.len())?.copy_from_slice(src);
        Ok(())
    }

    /// 消耗缓冲，把读区间零拷贝冻结为只读的 [`Bytes`]。
    ///
    /// # 设计取舍与风险（Trade-offs）
    /// - 返回的 `Bytes` 是对整个底层分配的切片，头尾空闲区随之存活，
    ///   直到所有克隆释放。对预留远大于负载的长寿命消息，
    ///   改用 [`into_vec`](Self::into_vec) 可立即收回空闲区。
    pub fn freeze(self) -> Bytes {
        let (head, tail) = (self.head, self.tail);
        Bytes::from(self.store).slice(head..tail)
    }

    /// 消耗缓冲，将读区间压平为 `Vec<u8>`。
    pub fn into_vec(self) -> Vec<u8> {
        let MsgBuf {
            store, head, tail, ..
        } = self;
        let mut flat = store;
        flat.truncate(tail);
        flat.drain(..head);
        flat
    }

    /// 把总容量扩大 `shortfall` 字节以上并对齐页粒度，偏移保持不变。
    fn grow(&mut self, shortfall: usize) -> Result<()> {
        let new_capacity = self
            .store
            .len()
            .checked_add(shortfall)
            .and_then(|wanted| wanted.checked_next_multiple_of(PAGE_SIZE))
            .ok_or(MsgBufError::OutOfMemory {
                requested: usize::MAX,
            })?;
        let additional = new_capacity - self.store.len();
        // try_reserve_exact 失败时 store 保持原样，调用方看到的缓冲完全未变。
        self.store
            .try_reserve_exact(additional)
            .map_err(|_| MsgBufError::OutOfMemory {
                requested: new_capacity,
            })?;
        self.store.resize(new_capacity, 0);
        Ok(())
    }

    #[inline]
    fn check_rep(&self) {
        debug_assert!(self.head <= self.tail);
        debug_assert!(self.tail <= self.store.len());
    }
}

impl fmt::Debug for MsgBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MsgBuf")
            .field("fd", &self.fd)
            .field("id", &self.id)
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("headroom", &self.headroom())
            .field("tailroom", &self.tailroom())
            .finish()
    }
}

impl AsRef<[u8]> for MsgBuf {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_reserves_headroom_and_tail_capacity() {
        let buff = MsgBuf::alloc(256).expect("初始分配失败");
        assert_eq!(buff.len(), 0);
        assert!(buff.is_empty());
        assert_eq!(buff.headroom(), DEFAULT_HEADROOM);
        assert_eq!(buff.tailroom(), 256);
        assert_eq!(buff.capacity(), 256 + DEFAULT_HEADROOM);
        assert_eq!(buff.fd, -1);
        assert_eq!(buff.id, 0);
    }

    #[test]
    fn push_head_consumes_reserve_until_exhausted() {
        let mut buff = MsgBuf::alloc_with_headroom(0, 8).expect("分配失败");
        buff.push_head(5)
            .expect("头部预留应足够")
            .copy_from_slice(b"hello");
        assert_eq!(buff.len(), 5);
        assert_eq!(buff.headroom(), 3);
        let err = buff.push_head(4).expect_err("超出预留必须失败");
        assert_eq!(
            err,
            MsgBufError::InsufficientHeadroom {
                requested: 4,
                available: 3,
            }
        );
        assert_eq!(buff.as_slice(), b"hello", "失败不得改动游标或内容");
    }

    #[test]
    fn pull_head_consumes_front_and_recycles_headroom() {
        let mut buff = MsgBuf::alloc_with_headroom(16, 4).expect("分配失败");
        buff.append(b"abcdef").expect("写入失败");
        let front = buff.pull_head(2).expect("消费前端失败");
        assert_eq!(front, b"ab");
        assert_eq!(buff.as_slice(), b"cdef");
        assert_eq!(buff.headroom(), 6, "消费过的空间应计入头部预留");
        buff.push_head(6).expect("回收后的预留应可再次前插");
    }

    #[test]
    fn push_tail_grows_to_page_boundary() {
        let mut buff = MsgBuf::alloc_with_headroom(16, 0).expect("分配失败");
        assert_eq!(buff.capacity(), 16);
        let view = buff.push_tail(20).expect("扩容失败");
        assert_eq!(view.len(), 20);
        assert_eq!(buff.capacity(), PAGE_SIZE);
        assert_eq!(buff.len(), 20);
        assert_eq!(buff.tailroom(), PAGE_SIZE - 20);
    }

    #[test]
    fn push_tail_growth_preserves_content_and_offsets() {
        let mut buff = MsgBuf::alloc_with_headroom(4, 2).expect("分配失败");
        buff.append(b"abcd").expect("填满初始容量");
        let headroom_before = buff.headroom();
        buff.push_tail(PAGE_SIZE).expect("跨页扩容失败");
        assert_eq!(&buff.as_slice()[..4], b"abcd", "扩容不得破坏既有内容");
        assert_eq!(buff.headroom(), headroom_before, "扩容不得影响头部预留");
        assert_eq!(buff.capacity() % PAGE_SIZE, 0, "扩容后的容量应对齐页粒度");
    }

    #[test]
    fn pull_tail_stops_at_head() {
        let mut buff = MsgBuf::alloc(64).expect("分配失败");
        buff.append(b"abcd").expect("写入失败");
        let pulled = buff.pull_tail(3).expect("回收尾部失败");
        assert_eq!(pulled, b"bcd");
        let err = buff.pull_tail(2).expect_err("越过 head 必须失败");
        assert_eq!(
            err,
            MsgBufError::InsufficientData {
                requested: 2,
                available: 1,
            }
        );
        assert_eq!(buff.as_slice(), b"a");
    }

    #[test]
    fn zero_length_ops_never_fail() {
        let mut buff = MsgBuf::alloc_with_headroom(0, 0).expect("分配失败");
        assert!(buff.push_head(0).expect("零长度前插").is_empty());
        assert!(buff.push_tail(0).expect("零长度追加").is_empty());
        assert!(buff.pull_head(0).expect("零长度前端消费").is_empty());
        assert!(buff.pull_tail(0).expect("零长度尾端回收").is_empty());
        assert_eq!(buff.capacity(), 0, "零长度操作不应触发扩容");
    }

    #[test]
    fn try_clone_copies_metadata_and_payload() {
        let mut buff = MsgBuf::alloc(32).expect("分配失败");
        buff.fd = 7;
        buff.id = 42;
        buff.append(b"payload").expect("写入失败");
        let copy = buff.try_clone().expect("深拷贝失败");
        assert_eq!(copy.fd, 7);
        assert_eq!(copy.id, 42);
        assert_eq!(copy.as_slice(), b"payload");
        assert_eq!(copy.headroom(), DEFAULT_HEADROOM, "拷贝应重置头部预留");
    }

    #[test]
    fn queue_appends_whole_source() {
        let mut dst = MsgBuf::alloc(8).expect("分配目标失败");
        dst.append(b"head-").expect("写入目标失败");
        let mut src = MsgBuf::alloc(8).expect("分配来源失败");
        src.append(b"tail").expect("写入来源失败");
        dst.queue(&src).expect("入队失败");
        assert_eq!(dst.as_slice(), b"head-tail");
        assert_eq!(src.as_slice(), b"tail", "入队不得修改来源");
    }

    #[test]
    fn freeze_hands_off_live_region() {
        let mut buff = MsgBuf::alloc(16).expect("分配失败");
        buff.append(b"frozen").expect("写入失败");
        buff.prepend(b">>").expect("前插失败");
        let bytes = buff.freeze();
        assert_eq!(bytes.as_ref(), b">>frozen");
    }

    #[test]
    fn into_vec_flattens_live_region() {
        let mut buff = MsgBuf::alloc_with_headroom(8, 4).expect("分配失败");
        buff.append(b"data").expect("写入失败");
        buff.prepend(b"x").expect("前插失败");
        assert_eq!(buff.into_vec(), b"xdata");
    }

    #[test]
    fn debug_reports_cursors_not_content() {
        let mut buff = MsgBuf::alloc_with_headroom(8, 2).expect("分配失败");
        buff.append(b"ab").expect("写入失败");
        let rendered = alloc::format!("{buff:?}");
        assert!(rendered.contains("len: 2"));
        assert!(rendered.contains("headroom: 2"));
        assert!(!rendered.contains("ab"), "Debug 输出不应包含负载内容");
    }
}
