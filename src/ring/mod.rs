//! 环形缓冲区扩展
//!
//! 在环形模式的 [`CacheSegment`] 上提供头尾游标、流式读写和子串查找。
//! 每个被移动的字节都走缓存段的行加载路径，行管理逻辑不重复实现。
//!
//! 游标都以段大小取模。保留一个字节区分"空"和"满"：
//!
//! ```text
//! read_available  = (head - tail)     mod segment_size
//! write_available = (tail - head - 1) mod segment_size
//! read_available + write_available == segment_size - 1
//! ```

mod search;

pub use search::StreamMatcher;

use crate::cache::CacheSegment;
use crate::consts::RING_TERMINATOR;
use crate::device::StorageDevice;

/// 环形游标
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RingCursors {
    /// 下一个写入位置
    pub head: u32,
    /// 下一个读取位置
    pub tail: u32,
}

impl RingCursors {
    /// 游标归零
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn read_available(&self, mask: u32) -> u32 {
        self.head.wrapping_sub(self.tail) & mask
    }

    fn write_available(&self, mask: u32) -> u32 {
        self.tail.wrapping_sub(self.head).wrapping_sub(1) & mask
    }
}

impl<'a, D: StorageDevice> CacheSegment<'a, D> {
    /// 是否为已初始化的环形段
    pub fn is_circular(&self) -> bool {
        self.state
            .as_ref()
            .map(|state| state.cursors.is_some())
            .unwrap_or(false)
    }

    /// 当前游标
    pub fn circular_cursors(&self) -> Option<RingCursors> {
        self.state.as_ref().and_then(|state| state.cursors)
    }

    /// 可读字节数
    pub fn circular_read_available(&self) -> u32 {
        match self.state.as_ref() {
            Some(state) => state
                .cursors
                .map(|c| c.read_available(state.geo.segment_mask()))
                .unwrap_or(0),
            None => 0,
        }
    }

    /// 可写字节数
    pub fn circular_write_available(&self) -> u32 {
        match self.state.as_ref() {
            Some(state) => state
                .cursors
                .map(|c| c.write_available(state.geo.segment_mask()))
                .unwrap_or(0),
            None => 0,
        }
    }

    /// 从 `tail` 读取数据到 `dest`
    ///
    /// 读取 `min(可读字节数, dest.len() - [terminate])` 字节，按不超过一行的块复制，
    /// 然后推进 `tail`。`terminate` 为 true 时在数据后追加一个终止字节。
    ///
    /// # 返回
    ///
    /// 复制的数据字节数（不含终止字节）
    pub fn circular_read(&mut self, dest: &mut [u8], terminate: bool) -> usize {
        let Some(state) = self.state.as_mut() else {
            return 0;
        };
        let Some(mut cursors) = state.cursors else {
            return 0;
        };

        let room = if terminate {
            match dest.len().checked_sub(1) {
                Some(room) => room,
                None => return 0,
            }
        } else {
            dest.len()
        };

        let geo = state.geo;
        let mask = geo.segment_mask();
        let count = (cursors.read_available(mask) as usize).min(room);

        let mut copied = 0;
        while copied < count {
            let tail = cursors.tail;
            let offset = geo.line_offset(tail) as usize;
            // 行不会跨越段末尾，因此块也不会跨越回绕点
            let chunk = (count - copied).min(geo.line_size as usize - offset);

            state.ensure_line(&mut self.io, tail);
            dest[copied..copied + chunk].copy_from_slice(&state.line.data()[offset..offset + chunk]);

            copied += chunk;
            cursors.tail = (tail + chunk as u32) & mask;
        }

        if terminate {
            dest[count] = RING_TERMINATOR;
        }
        state.cursors = Some(cursors);

        log::debug!("[RING] read {} bytes, tail={:#x}", count, cursors.tail);
        count
    }

    /// 从 `head` 写入 `src`
    ///
    /// 空间不足或写保护时返回 0 且没有任何副作用。否则逐字节经 `write()` 写入，
    /// 推进 `head`，最后刷新一次驻留行。
    pub fn circular_write(&mut self, src: &[u8]) -> usize {
        if self.io.write_protected {
            return 0;
        }
        let Some(state) = self.state.as_ref() else {
            return 0;
        };
        let Some(mut cursors) = state.cursors else {
            return 0;
        };

        let mask = state.geo.segment_mask();
        let available = cursors.write_available(mask) as usize;
        if src.len() > available {
            log::debug!("[RING] write of {} bytes refused, {} available", src.len(), available);
            return 0;
        }

        for &byte in src {
            self.write(cursors.head, byte);
            cursors.head = (cursors.head + 1) & mask;
        }

        if let Some(state) = self.state.as_mut() {
            state.cursors = Some(cursors);
        }
        self.flush_cache_line();

        log::debug!("[RING] wrote {} bytes, head={:#x}", src.len(), cursors.head);
        src.len()
    }

    /// 在未读区域中查找 `pattern`
    ///
    /// 从 `tail` 向 `head` 扫描，跨行时自动重新加载，跨行边界和回绕点的匹配都能找到。
    /// 不移动游标。
    ///
    /// # 返回
    ///
    /// 从 `tail` 到匹配末尾之后的字节数，即消费掉匹配及其之前内容需要丢弃的字节数；
    /// 未找到、未读区域为空或模式为空时返回 `None`。
    pub fn circular_find(&mut self, pattern: &[u8]) -> Option<usize> {
        let state = self.state.as_mut()?;
        let cursors = state.cursors?;
        let mut matcher = StreamMatcher::new(pattern)?;

        let geo = state.geo;
        let mask = geo.segment_mask();
        let available = cursors.read_available(mask) as usize;

        let mut scanned = 0;
        let mut pos = cursors.tail;
        while scanned < available {
            let offset = geo.line_offset(pos) as usize;
            let chunk = (available - scanned).min(geo.line_size as usize - offset);

            state.ensure_line(&mut self.io, pos);
            if let Some(end) = matcher.scan(&state.line.data()[offset..offset + chunk]) {
                log::debug!("[RING] found {} byte pattern, consume {}", pattern.len(), scanned + end);
                return Some(scanned + end);
            }

            scanned += chunk;
            pos = (pos + chunk as u32) & mask;
        }

        None
    }

    /// 丢弃最多 `n` 个未读字节
    ///
    /// 只移动 `tail`，不访问缓存行。返回实际丢弃的字节数。
    pub fn circular_discard(&mut self, n: usize) -> usize {
        let Some(state) = self.state.as_mut() else {
            return 0;
        };
        let Some(cursors) = state.cursors.as_mut() else {
            return 0;
        };

        let mask = state.geo.segment_mask();
        let count = n.min(cursors.read_available(mask) as usize);
        cursors.tail = (cursors.tail + count as u32) & mask;
        count
    }
}
