//! 缓存行结构

use alloc::vec::Vec;
use bitflags::bitflags;

bitflags! {
    /// 缓存行标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LineFlags: u8 {
        /// 数据已修改（脏），驱逐前必须写回
        const DIRTY = 0x01;
    }
}

/// 行缓冲区的所有权
///
/// - `Owned`: 段自己分配，生命周期与段相同
/// - `External`: 调用者提供，段只借用；长度至少为一行，只使用前 `line_size` 字节
#[derive(Debug)]
pub enum LineBuffer<'a> {
    /// 段分配的缓冲区
    Owned(Vec<u8>),
    /// 调用者提供的缓冲区
    External(&'a mut [u8]),
}

impl LineBuffer<'_> {
    /// 是否为调用者提供的缓冲区
    pub fn is_external(&self) -> bool {
        matches!(self, LineBuffer::External(_))
    }

    fn as_slice(&self) -> &[u8] {
        match self {
            LineBuffer::Owned(buf) => buf,
            LineBuffer::External(buf) => buf,
        }
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        match self {
            LineBuffer::Owned(buf) => buf,
            LineBuffer::External(buf) => buf,
        }
    }
}

/// 单个缓存行
///
/// `base` 为 `None` 表示没有行驻留。
#[derive(Debug)]
pub struct CacheLine<'a> {
    /// 驻留行的段内基地址
    pub base: Option<u32>,
    /// 行状态标志
    pub flags: LineFlags,
    buf: LineBuffer<'a>,
    line_size: usize,
}

impl<'a> CacheLine<'a> {
    /// 创建未加载的缓存行
    ///
    /// `buf` 长度必须不小于 `line_size`。
    pub fn new(buf: LineBuffer<'a>, line_size: usize) -> Self {
        debug_assert!(buf.as_slice().len() >= line_size);
        Self {
            base: None,
            flags: LineFlags::empty(),
            buf,
            line_size,
        }
    }

    /// 行数据
    pub fn data(&self) -> &[u8] {
        &self.buf.as_slice()[..self.line_size]
    }

    /// 行数据的可变引用
    pub fn data_mut(&mut self) -> &mut [u8] {
        let line_size = self.line_size;
        &mut self.buf.as_mut_slice()[..line_size]
    }

    /// 缓冲区所有权
    pub fn buffer(&self) -> &LineBuffer<'a> {
        &self.buf
    }

    /// 指定行是否驻留
    pub fn is_resident(&self, base: u32) -> bool {
        self.base == Some(base)
    }

    /// 标记为脏
    pub fn mark_dirty(&mut self) {
        self.flags.insert(LineFlags::DIRTY);
    }

    /// 标记为干净
    pub fn mark_clean(&mut self) {
        self.flags.remove(LineFlags::DIRTY);
    }

    /// 是否为脏
    pub fn is_dirty(&self) -> bool {
        self.flags.contains(LineFlags::DIRTY)
    }

    /// 丢弃驻留行（不写回）
    pub fn invalidate(&mut self) {
        self.base = None;
        self.mark_clean();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_line_creation() {
        let line = CacheLine::new(LineBuffer::Owned(vec![0u8; 16]), 16);
        assert_eq!(line.base, None);
        assert_eq!(line.data().len(), 16);
        assert!(!line.is_dirty());
        assert!(!line.buffer().is_external());
    }

    #[test]
    fn test_dirty_flag() {
        let mut line = CacheLine::new(LineBuffer::Owned(vec![0u8; 16]), 16);
        line.base = Some(32);
        line.mark_dirty();
        assert!(line.is_dirty());
        assert!(line.flags.contains(LineFlags::DIRTY));
        assert!(line.is_resident(32));

        line.invalidate();
        assert!(!line.is_dirty());
        assert!(!line.is_resident(32));
    }

    #[test]
    fn test_external_buffer_is_truncated_to_line() {
        let mut raw = [0u8; 24];
        {
            let mut line = CacheLine::new(LineBuffer::External(&mut raw), 16);
            assert!(line.buffer().is_external());
            assert_eq!(line.data().len(), 16);
            line.data_mut()[15] = 0x5A;
        }
        assert_eq!(raw[15], 0x5A);
        assert_eq!(raw[16], 0);
    }
}
