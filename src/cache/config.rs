//! 段配置与几何校验

use crate::consts::{DEFAULT_LINE_SIZE, DEFAULT_PAGE_SIZE, DEFAULT_SEGMENT_SIZE, DEFAULT_START_ADDR};
use crate::error::{Error, ErrorKind, Result};
use bitflags::bitflags;

bitflags! {
    /// 段模式标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SegmentFlags: u8 {
        /// 写保护：写操作和写回都被忽略
        const WRITE_PROTECT = 0x01;
        /// 环形缓冲区模式
        const CIRCULAR      = 0x02;
    }
}

/// 缓存段配置
///
/// 构造后不可变。地址均为段内相对地址，设备地址 = `start_addr` + 相对地址。
///
/// # 示例
///
/// ```rust,ignore
/// let config = SegmentConfig::new(1024, 64, 16)
///     .start_addr(4096)
///     .circular();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentConfig {
    /// 段在设备上的起始地址
    pub start_addr: u32,
    /// 段大小（2 的幂）
    pub segment_size: u32,
    /// 缓存行大小（2 的幂，不超过段大小）
    pub line_size: u32,
    /// 页大小（2 的幂，不超过行大小）
    pub page_size: u32,
    /// 模式标志
    pub flags: SegmentFlags,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            start_addr: DEFAULT_START_ADDR,
            segment_size: DEFAULT_SEGMENT_SIZE,
            line_size: DEFAULT_LINE_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
            flags: SegmentFlags::empty(),
        }
    }
}

impl SegmentConfig {
    /// 从设备地址 0 开始的段
    pub const fn new(segment_size: u32, line_size: u32, page_size: u32) -> Self {
        Self {
            start_addr: 0,
            segment_size,
            line_size,
            page_size,
            flags: SegmentFlags::empty(),
        }
    }

    /// 设置起始地址
    pub fn start_addr(mut self, start_addr: u32) -> Self {
        self.start_addr = start_addr;
        self
    }

    /// 启用环形缓冲区模式
    pub fn circular(mut self) -> Self {
        self.flags.insert(SegmentFlags::CIRCULAR);
        self
    }

    /// 初始为写保护
    pub fn write_protected(mut self) -> Self {
        self.flags.insert(SegmentFlags::WRITE_PROTECT);
        self
    }

    /// 是否为环形模式
    pub fn is_circular(&self) -> bool {
        self.flags.contains(SegmentFlags::CIRCULAR)
    }

    /// 按设备容量校验配置
    ///
    /// 要求：
    /// - 段、行、页大小都是非零的 2 的幂
    /// - `page_size <= line_size <= segment_size`
    /// - `start_addr + segment_size <= capacity`
    pub fn validate(&self, capacity: u32) -> Result<Geometry> {
        if !self.segment_size.is_power_of_two()
            || !self.line_size.is_power_of_two()
            || !self.page_size.is_power_of_two()
        {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "segment, line and page sizes must be powers of two",
            ));
        }

        if self.page_size > self.line_size {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "page size exceeds line size",
            ));
        }

        if self.line_size > self.segment_size {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "line size exceeds segment size",
            ));
        }

        if self.start_addr as u64 + self.segment_size as u64 > capacity as u64 {
            return Err(Error::new(
                ErrorKind::OutOfRange,
                "segment window exceeds device capacity",
            ));
        }

        Ok(Geometry {
            capacity,
            start_addr: self.start_addr,
            segment_size: self.segment_size,
            line_size: self.line_size,
            page_size: self.page_size,
        })
    }
}

/// 校验后的段几何
///
/// 所有尺寸都是 2 的幂，地址拆分只用掩码。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// 设备容量
    pub capacity: u32,
    /// 段起始地址
    pub start_addr: u32,
    /// 段大小
    pub segment_size: u32,
    /// 行大小
    pub line_size: u32,
    /// 页大小
    pub page_size: u32,
}

impl Geometry {
    /// 段内地址掩码（用于游标回绕）
    #[inline]
    pub fn segment_mask(&self) -> u32 {
        self.segment_size - 1
    }

    /// 地址所在行的基地址
    #[inline]
    pub fn line_base(&self, addr: u32) -> u32 {
        addr & !(self.line_size - 1)
    }

    /// 地址在行内的偏移
    #[inline]
    pub fn line_offset(&self, addr: u32) -> u32 {
        addr & (self.line_size - 1)
    }

    /// 地址所在页在段内的编号
    #[inline]
    pub fn page_index(&self, addr: u32) -> u32 {
        addr / self.page_size
    }

    /// 每行页数
    #[inline]
    pub fn pages_per_line(&self) -> u32 {
        self.line_size / self.page_size
    }

    /// 段内总页数
    #[inline]
    pub fn pages_in_segment(&self) -> u32 {
        self.segment_size / self.page_size
    }

    /// 段内地址转换为设备地址
    #[inline]
    pub fn device_addr(&self, addr: u32) -> u32 {
        self.start_addr + addr
    }

    /// 地址是否落在段内
    #[inline]
    pub fn contains(&self, addr: u32) -> bool {
        addr < self.segment_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = SegmentConfig::default();
        let geo = config.validate(8192).unwrap();
        assert_eq!(geo.pages_per_line(), 4);
        assert_eq!(geo.pages_in_segment(), 64);
        assert!(!config.is_circular());
    }

    #[test]
    fn test_builder() {
        let config = SegmentConfig::new(64, 16, 4)
            .start_addr(128)
            .circular()
            .write_protected();
        assert_eq!(config.start_addr, 128);
        assert!(config.is_circular());
        assert!(config.flags.contains(SegmentFlags::WRITE_PROTECT));
    }

    #[test]
    fn test_address_split() {
        let geo = SegmentConfig::new(64, 16, 4).start_addr(256).validate(8192).unwrap();
        assert_eq!(geo.line_base(21), 16);
        assert_eq!(geo.line_offset(21), 5);
        assert_eq!(geo.page_index(21), 5);
        assert_eq!(geo.device_addr(21), 277);
        assert_eq!(geo.segment_mask(), 63);
        assert!(geo.contains(63));
        assert!(!geo.contains(64));
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        for config in [
            SegmentConfig::new(96, 16, 4),
            SegmentConfig::new(64, 24, 4),
            SegmentConfig::new(64, 16, 3),
            SegmentConfig::new(64, 16, 0),
            SegmentConfig::new(0, 0, 0),
        ] {
            let err = config.validate(8192).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
        }
    }

    #[test]
    fn test_rejects_bad_ordering() {
        let err = SegmentConfig::new(64, 16, 32).validate(8192).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = SegmentConfig::new(64, 128, 4).validate(8192).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_rejects_window_beyond_capacity() {
        let err = SegmentConfig::new(64, 16, 4)
            .start_addr(8192 - 32)
            .validate(8192)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);

        // 恰好到末尾是允许的
        assert!(SegmentConfig::new(64, 16, 4)
            .start_addr(8192 - 64)
            .validate(8192)
            .is_ok());

        // 不会溢出
        let err = SegmentConfig::new(64, 16, 4)
            .start_addr(u32::MAX)
            .validate(u32::MAX)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
    }
}
