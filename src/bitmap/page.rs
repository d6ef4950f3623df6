//! 页有效性位图
//!
//! 每个页一位。位被设置表示该页"已知为空"：加载时直接补零，不访问设备。

use super::ops;
use alloc::vec;
use alloc::vec::Vec;

/// 页有效性位图
///
/// 覆盖整个段（`segment_size / page_size` 位），因此每行的页数不受固定位宽限制。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBitmap {
    bits: Vec<u8>,
    pages: u32,
}

impl PageBitmap {
    /// 创建 `pages` 位的位图，初始没有任何页被标记为空
    pub fn new(pages: u32) -> Self {
        Self {
            bits: vec![0u8; (pages as usize + 7) / 8],
            pages,
        }
    }

    /// 覆盖的页数
    pub fn pages(&self) -> u32 {
        self.pages
    }

    /// 页是否已知为空
    pub fn is_empty_page(&self, page: u32) -> bool {
        page < self.pages && ops::test_bit(&self.bits, page)
    }

    /// 页被写入后清除空标记
    pub fn mark_written(&mut self, page: u32) {
        if page < self.pages {
            let _ = ops::clear_bit(&mut self.bits, page);
        }
    }

    /// 所有页都标记为空
    pub fn mark_all_empty(&mut self) {
        ops::set_first_bits(&mut self.bits, self.pages);
    }

    /// 已知为空的页数
    pub fn empty_count(&self) -> u32 {
        ops::count_ones(&self.bits, 0, self.pages)
    }
}
