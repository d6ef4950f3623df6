//! 位图
//!
//! - [`ops`] - 字节切片上的位操作
//! - [`PageBitmap`] - 段内页的"已知为空"跟踪

pub mod ops;
mod page;

pub use ops::{clear_bit, count_ones, set_bit, set_first_bits, test_bit};
pub use page::PageBitmap;
