//! 位图基础操作
//!
//! 位按小端序排列：第 `i` 位位于第 `i / 8` 字节的第 `i % 8` 位。

use crate::error::{Error, ErrorKind, Result};

/// 测试位图中某一位是否被设置
///
/// # 参数
///
/// * `bitmap` - 位图数据
/// * `index` - 位索引（从 0 开始）
///
/// # 返回
///
/// 如果位被设置返回 true；索引超出范围返回 false
pub fn test_bit(bitmap: &[u8], index: u32) -> bool {
    let byte_index = (index / 8) as usize;
    let bit_offset = (index % 8) as u8;

    match bitmap.get(byte_index) {
        Some(byte) => (byte & (1 << bit_offset)) != 0,
        None => false,
    }
}

/// 设置位图中的某一位
///
/// # 返回
///
/// 成功返回 ()，如果索引超出范围返回错误
pub fn set_bit(bitmap: &mut [u8], index: u32) -> Result<()> {
    let byte_index = (index / 8) as usize;
    let bit_offset = (index % 8) as u8;

    let byte = bitmap.get_mut(byte_index).ok_or(Error::new(
        ErrorKind::InvalidInput,
        "Bitmap index out of range",
    ))?;
    *byte |= 1 << bit_offset;
    Ok(())
}

/// 清除位图中的某一位
///
/// # 返回
///
/// 成功返回 ()，如果索引超出范围返回错误
pub fn clear_bit(bitmap: &mut [u8], index: u32) -> Result<()> {
    let byte_index = (index / 8) as usize;
    let bit_offset = (index % 8) as u8;

    let byte = bitmap.get_mut(byte_index).ok_or(Error::new(
        ErrorKind::InvalidInput,
        "Bitmap index out of range",
    ))?;
    *byte &= !(1 << bit_offset);
    Ok(())
}

/// 设置前 `nbits` 位，其余位清零
///
/// `nbits` 超过位图容量时截断。
pub fn set_first_bits(bitmap: &mut [u8], nbits: u32) {
    let max_bits = (bitmap.len() * 8) as u32;
    let nbits = nbits.min(max_bits);
    let full = (nbits / 8) as usize;
    let rem = nbits % 8;

    bitmap.fill(0);
    bitmap[..full].fill(0xFF);
    if rem != 0 {
        bitmap[full] = (1u8 << rem) - 1;
    }
}

/// 统计位图中从 start 到 end 范围内被设置的位数
///
/// # 参数
///
/// * `bitmap` - 位图数据
/// * `start` - 开始位置（从 0 开始）
/// * `end` - 结束位置（不包含）
pub fn count_ones(bitmap: &[u8], start: u32, end: u32) -> u32 {
    let max_bits = (bitmap.len() * 8) as u32;
    let end = end.min(max_bits);

    (start..end).filter(|&i| test_bit(bitmap, i)).count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_operations() {
        let mut bitmap = [0u8; 4]; // 32 bits

        assert!(!test_bit(&bitmap, 0));
        set_bit(&mut bitmap, 0).unwrap();
        assert!(test_bit(&bitmap, 0));

        set_bit(&mut bitmap, 9).unwrap();
        assert_eq!(bitmap[1], 0b0000_0010);

        clear_bit(&mut bitmap, 0).unwrap();
        assert!(!test_bit(&bitmap, 0));
        assert!(test_bit(&bitmap, 9));
    }

    #[test]
    fn test_out_of_range() {
        let mut bitmap = [0u8; 2];
        assert!(!test_bit(&bitmap, 16));
        assert!(set_bit(&mut bitmap, 16).is_err());
        assert!(clear_bit(&mut bitmap, 100).is_err());
    }

    #[test]
    fn test_set_first_bits() {
        let mut bitmap = [0xAAu8; 3];
        set_first_bits(&mut bitmap, 11);
        assert_eq!(bitmap, [0xFF, 0b0000_0111, 0x00]);
        assert_eq!(count_ones(&bitmap, 0, 24), 11);

        // 截断到容量
        set_first_bits(&mut bitmap, 100);
        assert_eq!(bitmap, [0xFF; 3]);

        set_first_bits(&mut bitmap, 0);
        assert_eq!(bitmap, [0x00; 3]);
    }

    #[test]
    fn test_count_ones() {
        let mut bitmap = [0u8; 4];
        set_bit(&mut bitmap, 3).unwrap();
        set_bit(&mut bitmap, 10).unwrap();
        set_bit(&mut bitmap, 31).unwrap();

        assert_eq!(count_ones(&bitmap, 0, 32), 3);
        assert_eq!(count_ones(&bitmap, 4, 31), 1);
        assert_eq!(count_ones(&bitmap, 0, 1000), 3);
    }
}
