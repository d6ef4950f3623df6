//! 设备容量表

use super::DeviceId;
use crate::consts::{MANUF_ID_FUJITSU, MB85RS64V_CAPACITY, PROD_ID_MB85RS64V};

/// 容量表条目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceType {
    /// 设备标识
    pub id: DeviceId,
    /// 可寻址容量（字节）
    pub capacity: u32,
}

/// 已知设备
pub static KNOWN_DEVICES: &[DeviceType] = &[DeviceType {
    id: DeviceId::new(MANUF_ID_FUJITSU, PROD_ID_MB85RS64V),
    capacity: MB85RS64V_CAPACITY,
}];

/// 在内置表中查找设备容量
pub fn lookup_capacity(id: DeviceId) -> Option<u32> {
    lookup_capacity_in(KNOWN_DEVICES, id)
}

/// 在指定表中查找设备容量
///
/// 容量为 0 的条目视为无效。
pub fn lookup_capacity_in(table: &[DeviceType], id: DeviceId) -> Option<u32> {
    table
        .iter()
        .find(|entry| entry.id == id)
        .map(|entry| entry.capacity)
        .filter(|&capacity| capacity != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_device() {
        let id = DeviceId::new(0x04, 0x0302);
        assert_eq!(lookup_capacity(id), Some(8192));
    }

    #[test]
    fn test_lookup_unknown_device() {
        assert_eq!(lookup_capacity(DeviceId::new(0x04, 0x0303)), None);
        assert_eq!(lookup_capacity(DeviceId::new(0x00, 0x0000)), None);
    }

    #[test]
    fn test_lookup_custom_table() {
        let table = [
            DeviceType {
                id: DeviceId::new(0x7F, 0x0001),
                capacity: 32768,
            },
            DeviceType {
                id: DeviceId::new(0x7F, 0x0002),
                capacity: 0,
            },
        ];
        assert_eq!(lookup_capacity_in(&table, DeviceId::new(0x7F, 0x0001)), Some(32768));
        // 容量为 0 的条目不算识别成功
        assert_eq!(lookup_capacity_in(&table, DeviceId::new(0x7F, 0x0002)), None);
    }
}
