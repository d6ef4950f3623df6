//! 存储设备抽象
//!
//! device/mod.rs 定义缓存段依赖的最小设备能力接口（识别、读、写使能、写）。
//! device/table.rs 提供设备标识到容量的静态查找表。
//! device/mem.rs 提供内存模拟设备，带调用计数，用于测试和主机端仿真。

mod mem;
mod table;

pub use mem::MemDevice;
pub use table::{lookup_capacity, lookup_capacity_in, DeviceType, KNOWN_DEVICES};

use crate::error::Result;

/// 设备标识（厂商 ID + 产品 ID）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId {
    /// JEDEC 厂商 ID
    pub manufacturer_id: u8,
    /// 产品 ID
    pub product_id: u16,
}

impl DeviceId {
    /// 创建设备标识
    pub const fn new(manufacturer_id: u8, product_id: u16) -> Self {
        Self {
            manufacturer_id,
            product_id,
        }
    }
}

/// 存储设备接口
///
/// 实现此 trait 以提供底层传输访问（通常是 SPI FRAM 驱动）。
/// 所有地址都是设备绝对字节地址。
///
/// 每个方法都是同步的：返回时事务已经完成。缓存段不会重试失败的事务，
/// 也不检测部分完成的传输。
///
/// # 示例
///
/// ```rust,ignore
/// use framcache_core::{DeviceId, StorageDevice, Result};
///
/// struct SpiFram {
///     // ...
/// }
///
/// impl StorageDevice for SpiFram {
///     fn identify(&mut self) -> Result<DeviceId> {
///         // 发送 RDID 命令
///         Ok(DeviceId::new(0x04, 0x0302))
///     }
///
///     fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
///         // 发送 READ 命令并接收 buf.len() 字节
///         Ok(())
///     }
///
///     fn write_enable(&mut self, enable: bool) -> Result<()> {
///         // WREN / WRDI
///         Ok(())
///     }
///
///     fn write(&mut self, addr: u32, buf: &[u8]) -> Result<()> {
///         // 发送 WRITE 命令
///         Ok(())
///     }
/// }
/// ```
pub trait StorageDevice {
    /// 读取设备标识
    fn identify(&mut self) -> Result<DeviceId>;

    /// 从 `addr` 开始读取 `buf.len()` 字节
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()>;

    /// 设置写使能锁存
    fn write_enable(&mut self, enable: bool) -> Result<()>;

    /// 从 `addr` 开始写入 `buf`
    fn write(&mut self, addr: u32, buf: &[u8]) -> Result<()>;
}

impl<T: StorageDevice + ?Sized> StorageDevice for &mut T {
    #[inline]
    fn identify(&mut self) -> Result<DeviceId> {
        (**self).identify()
    }

    #[inline]
    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        (**self).read(addr, buf)
    }

    #[inline]
    fn write_enable(&mut self, enable: bool) -> Result<()> {
        (**self).write_enable(enable)
    }

    #[inline]
    fn write(&mut self, addr: u32, buf: &[u8]) -> Result<()> {
        (**self).write(addr, buf)
    }
}
