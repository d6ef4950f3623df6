//! 内存模拟设备
//!
//! 用 `Vec<u8>` 模拟 FRAM，记录每一次设备事务，便于验证缓存段产生的设备流量。

use super::{DeviceId, StorageDevice};
use crate::consts::{MANUF_ID_FUJITSU, MB85RS64V_CAPACITY, PROD_ID_MB85RS64V};
use crate::error::{Error, ErrorKind, Result};
use alloc::vec;
use alloc::vec::Vec;

/// 内存模拟设备
///
/// 行为与 SPI FRAM 一致：写入前必须先设置写使能锁存，
/// 每次写事务完成后锁存自动清除。
#[derive(Debug, Clone)]
pub struct MemDevice {
    id: DeviceId,
    storage: Vec<u8>,
    write_latch: bool,
    fail_io: bool,
    /// 读事务次数
    read_count: u64,
    /// 写事务次数
    write_count: u64,
    /// 写使能调用次数
    write_enable_count: u64,
    /// 读事务日志 `(addr, len)`
    read_log: Vec<(u32, usize)>,
}

impl MemDevice {
    /// 创建一个 MB85RS64V（8 KiB）模拟设备，内容全为 0
    pub fn new() -> Self {
        Self::with_id(
            DeviceId::new(MANUF_ID_FUJITSU, PROD_ID_MB85RS64V),
            MB85RS64V_CAPACITY,
        )
    }

    /// 创建指定标识和容量的模拟设备
    pub fn with_id(id: DeviceId, capacity: u32) -> Self {
        Self {
            id,
            storage: vec![0u8; capacity as usize],
            write_latch: false,
            fail_io: false,
            read_count: 0,
            write_count: 0,
            write_enable_count: 0,
            read_log: Vec::new(),
        }
    }

    /// 用固定字节填满存储（模拟上电前残留的数据）
    pub fn fill(&mut self, value: u8) {
        self.storage.fill(value);
    }

    /// 原始存储内容（不计入事务统计）
    pub fn storage(&self) -> &[u8] {
        &self.storage
    }

    /// 原始存储内容的可变引用（不计入事务统计）
    pub fn storage_mut(&mut self) -> &mut [u8] {
        &mut self.storage
    }

    /// 让后续读写事务全部失败
    pub fn set_fail_io(&mut self, fail: bool) {
        self.fail_io = fail;
    }

    /// 读事务次数
    pub fn read_count(&self) -> u64 {
        self.read_count
    }

    /// 写事务次数
    pub fn write_count(&self) -> u64 {
        self.write_count
    }

    /// 写使能调用次数
    pub fn write_enable_count(&self) -> u64 {
        self.write_enable_count
    }

    /// 读事务日志
    pub fn read_log(&self) -> &[(u32, usize)] {
        &self.read_log
    }

    /// 统计覆盖 `addr` 的读事务次数
    pub fn reads_covering(&self, addr: u32) -> usize {
        self.read_log
            .iter()
            .filter(|&&(start, len)| addr >= start && ((addr - start) as usize) < len)
            .count()
    }

    /// 清零所有计数器和日志
    pub fn reset_counters(&mut self) {
        self.read_count = 0;
        self.write_count = 0;
        self.write_enable_count = 0;
        self.read_log.clear();
    }

    fn range(&self, addr: u32, len: usize) -> Result<core::ops::Range<usize>> {
        let start = addr as usize;
        let end = start
            .checked_add(len)
            .filter(|&end| end <= self.storage.len())
            .ok_or(Error::new(ErrorKind::OutOfRange, "access beyond device capacity"))?;
        Ok(start..end)
    }
}

impl Default for MemDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageDevice for MemDevice {
    fn identify(&mut self) -> Result<DeviceId> {
        if self.fail_io {
            return Err(Error::new(ErrorKind::Io, "identify failed"));
        }
        Ok(self.id)
    }

    fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        self.read_count += 1;
        self.read_log.push((addr, buf.len()));
        if self.fail_io {
            return Err(Error::new(ErrorKind::Io, "read transaction failed"));
        }
        let range = self.range(addr, buf.len())?;
        buf.copy_from_slice(&self.storage[range]);
        Ok(())
    }

    fn write_enable(&mut self, enable: bool) -> Result<()> {
        self.write_enable_count += 1;
        self.write_latch = enable;
        Ok(())
    }

    fn write(&mut self, addr: u32, buf: &[u8]) -> Result<()> {
        self.write_count += 1;
        if self.fail_io {
            return Err(Error::new(ErrorKind::Io, "write transaction failed"));
        }
        if !self.write_latch {
            return Err(Error::new(ErrorKind::Io, "write latch not set"));
        }
        // FRAM 在写事务结束后自动清除锁存
        self.write_latch = false;
        let range = self.range(addr, buf.len())?;
        self.storage[range].copy_from_slice(buf);
        Ok(())
    }
}
