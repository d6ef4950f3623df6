//! 缓存段实现
//!
//! 单行直接映射、写回策略的缓存。所有字节读写都经过同一条路径：
//!
//! ```text
//! read/write(addr)
//!   └─ ensure_line(addr)
//!        ├─ 命中：直接返回
//!        └─ 未命中：load_line(base)
//!              ├─ 驻留行为脏 → flush_line()（写回，绝不写穿）
//!              └─ 逐页加载：空页补零，其余页各发一次设备读
//! ```
//!
//! 环形缓冲区操作（见 [`crate::ring`]）复用同一条路径。

use super::buffer::{CacheLine, LineBuffer};
use super::config::{Geometry, SegmentConfig, SegmentFlags};
use crate::bitmap::PageBitmap;
use crate::device::{lookup_capacity, StorageDevice};
use crate::error::{Error, ErrorKind, Result};
use crate::ring::RingCursors;
use alloc::vec;
use byteorder::{ByteOrder, LittleEndian};

/// 缓存统计信息
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// 行访问次数
    pub accesses: u64,
    /// 行命中次数
    pub hits: u64,
    /// 行加载次数
    pub line_loads: u64,
    /// 设备页读次数
    pub device_reads: u64,
    /// 因页为空而跳过的设备读次数
    pub empty_page_skips: u64,
    /// 写回次数
    pub writebacks: u64,
    /// 设备 I/O 错误次数
    pub io_errors: u64,
}

impl CacheStats {
    /// 计算命中率
    pub fn hit_rate(&self) -> f64 {
        if self.accesses == 0 {
            0.0
        } else {
            self.hits as f64 / self.accesses as f64
        }
    }
}

/// 读-改-写位操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOp {
    /// `data |= value`
    Set,
    /// `data &= !value`
    Clear,
    /// `data ^= value`
    Toggle,
}

impl BitOp {
    /// 作用于一个字节
    #[inline]
    pub fn apply(self, data: u8, value: u8) -> u8 {
        match self {
            BitOp::Set => data | value,
            BitOp::Clear => data & !value,
            BitOp::Toggle => data ^ value,
        }
    }
}

/// 设备端口：设备、统计和写保护状态
///
/// 与段状态分开存放，行管理代码可以同时借用两者。
pub(crate) struct DeviceIo<D> {
    pub(crate) device: D,
    pub(crate) stats: CacheStats,
    pub(crate) write_protected: bool,
}

impl<D: StorageDevice> DeviceIo<D> {
    fn read_page(&mut self, addr: u32, buf: &mut [u8]) {
        self.stats.device_reads += 1;
        if let Err(err) = self.device.read(addr, buf) {
            log::error!("[SEGMENT] device read at {:#x} ({} bytes) failed: {}", addr, buf.len(), err);
            self.stats.io_errors += 1;
            buf.fill(0);
        }
    }

    fn write_line(&mut self, addr: u32, buf: &[u8]) {
        let result = self
            .device
            .write_enable(true)
            .and_then(|_| self.device.write(addr, buf));
        match result {
            Ok(()) => self.stats.writebacks += 1,
            Err(err) => {
                log::error!("[SEGMENT] write-back at {:#x} ({} bytes) failed: {}", addr, buf.len(), err);
                self.stats.io_errors += 1;
            }
        }
    }
}

/// 已初始化段的内部状态
pub(crate) struct SegmentState<'a> {
    pub(crate) geo: Geometry,
    pub(crate) line: CacheLine<'a>,
    pub(crate) empty: PageBitmap,
    pub(crate) cursors: Option<RingCursors>,
}

impl SegmentState<'_> {
    /// 确保 `addr` 所在行驻留
    pub(crate) fn ensure_line<D: StorageDevice>(&mut self, io: &mut DeviceIo<D>, addr: u32) {
        let base = self.geo.line_base(addr);
        io.stats.accesses += 1;

        if self.line.is_resident(base) {
            io.stats.hits += 1;
            log::trace!("[SEGMENT] line {:#x} HIT (dirty={})", base, self.line.is_dirty());
            return;
        }

        self.load_line(io, base);
    }

    fn load_line<D: StorageDevice>(&mut self, io: &mut DeviceIo<D>, base: u32) {
        if self.line.is_dirty() {
            self.flush_line(io);
            if self.line.is_dirty() {
                log::warn!(
                    "[SEGMENT] discarding dirty line {:#x?} under write protection",
                    self.line.base
                );
            }
        }

        log::debug!("[SEGMENT] load line {:#x} (evict {:x?})", base, self.line.base);

        let geo = self.geo;
        let page_size = geo.page_size as usize;
        let data = self.line.data_mut();
        for (i, page) in data.chunks_mut(page_size).enumerate() {
            let page_addr = base + (i * page_size) as u32;
            if self.empty.is_empty_page(geo.page_index(page_addr)) {
                page.fill(0);
                io.stats.empty_page_skips += 1;
            } else {
                io.read_page(geo.device_addr(page_addr), page);
            }
        }

        self.line.base = Some(base);
        self.line.mark_clean();
        io.stats.line_loads += 1;
    }

    /// 写回驻留行（脏且未写保护时）
    pub(crate) fn flush_line<D: StorageDevice>(&mut self, io: &mut DeviceIo<D>) {
        let Some(base) = self.line.base else {
            return;
        };
        if io.write_protected || !self.line.is_dirty() {
            return;
        }

        log::debug!("[SEGMENT] flush line {:#x}", base);
        io.write_line(self.geo.device_addr(base), self.line.data());
        self.line.mark_clean();
    }
}

/// 缓存段
///
/// 绑定到设备上一个固定子区域，内部只有一个缓存行。
///
/// 构造失败时段进入永久的"未初始化"状态：之后所有读返回 0，写和清除什么都不做，
/// [`initialized`](Self::initialized) 返回 false。需要具体错误时使用
/// [`try_new`](Self::try_new)。
///
/// # 并发使用
///
/// 所有修改操作都需要 `&mut self`，因此 [`oper`](Self::oper) 对同一段的其他使用者
/// 天然是原子的。多上下文共享时由调用者在外层加锁。
///
/// # 示例
///
/// ```rust,ignore
/// use framcache_core::{CacheSegment, SegmentConfig, BitOp};
///
/// let mut seg = CacheSegment::new(fram, SegmentConfig::new(1024, 64, 16));
/// seg.write(5, 0xAA);
/// seg.oper(5, BitOp::Clear, 0x0F);
/// assert_eq!(seg.read(5), 0xA0);
/// seg.flush_cache_line();
/// ```
pub struct CacheSegment<'a, D> {
    pub(crate) io: DeviceIo<D>,
    pub(crate) state: Option<SegmentState<'a>>,
    config: SegmentConfig,
    init_error: Option<Error>,
}

impl<'a, D: StorageDevice> CacheSegment<'a, D> {
    /// 创建缓存段，行缓冲区由段分配
    pub fn new(device: D, config: SegmentConfig) -> Self {
        Self::build(device, config, None)
    }

    /// 创建缓存段，使用调用者提供的行缓冲区
    ///
    /// `buf` 长度必须不小于 `config.line_size`，否则段未初始化。
    pub fn with_buffer(device: D, config: SegmentConfig, buf: &'a mut [u8]) -> Self {
        Self::build(device, config, Some(buf))
    }

    /// 创建缓存段，失败时返回具体错误
    pub fn try_new(device: D, config: SegmentConfig) -> Result<Self> {
        Self::new(device, config).into_result()
    }

    /// 使用调用者提供的缓冲区创建缓存段，失败时返回具体错误
    pub fn try_with_buffer(device: D, config: SegmentConfig, buf: &'a mut [u8]) -> Result<Self> {
        Self::with_buffer(device, config, buf).into_result()
    }

    fn into_result(mut self) -> Result<Self> {
        match self.init_error.take() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }

    fn build(mut device: D, config: SegmentConfig, external: Option<&'a mut [u8]>) -> Self {
        let (state, init_error) = match Self::setup(&mut device, &config, external) {
            Ok(state) => {
                log::debug!(
                    "[SEGMENT] init start={:#x} size={} line={} page={} circular={}",
                    state.geo.start_addr,
                    state.geo.segment_size,
                    state.geo.line_size,
                    state.geo.page_size,
                    state.cursors.is_some()
                );
                (Some(state), None)
            }
            Err(err) => {
                log::warn!("[SEGMENT] init failed, segment disabled: {}", err);
                (None, Some(err))
            }
        };

        Self {
            io: DeviceIo {
                device,
                stats: CacheStats::default(),
                write_protected: config.flags.contains(SegmentFlags::WRITE_PROTECT),
            },
            state,
            config,
            init_error,
        }
    }

    fn setup(
        device: &mut D,
        config: &SegmentConfig,
        external: Option<&'a mut [u8]>,
    ) -> Result<SegmentState<'a>> {
        let id = device.identify()?;
        let capacity = lookup_capacity(id).ok_or(Error::new(
            ErrorKind::UnknownDevice,
            "device id not in capacity table",
        ))?;
        let geo = config.validate(capacity)?;

        let line_size = geo.line_size as usize;
        let buf = match external {
            Some(buf) if buf.len() < line_size => {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    "external buffer shorter than a cache line",
                ));
            }
            Some(buf) => LineBuffer::External(buf),
            None => LineBuffer::Owned(vec![0u8; line_size]),
        };

        Ok(SegmentState {
            line: CacheLine::new(buf, line_size),
            empty: PageBitmap::new(geo.pages_in_segment()),
            cursors: config.is_circular().then(RingCursors::default),
            geo,
        })
    }

    /// 是否初始化成功
    pub fn initialized(&self) -> bool {
        self.state.is_some()
    }

    /// 初始化失败的原因
    pub fn init_error(&self) -> Option<&Error> {
        self.init_error.as_ref()
    }

    /// 构造时使用的配置
    pub fn config(&self) -> &SegmentConfig {
        &self.config
    }

    /// 校验后的几何参数
    pub fn geometry(&self) -> Option<&Geometry> {
        self.state.as_ref().map(|state| &state.geo)
    }

    /// 设备容量（字节）
    pub fn capacity(&self) -> Option<u32> {
        self.geometry().map(|geo| geo.capacity)
    }

    /// 读取一个字节
    ///
    /// 未初始化或地址超出段时返回 0。
    pub fn read(&mut self, addr: u32) -> u8 {
        let Some(state) = self.state.as_mut() else {
            return 0;
        };
        if !state.geo.contains(addr) {
            log::trace!("[SEGMENT] read {:#x} out of range", addr);
            return 0;
        }

        state.ensure_line(&mut self.io, addr);
        state.line.data()[state.geo.line_offset(addr) as usize]
    }

    /// 写入一个字节
    ///
    /// 未初始化、写保护或地址超出段时什么都不做。
    pub fn write(&mut self, addr: u32, value: u8) {
        if self.io.write_protected {
            return;
        }
        let Some(state) = self.state.as_mut() else {
            return;
        };
        if !state.geo.contains(addr) {
            log::trace!("[SEGMENT] write {:#x} out of range", addr);
            return;
        }

        state.ensure_line(&mut self.io, addr);
        let offset = state.geo.line_offset(addr) as usize;
        state.line.data_mut()[offset] = value;
        state.line.mark_dirty();
        state.empty.mark_written(state.geo.page_index(addr));
    }

    /// 读-改-写位操作
    ///
    /// 设备流量与一次 `read` 加一次 `write` 相同。
    pub fn oper(&mut self, addr: u32, op: BitOp, value: u8) {
        let data = self.read(addr);
        self.write(addr, op.apply(data, value));
    }

    /// 清空段
    ///
    /// 丢弃脏数据（不写回），所有页标记为空，驻留行失效；环形模式下游标归零。
    /// 不访问设备。
    pub fn clear(&mut self) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        log::debug!(
            "[SEGMENT] clear (drop line {:x?}, dirty={})",
            state.line.base,
            state.line.is_dirty()
        );
        state.line.invalidate();
        state.empty.mark_all_empty();
        if let Some(cursors) = state.cursors.as_mut() {
            cursors.reset();
        }
    }

    /// 写回驻留行
    ///
    /// 只有行为脏且未写保护时才产生设备写；重复调用不会产生额外流量。
    pub fn flush_cache_line(&mut self) {
        if let Some(state) = self.state.as_mut() {
            state.flush_line(&mut self.io);
        }
    }

    /// 设置写保护
    pub fn set_write_protect(&mut self, enable: bool) {
        self.io.write_protected = enable;
    }

    /// 是否写保护
    pub fn is_write_protected(&self) -> bool {
        self.io.write_protected
    }

    /// 驻留行的段内基地址
    pub fn resident_line(&self) -> Option<u32> {
        self.state.as_ref().and_then(|state| state.line.base)
    }

    /// 驻留行是否为脏
    pub fn is_dirty(&self) -> bool {
        self.state
            .as_ref()
            .map(|state| state.line.is_dirty())
            .unwrap_or(false)
    }

    /// 驻留行的数据
    pub fn line_data(&self) -> Option<&[u8]> {
        let state = self.state.as_ref()?;
        state.line.base.map(|_| state.line.data())
    }

    /// 从 `addr` 开始读取到 `buf`
    ///
    /// 读到段末尾为止，返回实际读取的字节数。
    pub fn read_bytes(&mut self, addr: u32, buf: &mut [u8]) -> usize {
        let len = self.span(addr, buf.len());
        for (i, byte) in buf[..len].iter_mut().enumerate() {
            *byte = self.read(addr + i as u32);
        }
        len
    }

    /// 从 `addr` 开始写入 `buf`
    ///
    /// 写到段末尾为止，返回实际写入的字节数；写保护时返回 0。
    pub fn write_bytes(&mut self, addr: u32, buf: &[u8]) -> usize {
        if self.io.write_protected {
            return 0;
        }
        let len = self.span(addr, buf.len());
        for (i, &byte) in buf[..len].iter().enumerate() {
            self.write(addr + i as u32, byte);
        }
        len
    }

    fn span(&self, addr: u32, len: usize) -> usize {
        match self.geometry() {
            Some(geo) if geo.contains(addr) => len.min((geo.segment_size - addr) as usize),
            _ => 0,
        }
    }

    /// 读取小端 u16
    pub fn read_u16_le(&mut self, addr: u32) -> u16 {
        let mut raw = [0u8; 2];
        self.read_bytes(addr, &mut raw);
        LittleEndian::read_u16(&raw)
    }

    /// 读取小端 u32
    pub fn read_u32_le(&mut self, addr: u32) -> u32 {
        let mut raw = [0u8; 4];
        self.read_bytes(addr, &mut raw);
        LittleEndian::read_u32(&raw)
    }

    /// 写入小端 u16
    pub fn write_u16_le(&mut self, addr: u32, value: u16) {
        let mut raw = [0u8; 2];
        LittleEndian::write_u16(&mut raw, value);
        self.write_bytes(addr, &raw);
    }

    /// 写入小端 u32
    pub fn write_u32_le(&mut self, addr: u32, value: u32) {
        let mut raw = [0u8; 4];
        LittleEndian::write_u32(&mut raw, value);
        self.write_bytes(addr, &raw);
    }

    /// 获取统计信息
    pub fn stats(&self) -> CacheStats {
        self.io.stats
    }

    /// 获取底层设备的引用
    pub fn device(&self) -> &D {
        &self.io.device
    }

    /// 获取底层设备的可变引用
    ///
    /// 绕过缓存直接操作设备可能与驻留行不一致。
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.io.device
    }

    /// 取回底层设备（不写回驻留行）
    pub fn into_device(self) -> D {
        self.io.device
    }
}

impl<D> core::fmt::Debug for CacheSegment<'_, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut s = f.debug_struct("CacheSegment");
        s.field("config", &self.config)
            .field("initialized", &self.state.is_some())
            .field("write_protected", &self.io.write_protected);
        if let Some(state) = &self.state {
            s.field("resident_line", &state.line.base)
                .field("dirty", &state.line.is_dirty())
                .field("empty_pages", &state.empty.empty_count())
                .field("cursors", &state.cursors);
        } else {
            s.field("init_error", &self.init_error);
        }
        s.field("stats", &self.io.stats).finish()
    }
}
