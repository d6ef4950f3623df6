//! 常量定义
//!
//! 缓存段的默认几何参数和设备相关常量。

//=============================================================================
// 默认几何参数
//=============================================================================

/// 默认段起始地址
pub const DEFAULT_START_ADDR: u32 = 0;

/// 默认段大小（字节）
pub const DEFAULT_SEGMENT_SIZE: u32 = 1024;

/// 默认缓存行大小（字节）
pub const DEFAULT_LINE_SIZE: u32 = 64;

/// 默认页大小（字节），空页跟踪的粒度
pub const DEFAULT_PAGE_SIZE: u32 = 16;

//=============================================================================
// 设备相关
//=============================================================================

/// Fujitsu 的 JEDEC 厂商 ID
pub const MANUF_ID_FUJITSU: u8 = 0x04;

/// MB85RS64V 产品 ID（64 Kbit）
pub const PROD_ID_MB85RS64V: u16 = 0x0302;

/// MB85RS64V 容量（字节）
pub const MB85RS64V_CAPACITY: u32 = 8192;

//=============================================================================
// 环形缓冲区
//=============================================================================

/// `circular_read` 在数据末尾追加的终止字节
pub const RING_TERMINATOR: u8 = 0x00;
