//! framcache_core: 非易失存储设备（SPI FRAM）上的单行写回缓存
//!
//! 设备只能通过慢速的事务访问，本库在设备的一个子区域上提供：
//! - **单行直接映射缓存**，写回策略，按页跟踪"已知为空"区域以省去设备读
//! - **可选的环形缓冲区**，流式读写和跨行、跨回绕点的子串查找
//!
//! # 示例
//!
//! ```rust,ignore
//! use framcache_core::{CacheSegment, SegmentConfig, StorageDevice};
//!
//! // 实现 StorageDevice trait
//! struct SpiFram {
//!     // ...
//! }
//!
//! impl StorageDevice for SpiFram {
//!     // 实现 identify / read / write_enable / write
//!     // ...
//! }
//!
//! let config = SegmentConfig::new(1024, 64, 16).start_addr(4096).circular();
//! let mut log = CacheSegment::new(SpiFram::new(), config);
//! if !log.initialized() {
//!     // 设备未识别或配置无效，所有操作都是空操作
//! }
//!
//! log.circular_write(b"boot ok\n");
//! if let Some(n) = log.circular_find(b"\n") {
//!     let mut line = [0u8; 64];
//!     log.circular_read(&mut line[..n + 1], true);
//! }
//! ```
//!
//! # 模块结构
//!
//! - [`error`] - 错误类型定义
//! - [`consts`] - 常量定义
//! - [`device`] - 存储设备接口、容量表、内存模拟设备
//! - [`bitmap`] - 位图操作和页有效性位图
//! - [`cache`] - 缓存段
//! - [`ring`] - 环形缓冲区扩展

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

// ===== 核心模块 =====

/// 错误处理
pub mod error;

/// 常量定义
pub mod consts;

/// 存储设备抽象
pub mod device;

/// 位图操作
pub mod bitmap;

/// 缓存段
pub mod cache;

/// 环形缓冲区
pub mod ring;

// ===== 公共导出 =====

// 错误处理
pub use error::{Error, ErrorKind, Result};

// 设备
pub use device::{lookup_capacity, DeviceId, DeviceType, MemDevice, StorageDevice, KNOWN_DEVICES};

// 缓存段
pub use cache::{
    BitOp, CacheLine, CacheSegment, CacheStats, Geometry, LineBuffer, LineFlags, SegmentConfig,
    SegmentFlags,
};

// 环形缓冲区
pub use ring::{RingCursors, StreamMatcher};
