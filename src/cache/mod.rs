//! 缓存段模块
//!
//! 在慢速、按事务访问的非易失存储设备上提供单行直接映射的写回缓存。
//!
//! # 主要组件
//!
//! - [`SegmentConfig`] - 段配置（起始地址、段/行/页大小、模式标志）
//! - [`CacheLine`] / [`LineBuffer`] - 驻留行与缓冲区所有权
//! - [`CacheSegment`] - 读写入口，负责行驻留、脏跟踪、空页跳过
//! - [`CacheStats`] - 统计信息
//!
//! # 设计原理
//!
//! 1. **单行**：任一时刻只有一行驻留，地址所在行 = 地址按行大小掩码
//! 2. **写回**：写只修改缓冲区并标记脏，驱逐或显式刷新时整行写回
//! 3. **空页**：`clear()` 后所有页"已知为空"，加载时直接补零，不读设备；
//!    页内任何字节被写入后该页恢复为从设备读取
//! 4. **未初始化状态**：构造失败不返回错误，而是让之后的所有操作变为安全的空操作
//!
//! # 使用示例
//!
//! ```rust,ignore
//! use framcache_core::cache::{CacheSegment, SegmentConfig};
//!
//! let mut seg = CacheSegment::new(fram, SegmentConfig::new(64, 16, 4));
//! seg.clear();
//! seg.write(5, 0xAA);
//! assert_eq!(seg.read(5), 0xAA);
//! assert_eq!(seg.read(20), 0); // 不读设备
//! seg.flush_cache_line();
//! ```

mod buffer;
mod config;
mod segment;

pub use buffer::{CacheLine, LineBuffer, LineFlags};
pub use config::{Geometry, SegmentConfig, SegmentFlags};
pub use segment::{BitOp, CacheSegment, CacheStats};
