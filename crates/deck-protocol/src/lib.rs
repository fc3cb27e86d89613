//! # Deck Protocol
//!
//! 全向跑步机设备服务边界的数据模型（无 IO 依赖）
//!
//! ## 模块
//!
//! - `error`: 握手错误码（`InitErrorKind`）及诊断字符串映射、协议错误
//! - `types`: 连接状态、地面速度、虚拟圆环、参考设备角度差
//! - `identity`: 设备身份信息（定长字符串）
//!
//! ## 单位约定
//!
//! - 地面速度：米/秒，沿设备本地地面轴（v0, v1）
//! - 圆环：设备空间单位
//!
//! 线格式（位级布局）由厂商 SDK 拥有，本 crate 只描述其语义。

pub mod error;
pub mod identity;
pub mod types;

// 重新导出常用类型
pub use error::*;
pub use identity::*;
pub use types::*;
