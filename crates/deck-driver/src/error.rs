//! 驱动层错误类型定义
//!
//! 连接失败在本层被慢速重连循环吸收，不会作为硬错误抛给调用方；
//! 这些类型只用于分类记录（`DeviceLink::last_failure()`）和
//! 需要观察命令是否送达的调用方（`CommandGateway::try_send()`）。

use deck_protocol::InitErrorKind;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// 设备服务进程不可达（未尝试握手）
    #[error("Device service unreachable")]
    ServiceUnreachable,

    /// 握手失败
    #[error("Handshake failed: {0}")]
    HandshakeFailed(InitErrorKind),

    /// 未连接（命令被丢弃）
    #[error("Not connected to device service")]
    NotConnected,

    /// 连接已在会话结束时释放
    #[error("Device link already torn down")]
    TornDown,
}

impl DriverError {
    /// 握手失败时的错误码
    pub fn init_error(&self) -> Option<InitErrorKind> {
        match self {
            Self::HandshakeFailed(kind) => Some(*kind),
            _ => None,
        }
    }
}

/// 配置加载/保存错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
