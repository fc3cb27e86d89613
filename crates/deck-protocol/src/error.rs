//! 握手错误码与协议错误类型

use thiserror::Error;

/// 连接握手失败原因
///
/// 数值与设备服务返回的错误码一致（声明顺序 0..=10）。
/// 未知错误码统一映射为 [`InitErrorKind::Undocumented`]。
///
/// # 示例
///
/// ```rust
/// use deck_protocol::InitErrorKind;
///
/// assert_eq!(InitErrorKind::from_code(2), InitErrorKind::NoServer);
/// assert_eq!(InitErrorKind::from_code(999), InitErrorKind::Undocumented);
/// assert_eq!(InitErrorKind::NoServer.diagnostic(), "ERROR: NO SERVER FOUND");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, num_enum::FromPrimitive, num_enum::IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u32)]
pub enum InitErrorKind {
    /// 无错误（握手报告成功但连接检查仍失败时也使用此值）
    None = 0,
    Unknown = 1,
    /// 找不到设备服务
    NoServer = 2,
    /// 游戏端 API 需要升级
    UpdateRequired = 3,
    InterfaceVerificationFailed = 4,
    ControllerVerificationFailed = 5,
    FailedInitialization = 6,
    FailedHostResolution = 7,
    FailedServerConnection = 8,
    FailedServerSend = 9,
    /// 设备运行时版本过旧
    RuntimeOutOfDate = 10,
    /// 未记录的错误码
    #[num_enum(default)]
    Undocumented = 0xFFFF_FFFF,
}

impl Default for InitErrorKind {
    fn default() -> Self {
        Self::None
    }
}

impl InitErrorKind {
    /// 从原始错误码转换（未知值 → `Undocumented`）
    pub fn from_code(code: u32) -> Self {
        Self::from(code)
    }

    /// 转换为原始错误码
    pub fn code(self) -> u32 {
        self.into()
    }

    /// 人类可读的诊断字符串
    ///
    /// 固定映射表，供 UI/诊断面板直接显示。
    pub fn diagnostic(self) -> &'static str {
        match self {
            Self::None => "ERROR: INIT CONNECTION FAILED WITH NO ERROR",
            Self::Unknown => "ERROR: UNKNOWN ERROR",
            Self::NoServer => "ERROR: NO SERVER FOUND",
            Self::UpdateRequired => "ERROR: GAME API UPDATE REQUIRED",
            Self::InterfaceVerificationFailed => "ERROR: FAILED TO VERIFY INTERFACE",
            Self::ControllerVerificationFailed => "ERROR: FAILED TO VERIFY CONTROLLER",
            Self::FailedInitialization => "ERROR: FAILED TO INITIALIZE",
            Self::FailedHostResolution => "ERROR: FAILED TO RESOLVE HOST",
            Self::FailedServerConnection => "ERROR: FAILED TO CONNECT TO SERVER",
            Self::FailedServerSend => "ERROR: FAILED TO SEND PACKET TO SERVER",
            Self::RuntimeOutOfDate => "ERROR: RUNTIME OUT OF DATE",
            Self::Undocumented => "ERROR: UNDOCUMENTED ERROR",
        }
    }
}

impl std::fmt::Display for InitErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.diagnostic())
    }
}

/// 协议数据校验错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error("Non-finite value in field {field}: {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("Identity field {field} too long: {len} bytes (max {max})")]
    IdentityFieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}
