//! 设备身份信息
//!
//! 设备服务以三个定长（32 字节、NUL 结尾）字符串上报身份：
//! 序列号、型号、固件/API 版本。

use crate::error::ProtocolError;

/// 身份字段缓冲区长度（字节，含 NUL 终止符）
pub const IDENTITY_FIELD_LEN: usize = 32;

/// 身份字段最大有效长度（字节）
pub const IDENTITY_FIELD_MAX: usize = IDENTITY_FIELD_LEN - 1;

/// 设备身份（序列号、型号、固件版本）
///
/// 会话内通常只填充一次，但允许重复读取覆盖。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceIdentity {
    /// 设备序列号
    pub id: String,
    /// 型号
    pub model_number: String,
    /// 固件/API 版本
    pub dll_version: String,
}

impl DeviceIdentity {
    /// 创建身份信息，超长字段按字节截断到 31 字节（保持 UTF-8 边界）
    pub fn new(
        id: impl Into<String>,
        model_number: impl Into<String>,
        dll_version: impl Into<String>,
    ) -> Self {
        Self {
            id: truncate_field(id.into()),
            model_number: truncate_field(model_number.into()),
            dll_version: truncate_field(dll_version.into()),
        }
    }

    /// 严格版本：任一字段超长则返回错误
    pub fn try_new(
        id: impl Into<String>,
        model_number: impl Into<String>,
        dll_version: impl Into<String>,
    ) -> Result<Self, ProtocolError> {
        let id = id.into();
        let model_number = model_number.into();
        let dll_version = dll_version.into();
        check_len("id", &id)?;
        check_len("model_number", &model_number)?;
        check_len("dll_version", &dll_version)?;
        Ok(Self {
            id,
            model_number,
            dll_version,
        })
    }

    /// 从设备服务的原始缓冲区解码
    ///
    /// 每个字段读到第一个 NUL 为止，非法 UTF-8 按 lossy 方式替换。
    pub fn from_raw(
        id: &[u8; IDENTITY_FIELD_LEN],
        model_number: &[u8; IDENTITY_FIELD_LEN],
        dll_version: &[u8; IDENTITY_FIELD_LEN],
    ) -> Self {
        Self {
            id: decode_field(id),
            model_number: decode_field(model_number),
            dll_version: decode_field(dll_version),
        }
    }

    /// 是否尚未从设备读取到任何字段
    pub fn is_empty(&self) -> bool {
        self.id.is_empty() && self.model_number.is_empty() && self.dll_version.is_empty()
    }
}

impl std::fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (model {}, api {})",
            self.id, self.model_number, self.dll_version
        )
    }
}

fn decode_field(buf: &[u8; IDENTITY_FIELD_LEN]) -> String {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(IDENTITY_FIELD_LEN);
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

fn truncate_field(mut s: String) -> String {
    if s.len() > IDENTITY_FIELD_MAX {
        let mut cut = IDENTITY_FIELD_MAX;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
    }
    s
}

fn check_len(field: &'static str, value: &str) -> Result<(), ProtocolError> {
    if value.len() > IDENTITY_FIELD_MAX {
        return Err(ProtocolError::IdentityFieldTooLong {
            field,
            len: value.len(),
            max: IDENTITY_FIELD_MAX,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(s: &str) -> [u8; IDENTITY_FIELD_LEN] {
        let mut buf = [0u8; IDENTITY_FIELD_LEN];
        let n = s.len().min(IDENTITY_FIELD_LEN);
        buf[..n].copy_from_slice(&s.as_bytes()[..n]);
        buf
    }

    #[test]
    fn test_from_raw_stops_at_nul() {
        let identity = DeviceIdentity::from_raw(&raw("DECK-0042"), &raw("M2"), &raw("3.3.0"));
        assert_eq!(identity.id, "DECK-0042");
        assert_eq!(identity.model_number, "M2");
        assert_eq!(identity.dll_version, "3.3.0");
    }

    #[test]
    fn test_from_raw_without_terminator_uses_full_buffer() {
        let full = "A".repeat(IDENTITY_FIELD_LEN);
        let identity = DeviceIdentity::from_raw(&raw(&full), &raw(""), &raw(""));
        assert_eq!(identity.id.len(), IDENTITY_FIELD_LEN);
        assert!(identity.model_number.is_empty());
    }

    #[test]
    fn test_from_raw_invalid_utf8_is_lossy() {
        let mut buf = [0u8; IDENTITY_FIELD_LEN];
        buf[0] = b'X';
        buf[1] = 0xFF;
        let identity = DeviceIdentity::from_raw(&buf, &raw(""), &raw(""));
        assert!(identity.id.starts_with('X'));
        assert!(identity.id.contains('\u{FFFD}'));
    }

    #[test]
    fn test_new_truncates_long_fields() {
        let long = "S".repeat(40);
        let identity = DeviceIdentity::new(long, "model", "1.0");
        assert_eq!(identity.id.len(), IDENTITY_FIELD_MAX);
        assert_eq!(identity.model_number, "model");
    }

    #[test]
    fn test_new_truncates_on_char_boundary() {
        // 30 个 ASCII + 一个 2 字节字符 = 32 字节
        let s = format!("{}é", "a".repeat(30));
        let identity = DeviceIdentity::new(s, "", "");
        assert_eq!(identity.id, "a".repeat(30));
    }

    #[test]
    fn test_try_new_rejects_long_fields() {
        let err = DeviceIdentity::try_new("id", "m".repeat(32), "v").unwrap_err();
        assert_eq!(
            err,
            ProtocolError::IdentityFieldTooLong {
                field: "model_number",
                len: 32,
                max: IDENTITY_FIELD_MAX,
            }
        );
        assert!(DeviceIdentity::try_new("id", "m", "v").is_ok());
    }

    #[test]
    fn test_is_empty_and_display() {
        assert!(DeviceIdentity::default().is_empty());
        let identity = DeviceIdentity::new("SN1", "M2", "3.3.0");
        assert!(!identity.is_empty());
        assert_eq!(identity.to_string(), "SN1 (model M2, api 3.3.0)");
    }
}
