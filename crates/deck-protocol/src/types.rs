//! 设备遥测数据类型
//!
//! 所有类型都是 `Copy` 的纯数据，适合在每帧 tick 中按值传递。

use crate::error::ProtocolError;

/// 与设备服务的连接状态
///
/// 只能由 `DeviceLink` 的重连例程修改，其它组件只读。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

impl ConnectionState {
    /// 是否已连接
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

/// 地面速度采样（米/秒）
///
/// `v0`/`v1` 为设备本地地面轴上的有符号速度。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FloorSpeeds {
    pub v0: f64,
    pub v1: f64,
}

impl FloorSpeeds {
    pub const ZERO: Self = Self { v0: 0.0, v1: 0.0 };

    pub fn new(v0: f64, v1: f64) -> Self {
        Self { v0, v1 }
    }

    /// 速度模长
    ///
    /// 用于驱动参考模型的表面动画等只关心速率的场景。
    pub fn magnitude(&self) -> f64 {
        self.v0.hypot(self.v1)
    }

    /// 校验采样值均为有限数
    ///
    /// 设备偶发返回 NaN/Inf 时，调用方应保留上一次的有效采样。
    pub fn validated(self) -> Result<Self, ProtocolError> {
        check_finite("v0", self.v0)?;
        check_finite("v1", self.v1)?;
        Ok(self)
    }
}

impl From<(f64, f64)> for FloorSpeeds {
    fn from((v0, v1): (f64, f64)) -> Self {
        Self { v0, v1 }
    }
}

/// 虚拟圆环（设备中心点在设备空间的位置及半径）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ring {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// 半径
    pub r: f64,
}

impl Ring {
    pub fn new(x: f64, y: f64, z: f64, r: f64) -> Self {
        Self { x, y, z, r }
    }
}

impl From<(f64, f64, f64, f64)> for Ring {
    fn from((x, y, z, r): (f64, f64, f64, f64)) -> Self {
        Self { x, y, z, r }
    }
}

/// 四元数（w, x, y, z）
///
/// 用于参考设备相对跑步机朝向的角度差。
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuaternionVector4 {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl QuaternionVector4 {
    /// 单位四元数（无旋转）
    pub const IDENTITY: Self = Self {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }
}

// 设备未上报前视为无旋转，而不是全零四元数
impl Default for QuaternionVector4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<(f64, f64, f64, f64)> for QuaternionVector4 {
    fn from((w, x, y, z): (f64, f64, f64, f64)) -> Self {
        Self { w, x, y, z }
    }
}

fn check_finite(field: &'static str, value: f64) -> Result<(), ProtocolError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ProtocolError::NonFinite { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_default() {
        let state = ConnectionState::default();
        assert_eq!(state, ConnectionState::Disconnected);
        assert!(!state.is_connected());
        assert!(ConnectionState::Connected.is_connected());
    }

    #[test]
    fn test_floor_speed_magnitude() {
        let speeds = FloorSpeeds::new(3.0, -4.0);
        assert!((speeds.magnitude() - 5.0).abs() < 1e-12);
        assert_eq!(FloorSpeeds::ZERO.magnitude(), 0.0);
    }

    #[test]
    fn test_floor_speed_validated() {
        assert!(FloorSpeeds::new(1.0, -0.5).validated().is_ok());

        let err = FloorSpeeds::new(f64::NAN, 0.0).validated().unwrap_err();
        assert!(matches!(err, ProtocolError::NonFinite { field: "v0", .. }));

        let err = FloorSpeeds::new(0.0, f64::INFINITY).validated().unwrap_err();
        assert!(matches!(err, ProtocolError::NonFinite { field: "v1", .. }));
    }

    #[test]
    fn test_tuple_conversions() {
        let speeds: FloorSpeeds = (1.5, 2.5).into();
        assert_eq!(speeds, FloorSpeeds::new(1.5, 2.5));

        let ring: Ring = (1.0, 2.0, 3.0, 0.75).into();
        assert_eq!(ring.r, 0.75);

        let q: QuaternionVector4 = (0.5, 0.5, 0.5, 0.5).into();
        assert_eq!(q, QuaternionVector4::new(0.5, 0.5, 0.5, 0.5));
    }

    #[test]
    fn test_quaternion_default_is_identity() {
        assert_eq!(QuaternionVector4::default(), QuaternionVector4::IDENTITY);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_ring_serde() {
        let ring = Ring::new(0.1, 0.2, 0.3, 1.0);
        let json = serde_json::to_string(&ring).unwrap();
        let back: Ring = serde_json::from_str(&json).unwrap();
        assert_eq!(ring, back);
    }
}
