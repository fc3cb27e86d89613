//! 设备服务边界
//!
//! [`DeviceService`] 抽象了与外部跑步机服务进程通信的接口（厂商 SDK / 原生互操作）。
//! 位级线格式由厂商 SDK 负责，本层只关心调用语义。
//!
//! # 实现约定
//!
//! - 所有读取都是同步调用，在单一 tick 路径上执行
//! - 实现**不得无限阻塞**：驱动层不对单次调用加超时
//! - 读取失败与"本周期未更新"在本层不可区分，实现可直接返回上一次的值

use deck_protocol::{DeviceIdentity, FloorSpeeds, InitErrorKind, QuaternionVector4, Ring};

/// 设备服务接口
pub trait DeviceService {
    /// 设备服务进程是否可达（不进行握手）
    fn check_service_reachable(&mut self) -> bool;

    /// 建立连接
    ///
    /// 失败时返回错误码；成功后调用方仍会用 [`is_connected`](Self::is_connected) 复核。
    fn handshake(&mut self) -> Result<(), InitErrorKind>;

    /// 服务端视角的连接状态
    fn is_connected(&mut self) -> bool;

    /// 释放连接句柄（会话结束时调用一次）
    fn deinit(&mut self) {}

    // === 读取 ===
    fn floor_speeds(&mut self) -> FloorSpeeds;
    fn floor_speed_magnitude(&mut self) -> f64;
    fn floor_speed_angle(&mut self) -> f64;
    fn ring(&mut self) -> Ring;
    fn run_state(&mut self) -> bool;
    fn pause_state(&mut self) -> bool;
    fn virtual_ring_enabled(&mut self) -> bool;
    fn reference_angle_delta(&mut self) -> QuaternionVector4;
    fn device_identity(&mut self) -> DeviceIdentity;

    // === 命令（无应答） ===
    fn set_run_state(&mut self, run: bool);
    fn set_manual_speeds(&mut self, x: f64, y: f64);
    fn set_pause(&mut self, pause: bool);
    fn set_virtual_ring(&mut self, enable: bool);
    fn start_manual_control(&mut self);
    fn start_user_control(&mut self);
    fn stop(&mut self);
}

/// 单向控制命令
///
/// 统一表示所有经 `CommandGateway` 下发的命令，便于日志与测试记录。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceCommand {
    /// 请求启动/停止跑步机
    RunState(bool),
    /// 手动设置地面速度
    ManualSpeeds { x: f64, y: f64 },
    /// 暂停（保持使能但不运动）
    Pause(bool),
    /// 显示/隐藏用户视野中的虚拟圆环
    VirtualRing(bool),
    /// 进入手动控制模式
    StartManualControl,
    /// 进入用户追踪控制模式
    StartUserControl,
    /// 停止跑步机
    Stop,
}

impl DeviceCommand {
    /// 下发到设备服务
    pub fn apply<S: DeviceService + ?Sized>(self, service: &mut S) {
        match self {
            Self::RunState(run) => service.set_run_state(run),
            Self::ManualSpeeds { x, y } => service.set_manual_speeds(x, y),
            Self::Pause(pause) => service.set_pause(pause),
            Self::VirtualRing(enable) => service.set_virtual_ring(enable),
            Self::StartManualControl => service.start_manual_control(),
            Self::StartUserControl => service.start_user_control(),
            Self::Stop => service.stop(),
        }
    }
}

impl<S: DeviceService + ?Sized> DeviceService for Box<S> {
    fn check_service_reachable(&mut self) -> bool {
        (**self).check_service_reachable()
    }
    fn handshake(&mut self) -> Result<(), InitErrorKind> {
        (**self).handshake()
    }
    fn is_connected(&mut self) -> bool {
        (**self).is_connected()
    }
    fn deinit(&mut self) {
        (**self).deinit()
    }
    fn floor_speeds(&mut self) -> FloorSpeeds {
        (**self).floor_speeds()
    }
    fn floor_speed_magnitude(&mut self) -> f64 {
        (**self).floor_speed_magnitude()
    }
    fn floor_speed_angle(&mut self) -> f64 {
        (**self).floor_speed_angle()
    }
    fn ring(&mut self) -> Ring {
        (**self).ring()
    }
    fn run_state(&mut self) -> bool {
        (**self).run_state()
    }
    fn pause_state(&mut self) -> bool {
        (**self).pause_state()
    }
    fn virtual_ring_enabled(&mut self) -> bool {
        (**self).virtual_ring_enabled()
    }
    fn reference_angle_delta(&mut self) -> QuaternionVector4 {
        (**self).reference_angle_delta()
    }
    fn device_identity(&mut self) -> DeviceIdentity {
        (**self).device_identity()
    }
    fn set_run_state(&mut self, run: bool) {
        (**self).set_run_state(run)
    }
    fn set_manual_speeds(&mut self, x: f64, y: f64) {
        (**self).set_manual_speeds(x, y)
    }
    fn set_pause(&mut self, pause: bool) {
        (**self).set_pause(pause)
    }
    fn set_virtual_ring(&mut self, enable: bool) {
        (**self).set_virtual_ring(enable)
    }
    fn start_manual_control(&mut self) {
        (**self).start_manual_control()
    }
    fn start_user_control(&mut self) {
        (**self).start_user_control()
    }
    fn stop(&mut self) {
        (**self).stop()
    }
}
