//! 进程内模拟设备服务
//!
//! 用于测试和 CLI 演示，无需真实硬件。
//! 状态保存在 `Arc<Mutex<..>>` 中：[`SimulatedService`] 交给 `DeviceLink` 持有，
//! [`SimulatedHandle`] 留在测试/控制线程中用于脚本化设备行为并检查调用记录。

use crate::service::{DeviceCommand, DeviceService};
use deck_protocol::{DeviceIdentity, FloorSpeeds, InitErrorKind, QuaternionVector4, Ring};
use parking_lot::Mutex;
use std::sync::Arc;

/// 读取调用类型（用于验证轮询节奏）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadKind {
    FloorSpeeds,
    RunState,
    SpeedMagnitude,
    SpeedAngle,
    Ring,
    PauseState,
    VirtualRingEnabled,
    ReferenceAngleDelta,
    DeviceIdentity,
}

/// 模拟设备状态
#[derive(Debug, Clone)]
pub struct SimulatedState {
    /// 服务进程是否可达
    pub reachable: bool,
    /// 下一次握手的结果
    pub handshake_result: Result<(), InitErrorKind>,
    /// 握手成功后是否真正建立连接（false 用于模拟"握手无错误但未连接"）
    pub connect_on_handshake: bool,
    /// 服务端连接状态
    pub connected: bool,

    pub floor_speeds: FloorSpeeds,
    pub ring: Ring,
    pub run_state: bool,
    pub pause_state: bool,
    pub virtual_ring_enabled: bool,
    pub reference_angle_delta: QuaternionVector4,
    pub identity: DeviceIdentity,

    /// 握手次数
    pub handshakes: u32,
    /// 句柄释放次数
    pub deinits: u32,
    /// `stop` 命令送达次数
    pub stops: u32,
    /// 是否记录 `reads` / `commands`；关闭后两者不再增长
    pub recording: bool,
    /// 读取记录（按调用顺序）
    pub reads: Vec<ReadKind>,
    /// 已送达的命令（按调用顺序）
    pub commands: Vec<DeviceCommand>,
}

impl Default for SimulatedState {
    fn default() -> Self {
        Self {
            reachable: true,
            handshake_result: Ok(()),
            connect_on_handshake: true,
            connected: false,
            floor_speeds: FloorSpeeds::ZERO,
            ring: Ring::new(0.0, 0.0, 0.0, 0.5),
            run_state: false,
            pause_state: false,
            virtual_ring_enabled: true,
            reference_angle_delta: QuaternionVector4::IDENTITY,
            identity: DeviceIdentity::new("SIM-0001", "SIMDECK", "0.0.0-sim"),
            handshakes: 0,
            deinits: 0,
            stops: 0,
            recording: true,
            reads: Vec::new(),
            commands: Vec::new(),
        }
    }
}

/// 模拟设备服务（交给 `DeviceLink` 持有）
#[derive(Debug, Clone, Default)]
pub struct SimulatedService {
    state: Arc<Mutex<SimulatedState>>,
}

/// 模拟设备控制句柄
#[derive(Debug, Clone)]
pub struct SimulatedHandle {
    state: Arc<Mutex<SimulatedState>>,
}

impl SimulatedService {
    /// 创建模拟服务及其控制句柄
    pub fn new() -> (Self, SimulatedHandle) {
        Self::with_state(SimulatedState::default())
    }

    /// 使用指定初始状态创建
    pub fn with_state(state: SimulatedState) -> (Self, SimulatedHandle) {
        let state = Arc::new(Mutex::new(state));
        (
            Self {
                state: state.clone(),
            },
            SimulatedHandle { state },
        )
    }

    fn record_read<T>(&self, kind: ReadKind, f: impl FnOnce(&SimulatedState) -> T) -> T {
        let mut state = self.state.lock();
        if state.recording {
            state.reads.push(kind);
        }
        f(&*state)
    }

    fn record_command(&self, command: DeviceCommand) {
        let mut state = self.state.lock();
        if state.recording {
            state.commands.push(command);
        }
        match command {
            DeviceCommand::RunState(run) => state.run_state = run,
            DeviceCommand::ManualSpeeds { x, y } => state.floor_speeds = FloorSpeeds::new(x, y),
            DeviceCommand::Pause(pause) => state.pause_state = pause,
            DeviceCommand::VirtualRing(enable) => state.virtual_ring_enabled = enable,
            DeviceCommand::StartManualControl | DeviceCommand::StartUserControl => {
                state.run_state = true
            },
            DeviceCommand::Stop => {
                state.stops += 1;
                state.run_state = false;
                state.floor_speeds = FloorSpeeds::ZERO;
            },
        }
    }
}

impl SimulatedHandle {
    /// 在锁内修改模拟状态
    pub fn update(&self, f: impl FnOnce(&mut SimulatedState)) {
        f(&mut *self.state.lock());
    }

    /// 获取状态副本
    pub fn state(&self) -> SimulatedState {
        self.state.lock().clone()
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.update(|s| s.reachable = reachable);
    }

    pub fn set_handshake_result(&self, result: Result<(), InitErrorKind>) {
        self.update(|s| s.handshake_result = result);
    }

    /// 模拟服务端断开连接
    pub fn drop_connection(&self) {
        self.update(|s| s.connected = false);
    }

    pub fn set_floor_speeds(&self, v0: f64, v1: f64) {
        self.update(|s| s.floor_speeds = FloorSpeeds::new(v0, v1));
    }

    /// 已送达的命令
    pub fn commands(&self) -> Vec<DeviceCommand> {
        self.state.lock().commands.clone()
    }

    /// 读取记录
    pub fn reads(&self) -> Vec<ReadKind> {
        self.state.lock().reads.clone()
    }

    /// 清空读取记录
    pub fn clear_reads(&self) {
        self.update(|s| s.reads.clear());
    }

    /// 开关调用记录（长时间运行时关闭）
    pub fn set_recording(&self, enabled: bool) {
        self.update(|s| s.recording = enabled);
    }

    /// `stop` 命令送达次数（不受记录开关影响）
    pub fn stop_count(&self) -> usize {
        self.state.lock().stops as usize
    }
}

impl DeviceService for SimulatedService {
    fn check_service_reachable(&mut self) -> bool {
        self.state.lock().reachable
    }

    fn handshake(&mut self) -> Result<(), InitErrorKind> {
        let mut state = self.state.lock();
        state.handshakes += 1;
        let result = state.handshake_result;
        if result.is_ok() && state.connect_on_handshake {
            state.connected = true;
        }
        result
    }

    fn is_connected(&mut self) -> bool {
        let state = self.state.lock();
        state.reachable && state.connected
    }

    fn deinit(&mut self) {
        let mut state = self.state.lock();
        state.deinits += 1;
        state.connected = false;
    }

    fn floor_speeds(&mut self) -> FloorSpeeds {
        self.record_read(ReadKind::FloorSpeeds, |s| s.floor_speeds)
    }

    fn floor_speed_magnitude(&mut self) -> f64 {
        self.record_read(ReadKind::SpeedMagnitude, |s| s.floor_speeds.magnitude())
    }

    fn floor_speed_angle(&mut self) -> f64 {
        self.record_read(ReadKind::SpeedAngle, |s| {
            s.floor_speeds.v1.atan2(s.floor_speeds.v0)
        })
    }

    fn ring(&mut self) -> Ring {
        self.record_read(ReadKind::Ring, |s| s.ring)
    }

    fn run_state(&mut self) -> bool {
        self.record_read(ReadKind::RunState, |s| s.run_state)
    }

    fn pause_state(&mut self) -> bool {
        self.record_read(ReadKind::PauseState, |s| s.pause_state)
    }

    fn virtual_ring_enabled(&mut self) -> bool {
        self.record_read(ReadKind::VirtualRingEnabled, |s| s.virtual_ring_enabled)
    }

    fn reference_angle_delta(&mut self) -> QuaternionVector4 {
        self.record_read(ReadKind::ReferenceAngleDelta, |s| s.reference_angle_delta)
    }

    fn device_identity(&mut self) -> DeviceIdentity {
        self.record_read(ReadKind::DeviceIdentity, |s| s.identity.clone())
    }

    fn set_run_state(&mut self, run: bool) {
        self.record_command(DeviceCommand::RunState(run));
    }

    fn set_manual_speeds(&mut self, x: f64, y: f64) {
        self.record_command(DeviceCommand::ManualSpeeds { x, y });
    }

    fn set_pause(&mut self, pause: bool) {
        self.record_command(DeviceCommand::Pause(pause));
    }

    fn set_virtual_ring(&mut self, enable: bool) {
        self.record_command(DeviceCommand::VirtualRing(enable));
    }

    fn start_manual_control(&mut self) {
        self.record_command(DeviceCommand::StartManualControl);
    }

    fn start_user_control(&mut self) {
        self.record_command(DeviceCommand::StartUserControl);
    }

    fn stop(&mut self) {
        self.record_command(DeviceCommand::Stop);
    }
}
