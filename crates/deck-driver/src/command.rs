//! 单向命令网关
//!
//! 所有控制命令都是尽力而为的：未连接时先尝试建立连接，
//! 仍未连接则静默丢弃（不排队、不重试、不等待应答）。
//! 命令效果只能通过下一次缓存刷新间接观察。

use crate::error::DriverError;
use crate::link::DeviceLink;
use crate::metrics::DeckMetrics;
use crate::service::{DeviceCommand, DeviceService};
use tracing::debug;

/// 命令网关（借用 `DeviceLink`）
pub struct CommandGateway<'a, S: DeviceService> {
    link: &'a mut DeviceLink<S>,
}

impl<'a, S: DeviceService> CommandGateway<'a, S> {
    pub fn new(link: &'a mut DeviceLink<S>) -> Self {
        Self { link }
    }

    /// 请求启动/停止跑步机
    pub fn request_run_state(&mut self, run: bool) {
        self.send(DeviceCommand::RunState(run));
    }

    /// 手动设置地面速度
    pub fn set_manual_speeds(&mut self, x: f64, y: f64) {
        self.send(DeviceCommand::ManualSpeeds { x, y });
    }

    pub fn set_pause(&mut self, pause: bool) {
        self.send(DeviceCommand::Pause(pause));
    }

    /// 显示/隐藏虚拟圆环
    pub fn set_virtual_ring(&mut self, enable: bool) {
        self.send(DeviceCommand::VirtualRing(enable));
    }

    pub fn start_manual_control(&mut self) {
        self.send(DeviceCommand::StartManualControl);
    }

    pub fn start_user_control(&mut self) {
        self.send(DeviceCommand::StartUserControl);
    }

    /// 停止跑步机
    pub fn stop(&mut self) {
        self.send(DeviceCommand::Stop);
    }

    /// 下发命令并返回是否送达
    ///
    /// 与其它操作语义相同，只是把丢弃原因交给调用方。
    pub fn try_send(&mut self, command: DeviceCommand) -> Result<(), DriverError> {
        if !self.link.is_connected() {
            self.link.try_establish();
        }

        match self.link.dispatch(command) {
            Ok(()) => {
                DeckMetrics::incr(&self.link.metrics().commands_sent);
                Ok(())
            },
            Err(e) => {
                DeckMetrics::incr(&self.link.metrics().commands_dropped);
                debug!(?command, "Command dropped: {}", e);
                Err(e)
            },
        }
    }

    fn send(&mut self, command: DeviceCommand) {
        let _ = self.try_send(command);
    }
}
