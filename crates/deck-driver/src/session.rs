//! 会话编排
//!
//! [`DeckSession`] 持有唯一的 [`DeviceLink`]，并把重连检查、遥测轮询、
//! 位移换算和命令网关挂到同一条 tick 路径上：
//!
//! ```text
//! tick(now)
//!   ├─ 重连任务到期？ → link.try_establish()
//!   └─ 已连接？
//!        ├─ cache.refresh_fast()
//!        ├─ cache.refresh_standard()   (一个字段)
//!        └─ cache.publish()
//! ```
//!
//! 所有状态修改都发生在调用 `tick` 的线程上，不需要锁。

use crate::cache::{PolledStateCache, SnapshotReader, StandardField, TelemetrySnapshot};
use crate::command::CommandGateway;
use crate::config::DeckConfig;
use crate::link::DeviceLink;
use crate::locomotion::{DisplacementVector, LocomotionTranslator, MoveObserver};
use crate::metrics::DeckMetrics;
use crate::scheduler::RepeatingTask;
use crate::service::DeviceService;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// 单次 tick 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    /// 本 tick 是否执行了重连检查
    pub reconnect_checked: bool,
    /// tick 结束时是否已连接
    pub connected: bool,
    /// 本 tick 刷新的标准字段
    pub standard_field: Option<StandardField>,
}

/// 设备会话
pub struct DeckSession<S: DeviceService> {
    link: DeviceLink<S>,
    cache: PolledStateCache<S>,
    reconnect: RepeatingTask,
    translator: LocomotionTranslator,
    observer: MoveObserver,
    config: DeckConfig,
}

impl<S: DeviceService> DeckSession<S> {
    /// 创建会话（未激活，未连接）
    pub fn new(service: S, config: DeckConfig) -> Self {
        Self::with_metrics(service, config, Arc::new(DeckMetrics::new()))
    }

    pub fn with_metrics(service: S, config: DeckConfig, metrics: Arc<DeckMetrics>) -> Self {
        Self {
            link: DeviceLink::with_metrics(service, metrics),
            cache: PolledStateCache::new(),
            reconnect: RepeatingTask::new(config.slow_loop_interval()),
            translator: LocomotionTranslator::new(config.speed_gain)
                .with_velocity_logging(config.show_treadmill_velocity),
            observer: MoveObserver::new(config.show_collisions),
            config,
        }
    }

    /// 激活：启动重连任务，首个 tick 立即检查连接
    ///
    /// 重复激活是空操作，返回 `false`。
    pub fn activate(&mut self, now: Instant) -> bool {
        let started = self.reconnect.start(now);
        if started {
            info!(
                interval_ms = self.config.slow_loop_interval_ms,
                "Deck session activated"
            );
        }
        started
    }

    /// 停用：取消重连任务；连接保持不变
    pub fn deactivate(&mut self) {
        if self.reconnect.is_active() {
            self.reconnect.cancel();
            info!("Deck session deactivated");
        }
    }

    pub fn is_active(&self) -> bool {
        self.reconnect.is_active()
    }

    /// 推进一个 tick
    ///
    /// 未激活时什么都不做。
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let mut outcome = TickOutcome {
            reconnect_checked: false,
            connected: self.link.is_connected(),
            standard_field: None,
        };
        if !self.reconnect.is_active() {
            return outcome;
        }

        if self.reconnect.poll(now) {
            outcome.reconnect_checked = true;
            self.link.try_establish();
        }

        if self.link.is_connected() {
            self.cache.refresh_fast(&mut self.link);
            outcome.standard_field = Some(self.cache.refresh_standard(&mut self.link));
            self.cache.publish();
        }
        outcome.connected = self.link.is_connected();
        outcome
    }

    /// 用缓存的地面速度计算本 tick 位移
    ///
    /// 未连接时返回 `None`，不会用过期速度移动消费方。
    pub fn locomotion_step(&self, dt: f64, yaw: f64, scale: f64) -> Option<DisplacementVector> {
        if !self.link.is_connected() {
            return None;
        }
        Some(
            self.translator
                .step(self.cache.snapshot().floor_speeds, dt, yaw, scale),
        )
    }

    /// 命令网关
    pub fn commands(&mut self) -> CommandGateway<'_, S> {
        CommandGateway::new(&mut self.link)
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    pub fn link(&self) -> &DeviceLink<S> {
        &self.link
    }

    /// 当前诊断字符串（无错误时为空）
    pub fn diagnostic(&self) -> &str {
        self.link.diagnostic()
    }

    pub fn telemetry(&self) -> &TelemetrySnapshot {
        self.cache.snapshot()
    }

    /// 跨线程快照读取器
    pub fn reader(&self) -> SnapshotReader {
        self.cache.reader()
    }

    pub fn metrics(&self) -> &Arc<DeckMetrics> {
        self.link.metrics()
    }

    pub fn move_observer(&mut self) -> &mut MoveObserver {
        &mut self.observer
    }

    pub fn config(&self) -> &DeckConfig {
        &self.config
    }

    /// 修改速度增益（运行时生效）
    pub fn set_speed_gain(&mut self, gain: f64) {
        debug!(gain, "Speed gain updated");
        self.config.speed_gain = gain;
        self.translator.set_gain(gain);
    }

    /// 结束会话：停用并释放连接（已连接时先停止跑步机）
    pub fn shutdown(&mut self) {
        self.deactivate();
        self.link.teardown();
    }
}
