//! 设备连接管理
//!
//! [`DeviceLink`] 持有与设备服务的唯一逻辑连接，负责建立/修复连接、
//! 分类连接失败，并在会话结束时释放连接。
//!
//! # 状态所有权
//!
//! `ConnectionState` 只在 [`DeviceLink::try_establish`] 和 [`DeviceLink::teardown`]
//! 中被修改。其它组件通过 `&DeviceLink` 只读，或通过 `pub(crate)` 的
//! `read`/`dispatch` 在已连接时访问服务。
//!
//! # 失败语义
//!
//! 连接尝试从不 panic 或返回硬错误，失败通过 `ConnectionState` +
//! [`last_failure`](DeviceLink::last_failure) + [`diagnostic`](DeviceLink::diagnostic)
//! 表达。重连由上层以固定间隔无限重试，不使用指数退避。

use crate::error::DriverError;
use crate::metrics::DeckMetrics;
use crate::service::{DeviceCommand, DeviceService};
use deck_protocol::{ConnectionState, InitErrorKind};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// 设备连接
pub struct DeviceLink<S: DeviceService> {
    service: S,
    state: ConnectionState,
    last_failure: Option<DriverError>,
    diagnostic: String,
    torn_down: bool,
    metrics: Arc<DeckMetrics>,
}

impl<S: DeviceService> DeviceLink<S> {
    /// 创建连接（初始为 Disconnected，不会立即握手）
    pub fn new(service: S) -> Self {
        Self::with_metrics(service, Arc::new(DeckMetrics::new()))
    }

    /// 使用共享指标创建
    pub fn with_metrics(service: S, metrics: Arc<DeckMetrics>) -> Self {
        Self {
            service,
            state: ConnectionState::Disconnected,
            last_failure: None,
            diagnostic: String::new(),
            torn_down: false,
            metrics,
        }
    }

    /// 尝试建立连接
    ///
    /// - 服务进程不可达：置为 Disconnected，不握手
    /// - 服务端已连接：置为 Connected
    /// - 否则握手；成功（且服务端复核已连接）则清除错误，失败则记录错误码与诊断字符串
    ///
    /// 会话结束（`teardown`）后调用始终返回 Disconnected。
    pub fn try_establish(&mut self) -> ConnectionState {
        if self.torn_down {
            trace!("try_establish after teardown ignored");
            return ConnectionState::Disconnected;
        }

        if !self.service.check_service_reachable() {
            if self.state.is_connected() {
                warn!("Device service became unreachable, marking link disconnected");
            }
            DeckMetrics::incr(&self.metrics.service_unreachable);
            self.state = ConnectionState::Disconnected;
            self.last_failure = Some(DriverError::ServiceUnreachable);
            return self.state;
        }

        if self.service.is_connected() {
            if !self.state.is_connected() {
                info!("Device link restored");
            }
            self.state = ConnectionState::Connected;
            self.last_failure = None;
            self.diagnostic.clear();
            return self.state;
        }

        DeckMetrics::incr(&self.metrics.reconnect_attempts);
        let result = match self.service.handshake() {
            // 握手无错误但服务端仍未连接
            Ok(()) if !self.service.is_connected() => Err(InitErrorKind::None),
            other => other,
        };

        match result {
            Ok(()) => {
                DeckMetrics::incr(&self.metrics.handshakes_succeeded);
                if self.last_failure.is_some() {
                    info!("Device link re-established");
                } else {
                    info!("Device link established");
                }
                self.state = ConnectionState::Connected;
                self.last_failure = None;
                self.diagnostic.clear();
            },
            Err(kind) => {
                DeckMetrics::incr(&self.metrics.handshakes_failed);
                // 只有错误码变化时才告警
                if self.last_failure != Some(DriverError::HandshakeFailed(kind)) {
                    warn!(code = kind.code(), "Device handshake failed: {}", kind.diagnostic());
                } else {
                    debug!("Device handshake failed again: {}", kind.diagnostic());
                }
                self.state = ConnectionState::Disconnected;
                self.last_failure = Some(DriverError::HandshakeFailed(kind));
                self.diagnostic = kind.diagnostic().to_string();
            },
        }
        self.state
    }

    /// 读取缓存的连接状态（不会触发重连）
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// 当前连接状态
    #[inline]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// 最近一次失败的分类（成功连接后清除）
    pub fn last_failure(&self) -> Option<DriverError> {
        self.last_failure
    }

    /// 最近一次握手失败的错误码
    pub fn last_init_error(&self) -> Option<InitErrorKind> {
        self.last_failure.and_then(|e| e.init_error())
    }

    /// 人类可读的诊断字符串（无错误时为空）
    pub fn diagnostic(&self) -> &str {
        &self.diagnostic
    }

    /// 是否已释放
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// 共享指标
    pub fn metrics(&self) -> &Arc<DeckMetrics> {
        &self.metrics
    }

    /// 释放连接
    ///
    /// 已连接时先下发停止命令，然后释放句柄。幂等：重复调用不会再次下发停止命令。
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        if self.state.is_connected() {
            info!("Stopping treadmill before releasing device link");
            self.service.stop();
            DeckMetrics::incr(&self.metrics.commands_sent);
        }
        self.service.deinit();
        self.state = ConnectionState::Disconnected;
        info!("Device link torn down");
    }

    /// 已连接时执行读取，未连接时返回 `None`（调用方保留缓存值）
    pub(crate) fn read<T>(&mut self, f: impl FnOnce(&mut S) -> T) -> Option<T> {
        if !self.state.is_connected() {
            DeckMetrics::incr(&self.metrics.reads_skipped);
            return None;
        }
        Some(f(&mut self.service))
    }

    /// 已连接时下发命令
    pub(crate) fn dispatch(&mut self, command: DeviceCommand) -> Result<(), DriverError> {
        if self.torn_down {
            return Err(DriverError::TornDown);
        }
        if !self.state.is_connected() {
            return Err(DriverError::NotConnected);
        }
        trace!(?command, "Dispatching command");
        command.apply(&mut self.service);
        Ok(())
    }
}

impl<S: DeviceService> Drop for DeviceLink<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<S: DeviceService> std::fmt::Debug for DeviceLink<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceLink")
            .field("state", &self.state)
            .field("last_failure", &self.last_failure)
            .field("torn_down", &self.torn_down)
            .finish_non_exhaustive()
    }
}
