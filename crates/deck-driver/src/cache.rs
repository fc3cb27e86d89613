//! 遥测状态缓存
//!
//! [`PolledStateCache`] 以两种节奏从设备服务拉取遥测：
//!
//! - **快速刷新**（每 tick）：地面速度 + 运行状态，两次标量读取
//! - **标准刷新**（每 tick 一个字段）：按固定顺序轮询 [`StandardField::ORDER`]
//!   中的 9 个字段，游标在末尾回绕到 0
//!
//! 未连接时所有刷新都是空操作，缓存值保持不变（过期但存在）。
//!
//! 缓存本身只在 tick 路径上被修改；其它线程通过 [`SnapshotReader`]
//! 读取每个 tick 结束时发布的快照（ArcSwap，无锁）。

use crate::link::DeviceLink;
use crate::metrics::DeckMetrics;
use crate::service::DeviceService;
use arc_swap::ArcSwap;
use deck_protocol::{DeviceIdentity, FloorSpeeds, QuaternionVector4, Ring};
use serde::Serialize;
use std::sync::Arc;
use tracing::{trace, warn};

/// 遥测快照
///
/// 每个字段都是最近一次成功读取的值；从未读取过的字段保持默认值。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    // === 快速字段 ===
    /// 地面速度（m/s，设备本地坐标）
    pub floor_speeds: FloorSpeeds,
    /// 跑步机是否在运行
    pub run_state: bool,

    // === 标准字段 ===
    pub speed_magnitude: f64,
    pub speed_angle: f64,
    pub ring: Ring,
    pub pause_state: bool,
    pub virtual_ring_enabled: bool,
    pub reference_angle_delta: QuaternionVector4,
    pub identity: DeviceIdentity,
}

/// 标准轮询字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StandardField {
    SpeedMagnitude,
    SpeedAngle,
    Ring,
    PauseState,
    VirtualRingEnabled,
    ReferenceAngleDelta,
    DeviceId,
    ModelNumber,
    DllVersion,
}

impl StandardField {
    /// 轮询顺序
    pub const ORDER: [StandardField; 9] = [
        StandardField::SpeedMagnitude,
        StandardField::SpeedAngle,
        StandardField::Ring,
        StandardField::PauseState,
        StandardField::VirtualRingEnabled,
        StandardField::ReferenceAngleDelta,
        StandardField::DeviceId,
        StandardField::ModelNumber,
        StandardField::DllVersion,
    ];

    /// 字段数量
    pub const COUNT: usize = Self::ORDER.len();
}

type Refresher<S> = fn(&mut S, &mut TelemetrySnapshot);

/// 标准字段刷新表，下标与 [`StandardField::ORDER`] 一一对应
///
/// 身份三元组在服务边界上是一次调用，这里按字段只取各自那一项。
fn standard_table<S: DeviceService>() -> [Refresher<S>; StandardField::COUNT] {
    [
        |s, t| t.speed_magnitude = s.floor_speed_magnitude(),
        |s, t| t.speed_angle = s.floor_speed_angle(),
        |s, t| t.ring = s.ring(),
        |s, t| t.pause_state = s.pause_state(),
        |s, t| t.virtual_ring_enabled = s.virtual_ring_enabled(),
        |s, t| t.reference_angle_delta = s.reference_angle_delta(),
        |s, t| t.identity.id = s.device_identity().id,
        |s, t| t.identity.model_number = s.device_identity().model_number,
        |s, t| t.identity.dll_version = s.device_identity().dll_version,
    ]
}

/// 跨线程快照读取器
///
/// # 性能
/// - 无锁读取（ArcSwap::load）
/// - 读到的是最近一次 [`PolledStateCache::publish`] 的结果
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    inner: Arc<ArcSwap<TelemetrySnapshot>>,
}

impl SnapshotReader {
    /// 获取最新发布的快照
    pub fn load(&self) -> Arc<TelemetrySnapshot> {
        self.inner.load_full()
    }
}

/// 轮询状态缓存
pub struct PolledStateCache<S: DeviceService> {
    current: TelemetrySnapshot,
    cursor: usize,
    table: [Refresher<S>; StandardField::COUNT],
    published: Arc<ArcSwap<TelemetrySnapshot>>,
}

impl<S: DeviceService> PolledStateCache<S> {
    pub fn new() -> Self {
        Self {
            current: TelemetrySnapshot::default(),
            cursor: 0,
            table: standard_table::<S>(),
            published: Arc::new(ArcSwap::from_pointee(TelemetrySnapshot::default())),
        }
    }

    /// 快速刷新：地面速度 + 运行状态
    ///
    /// 返回是否实际读取了设备。设备返回非有限值时保留上一次的地面速度。
    pub fn refresh_fast(&mut self, link: &mut DeviceLink<S>) -> bool {
        let Some((speeds, run_state)) = link.read(|s| (s.floor_speeds(), s.run_state())) else {
            return false;
        };

        match speeds.validated() {
            Ok(speeds) => self.current.floor_speeds = speeds,
            Err(e) => {
                DeckMetrics::incr(&link.metrics().samples_rejected);
                warn!("Discarding floor speed sample: {}", e);
            },
        }
        self.current.run_state = run_state;
        DeckMetrics::incr(&link.metrics().fast_refreshes);
        trace!(
            v0 = self.current.floor_speeds.v0,
            v1 = self.current.floor_speeds.v1,
            run = run_state,
            "Fast refresh"
        );
        true
    }

    /// 标准刷新：按游标刷新一个字段，然后游标前进（在末尾回绕）
    ///
    /// 游标无论是否连接都会前进；返回本次轮到的字段。
    pub fn refresh_standard(&mut self, link: &mut DeviceLink<S>) -> StandardField {
        let index = self.cursor;
        let field = StandardField::ORDER[index];
        self.cursor = (index + 1) % StandardField::COUNT;

        let refresh = self.table[index];
        let current = &mut self.current;
        if link.read(|s| refresh(s, current)).is_some() {
            DeckMetrics::incr(&link.metrics().standard_refreshes);
            trace!(?field, "Standard refresh");
        }
        field
    }

    /// 下一次标准刷新的下标
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// 当前缓存（tick 路径内使用）
    pub fn snapshot(&self) -> &TelemetrySnapshot {
        &self.current
    }

    /// 发布当前缓存给跨线程读取者
    pub fn publish(&self) {
        self.published.store(Arc::new(self.current.clone()));
    }

    /// 创建跨线程读取器
    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader {
            inner: self.published.clone(),
        }
    }
}

impl<S: DeviceService> Default for PolledStateCache<S> {
    fn default() -> Self {
        Self::new()
    }
}
