//! 运动位移换算
//!
//! 把跑步机地面速度（设备本地坐标）换算成消费方世界坐标下的水平位移，
//! 并修正消费方的偏航角与缩放。
//!
//! # 算法
//!
//! ```text
//! raw = (v0·Δt, v1·Δt)
//! dx  = ( raw.x·cos θ + raw.y·sin θ) · s · g
//! dy  = (-raw.x·sin θ + raw.y·cos θ) · s · g
//! ```
//!
//! 旋转是保范数的，`|d| = |raw| · s · g`。
//!
//! [`translate`] 是纯函数，不检查连接状态：未连接时传入的是缓存中
//! 过期的速度，仍会产生非零位移。需要门控的调用方应使用
//! `DeckSession::locomotion_step`。

use deck_protocol::FloorSpeeds;
use serde::Serialize;
use tracing::info;

/// 碰撞检测的位置容差（世界单位）
pub const COLLISION_TOLERANCE: f64 = 0.001;

/// 单个 tick 的水平位移（世界坐标）
///
/// `x` 对应世界 X 轴，`y` 对应水平面上的第二根轴（世界 Z 轴）。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DisplacementVector {
    pub x: f64,
    pub y: f64,
}

impl DisplacementVector {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// 叠加到世界坐标 `[x, y, z]`：`dx` 加到 x，`dy` 加到 z，竖直方向不变
    pub fn apply_to(&self, position: [f64; 3]) -> [f64; 3] {
        [position[0] + self.x, position[1], position[2] + self.y]
    }
}

/// 把一次地面速度采样换算成位移
///
/// # 参数
/// - `sample`: 地面速度（m/s）
/// - `dt`: 距上次调用的真实耗时（秒）；非正或非有限时返回零位移
/// - `yaw`: 消费方当前偏航角（弧度）
/// - `scale`: 消费方世界缩放
/// - `gain`: 速度增益
///
/// # 示例
///
/// ```
/// use deck_driver::locomotion::translate;
/// use deck_protocol::FloorSpeeds;
///
/// let d = translate(FloorSpeeds::new(1.0, 0.0), 0.1, 0.0, 1.2192, 1.0);
/// assert!((d.x - 0.12192).abs() < 1e-12);
/// assert_eq!(d.y, 0.0);
/// ```
pub fn translate(
    sample: FloorSpeeds,
    dt: f64,
    yaw: f64,
    scale: f64,
    gain: f64,
) -> DisplacementVector {
    if !dt.is_finite() || dt <= 0.0 {
        return DisplacementVector::ZERO;
    }

    let raw_x = sample.v0 * dt;
    let raw_y = sample.v1 * dt;
    let (sin, cos) = yaw.sin_cos();
    let k = scale * gain;

    DisplacementVector {
        x: (raw_x * cos + raw_y * sin) * k,
        y: (-raw_x * sin + raw_y * cos) * k,
    }
}

/// 带配置的位移换算器
#[derive(Debug, Clone, Copy)]
pub struct LocomotionTranslator {
    gain: f64,
    show_velocity: bool,
}

impl LocomotionTranslator {
    pub fn new(gain: f64) -> Self {
        Self {
            gain,
            show_velocity: false,
        }
    }

    /// 每次换算时输出原始地面速度（info 级别）
    pub fn with_velocity_logging(mut self, enabled: bool) -> Self {
        self.show_velocity = enabled;
        self
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn set_gain(&mut self, gain: f64) {
        self.gain = gain;
    }

    pub fn step(&self, sample: FloorSpeeds, dt: f64, yaw: f64, scale: f64) -> DisplacementVector {
        if self.show_velocity {
            info!(v0 = sample.v0, v1 = sample.v1, "Treadmill velocity");
        }
        translate(sample, dt, yaw, scale, self.gain)
    }
}

impl Default for LocomotionTranslator {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// 碰撞观测（只记录，不修正）
///
/// `report` 打开时每次碰撞输出一条 info 日志。
///
/// - 移动前：位置与上一帧结束时不同，说明有外部移动
/// - 移动后：位置没到达目标，说明移动被阻挡
#[derive(Debug, Clone, Default)]
pub struct MoveObserver {
    previous: Option<[f64; 3]>,
    report: bool,
    collisions: u64,
}

impl MoveObserver {
    pub fn new(report: bool) -> Self {
        Self {
            previous: None,
            report,
            collisions: 0,
        }
    }

    /// 移动前检查；返回是否检测到外部移动
    pub fn pre_move(&mut self, position: [f64; 3]) -> bool {
        let moved = self
            .previous
            .is_some_and(|prev| distance(prev, position) > COLLISION_TOLERANCE);
        if moved {
            self.collisions += 1;
            if self.report {
                info!(?position, "Pre-move check: moved since last frame, collision occurred");
            }
        }
        moved
    }

    /// 移动后检查；返回是否被阻挡。`actual` 记为本帧结束位置
    pub fn post_move(&mut self, target: [f64; 3], actual: [f64; 3]) -> bool {
        let blocked = distance(target, actual) > COLLISION_TOLERANCE;
        if blocked {
            self.collisions += 1;
            if self.report {
                info!(?target, ?actual, "Post-move check: target not reached, collision occurred");
            }
        }
        self.previous = Some(actual);
        blocked
    }

    /// 累计检测到的碰撞次数
    pub fn collisions(&self) -> u64 {
        self.collisions
    }
}

fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}
