//! 驱动层运行指标
//!
//! 提供零开销的原子计数器，用于监控连接与轮询链路的健康状态。
//! 所有计数器都使用原子操作，诊断面板可以在任何线程安全地读取，不会引入锁竞争。

use std::sync::atomic::{AtomicU64, Ordering};

/// 驱动层实时指标
///
/// # 使用示例
///
/// ```rust
/// use deck_driver::DeckMetrics;
/// use std::sync::Arc;
/// use std::sync::atomic::Ordering;
///
/// let metrics = Arc::new(DeckMetrics::default());
///
/// // 在 tick 路径中更新指标
/// metrics.fast_refreshes.fetch_add(1, Ordering::Relaxed);
///
/// // 在诊断线程中读取快照
/// let snapshot = metrics.snapshot();
/// println!("Fast refreshes: {}", snapshot.fast_refreshes);
/// ```
#[derive(Debug, Default)]
pub struct DeckMetrics {
    /// 重连检查次数（服务可达且未连接时的握手尝试）
    pub reconnect_attempts: AtomicU64,

    /// 握手成功次数
    pub handshakes_succeeded: AtomicU64,

    /// 握手失败次数
    pub handshakes_failed: AtomicU64,

    /// 服务不可达次数
    pub service_unreachable: AtomicU64,

    /// 快速刷新次数（地面速度 + 运行状态）
    pub fast_refreshes: AtomicU64,

    /// 标准轮询刷新次数（每次一个字段）
    pub standard_refreshes: AtomicU64,

    /// 因未连接而跳过的读取次数
    pub reads_skipped: AtomicU64,

    /// 设备返回非法采样（NaN/Inf）被丢弃的次数
    pub samples_rejected: AtomicU64,

    /// 已送达的命令数
    pub commands_sent: AtomicU64,

    /// 因未连接被丢弃的命令数
    ///
    /// 命令是尽力而为的：不排队、不重试。
    pub commands_dropped: AtomicU64,
}

impl DeckMetrics {
    /// 创建新的指标实例（所有计数器初始化为 0）
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// 获取指标快照
    ///
    /// 不同计数器之间可能有微小的时间差，适合监控场景。
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            reconnect_attempts: self.reconnect_attempts.load(Ordering::Relaxed),
            handshakes_succeeded: self.handshakes_succeeded.load(Ordering::Relaxed),
            handshakes_failed: self.handshakes_failed.load(Ordering::Relaxed),
            service_unreachable: self.service_unreachable.load(Ordering::Relaxed),
            fast_refreshes: self.fast_refreshes.load(Ordering::Relaxed),
            standard_refreshes: self.standard_refreshes.load(Ordering::Relaxed),
            reads_skipped: self.reads_skipped.load(Ordering::Relaxed),
            samples_rejected: self.samples_rejected.load(Ordering::Relaxed),
            commands_sent: self.commands_sent.load(Ordering::Relaxed),
            commands_dropped: self.commands_dropped.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器
    pub fn reset(&self) {
        self.reconnect_attempts.store(0, Ordering::Relaxed);
        self.handshakes_succeeded.store(0, Ordering::Relaxed);
        self.handshakes_failed.store(0, Ordering::Relaxed);
        self.service_unreachable.store(0, Ordering::Relaxed);
        self.fast_refreshes.store(0, Ordering::Relaxed);
        self.standard_refreshes.store(0, Ordering::Relaxed);
        self.reads_skipped.store(0, Ordering::Relaxed);
        self.samples_rejected.store(0, Ordering::Relaxed);
        self.commands_sent.store(0, Ordering::Relaxed);
        self.commands_dropped.store(0, Ordering::Relaxed);
    }
}

/// 指标快照（不可变，用于读取）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct MetricsSnapshot {
    pub reconnect_attempts: u64,
    pub handshakes_succeeded: u64,
    pub handshakes_failed: u64,
    pub service_unreachable: u64,
    pub fast_refreshes: u64,
    pub standard_refreshes: u64,
    pub reads_skipped: u64,
    pub samples_rejected: u64,
    pub commands_sent: u64,
    pub commands_dropped: u64,
}

impl MetricsSnapshot {
    /// 命令丢弃率（百分比）
    ///
    /// 返回 0.0 到 100.0 之间的值。如果没有任何命令，返回 0.0。
    pub fn command_drop_rate(&self) -> f64 {
        let total = self.commands_sent + self.commands_dropped;
        if total == 0 {
            return 0.0;
        }
        (self.commands_dropped as f64 / total as f64) * 100.0
    }

    /// 握手成功率（百分比）
    ///
    /// 如果尚未尝试握手，返回 0.0。
    pub fn handshake_success_rate(&self) -> f64 {
        let total = self.handshakes_succeeded + self.handshakes_failed;
        if total == 0 {
            return 0.0;
        }
        (self.handshakes_succeeded as f64 / total as f64) * 100.0
    }
}
