//! 协作式重复任务
//!
//! 单线程 tick 模型下的定时任务原语：任务本身不持有线程或回调，
//! 由驱动方在每个 tick 调用 [`RepeatingTask::poll`] 询问是否到期。
//! 启动/取消与所属组件的激活状态绑定。

use std::time::{Duration, Instant};

/// 固定间隔的重复任务
#[derive(Debug, Clone)]
pub struct RepeatingTask {
    interval: Duration,
    next_due: Option<Instant>,
}

impl RepeatingTask {
    /// 创建任务（未启动）
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    /// 启动任务，首次 `poll` 立即到期
    ///
    /// 已启动时为空操作并返回 `false`，不会重置下次到期时间。
    pub fn start(&mut self, now: Instant) -> bool {
        if self.next_due.is_some() {
            return false;
        }
        self.next_due = Some(now);
        true
    }

    /// 取消任务（可再次 `start`）
    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// 到期则返回 `true` 并排定下一次
    ///
    /// 下一次到期时间从 `now` 起算：tick 停顿期间错过的周期不会补跑。
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.interval);
                true
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(500);

    #[test]
    fn test_inactive_never_fires() {
        let mut task = RepeatingTask::new(INTERVAL);
        let now = Instant::now();
        assert!(!task.is_active());
        assert!(!task.poll(now));
        assert!(!task.poll(now + INTERVAL * 10));
    }

    #[test]
    fn test_fires_immediately_then_on_interval() {
        let mut task = RepeatingTask::new(INTERVAL);
        let t0 = Instant::now();
        assert!(task.start(t0));

        assert!(task.poll(t0));
        assert!(!task.poll(t0 + Duration::from_millis(100)));
        assert!(!task.poll(t0 + Duration::from_millis(499)));
        assert!(task.poll(t0 + INTERVAL));
        assert!(!task.poll(t0 + INTERVAL));
    }

    #[test]
    fn test_double_start_is_noop() {
        let mut task = RepeatingTask::new(INTERVAL);
        let t0 = Instant::now();
        assert!(task.start(t0));
        assert!(task.poll(t0));

        // 重复启动不会让任务提前到期
        assert!(!task.start(t0 + Duration::from_millis(10)));
        assert!(!task.poll(t0 + Duration::from_millis(10)));
    }

    #[test]
    fn test_cancel_and_restart() {
        let mut task = RepeatingTask::new(INTERVAL);
        let t0 = Instant::now();
        task.start(t0);
        task.cancel();
        assert!(!task.is_active());
        assert!(!task.poll(t0 + INTERVAL));

        let t1 = t0 + Duration::from_secs(5);
        assert!(task.start(t1));
        assert!(task.poll(t1));
    }

    #[test]
    fn test_missed_periods_not_replayed() {
        let mut task = RepeatingTask::new(INTERVAL);
        let t0 = Instant::now();
        task.start(t0);
        task.poll(t0);

        let late = t0 + INTERVAL * 5;
        assert!(task.poll(late));
        assert!(!task.poll(late + Duration::from_millis(1)));
    }
}
