use std::time::{Duration, Instant};

/// 一次性计时器 - 用于控制层自动隐藏、续播提示消失、布局刷新
///
/// 不持有线程，由宿主的帧循环调用 [`OneShotTimer::fire`] 轮询到期
#[derive(Debug, Clone, Default)]
pub struct OneShotTimer {
    deadline: Option<Instant>,
}

impl OneShotTimer {
    pub fn new() -> Self {
        Self { deadline: None }
    }

    /// 从 `now` 起 `delay` 后到期（覆盖已有的计时）
    pub fn arm(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    /// 仅在未计时时才开始计时
    pub fn arm_if_idle(&mut self, now: Instant, delay: Duration) {
        if self.deadline.is_none() {
            self.arm(now, delay);
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// 到期则返回 true 并清除计时，每次计时只触发一次
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
