//! 运行时性能指标
//!
//! 原子计数器，控制线程写入，任意线程无锁读取。

use std::sync::atomic::{AtomicU64, Ordering};

/// 运行时指标
///
/// # 使用示例
///
/// ```rust
/// use wbc_driver::RuntimeMetrics;
/// use std::sync::atomic::Ordering;
///
/// let metrics = RuntimeMetrics::new();
/// metrics.ticks.fetch_add(1, Ordering::Relaxed);
///
/// let snapshot = metrics.snapshot();
/// assert_eq!(snapshot.ticks, 1);
/// ```
#[derive(Debug, Default)]
pub struct RuntimeMetrics {
    /// 已执行的控制周期数
    pub ticks: AtomicU64,

    /// 计算时间超过软预算（3 ms）的周期数
    pub slow_ticks: AtomicU64,

    /// 错过周期锚点的次数
    ///
    /// 计算时间超过整个控制周期时发生，锚点会被重置到当前时间。
    pub loop_overruns: AtomicU64,

    /// 平衡修正失败导致的运动中止次数
    pub ik_aborts: AtomicU64,

    /// 控制线程收到的命令数
    pub commands: AtomicU64,

    /// 被仲裁拒绝的命令数
    pub rejected_commands: AtomicU64,

    /// 状态通道满导致丢弃的事件数
    pub status_drops: AtomicU64,

    /// 执行器写入失败次数
    pub actuator_errors: AtomicU64,
}

impl RuntimeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取指标快照
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            slow_ticks: self.slow_ticks.load(Ordering::Relaxed),
            loop_overruns: self.loop_overruns.load(Ordering::Relaxed),
            ik_aborts: self.ik_aborts.load(Ordering::Relaxed),
            commands: self.commands.load(Ordering::Relaxed),
            rejected_commands: self.rejected_commands.load(Ordering::Relaxed),
            status_drops: self.status_drops.load(Ordering::Relaxed),
            actuator_errors: self.actuator_errors.load(Ordering::Relaxed),
        }
    }

    /// 重置所有计数器
    pub fn reset(&self) {
        self.ticks.store(0, Ordering::Relaxed);
        self.slow_ticks.store(0, Ordering::Relaxed);
        self.loop_overruns.store(0, Ordering::Relaxed);
        self.ik_aborts.store(0, Ordering::Relaxed);
        self.commands.store(0, Ordering::Relaxed);
        self.rejected_commands.store(0, Ordering::Relaxed);
        self.status_drops.store(0, Ordering::Relaxed);
        self.actuator_errors.store(0, Ordering::Relaxed);
    }
}

/// 指标快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub ticks: u64,
    pub slow_ticks: u64,
    pub loop_overruns: u64,
    pub ik_aborts: u64,
    pub commands: u64,
    pub rejected_commands: u64,
    pub status_drops: u64,
    pub actuator_errors: u64,
}

impl MetricsSnapshot {
    /// 慢周期占比（百分比）
    ///
    /// `ticks` 为 0 时返回 0.0。
    pub fn slow_tick_rate(&self) -> f64 {
        if self.ticks == 0 {
            return 0.0;
        }
        (self.slow_ticks as f64 / self.ticks as f64) * 100.0
    }

    /// 命令拒绝率（百分比）
    pub fn rejection_rate(&self) -> f64 {
        if self.commands == 0 {
            return 0.0;
        }
        (self.rejected_commands as f64 / self.commands as f64) * 100.0
    }
}
