//! 一阶低通滤波器与 PD 控制器
//!
//! 平衡控制器每个通道都是 "低通 → PD" 的串联：
//!
//! ```text
//! y[k]   = y[k-1] + α · (x[k] - y[k-1]),   α = 2π·fc·dt / (1 + 2π·fc·dt)
//! out[k] = Kp · e[k] + Kd · (e[k] - e[k-1])
//! ```
//!
//! 微分项使用逐周期差分（不除以 dt），增益表按此约定整定。

use std::f64::consts::PI;
use wbc_tools::PdGain;

/// 一阶低通滤波器
#[derive(Debug, Clone, PartialEq)]
pub struct LowPassFilter {
    control_cycle: f64,
    alpha: f64,
    output: f64,
}

impl LowPassFilter {
    /// 创建滤波器
    ///
    /// # 参数
    ///
    /// - `control_cycle`: 采样周期（秒）
    /// - `cutoff`: 截止频率（Hz），`<= 0` 时滤波器直通
    pub fn new(control_cycle: f64, cutoff: f64) -> Self {
        let mut filter = Self {
            control_cycle,
            alpha: 1.0,
            output: 0.0,
        };
        filter.set_cutoff(cutoff);
        filter
    }

    /// 更新截止频率（保留当前输出）
    pub fn set_cutoff(&mut self, cutoff: f64) {
        self.alpha = if cutoff > 0.0 {
            let w = 2.0 * PI * cutoff * self.control_cycle;
            w / (1.0 + w)
        } else {
            1.0
        };
    }

    /// 滤波一次
    pub fn filter(&mut self, input: f64) -> f64 {
        self.output += self.alpha * (input - self.output);
        self.output
    }

    pub fn output(&self) -> f64 {
        self.output
    }

    pub fn reset(&mut self) {
        self.output = 0.0;
    }
}

/// PD 控制器（差分微分项）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PdController {
    gain: PdGain,
    prev_error: f64,
}

impl PdController {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置增益
    pub fn with_gains(mut self, p: f64, d: f64) -> Self {
        self.gain = PdGain::new(p, d);
        self
    }

    pub fn set_gain(&mut self, gain: PdGain) {
        self.gain = gain;
    }

    pub fn gain(&self) -> PdGain {
        self.gain
    }

    /// 计算输出
    ///
    /// # 参数
    ///
    /// - `desired`: 期望值
    /// - `present`: 当前值
    pub fn update(&mut self, desired: f64, present: f64) -> f64 {
        let error = desired - present;
        let output = self.gain.p * error + self.gain.d * (error - self.prev_error);
        self.prev_error = error;
        output
    }

    pub fn reset(&mut self) {
        self.prev_error = 0.0;
    }
}
