//! Trajectory - 最小加加速度（minimum jerk）轨迹
//!
//! 使用五次多项式插值，边界条件为起止位置/速度/加速度：
//!
//! ```text
//! p(τ) = c0 + c1·τ + c2·τ² + c3·τ³ + c4·τ⁴ + c5·τ⁵,   τ = t - t0
//! ```
//!
//! - [`MinimumJerk`]：N 维，任意边界条件（关节运动、躯干偏移、增益渐变）
//! - [`MinimumJerkViaPoint`]：一维，经过中间点，两端各留出 ½·dsp_ratio 的静止段
//!   （步行前馈、摆动腿抬脚高度）
//!
//! # 示例
//!
//! ```rust
//! use wbc_control::trajectory::MinimumJerk;
//!
//! let traj = MinimumJerk::<1>::rest_to_rest(0.0, 1.0, [0.0], [0.5]);
//! let end = traj.evaluate(1.0);
//! assert!((end.position[0] - 0.5).abs() < 1e-12);
//! ```

/// 五次多项式系数
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct QuinticCoeffs {
    c: [f64; 6],
}

impl QuinticCoeffs {
    /// 根据边界条件求解系数
    ///
    /// # 参数
    ///
    /// - `start`: 起点 (位置, 速度, 加速度)
    /// - `end`: 终点 (位置, 速度, 加速度)
    /// - `duration`: 时长（秒），必须为正
    fn solve(start: [f64; 3], end: [f64; 3], duration: f64) -> Self {
        let [p0, v0, a0] = start;
        let [p1, v1, a1] = end;
        let t = duration;
        let t2 = t * t;
        let t3 = t2 * t;
        let h = p1 - p0;

        let c3 = (20.0 * h - (8.0 * v1 + 12.0 * v0) * t - (3.0 * a0 - a1) * t2) / (2.0 * t3);
        let c4 = (-30.0 * h + (14.0 * v1 + 16.0 * v0) * t + (3.0 * a0 - 2.0 * a1) * t2)
            / (2.0 * t3 * t);
        let c5 = (12.0 * h - 6.0 * (v1 + v0) * t + (a1 - a0) * t2) / (2.0 * t3 * t2);

        Self {
            c: [p0, v0, 0.5 * a0, c3, c4, c5],
        }
    }

    fn position(&self, tau: f64) -> f64 {
        let c = &self.c;
        c[0] + tau * (c[1] + tau * (c[2] + tau * (c[3] + tau * (c[4] + tau * c[5]))))
    }

    fn velocity(&self, tau: f64) -> f64 {
        let c = &self.c;
        c[1] + tau * (2.0 * c[2] + tau * (3.0 * c[3] + tau * (4.0 * c[4] + tau * 5.0 * c[5])))
    }

    fn acceleration(&self, tau: f64) -> f64 {
        let c = &self.c;
        2.0 * c[2] + tau * (6.0 * c[3] + tau * (12.0 * c[4] + tau * 20.0 * c[5]))
    }
}

/// 轨迹采样点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryPoint<const N: usize> {
    pub position: [f64; N],
    pub velocity: [f64; N],
    pub acceleration: [f64; N],
}

/// N 维最小加加速度轨迹
///
/// 时间参数会被限制在 `[t0, t1]` 内，超出范围时保持端点状态。
#[derive(Debug, Clone, PartialEq)]
pub struct MinimumJerk<const N: usize> {
    coeffs: [QuinticCoeffs; N],
    t0: f64,
    t1: f64,
}

impl<const N: usize> MinimumJerk<N> {
    /// 创建轨迹
    ///
    /// # 参数
    ///
    /// - `t0`, `t1`: 起止时间（秒）
    /// - `start_*`: 起点位置/速度/加速度
    /// - `end_*`: 终点位置/速度/加速度
    ///
    /// `t1 <= t0` 时退化为停在终点的常值轨迹。
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        t0: f64,
        t1: f64,
        start_pos: [f64; N],
        start_vel: [f64; N],
        start_acc: [f64; N],
        end_pos: [f64; N],
        end_vel: [f64; N],
        end_acc: [f64; N],
    ) -> Self {
        let duration = t1 - t0;
        let coeffs = std::array::from_fn(|i| {
            if duration > 0.0 {
                QuinticCoeffs::solve(
                    [start_pos[i], start_vel[i], start_acc[i]],
                    [end_pos[i], end_vel[i], end_acc[i]],
                    duration,
                )
            } else {
                QuinticCoeffs {
                    c: [end_pos[i], 0.0, 0.0, 0.0, 0.0, 0.0],
                }
            }
        });

        Self {
            coeffs,
            t0,
            t1: t1.max(t0),
        }
    }

    /// 起止速度、加速度均为 0 的轨迹
    pub fn rest_to_rest(t0: f64, t1: f64, start: [f64; N], end: [f64; N]) -> Self {
        let zero = [0.0; N];
        Self::new(t0, t1, start, zero, zero, end, zero, zero)
    }

    /// 轨迹时长
    pub fn duration(&self) -> f64 {
        self.t1 - self.t0
    }

    fn tau(&self, t: f64) -> f64 {
        t.clamp(self.t0, self.t1) - self.t0
    }

    /// 位置
    pub fn position(&self, t: f64) -> [f64; N] {
        let tau = self.tau(t);
        std::array::from_fn(|i| self.coeffs[i].position(tau))
    }

    /// 位置、速度、加速度
    pub fn evaluate(&self, t: f64) -> TrajectoryPoint<N> {
        let tau = self.tau(t);
        // 端点外速度和加速度保持端点值
        TrajectoryPoint {
            position: std::array::from_fn(|i| self.coeffs[i].position(tau)),
            velocity: std::array::from_fn(|i| self.coeffs[i].velocity(tau)),
            acceleration: std::array::from_fn(|i| self.coeffs[i].acceleration(tau)),
        }
    }
}

/// 经过中间点的一维最小加加速度轨迹
///
/// 在 `[t0, t1]` 内，前后各 `½·dsp_ratio·(t1 - t0)` 保持端点值，
/// 中间窗口内分两段五次多项式经过 `via`（中间点速度、加速度为 0）。
#[derive(Debug, Clone, PartialEq)]
pub struct MinimumJerkViaPoint {
    rise: MinimumJerk<1>,
    fall: MinimumJerk<1>,
    window_start: f64,
    via_time: f64,
    window_end: f64,
    start: f64,
    end: f64,
}

impl MinimumJerkViaPoint {
    /// 创建轨迹
    ///
    /// # 参数
    ///
    /// - `t0`, `t1`: 起止时间
    /// - `via_time`: 中间点时间（会被限制在活动窗口内）
    /// - `dsp_ratio`: 两端静止段总占比 ∈ [0, 1)
    /// - `start`, `via`, `end`: 起点、中间点、终点位置
    pub fn new(
        t0: f64,
        t1: f64,
        via_time: f64,
        dsp_ratio: f64,
        start: f64,
        via: f64,
        end: f64,
    ) -> Self {
        let margin = 0.5 * dsp_ratio.clamp(0.0, 1.0) * (t1 - t0).max(0.0);
        let window_start = t0 + margin;
        let window_end = (t1 - margin).max(window_start);
        let via_time = via_time.clamp(window_start, window_end);

        Self {
            rise: MinimumJerk::rest_to_rest(window_start, via_time, [start], [via]),
            fall: MinimumJerk::rest_to_rest(via_time, window_end, [via], [end]),
            window_start,
            via_time,
            window_end,
            start,
            end,
        }
    }

    /// 位置
    pub fn position(&self, t: f64) -> f64 {
        if t <= self.window_start {
            self.start
        } else if t >= self.window_end {
            self.end
        } else if t <= self.via_time {
            self.rise.position(t)[0]
        } else {
            self.fall.position(t)[0]
        }
    }

    /// 活动窗口 `[start, end]`
    pub fn window(&self) -> (f64, f64) {
        (self.window_start, self.window_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_quintic_boundary_conditions() {
        let coeffs = QuinticCoeffs::solve([0.1, 0.2, 0.3], [1.0, -0.5, 0.4], 2.0);

        assert_abs_diff_eq!(coeffs.position(0.0), 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(coeffs.velocity(0.0), 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(coeffs.acceleration(0.0), 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(coeffs.position(2.0), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(coeffs.velocity(2.0), -0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(coeffs.acceleration(2.0), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_rest_to_rest_midpoint() {
        let traj = MinimumJerk::<2>::rest_to_rest(0.0, 1.0, [0.0, 1.0], [1.0, -1.0]);
        let mid = traj.evaluate(0.5);

        // 对称轨迹中点在一半处，速度最大（15/8 · Δ/T）
        assert_abs_diff_eq!(mid.position[0], 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(mid.position[1], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(mid.velocity[0], 1.875, epsilon = 1e-12);
        assert_abs_diff_eq!(mid.acceleration[0], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_time_is_clamped() {
        let traj = MinimumJerk::<1>::rest_to_rest(1.0, 2.0, [0.0], [3.0]);

        assert_eq!(traj.position(0.0), [0.0]);
        assert_abs_diff_eq!(traj.position(5.0)[0], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_duration_holds_end() {
        let traj = MinimumJerk::<1>::rest_to_rest(0.0, 0.0, [0.0], [2.0]);
        assert_eq!(traj.position(0.0), [2.0]);
        assert_eq!(traj.duration(), 0.0);
    }

    #[test]
    fn test_rest_to_rest_is_monotone() {
        let traj = MinimumJerk::<1>::rest_to_rest(0.0, 1.0, [0.0], [1.0]);
        let mut last = f64::NEG_INFINITY;
        for i in 0..=1000 {
            let p = traj.position(i as f64 * 0.001)[0];
            assert!(p >= last - 1e-15);
            last = p;
        }
    }

    #[test]
    fn test_via_point_shape() {
        let via_rad = 1.0_f64.to_radians();
        let traj = MinimumJerkViaPoint::new(0.0, 1.0, 0.5, 0.2, 0.0, via_rad, 0.0);

        assert_eq!(traj.window(), (0.1, 0.9));
        // 静止段
        assert_eq!(traj.position(0.05), 0.0);
        assert_eq!(traj.position(0.95), 0.0);
        // 中间点
        assert_abs_diff_eq!(traj.position(0.5), via_rad, epsilon = 1e-12);
        // 窗口内非负且不超过中间点
        for i in 0..=100 {
            let p = traj.position(i as f64 * 0.01);
            assert!((-1e-12..=via_rad + 1e-12).contains(&p));
        }
    }
}
