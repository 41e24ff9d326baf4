//! 运动源（Motion Source）
//!
//! 四种运动生成器共享同一生命周期：
//!
//! 1. 构造（init）：以当前期望状态为起点规划轨迹
//! 2. 每个控制周期 [`MotionSource::tick`]：在 `step · cycle` 时刻采样并写入 [`DesiredState`]
//! 3. `step == total_steps - 1` 时返回 [`Progress::Finished`]，由控制器收尾并切回 NONE
//!
//! `total_steps = floor(duration / cycle) + 1`（见 [`StepClock`]）。

pub mod joint;
pub mod offset;
pub mod walking;
pub mod wholebody;

pub use joint::JointMotion;
pub use offset::OffsetMotion;
pub use walking::{
    LipmState, PreviewWalkingGenerator, WalkingGenerator, WalkingMotion, WalkingPattern,
    WalkingRequest, WalkingSample,
};
pub use wholebody::{MinimumJerkBlender, PoseTrajectory, WholebodyMotion, WholebodyPlanner};

use nalgebra::Vector3;
use wbc_protocol::{DEFAULT_FOOT_DISTANCE, JointArray, Leg, StancePoses, WalkingPhase};

/// 浮点误差余量（避免 1.0 / 0.008 = 124.99999 被截断）
const STEP_EPSILON: f64 = 1e-9;

/// 时长对应的总步数
///
/// # 示例
///
/// ```rust
/// use wbc_control::motion::step_count;
///
/// assert_eq!(step_count(1.0, 0.008), 126);
/// ```
pub fn step_count(duration: f64, control_cycle: f64) -> usize {
    if !(duration > 0.0 && control_cycle > 0.0) {
        return 1;
    }
    (duration / control_cycle + STEP_EPSILON).floor() as usize + 1
}

/// 离散步计数器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepClock {
    step: usize,
    total: usize,
}

impl StepClock {
    pub fn new(duration: f64, control_cycle: f64) -> Self {
        Self {
            step: 0,
            total: step_count(duration, control_cycle),
        }
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// 当前采样时刻（相对起点，秒）
    pub fn time(&self, control_cycle: f64) -> f64 {
        self.step as f64 * control_cycle
    }

    pub fn is_last(&self) -> bool {
        self.step + 1 >= self.total
    }

    /// 推进一步；当前已是最后一步时返回 `true`（不再推进）
    pub fn advance(&mut self) -> bool {
        if self.is_last() {
            true
        } else {
            self.step += 1;
            false
        }
    }
}

/// 单次 tick 的进度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Running,
    Finished,
}

/// 关节期望轨迹状态
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointState {
    pub position: JointArray<f64>,
    pub velocity: JointArray<f64>,
    pub acceleration: JointArray<f64>,
}

impl JointState {
    /// 静止于给定位置
    pub fn at_rest(position: JointArray<f64>) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

/// 步态状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaitState {
    pub phase: WalkingPhase,
    pub support: Leg,
    /// 倒立摆质心状态
    pub lipm: LipmState,
    /// 摆动前馈基准值（rad），非行走时为 0
    pub feedforward: f64,
}

impl Default for GaitState {
    fn default() -> Self {
        Self {
            phase: WalkingPhase::Dsp,
            support: Leg::Left,
            lipm: LipmState::default(),
            feedforward: 0.0,
        }
    }
}

/// 所有运动源共享的期望状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DesiredState {
    pub joints: JointState,
    /// 世界系期望站姿
    pub stance: StancePoses,
    /// 躯干手动偏移
    pub body_offset: Vector3<f64>,
    pub gait: GaitState,
}

impl Default for DesiredState {
    fn default() -> Self {
        Self {
            joints: JointState::default(),
            stance: StancePoses::nominal(DEFAULT_FOOT_DISTANCE),
            body_offset: Vector3::zeros(),
            gait: GaitState::default(),
        }
    }
}

impl DesiredState {
    /// 回到名义站姿，倒立摆静止于躯干位置，保留躯干偏移
    pub fn reset_stance(&mut self, foot_distance: f64) {
        self.stance = StancePoses::nominal(foot_distance);
        let body = self.stance.body.position;
        self.gait.lipm = LipmState::at_rest(body.x, body.y);
        self.gait.phase = WalkingPhase::Dsp;
        self.gait.feedforward = 0.0;
    }

    /// 复位躯干：名义站姿并清零偏移
    pub fn reset_body(&mut self, foot_distance: f64) {
        self.reset_stance(foot_distance);
        self.body_offset = Vector3::zeros();
    }
}

/// 运动源
pub trait MotionSource {
    /// 日志名称（如 "Joint Control"）
    fn name(&self) -> &'static str;

    /// 采样当前步并写入期望状态，然后推进一步
    fn tick(&mut self, desired: &mut DesiredState) -> Progress;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_count() {
        assert_eq!(step_count(1.0, 0.008), 126);
        assert_eq!(step_count(0.5, 0.008), 63);
        assert_eq!(step_count(0.0, 0.008), 1);
    }

    #[test]
    fn test_step_clock_finishes_on_last_step() {
        let mut clock = StepClock::new(0.024, 0.008);
        assert_eq!(clock.total(), 4);

        let mut ticks = 1;
        while !clock.advance() {
            ticks += 1;
        }
        assert_eq!(ticks, 4);
        assert_eq!(clock.step(), 3);
        assert!((clock.time(0.008) - 0.024).abs() < 1e-12);
    }

    #[test]
    fn test_reset_body() {
        let mut desired = DesiredState::default();
        desired.body_offset = Vector3::new(0.01, 0.02, 0.03);
        desired.stance.body.position.x = 0.1;
        desired.gait.feedforward = 0.2;

        desired.reset_body(0.08);

        assert_eq!(desired.body_offset, Vector3::zeros());
        assert_eq!(desired.stance, StancePoses::nominal(0.08));
        assert_eq!(desired.gait.lipm, LipmState::at_rest(0.0, 0.0));
        assert_eq!(desired.gait.feedforward, 0.0);
    }

    #[test]
    fn test_reset_stance_keeps_offset() {
        let mut desired = DesiredState::default();
        desired.body_offset = Vector3::new(0.02, 0.0, -0.01);
        desired.stance.left_foot.position.x = 0.04;
        desired.gait.lipm = LipmState::at_rest(0.03, -0.01);

        desired.reset_stance(0.07);

        // 偏移只由躯干复位清零
        assert_eq!(desired.body_offset, Vector3::new(0.02, 0.0, -0.01));
        assert_eq!(desired.stance, StancePoses::nominal(0.07));
        assert_eq!(desired.gait.lipm, LipmState::at_rest(0.0, 0.0));
    }
}
