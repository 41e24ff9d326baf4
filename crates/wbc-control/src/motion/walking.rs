//! 动态行走
//!
//! 一次步行命令展开为 `step_num + 2` 步（起步 + 迈步 + 收步），每步
//! `floor(step_time / cycle) + 1` 个控制周期。
//!
//! - [`WalkingGenerator`] / [`WalkingPattern`]：步态生成器接口，逐周期给出双脚、
//!   躯干位姿、倒立摆状态、相位和支撑腿
//! - [`PreviewWalkingGenerator`]：基于 cart-table 预观控制的参考实现
//! - [`WalkingMotion`]：把步态生成器接入运动源生命周期，并生成摆动前馈基准值
//!
//! 单步内前后各 `½·dsp_ratio·step_time` 为双脚支撑（DSP），中间为单脚支撑（SSP）。
//! 起步和收步整步都是 DSP。

use super::{DesiredState, MotionSource, Progress, StepClock};
use crate::error::ControlError;
use crate::preview::PreviewMatrix;
use crate::trajectory::{MinimumJerk, MinimumJerkViaPoint};
use nalgebra::{Matrix3, UnitQuaternion, Vector3};
use std::f64::consts::PI;
use tracing::debug;
use wbc_protocol::{
    FootPair, FootStepCommand, Leg, Pose6D, StancePoses, StepDirection, WalkingParam,
    WalkingPhase,
};

/// 摆动前馈中间点（1°）
const FEEDFORWARD_VIA: f64 = PI / 180.0;

/// 倒立摆质心状态，每轴 `[位置, 速度, 加速度]`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LipmState {
    pub x: [f64; 3],
    pub y: [f64; 3],
}

impl LipmState {
    /// 静止于 (x, y)
    pub fn at_rest(x: f64, y: f64) -> Self {
        Self {
            x: [x, 0.0, 0.0],
            y: [y, 0.0, 0.0],
        }
    }

    /// 水平加速度 (ax, ay)
    pub fn acceleration(&self) -> (f64, f64) {
        (self.x[2], self.y[2])
    }
}

/// 步态采样
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkingSample {
    /// 世界系站姿
    pub stance: StancePoses,
    pub lipm: LipmState,
    pub phase: WalkingPhase,
    pub support: Leg,
}

/// 步行启动参数
#[derive(Debug, Clone, PartialEq)]
pub struct WalkingRequest {
    pub command: FootStepCommand,
    pub param: WalkingParam,
    pub control_cycle: f64,
    pub foot_distance: f64,
    /// 起步时的期望站姿
    pub start: StancePoses,
    /// 起步时的倒立摆状态
    pub lipm: LipmState,
    pub preview: PreviewMatrix,
}

/// 一次步行的步态
pub trait WalkingPattern: Send {
    /// 第 `step` 步、步内时刻 `t` 的采样
    ///
    /// 每个控制周期按时间顺序调用一次（内部状态随调用推进）。
    fn sample(&mut self, step: usize, t: f64) -> WalkingSample;
}

/// 步态生成器
pub trait WalkingGenerator: Send {
    fn start(&self, request: WalkingRequest) -> Result<Box<dyn WalkingPattern>, ControlError>;
}

// ==================== 预观控制步态生成器 ====================

fn wrap_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(2.0 * PI) - PI
}

fn yaw_of(pose: &Pose6D) -> f64 {
    pose.euler_angles().2
}

/// 两个偏航角的中间值
fn mean_yaw(a: f64, b: f64) -> f64 {
    a + 0.5 * wrap_angle(b - a)
}

/// 行走坐标系 (x, y, yaw)
#[derive(Debug, Clone, Copy, PartialEq)]
struct WalkingFrame {
    x: f64,
    y: f64,
    yaw: f64,
}

impl WalkingFrame {
    fn between(feet: &FootPair<Pose6D>) -> Self {
        Self {
            x: 0.5 * (feet.left.position.x + feet.right.position.x),
            y: 0.5 * (feet.left.position.y + feet.right.position.y),
            yaw: mean_yaw(yaw_of(&feet.right), yaw_of(&feet.left)),
        }
    }

    /// 坐标系内一点 → 世界系
    fn point(&self, dx: f64, dy: f64) -> [f64; 2] {
        let (s, c) = self.yaw.sin_cos();
        [self.x + c * dx - s * dy, self.y + s * dx + c * dy]
    }

    fn advance(&self, dx: f64, dy: f64, dyaw: f64) -> Self {
        let [x, y] = self.point(dx, dy);
        Self {
            x,
            y,
            yaw: self.yaw + dyaw,
        }
    }

    fn foot(&self, leg: Leg, foot_distance: f64) -> Pose6D {
        let [x, y] = self.point(0.0, 0.5 * leg.lateral_sign() * foot_distance);
        Pose6D::new(
            Vector3::new(x, y, 0.0),
            UnitQuaternion::from_euler_angles(0.0, 0.0, self.yaw),
        )
    }
}

/// 摆动腿轨迹
#[derive(Debug, Clone)]
struct SwingPlan {
    leg: Leg,
    /// (x, y, yaw)，SSP 窗口内
    planar: MinimumJerk<3>,
    /// 抬脚高度
    lift: MinimumJerkViaPoint,
}

impl SwingPlan {
    fn new(leg: Leg, from: &Pose6D, to: &Pose6D, step_time: f64, param: &WalkingParam) -> Self {
        let margin = 0.5 * param.dsp_ratio * step_time;
        let from_yaw = yaw_of(from);
        let to_yaw = from_yaw + wrap_angle(yaw_of(to) - from_yaw);
        let top = from.position.z.max(to.position.z) + param.foot_height_max;

        Self {
            leg,
            planar: MinimumJerk::rest_to_rest(
                margin,
                step_time - margin,
                [from.position.x, from.position.y, from_yaw],
                [to.position.x, to.position.y, to_yaw],
            ),
            lift: MinimumJerkViaPoint::new(
                0.0,
                step_time,
                0.5 * step_time,
                param.dsp_ratio,
                from.position.z,
                top,
                to.position.z,
            ),
        }
    }

    fn pose(&self, t: f64) -> Pose6D {
        let [x, y, yaw] = self.planar.position(t);
        Pose6D::new(
            Vector3::new(x, y, self.lift.position(t)),
            UnitQuaternion::from_euler_angles(0.0, 0.0, yaw),
        )
    }
}

/// 单步计划
#[derive(Debug, Clone)]
struct StepPlan {
    swing: Option<SwingPlan>,
    support: Leg,
    /// 本步开始时的双脚位姿
    feet: FootPair<Pose6D>,
    zmp_from: [f64; 2],
    zmp_to: [f64; 2],
}

/// 预观控制步态生成器
///
/// - 落脚点由行走坐标系 (x, y, yaw) 推进得到；前后行走每步推进，
///   侧移和转向只在领先腿迈步时推进，最后一步（`step_num >= 2`）双脚并拢
/// - ZMP 参考：起步/收步为双脚中点，迈步时为支撑脚（含 ZMP 偏移），
///   在每步开头的 DSP 内线性过渡
/// - 质心由预观控制跟踪 ZMP 参考，躯干高度保持起步值，偏航取双脚中间值
#[derive(Debug, Clone, Copy, Default)]
pub struct PreviewWalkingGenerator;

fn lead_leg(direction: StepDirection) -> Leg {
    match direction {
        StepDirection::Right | StepDirection::TurnRight => Leg::Right,
        _ => Leg::Left,
    }
}

/// 每步坐标系增量 (dx, dy, dyaw) 以及是否每步都推进
fn frame_delta(cmd: &FootStepCommand) -> (f64, f64, f64, bool) {
    match cmd.direction {
        StepDirection::Forward => (cmd.step_length, 0.0, 0.0, true),
        StepDirection::Backward => (-cmd.step_length, 0.0, 0.0, true),
        StepDirection::Left => (0.0, cmd.side_step_length, 0.0, false),
        StepDirection::Right => (0.0, -cmd.side_step_length, 0.0, false),
        StepDirection::TurnLeft => (0.0, 0.0, cmd.step_angle, false),
        StepDirection::TurnRight => (0.0, 0.0, -cmd.step_angle, false),
        StepDirection::Stop => (0.0, 0.0, 0.0, true),
    }
}

fn feet_midpoint(feet: &FootPair<Pose6D>) -> [f64; 2] {
    let mid = 0.5 * (feet.left.position + feet.right.position);
    [mid.x, mid.y]
}

/// 支撑脚 ZMP 参考（`zmp_offset_y > 0` 向躯干中线偏移）
fn support_zmp(foot: &Pose6D, support: Leg, param: &WalkingParam) -> [f64; 2] {
    let (s, c) = yaw_of(foot).sin_cos();
    let dx = param.zmp_offset_x;
    let dy = -support.lateral_sign() * param.zmp_offset_y;
    [
        foot.position.x + c * dx - s * dy,
        foot.position.y + s * dx + c * dy,
    ]
}

fn plan_steps(request: &WalkingRequest) -> Vec<StepPlan> {
    let cmd = &request.command;
    let param = &request.param;
    let lead = lead_leg(cmd.direction);
    let (dx, dy, dyaw, every_step) = frame_delta(cmd);

    let mut feet = FootPair::new(request.start.left_foot, request.start.right_foot);
    let mut frame = WalkingFrame::between(&feet);
    let mut zmp = feet_midpoint(&feet);

    let mut steps = Vec::with_capacity(cmd.total_steps());
    steps.push(StepPlan {
        swing: None,
        support: lead.opposite(),
        feet,
        zmp_from: zmp,
        zmp_to: zmp,
    });

    let mut swing = lead;
    for k in 1..=cmd.step_num {
        let closing = k == cmd.step_num && cmd.step_num >= 2;
        if !closing && (every_step || swing == lead) {
            frame = frame.advance(dx, dy, dyaw);
        }

        let support = swing.opposite();
        let target = frame.foot(swing, request.foot_distance);
        let zmp_to = support_zmp(feet.get(support), support, param);

        steps.push(StepPlan {
            swing: Some(SwingPlan::new(swing, feet.get(swing), &target, cmd.step_time, param)),
            support,
            feet,
            zmp_from: zmp,
            zmp_to,
        });

        *feet.get_mut(swing) = target;
        zmp = zmp_to;
        swing = support;
    }

    steps.push(StepPlan {
        swing: None,
        support: swing.opposite(),
        feet,
        zmp_from: zmp,
        zmp_to: feet_midpoint(&feet),
    });
    steps
}

/// 预观控制步态
struct PreviewWalkingPattern {
    steps: Vec<StepPlan>,
    step_time: f64,
    dsp_margin: f64,
    body_z: f64,
    preview: PreviewMatrix,
    a: Matrix3<f64>,
    b: Vector3<f64>,
    lipm: LipmState,
}

impl PreviewWalkingPattern {
    /// 全局时刻的 ZMP 参考
    fn zmp_at(&self, time: f64) -> [f64; 2] {
        let last = self.steps.len() - 1;
        let index = ((time / self.step_time).floor().max(0.0) as usize).min(last);
        let step = &self.steps[index];
        let tau = time - index as f64 * self.step_time;

        let shift = if step.swing.is_some() {
            self.dsp_margin
        } else {
            0.5 * self.step_time
        };
        let s = if shift > 0.0 {
            (tau / shift).clamp(0.0, 1.0)
        } else {
            1.0
        };

        [
            step.zmp_from[0] + s * (step.zmp_to[0] - step.zmp_from[0]),
            step.zmp_from[1] + s * (step.zmp_to[1] - step.zmp_from[1]),
        ]
    }

    /// 预观控制推进一个周期
    fn advance_lipm(&mut self, time: f64) {
        let dt = self.preview.control_cycle;
        let mut reference = [0.0; 2];
        for (j, f) in self.preview.f.iter().enumerate() {
            let zmp = self.zmp_at(time + (j + 1) as f64 * dt);
            reference[0] += f * zmp[0];
            reference[1] += f * zmp[1];
        }

        let k = Vector3::from(self.preview.k);
        for (axis, r) in [(&mut self.lipm.x, reference[0]), (&mut self.lipm.y, reference[1])] {
            let state = Vector3::from(*axis);
            let u = -k.dot(&state) + r;
            *axis = (self.a * state + self.b * u).into();
        }
    }
}

impl WalkingPattern for PreviewWalkingPattern {
    fn sample(&mut self, step: usize, t: f64) -> WalkingSample {
        let index = step.min(self.steps.len() - 1);
        self.advance_lipm(index as f64 * self.step_time + t);

        let plan = &self.steps[index];
        let mut feet = plan.feet;
        let mut phase = WalkingPhase::Dsp;
        if let Some(swing) = &plan.swing {
            *feet.get_mut(swing.leg) = swing.pose(t);
            if t > self.dsp_margin && t < self.step_time - self.dsp_margin {
                phase = WalkingPhase::Ssp;
            }
        }

        let yaw = mean_yaw(yaw_of(&feet.right), yaw_of(&feet.left));
        let body = Pose6D::new(
            Vector3::new(self.lipm.x[0], self.lipm.y[0], self.body_z),
            UnitQuaternion::from_euler_angles(0.0, 0.0, yaw),
        );

        WalkingSample {
            stance: StancePoses {
                body,
                left_foot: feet.left,
                right_foot: feet.right,
            },
            lipm: self.lipm,
            phase,
            support: plan.support,
        }
    }
}

impl WalkingGenerator for PreviewWalkingGenerator {
    fn start(&self, request: WalkingRequest) -> Result<Box<dyn WalkingPattern>, ControlError> {
        if request.preview.horizon() == 0 {
            return Err(ControlError::PreviewUnavailable(
                "empty preview horizon".to_string(),
            ));
        }

        let steps = plan_steps(&request);
        let (a, b, _) = request.preview.system();
        debug!(steps = steps.len(), "walking pattern planned");

        Ok(Box::new(PreviewWalkingPattern {
            steps,
            step_time: request.command.step_time,
            dsp_margin: 0.5 * request.param.dsp_ratio * request.command.step_time,
            body_z: request.start.body.position.z,
            preview: request.preview,
            a,
            b,
            lipm: request.lipm,
        }))
    }
}

// ==================== 行走运动源 ====================

/// 行走运动源
pub struct WalkingMotion {
    pattern: Box<dyn WalkingPattern>,
    feedforward: MinimumJerkViaPoint,
    step: usize,
    total_steps: usize,
    step_time: f64,
    clock: StepClock,
    control_cycle: f64,
}

impl std::fmt::Debug for WalkingMotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalkingMotion")
            .field("step", &self.step)
            .field("total_steps", &self.total_steps)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl WalkingMotion {
    pub fn new(
        pattern: Box<dyn WalkingPattern>,
        command: &FootStepCommand,
        dsp_ratio: f64,
        control_cycle: f64,
    ) -> Self {
        let step_time = command.step_time;
        Self {
            pattern,
            feedforward: MinimumJerkViaPoint::new(
                0.0,
                step_time,
                0.5 * step_time,
                dsp_ratio,
                0.0,
                FEEDFORWARD_VIA,
                0.0,
            ),
            step: 0,
            total_steps: command.total_steps(),
            step_time,
            clock: StepClock::new(step_time, control_cycle),
            control_cycle,
        }
    }

    /// 当前步（从 0 开始）
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }
}

impl MotionSource for WalkingMotion {
    fn name(&self) -> &'static str {
        "Walking Control"
    }

    fn tick(&mut self, desired: &mut DesiredState) -> Progress {
        let t = self.clock.time(self.control_cycle);
        let sample = self.pattern.sample(self.step, t);

        desired.stance = sample.stance;
        desired.gait.lipm = sample.lipm;
        desired.gait.phase = sample.phase;
        desired.gait.support = sample.support;
        desired.gait.feedforward = match sample.phase {
            WalkingPhase::Dsp => 0.0,
            WalkingPhase::Ssp => self.feedforward.position(t),
        };

        if !self.clock.advance() {
            return Progress::Running;
        }

        debug!(
            "[END] Walking Control ({}/{})",
            self.step + 1,
            self.total_steps
        );
        if self.step + 1 >= self.total_steps {
            desired.gait.feedforward = 0.0;
            return Progress::Finished;
        }

        self.step += 1;
        self.clock = StepClock::new(self.step_time, self.control_cycle);
        debug!(
            "[START] Walking Control ({}/{})",
            self.step + 1,
            self.total_steps
        );
        Progress::Running
    }
}
