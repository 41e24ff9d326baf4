//! 命令仲裁
//!
//! 控制模式 × 平衡模式状态机。控制状态是带标签的枚举：模式本身和
//! 运动源是否已初始化（[`MotionSlot::Pending`] / [`MotionSlot::Running`]）
//! 编码在同一个值里，不使用分散的布尔标志。
//!
//! | 命令 | 前置条件 |
//! |---|---|
//! | 关节目标 | 模式 ∈ {NONE, JOINT} |
//! | 躯干偏移 | 平衡 ON，模式 ∈ {NONE, OFFSET} |
//! | 全身目标 | 平衡 ON，模式 ∈ {NONE, WHOLEBODY}，运动中任务组相同 |
//! | 步行 | 平衡 ON，模式 ∈ {NONE, WALKING}，运动中忽略 |
//!
//! 不满足前置条件的命令被拒绝，状态不变。

use crate::error::ControlError;
use crate::motion::{JointMotion, OffsetMotion, StepClock, WalkingMotion, WholebodyMotion};
use crate::preview::PreviewMatrix;
use crate::trajectory::MinimumJerk;
use wbc_protocol::{
    BalanceMode, BodyOffset, ControlMode, FootStepCommand, JointPoseGoal, TaskGroup,
    WholebodyGoal,
};

/// 平衡增益渐变时长（秒）
pub const BALANCE_RAMP_TIME: f64 = 1.0;

/// 运动源槽位
#[derive(Debug)]
pub enum MotionSlot<R, M> {
    /// 已接受请求，下一个周期初始化
    Pending {
        request: R,
        /// 是否替换正在运行的同类运动
        update: bool,
    },
    Running(M),
}

impl<R, M> MotionSlot<R, M> {
    pub fn is_running(&self) -> bool {
        matches!(self, MotionSlot::Running(_))
    }
}

/// 待启动的步行
#[derive(Debug, Clone, PartialEq)]
pub struct WalkingStart {
    pub command: FootStepCommand,
    pub preview: PreviewMatrix,
}

/// 控制状态
#[derive(Debug, Default)]
pub enum ControlState {
    #[default]
    Idle,
    Joint(MotionSlot<JointPoseGoal, JointMotion>),
    Offset(MotionSlot<BodyOffset, OffsetMotion>),
    Wholebody(MotionSlot<WholebodyGoal, WholebodyMotion>),
    Walking(MotionSlot<WalkingStart, WalkingMotion>),
}

impl ControlState {
    pub fn mode(&self) -> ControlMode {
        match self {
            ControlState::Idle => ControlMode::None,
            ControlState::Joint(_) => ControlMode::Joint,
            ControlState::Offset(_) => ControlMode::Offset,
            ControlState::Wholebody(_) => ControlMode::Wholebody,
            ControlState::Walking(_) => ControlMode::Walking,
        }
    }

    /// 是否有运动源在运行
    pub fn is_moving(&self) -> bool {
        match self {
            ControlState::Idle => false,
            ControlState::Joint(slot) => slot.is_running(),
            ControlState::Offset(slot) => slot.is_running(),
            ControlState::Wholebody(slot) => slot.is_running(),
            ControlState::Walking(slot) => slot.is_running(),
        }
    }
}

/// 仲裁请求（只包含判断所需的信息）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    JointPose,
    BodyOffset,
    Wholebody(TaskGroup),
    FootStep,
}

impl Request {
    fn command(self) -> &'static str {
        match self {
            Request::JointPose => "joint_pose",
            Request::BodyOffset => "body_offset",
            Request::Wholebody(_) => "wholebody",
            Request::FootStep => "foot_step",
        }
    }

    fn mode(self) -> ControlMode {
        match self {
            Request::JointPose => ControlMode::Joint,
            Request::BodyOffset => ControlMode::Offset,
            Request::Wholebody(_) => ControlMode::Wholebody,
            Request::FootStep => ControlMode::Walking,
        }
    }

    fn needs_balance(self) -> bool {
        !matches!(self, Request::JointPose)
    }
}

/// 仲裁结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// 从空闲启动
    Start,
    /// 替换同类运动
    Update,
    /// 接受但不执行
    Ignore(&'static str),
}

pub const WARN_BALANCE_OFF: &str = "[WARN] Balance is off!";
pub const WARN_CONTROL_TYPE: &str = "[WARN] Control type is different!";
pub const WARN_CONTROL_GROUP: &str = "[WARN] Control group is different!";
pub const WARN_TASK_ALIVE: &str = "[WARN] Previous task is alive!";

/// 判断请求能否被接受
///
/// # 错误
///
/// 前置条件不满足时返回 [`ControlError::CommandRejected`]，
/// `reason` 为对外发布的警告文本。
pub fn admit(
    state: &ControlState,
    balance: BalanceMode,
    request: Request,
) -> Result<Admission, ControlError> {
    let command = request.command();

    if request.needs_balance() && balance != BalanceMode::On {
        return Err(ControlError::rejected(command, WARN_BALANCE_OFF));
    }

    let mode = state.mode();
    if mode == ControlMode::None {
        return Ok(Admission::Start);
    }
    if mode != request.mode() {
        return Err(ControlError::rejected(command, WARN_CONTROL_TYPE));
    }

    match (request, state) {
        (Request::Wholebody(group), ControlState::Wholebody(slot)) => {
            let current = match slot {
                MotionSlot::Pending { request, .. } => request.group,
                MotionSlot::Running(motion) => motion.group(),
            };
            if current != group {
                Err(ControlError::rejected(command, WARN_CONTROL_GROUP))
            } else {
                Ok(Admission::Update)
            }
        },
        (Request::FootStep, _) => Ok(Admission::Ignore(WARN_TASK_ALIVE)),
        _ => Ok(Admission::Update),
    }
}

// ==================== 增益渐变 ====================

/// 渐变本周期的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RampProgress {
    Idle,
    Running(f64),
    /// 本周期结束，携带最终比例
    Finished(f64),
}

#[derive(Debug, Clone)]
struct ActiveRamp {
    trajectory: MinimumJerk<1>,
    clock: StepClock,
}

/// 平衡增益比例 ∈ [0, 1]，按最小加加速度曲线在 1 秒内渐变
#[derive(Debug, Clone, Default)]
pub struct GainRamp {
    ratio: f64,
    target: f64,
    active: Option<ActiveRamp>,
}

impl GainRamp {
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// 从当前比例开始向 `target` 渐变；返回是否替换了进行中的渐变
    pub fn arm(&mut self, target: f64, control_cycle: f64) -> bool {
        let update = self.active.is_some();
        self.target = target.clamp(0.0, 1.0);
        self.active = Some(ActiveRamp {
            trajectory: MinimumJerk::rest_to_rest(
                0.0,
                BALANCE_RAMP_TIME,
                [self.ratio],
                [self.target],
            ),
            clock: StepClock::new(BALANCE_RAMP_TIME, control_cycle),
        });
        update
    }

    /// 立即设定比例（取消进行中的渐变）
    pub fn set_immediate(&mut self, ratio: f64) {
        self.ratio = ratio.clamp(0.0, 1.0);
        self.target = self.ratio;
        self.active = None;
    }

    pub fn tick(&mut self, control_cycle: f64) -> RampProgress {
        let Some(ramp) = self.active.as_mut() else {
            return RampProgress::Idle;
        };

        let t = ramp.clock.time(control_cycle);
        self.ratio = ramp.trajectory.position(t)[0].clamp(0.0, 1.0);

        if ramp.clock.advance() {
            self.ratio = self.target;
            self.active = None;
            RampProgress::Finished(self.ratio)
        } else {
            RampProgress::Running(self.ratio)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use wbc_protocol::Pose6D;

    fn joint_goal() -> JointPoseGoal {
        JointPoseGoal {
            goals: vec![],
            mov_time: 1.0,
        }
    }

    #[test]
    fn test_joint_pose_from_idle() {
        let state = ControlState::Idle;
        assert_eq!(
            admit(&state, BalanceMode::Off, Request::JointPose),
            Ok(Admission::Start)
        );
    }

    #[test]
    fn test_joint_pose_updates_joint() {
        let state = ControlState::Joint(MotionSlot::Pending {
            request: joint_goal(),
            update: false,
        });
        assert_eq!(
            admit(&state, BalanceMode::Off, Request::JointPose),
            Ok(Admission::Update)
        );
    }

    #[test]
    fn test_walking_rejected_while_offset_and_balance_off() {
        let state = ControlState::Offset(MotionSlot::Pending {
            request: BodyOffset::new(0.01, 0.0, 0.0),
            update: false,
        });
        let err = admit(&state, BalanceMode::Off, Request::FootStep).unwrap_err();
        assert_eq!(err, ControlError::rejected("foot_step", WARN_BALANCE_OFF));
    }

    #[test]
    fn test_mode_mismatch() {
        let state = ControlState::Joint(MotionSlot::Pending {
            request: joint_goal(),
            update: false,
        });
        assert_eq!(
            admit(&state, BalanceMode::On, Request::BodyOffset),
            Err(ControlError::rejected("body_offset", WARN_CONTROL_TYPE))
        );
    }

    #[test]
    fn test_wholebody_group_mismatch() {
        let goal = WholebodyGoal {
            group: TaskGroup::Body,
            mov_time: 1.0,
            pose: Pose6D::identity(),
        };
        let state = ControlState::Wholebody(MotionSlot::Pending {
            request: goal,
            update: false,
        });

        assert_eq!(
            admit(&state, BalanceMode::On, Request::Wholebody(TaskGroup::LeftLeg)),
            Err(ControlError::rejected("wholebody", WARN_CONTROL_GROUP))
        );
        assert_eq!(
            admit(&state, BalanceMode::On, Request::Wholebody(TaskGroup::Body)),
            Ok(Admission::Update)
        );
    }

    #[test]
    fn test_footstep_while_walking_is_ignored() {
        let state = ControlState::Walking(MotionSlot::Pending {
            request: WalkingStart {
                command: FootStepCommand {
                    direction: wbc_protocol::StepDirection::Forward,
                    step_num: 1,
                    step_time: 0.5,
                    step_length: 0.02,
                    side_step_length: 0.0,
                    step_angle: 0.0,
                },
                preview: PreviewMatrix {
                    lipm_height: 0.12,
                    control_cycle: 0.008,
                    k: [0.0; 3],
                    f: vec![],
                },
            },
            update: false,
        });
        assert_eq!(
            admit(&state, BalanceMode::On, Request::FootStep),
            Ok(Admission::Ignore(WARN_TASK_ALIVE))
        );
    }

    #[test]
    fn test_ramp_reaches_target() {
        let mut ramp = GainRamp::default();
        assert!(!ramp.arm(1.0, 0.008));

        let mut ticks = 0;
        loop {
            ticks += 1;
            if let RampProgress::Finished(ratio) = ramp.tick(0.008) {
                assert_eq!(ratio, 1.0);
                break;
            }
        }
        assert_eq!(ticks, 126);
        assert!(!ramp.is_active());
        assert_eq!(ramp.tick(0.008), RampProgress::Idle);
    }

    #[test]
    fn test_set_immediate_cancels_ramp() {
        let mut ramp = GainRamp::default();
        ramp.arm(1.0, 0.008);
        ramp.tick(0.008);
        ramp.set_immediate(0.0);

        assert_eq!(ramp.ratio(), 0.0);
        assert!(!ramp.is_active());
    }

    proptest! {
        #[test]
        fn test_ramp_is_monotone_and_bounded(start in 0.0f64..=1.0, up in any::<bool>()) {
            let mut ramp = GainRamp::default();
            ramp.set_immediate(start);
            let target = if up { 1.0 } else { 0.0 };
            ramp.arm(target, 0.008);

            let mut last = start;
            loop {
                let progress = ramp.tick(0.008);
                let ratio = ramp.ratio();
                prop_assert!((0.0..=1.0).contains(&ratio));
                if up {
                    prop_assert!(ratio >= last - 1e-12);
                } else {
                    prop_assert!(ratio <= last + 1e-12);
                }
                last = ratio;
                if matches!(progress, RampProgress::Finished(_)) {
                    break;
                }
            }
            prop_assert_eq!(ramp.ratio(), target);
        }
    }
}
