//! 全身控制器
//!
//! [`WholebodyController`] 持有全部控制状态，`tick` 每个控制周期调用一次：
//!
//! 1. 陀螺仪补偿量
//! 2. 首个周期（或硬复位后）采用执行器当前目标位置作为期望位置
//! 3. 推进当前运动源
//! 4. 平衡开启时：推进增益渐变 → 目标地面反力 → 平衡修正 + 逆运动学
//!    （逆解失败立即中止：平衡 OFF、模式 NONE、名义站姿）
//! 5. 命令整形：`desired + 前馈 + PD 反馈 + 陀螺仪补偿`
//!
//! 命令通过 [`WholebodyController::handle_command`] 提交，在调用线程内完成仲裁；
//! 状态通知随下一次 `tick` 的输出发布。
//!
//! # 示例
//!
//! ```rust
//! use wbc_control::{ControlCommand, ControllerConfig, TickInput, WholebodyController};
//! use wbc_protocol::{ControlMode, Joint, JointPoseGoal};
//!
//! let mut controller = WholebodyController::new(ControllerConfig::default());
//! controller
//!     .handle_command(ControlCommand::JointPose(JointPoseGoal {
//!         goals: vec![(Joint::RKnee, 0.5)],
//!         mov_time: 1.0,
//!     }))
//!     .unwrap();
//!
//! let input = TickInput::default();
//! for _ in 0..126 {
//!     controller.tick(&input);
//! }
//! assert_eq!(controller.mode(), ControlMode::None);
//! assert_eq!(controller.desired_joints()[Joint::RKnee], 0.5);
//! ```

use crate::arbiter::{
    Admission, ControlState, GainRamp, MotionSlot, RampProgress, Request, WalkingStart, admit,
};
use crate::balance::{
    BalanceController, BalanceCorrector, BalanceStatus, CorrectionRequest, PdBalanceController,
};
use crate::error::ControlError;
use crate::grf::{TargetGrf, schedule};
use crate::kinematics::{AnalyticLegKinematics, LegKinematics};
use crate::motion::{
    DesiredState, JointMotion, JointState, MinimumJerkBlender, MotionSource, OffsetMotion,
    PreviewWalkingGenerator, Progress, WalkingGenerator, WalkingMotion, WalkingRequest,
    WholebodyMotion, WholebodyPlanner,
};
use crate::preview::PreviewMatrix;
use crate::sensor::SensorFrame;
use crate::shaper::{CommandShaper, feedforward, sensory_offsets};
use nalgebra::Vector3;
use smallvec::SmallVec;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use wbc_protocol::{
    ActuatorFeedback, BalanceMode, BalanceToken, BodyOffset, ControlMode, FootStepCommand,
    JointArray, JointPoseGoal, Leg, Pose6D, StancePoses, StatusLevel, StatusMessage, TaskGroup,
    WalkingParam, WalkingPhase, WholebodyGoal,
};
use wbc_tools::{GainSet, ModuleConfig};

/// 单周期计算时间的软预算
pub const CALC_TIME_BUDGET: Duration = Duration::from_millis(3);

pub const FAIL_TASK_SPACE: &str = "[FAIL] Task Space Control";
pub const FAIL_PREVIEW_MATRIX: &str = "[FAIL] Cannot get preview matrix";

/// 控制器配置
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    /// 控制周期（秒）
    pub control_cycle: f64,
    /// 整机质量（kg）
    pub total_mass: f64,
    /// 初始足间距（米）
    pub foot_distance: f64,
    /// 初始步态参数
    pub walking: WalkingParam,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            control_cycle: 0.008,
            total_mass: 3.5,
            foot_distance: wbc_protocol::DEFAULT_FOOT_DISTANCE,
            walking: WalkingParam::default(),
        }
    }
}

impl From<&ModuleConfig> for ControllerConfig {
    fn from(config: &ModuleConfig) -> Self {
        Self {
            control_cycle: config.control_cycle,
            total_mass: config.total_mass,
            foot_distance: config.foot_distance,
            walking: config.walking,
        }
    }
}

/// 已解析的控制命令
///
/// 与 [`wbc_protocol::Command`] 的区别：需要慢速资源的命令（预观增益、增益文件）
/// 已经在非实时线程中准备好。
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    JointPose(JointPoseGoal),
    BodyOffset(BodyOffset),
    Wholebody(WholebodyGoal),
    /// `preview` 为 `None` 表示获取预观增益失败
    FootStep {
        command: FootStepCommand,
        preview: Option<PreviewMatrix>,
    },
    WalkingParam(WalkingParam),
    /// `gains` 为 `None` 表示重新加载失败，保留原增益
    Balance {
        token: BalanceToken,
        gains: Option<GainSet>,
    },
    ResetBody,
    FootDistance(f64),
    Gains(GainSet),
}

impl ControlCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ControlCommand::JointPose(_) => "joint_pose",
            ControlCommand::BodyOffset(_) => "body_offset",
            ControlCommand::Wholebody(_) => "wholebody",
            ControlCommand::FootStep { .. } => "foot_step",
            ControlCommand::WalkingParam(_) => "walking_param",
            ControlCommand::Balance { .. } => "balance",
            ControlCommand::ResetBody => "reset_body",
            ControlCommand::FootDistance(_) => "foot_distance",
            ControlCommand::Gains(_) => "gains",
        }
    }
}

/// 控制事件
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    /// 状态通知
    Status(StatusMessage),
    /// 运动正常结束
    MovementDone(ControlMode),
    /// 平衡修正失败，运动被中止
    Aborted(ControlError),
}

pub type ControlEvents = SmallVec<[ControlEvent; 4]>;

/// 单周期输入
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickInput {
    pub sensors: SensorFrame,
    pub actuators: ActuatorFeedback,
}

/// 单周期输出
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutput {
    /// 发送给执行器的关节目标
    pub command: JointArray<f64>,
    /// 期望关节角快照
    pub desired: JointArray<f64>,
    pub events: ControlEvents,
    pub compute_time: Duration,
}

/// 控制器状态快照（供其他线程查询）
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSnapshot {
    pub mode: ControlMode,
    pub balance: BalanceMode,
    pub gain_ratio: f64,
    pub phase: WalkingPhase,
    pub support: Leg,
    pub is_moving: bool,
    /// 是否已采用执行器目标位置
    pub initialized: bool,
    pub desired_joints: JointArray<f64>,
    pub stance: StancePoses,
    pub body_offset: Vector3<f64>,
    pub balance_status: BalanceStatus,
}

/// 期望关节角来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DesiredSource {
    /// 下一个周期从执行器目标位置初始化
    AwaitingActuators,
    Tracking,
}

/// 运动源推进结果
enum Outcome<S> {
    Continue(S),
    Finished,
    Failed,
}

fn publish(events: &mut ControlEvents, message: StatusMessage) {
    match message.level {
        StatusLevel::Info => info!("{}", message.message),
        StatusLevel::Warn => warn!("{}", message.message),
        StatusLevel::Error => error!("{}", message.message),
    }
    events.push(ControlEvent::Status(message));
}

fn start_label(update: bool) -> &'static str {
    if update { "UPDATE" } else { "START" }
}

/// 控制器构造器
pub struct WholebodyControllerBuilder {
    config: ControllerConfig,
    gains: GainSet,
    balance: Option<Box<dyn BalanceController>>,
    kinematics: Option<Box<dyn LegKinematics>>,
    planner: Option<Box<dyn WholebodyPlanner>>,
    walking: Option<Box<dyn WalkingGenerator>>,
}

impl WholebodyControllerBuilder {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            gains: GainSet::default(),
            balance: None,
            kinematics: None,
            planner: None,
            walking: None,
        }
    }

    /// 初始增益（默认全 0）
    pub fn gains(mut self, gains: GainSet) -> Self {
        self.gains = gains;
        self
    }

    /// 平衡控制器（默认 [`PdBalanceController`]）
    pub fn balance_controller(mut self, controller: Box<dyn BalanceController>) -> Self {
        self.balance = Some(controller);
        self
    }

    /// 腿部运动学（默认 [`AnalyticLegKinematics`]）
    pub fn kinematics(mut self, kinematics: Box<dyn LegKinematics>) -> Self {
        self.kinematics = Some(kinematics);
        self
    }

    /// 全身运动规划器（默认 [`MinimumJerkBlender`]）
    pub fn wholebody_planner(mut self, planner: Box<dyn WholebodyPlanner>) -> Self {
        self.planner = Some(planner);
        self
    }

    /// 步态生成器（默认 [`PreviewWalkingGenerator`]）
    pub fn walking_generator(mut self, generator: Box<dyn WalkingGenerator>) -> Self {
        self.walking = Some(generator);
        self
    }

    pub fn build(self) -> WholebodyController {
        let cycle = self.config.control_cycle;
        let balance = self
            .balance
            .unwrap_or_else(|| Box::new(PdBalanceController::new(cycle)));
        let kinematics = self
            .kinematics
            .unwrap_or_else(|| Box::new(AnalyticLegKinematics::default()));

        let mut shaper = CommandShaper::new();
        shaper.set_gains(&self.gains.feedback);

        let mut desired = DesiredState::default();
        desired.reset_body(self.config.foot_distance);

        WholebodyController {
            walking_param: self.config.walking,
            foot_distance: self.config.foot_distance,
            config: self.config,
            gains: self.gains,
            state: ControlState::Idle,
            balance: BalanceMode::Off,
            ramp: GainRamp::default(),
            desired,
            source: DesiredSource::AwaitingActuators,
            balance_status: BalanceStatus::NO_ERROR,
            corrector: BalanceCorrector::new(balance, kinematics),
            shaper,
            planner: self.planner.unwrap_or_else(|| Box::new(MinimumJerkBlender)),
            walking: self
                .walking
                .unwrap_or_else(|| Box::new(PreviewWalkingGenerator)),
            events: ControlEvents::new(),
        }
    }
}

/// 平衡感知的全身控制器
pub struct WholebodyController {
    config: ControllerConfig,
    gains: GainSet,
    walking_param: WalkingParam,
    foot_distance: f64,

    state: ControlState,
    balance: BalanceMode,
    ramp: GainRamp,
    desired: DesiredState,
    source: DesiredSource,
    balance_status: BalanceStatus,

    corrector: BalanceCorrector,
    shaper: CommandShaper,
    planner: Box<dyn WholebodyPlanner>,
    walking: Box<dyn WalkingGenerator>,

    /// 待发布的事件（命令处理产生）
    events: ControlEvents,
}

impl std::fmt::Debug for WholebodyController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WholebodyController")
            .field("mode", &self.state.mode())
            .field("balance", &self.balance)
            .field("gain_ratio", &self.ramp.ratio())
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl WholebodyController {
    /// 使用默认协作组件创建控制器
    pub fn new(config: ControllerConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: ControllerConfig) -> WholebodyControllerBuilder {
        WholebodyControllerBuilder::new(config)
    }

    // ==================== 命令 ====================

    /// 处理一条命令
    ///
    /// # 错误
    ///
    /// - [`ControlError::CommandRejected`]：前置条件不满足，状态不变
    /// - [`ControlError::PreviewUnavailable`]：步行命令缺少预观增益，命令被丢弃
    pub fn handle_command(&mut self, command: ControlCommand) -> Result<(), ControlError> {
        debug!(command = command.name(), "handle command");
        let result = self.apply_command(command);

        match &result {
            Err(ControlError::CommandRejected { reason, .. }) => {
                publish(&mut self.events, StatusMessage::warn(reason.clone()));
            },
            Err(ControlError::PreviewUnavailable(_)) => {
                publish(&mut self.events, StatusMessage::error(FAIL_PREVIEW_MATRIX));
            },
            Err(err) => {
                publish(&mut self.events, StatusMessage::error(err.to_string()));
            },
            Ok(()) => {},
        }
        result
    }

    fn apply_command(&mut self, command: ControlCommand) -> Result<(), ControlError> {
        let update = self.state.is_moving();

        match command {
            ControlCommand::JointPose(goal) => {
                admit(&self.state, self.balance, Request::JointPose)?;
                self.balance = BalanceMode::Off;
                self.ramp.set_immediate(0.0);
                self.state = ControlState::Joint(MotionSlot::Pending {
                    request: goal,
                    update,
                });
            },
            ControlCommand::BodyOffset(offset) => {
                admit(&self.state, self.balance, Request::BodyOffset)?;
                self.state = ControlState::Offset(MotionSlot::Pending {
                    request: offset,
                    update,
                });
            },
            ControlCommand::Wholebody(goal) => {
                admit(&self.state, self.balance, Request::Wholebody(goal.group))?;
                self.state = ControlState::Wholebody(MotionSlot::Pending {
                    request: goal,
                    update,
                });
            },
            ControlCommand::FootStep { command, preview } => {
                if let Admission::Ignore(reason) =
                    admit(&self.state, self.balance, Request::FootStep)?
                {
                    publish(&mut self.events, StatusMessage::warn(reason));
                    return Ok(());
                }
                let preview = preview.ok_or_else(|| {
                    ControlError::PreviewUnavailable("no preview matrix for footstep".to_string())
                })?;
                self.state = ControlState::Walking(MotionSlot::Pending {
                    request: WalkingStart { command, preview },
                    update: false,
                });
            },
            ControlCommand::WalkingParam(param) => {
                self.walking_param = param;
            },
            ControlCommand::Balance { token, gains } => {
                if let Some(gains) = gains {
                    self.set_gains(gains);
                }
                let update = self
                    .ramp
                    .arm(token.target_ratio(), self.config.control_cycle);
                publish(
                    &mut self.events,
                    StatusMessage::info(format!("[{}] Balance Gain", start_label(update))),
                );
                self.balance = BalanceMode::On;
                self.desired.gait.phase = WalkingPhase::Dsp;
            },
            ControlCommand::ResetBody => {
                self.desired.reset_body(self.foot_distance);
                self.sync_zmp_offset();
                debug!("body pose reset");
            },
            ControlCommand::FootDistance(distance) => {
                self.foot_distance = distance;
            },
            ControlCommand::Gains(gains) => {
                self.set_gains(gains);
            },
        }
        Ok(())
    }

    /// 回到名义站姿（保留躯干偏移），ZMP 前后偏移跟随躯干
    fn reset_stance(&mut self) {
        self.desired.reset_stance(self.foot_distance);
        self.sync_zmp_offset();
    }

    fn sync_zmp_offset(&mut self) {
        self.walking_param.zmp_offset_x = self.desired.stance.body.position.x;
    }

    fn set_gains(&mut self, gains: GainSet) {
        self.shaper.set_gains(&gains.feedback);
        self.gains = gains;
    }

    /// 硬复位：清空期望轨迹和全部模式状态，下一个周期重新采用执行器目标位置
    pub fn stop(&mut self) {
        self.state = ControlState::Idle;
        self.balance = BalanceMode::Off;
        self.ramp.set_immediate(0.0);
        self.desired.joints = JointState::default();
        self.desired.reset_body(self.foot_distance);
        self.source = DesiredSource::AwaitingActuators;
        self.balance_status = BalanceStatus::NO_ERROR;
        self.corrector.reset();
        self.shaper.reset();
        info!("wholebody controller stopped");
    }

    // ==================== 控制周期 ====================

    /// 执行一个控制周期
    pub fn tick(&mut self, input: &TickInput) -> TickOutput {
        let started = Instant::now();
        let mut events = std::mem::take(&mut self.events);

        let sensory = sensory_offsets(&input.sensors.gyro(), &self.gains.balance);

        if self.source == DesiredSource::AwaitingActuators {
            self.desired.joints = JointState::at_rest(input.actuators.goal);
            self.source = DesiredSource::Tracking;
            debug!("desired joints initialised from actuator goals");
        }

        self.advance_motion(&mut events);

        if self.balance == BalanceMode::On {
            self.advance_ramp(&mut events);
        }
        if self.balance == BalanceMode::On {
            self.apply_balance(&input.sensors, &mut events);
        }

        let ff = if self.state.mode() == ControlMode::Walking {
            feedforward(
                &self.gains.feedforward,
                self.desired.gait.feedforward,
                self.desired.gait.support,
            )
        } else {
            JointArray::splat(0.0)
        };
        let command = self.shaper.shape(
            &self.desired.joints.position,
            &input.actuators.present,
            &ff,
            &sensory,
        );

        let compute_time = started.elapsed();
        if compute_time > CALC_TIME_BUDGET {
            warn!(
                "[Wholebody Module] Calc Time: {:.3} ms",
                compute_time.as_secs_f64() * 1000.0
            );
        }

        TickOutput {
            command,
            desired: self.desired.joints.position,
            events,
            compute_time,
        }
    }

    /// 初始化（如需要）并推进一个运动源
    fn drive<R, M: MotionSource>(
        &mut self,
        slot: MotionSlot<R, M>,
        init: impl FnOnce(&mut Self, R) -> Result<M, ControlError>,
        events: &mut ControlEvents,
    ) -> Outcome<MotionSlot<R, M>> {
        let mut motion = match slot {
            MotionSlot::Running(motion) => motion,
            MotionSlot::Pending { request, update } => match init(self, request) {
                Ok(motion) => {
                    publish(
                        events,
                        StatusMessage::info(format!("[{}] {}", start_label(update), motion.name())),
                    );
                    motion
                },
                Err(err) => {
                    error!(%err, "failed to start motion");
                    let text = match err {
                        ControlError::PreviewUnavailable(_) => FAIL_PREVIEW_MATRIX.to_string(),
                        other => other.to_string(),
                    };
                    publish(events, StatusMessage::error(text));
                    return Outcome::Failed;
                },
            },
        };

        match motion.tick(&mut self.desired) {
            Progress::Running => Outcome::Continue(MotionSlot::Running(motion)),
            Progress::Finished => {
                publish(events, StatusMessage::info(format!("[END] {}", motion.name())));
                Outcome::Finished
            },
        }
    }

    fn advance_motion(&mut self, events: &mut ControlEvents) {
        let cycle = self.config.control_cycle;
        let mode = self.state.mode();

        let outcome = match std::mem::take(&mut self.state) {
            ControlState::Idle => Outcome::Continue(ControlState::Idle),
            ControlState::Joint(slot) => wrap(
                self.drive(
                    slot,
                    |c, goal| Ok(JointMotion::new(&goal, &c.desired.joints, cycle)),
                    events,
                ),
                ControlState::Joint,
            ),
            ControlState::Offset(slot) => wrap(
                self.drive(
                    slot,
                    |c, offset| Ok(OffsetMotion::new(&offset, &c.desired.body_offset, cycle)),
                    events,
                ),
                ControlState::Offset,
            ),
            ControlState::Wholebody(slot) => wrap(
                self.drive(
                    slot,
                    |c, goal| {
                        Ok(WholebodyMotion::new(
                            &goal,
                            &c.desired.stance,
                            c.planner.as_ref(),
                            cycle,
                        ))
                    },
                    events,
                ),
                ControlState::Wholebody,
            ),
            ControlState::Walking(slot) => wrap(
                self.drive(slot, |c, start| c.start_walking(start), events),
                ControlState::Walking,
            ),
        };

        self.state = match outcome {
            Outcome::Continue(state) => state,
            Outcome::Finished => {
                if mode == ControlMode::Walking {
                    self.reset_stance();
                }
                events.push(ControlEvent::MovementDone(mode));
                ControlState::Idle
            },
            Outcome::Failed => ControlState::Idle,
        };
    }

    fn start_walking(&mut self, start: WalkingStart) -> Result<WalkingMotion, ControlError> {
        let cycle = self.config.control_cycle;
        let pattern = self.walking.start(WalkingRequest {
            command: start.command,
            param: self.walking_param,
            control_cycle: cycle,
            foot_distance: self.foot_distance,
            start: self.desired.stance,
            lipm: self.desired.gait.lipm,
            preview: start.preview,
        })?;
        Ok(WalkingMotion::new(
            pattern,
            &start.command,
            self.walking_param.dsp_ratio,
            cycle,
        ))
    }

    fn advance_ramp(&mut self, events: &mut ControlEvents) {
        if let RampProgress::Finished(ratio) = self.ramp.tick(self.config.control_cycle) {
            publish(events, StatusMessage::info("[END] Balance Gain"));
            if ratio == 0.0 {
                self.balance = BalanceMode::Off;
                self.state = ControlState::Idle;
                debug!("balance gain ramped to zero, balance off");
            }
        }
    }

    /// 当前周期的目标地面反力
    pub fn target_grf(&self) -> TargetGrf {
        let gait = &self.desired.gait;
        schedule(
            self.config.total_mass,
            gait.lipm.acceleration(),
            gait.phase,
            gait.support,
        )
    }

    fn apply_balance(&mut self, sensors: &SensorFrame, events: &mut ControlEvents) {
        let grf = self.target_grf();
        let result = self.corrector.correct(&CorrectionRequest {
            stance: &self.desired.stance,
            sensors,
            target_grf: &grf,
            cob_offset: self.desired.body_offset,
            gains: &self.gains.balance,
            ratio: self.ramp.ratio(),
            seed: &self.desired.joints.position,
        });

        match result {
            Ok(correction) => {
                self.desired.joints.position = correction.joints;
                self.balance_status = correction.status;
            },
            Err(err) => self.abort(err, events),
        }
    }

    /// 平衡修正失败：中止运动，回到安全站姿
    fn abort(&mut self, err: ControlError, events: &mut ControlEvents) {
        error!(%err, "balance correction failed");
        self.state = ControlState::Idle;
        self.balance = BalanceMode::Off;
        self.ramp.set_immediate(0.0);
        self.corrector.reset();
        self.reset_stance();
        publish(events, StatusMessage::error(FAIL_TASK_SPACE));
        events.push(ControlEvent::Aborted(err));
    }

    // ==================== 查询 ====================

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn gains(&self) -> &GainSet {
        &self.gains
    }

    pub fn walking_param(&self) -> &WalkingParam {
        &self.walking_param
    }

    pub fn foot_distance(&self) -> f64 {
        self.foot_distance
    }

    pub fn mode(&self) -> ControlMode {
        self.state.mode()
    }

    pub fn balance(&self) -> BalanceMode {
        self.balance
    }

    pub fn gain_ratio(&self) -> f64 {
        self.ramp.ratio()
    }

    /// 是否有运动（含待初始化的运动）
    pub fn is_moving(&self) -> bool {
        self.state.mode() != ControlMode::None
    }

    pub fn desired(&self) -> &DesiredState {
        &self.desired
    }

    pub fn desired_joints(&self) -> &JointArray<f64> {
        &self.desired.joints.position
    }

    /// 当前期望关节角（关节名 → 角度）
    pub fn joint_pose(&self) -> Vec<(&'static str, f64)> {
        self.desired
            .joints
            .position
            .iter_joints()
            .map(|(joint, angle)| (joint.name(), *angle))
            .collect()
    }

    /// 任务组的世界系期望位姿
    pub fn task_pose(&self, group: TaskGroup) -> Pose6D {
        let stance = &self.desired.stance;
        match group {
            TaskGroup::Body => stance.body,
            TaskGroup::LeftLeg => stance.left_foot,
            TaskGroup::RightLeg => stance.right_foot,
        }
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            mode: self.state.mode(),
            balance: self.balance,
            gain_ratio: self.ramp.ratio(),
            phase: self.desired.gait.phase,
            support: self.desired.gait.support,
            is_moving: self.is_moving(),
            initialized: self.source == DesiredSource::Tracking,
            desired_joints: self.desired.joints.position,
            stance: self.desired.stance,
            body_offset: self.desired.body_offset,
            balance_status: self.balance_status,
        }
    }
}

fn wrap<S, T>(outcome: Outcome<S>, f: impl FnOnce(S) -> T) -> Outcome<T> {
    match outcome {
        Outcome::Continue(slot) => Outcome::Continue(f(slot)),
        Outcome::Finished => Outcome::Finished,
        Outcome::Failed => Outcome::Failed,
    }
}
