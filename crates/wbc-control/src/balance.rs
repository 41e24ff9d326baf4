//! 平衡修正
//!
//! [`BalanceCorrector`] 每个周期执行：
//!
//! 1. 世界系期望位姿 → 躯干相对位姿（躯干自身为单位位姿）
//! 2. IMU 姿态 → roll/pitch
//! 3. 足底力转到躯干系
//! 4. 调用 [`BalanceController`]（增益按渐变比例缩放）得到修正量
//! 5. `corrected_rel = rel · correction`，`world = body · corrected_rel`
//! 6. 双腿逆运动学
//!
//! 逆解失败时返回错误，由调用方中止当前运动；成功时返回 12 个关节角。

use crate::error::ControlError;
use crate::filter::{LowPassFilter, PdController};
use crate::grf::TargetGrf;
use crate::kinematics::LegKinematics;
use crate::sensor::{SensorFrame, imu_roll_pitch, wrench_to_body};
use nalgebra::{UnitQuaternion, Vector3};
use tracing::trace;
use wbc_protocol::{FootPair, JointArray, Leg, Pose6D, StancePoses, Wrench};
use wbc_tools::BalanceGains;

/// 平衡控制状态码（位标志）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BalanceStatus(u32);

impl BalanceStatus {
    pub const NO_ERROR: Self = Self(0);
    /// 质心修正量被限幅
    pub const COB_LIMITED: Self = Self(1 << 0);
    /// 足部高度修正量被限幅
    pub const FOOT_Z_LIMITED: Self = Self(1 << 1);
    /// 足部角度修正量被限幅
    pub const FOOT_ANGLE_LIMITED: Self = Self(1 << 2);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub const fn is_ok(self) -> bool {
        self.0 == 0
    }
}

/// 平衡控制器输入（躯干相对系）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceInput {
    /// 角速度 (roll, pitch)
    pub gyro: (f64, f64),
    /// 当前姿态 (roll, pitch)
    pub orientation: (f64, f64),
    /// 期望姿态 (roll, pitch)
    pub desired_orientation: (f64, f64),
    /// 当前足底力（躯干系）
    pub wrench: FootPair<Wrench>,
    /// 目标足底力
    pub desired_wrench: FootPair<Wrench>,
    /// 期望位姿（躯干相对系，躯干为单位位姿）
    pub desired: StancePoses,
    /// 质心手动偏移
    pub cob_offset: Vector3<f64>,
}

/// 平衡控制器输出：各部分的修正变换
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceOutput {
    pub body: Pose6D,
    pub feet: FootPair<Pose6D>,
    pub status: BalanceStatus,
}

impl Default for BalanceOutput {
    fn default() -> Self {
        Self {
            body: Pose6D::identity(),
            feet: FootPair::new(Pose6D::identity(), Pose6D::identity()),
            status: BalanceStatus::NO_ERROR,
        }
    }
}

/// 平衡控制器
pub trait BalanceController: Send {
    /// 设置增益（PD 增益乘以 `ratio`，截止频率逐通道设置）
    fn set_gains(&mut self, gains: &BalanceGains, ratio: f64);

    /// 计算修正量
    fn process(&mut self, input: &BalanceInput) -> BalanceOutput;

    /// 清除滤波器和微分状态
    fn reset(&mut self);
}

// ==================== PD 平衡控制器 ====================

/// 质心水平修正限幅（米）
pub const COB_ADJUSTMENT_LIMIT: f64 = 0.05;
/// 足部高度修正限幅（米）
pub const FOOT_Z_ADJUSTMENT_LIMIT: f64 = 0.05;
/// 足部角度修正限幅（rad）
pub const FOOT_ANGLE_ADJUSTMENT_LIMIT: f64 = 15.0 * std::f64::consts::PI / 180.0;

/// 单通道：低通 → PD
#[derive(Debug, Clone)]
struct Channel {
    lpf: LowPassFilter,
    pd: PdController,
}

impl Channel {
    fn new(control_cycle: f64) -> Self {
        Self {
            lpf: LowPassFilter::new(control_cycle, 0.0),
            pd: PdController::new(),
        }
    }

    fn configure(&mut self, gain: wbc_tools::PdGain, ratio: f64, cutoff: f64) {
        self.pd.set_gain(gain.scaled(ratio));
        self.lpf.set_cutoff(cutoff);
    }

    fn update(&mut self, desired: f64, present: f64) -> f64 {
        let filtered = self.lpf.filter(present);
        self.pd.update(desired, filtered)
    }

    fn reset(&mut self) {
        self.lpf.reset();
        self.pd.reset();
    }
}

/// 单脚力/力矩通道
#[derive(Debug, Clone)]
struct FootChannels {
    force_x: Channel,
    force_y: Channel,
    force_z: Channel,
    torque_roll: Channel,
    torque_pitch: Channel,
}

impl FootChannels {
    fn new(control_cycle: f64) -> Self {
        Self {
            force_x: Channel::new(control_cycle),
            force_y: Channel::new(control_cycle),
            force_z: Channel::new(control_cycle),
            torque_roll: Channel::new(control_cycle),
            torque_pitch: Channel::new(control_cycle),
        }
    }

    fn configure(&mut self, gains: &BalanceGains, ratio: f64) {
        self.force_x.configure(gains.foot_x_force, ratio, gains.foot_x_force_cutoff);
        self.force_y.configure(gains.foot_y_force, ratio, gains.foot_y_force_cutoff);
        self.force_z.configure(gains.foot_z_force, ratio, gains.foot_z_force_cutoff);
        self.torque_roll
            .configure(gains.foot_roll_torque, ratio, gains.foot_roll_torque_cutoff);
        self.torque_pitch
            .configure(gains.foot_pitch_torque, ratio, gains.foot_pitch_torque_cutoff);
    }

    fn reset(&mut self) {
        self.force_x.reset();
        self.force_y.reset();
        self.force_z.reset();
        self.torque_roll.reset();
        self.torque_pitch.reset();
    }
}

/// 基于 PD + 低通的平衡控制器
///
/// - 陀螺仪、姿态误差 → 双脚 roll/pitch 修正
/// - 各脚 z 向力误差 → 该脚高度修正
/// - 各脚 roll/pitch 力矩误差 → 该脚姿态修正
/// - 水平力误差 → 质心 x/y 修正
#[derive(Debug, Clone)]
pub struct PdBalanceController {
    roll_gyro: Channel,
    pitch_gyro: Channel,
    roll_angle: Channel,
    pitch_angle: Channel,
    feet: FootPair<FootChannels>,
}

impl PdBalanceController {
    /// 创建控制器（初始增益为 0）
    pub fn new(control_cycle: f64) -> Self {
        Self {
            roll_gyro: Channel::new(control_cycle),
            pitch_gyro: Channel::new(control_cycle),
            roll_angle: Channel::new(control_cycle),
            pitch_angle: Channel::new(control_cycle),
            feet: FootPair::new(
                FootChannels::new(control_cycle),
                FootChannels::new(control_cycle),
            ),
        }
    }
}

fn limit(value: f64, bound: f64, status: &mut BalanceStatus, flag: BalanceStatus) -> f64 {
    if value.abs() > bound {
        status.insert(flag);
    }
    value.clamp(-bound, bound)
}

impl BalanceController for PdBalanceController {
    fn set_gains(&mut self, gains: &BalanceGains, ratio: f64) {
        self.roll_gyro
            .configure(gains.foot_roll_gyro, ratio, gains.roll_gyro_cutoff);
        self.pitch_gyro
            .configure(gains.foot_pitch_gyro, ratio, gains.pitch_gyro_cutoff);
        self.roll_angle
            .configure(gains.foot_roll_angle, ratio, gains.roll_angle_cutoff);
        self.pitch_angle
            .configure(gains.foot_pitch_angle, ratio, gains.pitch_angle_cutoff);
        self.feet.left.configure(gains, ratio);
        self.feet.right.configure(gains, ratio);
    }

    fn process(&mut self, input: &BalanceInput) -> BalanceOutput {
        let mut status = BalanceStatus::NO_ERROR;

        // 期望角速度为 0
        let foot_roll = self.roll_gyro.update(0.0, input.gyro.0)
            + self.roll_angle.update(input.desired_orientation.0, input.orientation.0);
        let foot_pitch = self.pitch_gyro.update(0.0, input.gyro.1)
            + self.pitch_angle.update(input.desired_orientation.1, input.orientation.1);

        let mut cob = Vector3::zeros();
        let mut feet = FootPair::new(Pose6D::identity(), Pose6D::identity());

        for leg in [Leg::Left, Leg::Right] {
            let channels = self.feet.get_mut(leg);
            let present = input.wrench.get(leg);
            let desired = input.desired_wrench.get(leg);

            cob.x += 0.5 * channels.force_x.update(desired.force.x, present.force.x);
            cob.y += 0.5 * channels.force_y.update(desired.force.y, present.force.y);
            let z = channels.force_z.update(desired.force.z, present.force.z);
            let roll = channels
                .torque_roll
                .update(desired.torque.x, present.torque.x);
            let pitch = channels
                .torque_pitch
                .update(desired.torque.y, present.torque.y);

            let z = limit(z, FOOT_Z_ADJUSTMENT_LIMIT, &mut status, BalanceStatus::FOOT_Z_LIMITED);
            let roll = limit(
                foot_roll + roll,
                FOOT_ANGLE_ADJUSTMENT_LIMIT,
                &mut status,
                BalanceStatus::FOOT_ANGLE_LIMITED,
            );
            let pitch = limit(
                foot_pitch + pitch,
                FOOT_ANGLE_ADJUSTMENT_LIMIT,
                &mut status,
                BalanceStatus::FOOT_ANGLE_LIMITED,
            );

            *feet.get_mut(leg) = Pose6D::new(
                Vector3::new(0.0, 0.0, z),
                UnitQuaternion::from_euler_angles(roll, pitch, 0.0),
            );
        }

        cob.x = limit(cob.x, COB_ADJUSTMENT_LIMIT, &mut status, BalanceStatus::COB_LIMITED);
        cob.y = limit(cob.y, COB_ADJUSTMENT_LIMIT, &mut status, BalanceStatus::COB_LIMITED);

        BalanceOutput {
            body: Pose6D::from_translation(
                cob.x + input.cob_offset.x,
                cob.y + input.cob_offset.y,
                input.cob_offset.z,
            ),
            feet,
            status,
        }
    }

    fn reset(&mut self) {
        self.roll_gyro.reset();
        self.pitch_gyro.reset();
        self.roll_angle.reset();
        self.pitch_angle.reset();
        self.feet.left.reset();
        self.feet.right.reset();
    }
}

// ==================== 平衡修正流水线 ====================

/// 一次平衡修正所需的数据
#[derive(Debug, Clone, Copy)]
pub struct CorrectionRequest<'a> {
    /// 期望站姿（世界系）
    pub stance: &'a StancePoses,
    pub sensors: &'a SensorFrame,
    pub target_grf: &'a TargetGrf,
    /// 质心手动偏移（躯干偏移运动）
    pub cob_offset: Vector3<f64>,
    pub gains: &'a BalanceGains,
    /// 增益渐变比例 ∈ [0, 1]
    pub ratio: f64,
    /// 当前期望关节角（逆解初值）
    pub seed: &'a JointArray<f64>,
}

/// 修正结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    /// 新的期望关节角
    pub joints: JointArray<f64>,
    /// 修正后的世界系位姿
    pub stance: StancePoses,
    pub status: BalanceStatus,
}

/// 平衡修正器：平衡控制器 + 逆运动学
pub struct BalanceCorrector {
    controller: Box<dyn BalanceController>,
    kinematics: Box<dyn LegKinematics>,
}

impl std::fmt::Debug for BalanceCorrector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalanceCorrector").finish_non_exhaustive()
    }
}

impl BalanceCorrector {
    pub fn new(
        controller: Box<dyn BalanceController>,
        kinematics: Box<dyn LegKinematics>,
    ) -> Self {
        Self {
            controller,
            kinematics,
        }
    }

    pub fn kinematics(&self) -> &dyn LegKinematics {
        self.kinematics.as_ref()
    }

    /// 清除平衡控制器内部状态
    pub fn reset(&mut self) {
        self.controller.reset();
    }

    /// 执行一次平衡修正
    ///
    /// # 错误
    ///
    /// 任一条腿逆解失败返回 [`ControlError::IkUnreachable`]，此时不修改任何状态。
    pub fn correct(&mut self, req: &CorrectionRequest<'_>) -> Result<Correction, ControlError> {
        let stance = req.stance;

        // 1. 躯干相对位姿
        let body_inv = stance.body.inverse();
        let rel = FootPair::new(
            body_inv.compose(&stance.left_foot),
            body_inv.compose(&stance.right_foot),
        );

        // 2. IMU 姿态
        let orientation = imu_roll_pitch(&req.sensors.imu.orientation);

        // 3. 足底力转到躯干系
        let wrench = FootPair::new(
            wrench_to_body(&rel.left.orientation, &req.sensors.feet.left),
            wrench_to_body(&rel.right.orientation, &req.sensors.feet.right),
        );

        // 4. 平衡控制器
        let (desired_roll, desired_pitch, _) = stance.body.euler_angles();
        let gyro = req.sensors.gyro();
        self.controller.set_gains(req.gains, req.ratio);
        let output = self.controller.process(&BalanceInput {
            gyro: (gyro.x, gyro.y),
            orientation,
            desired_orientation: (desired_roll, desired_pitch),
            wrench,
            desired_wrench: *req.target_grf,
            desired: StancePoses {
                body: Pose6D::identity(),
                left_foot: rel.left,
                right_foot: rel.right,
            },
            cob_offset: req.cob_offset,
        });
        trace!(status = output.status.bits(), "balance output");

        // 5. 应用修正
        let corrected = StancePoses {
            body: stance.body.compose(&output.body),
            left_foot: stance.body.compose(&rel.left.compose(&output.feet.left)),
            right_foot: stance.body.compose(&rel.right.compose(&output.feet.right)),
        };

        // 6. 逆运动学
        let mut joints = *req.seed;
        for leg in [Leg::Right, Leg::Left] {
            let angles = self.kinematics.inverse(
                leg,
                &corrected.body,
                corrected.foot(leg),
                &req.seed.leg(leg),
            )?;
            joints.set_leg(leg, angles);
        }

        Ok(Correction {
            joints,
            stance: corrected,
            status: output.status,
        })
    }
}
