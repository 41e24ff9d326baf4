//! 入站命令消息
//!
//! 所有命令在进入控制器前都已经完成名称解析（关节名 → [`Joint`]，
//! 任务组名 → [`TaskGroup`]）。

use crate::ProtocolError;
use crate::joint::Joint;
use crate::mode::TaskGroup;
use crate::pose::Pose6D;
use nalgebra::Vector3;
use std::str::FromStr;

/// 检查时长参数（必须为有限正数）
fn check_duration(field: &str, value: f64) -> Result<(), ProtocolError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ProtocolError::InvalidValue {
            field: field.to_string(),
            value,
        })
    }
}

/// 关节空间目标
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointPoseGoal {
    /// (关节, 目标角度 rad)，未列出的关节保持当前期望值
    pub goals: Vec<(Joint, f64)>,
    /// 运动时长（秒）
    pub mov_time: f64,
}

impl JointPoseGoal {
    /// 从名称映射构造
    ///
    /// # 示例
    ///
    /// ```rust
    /// # use wbc_protocol::{Joint, JointPoseGoal};
    /// let goal = JointPoseGoal::from_names([("r_knee", 0.5)], 1.0).unwrap();
    /// assert_eq!(goal.goals[0], (Joint::RKnee, 0.5));
    /// ```
    pub fn from_names<'a, I>(names: I, mov_time: f64) -> Result<Self, ProtocolError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        check_duration("mov_time", mov_time)?;
        let goals = names
            .into_iter()
            .map(|(name, angle)| name.parse::<Joint>().map(|joint| (joint, angle)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { goals, mov_time })
    }

    pub fn validate(&self) -> Result<(), ProtocolError> {
        check_duration("mov_time", self.mov_time)
    }
}

/// 躯干偏移（COB 手动调整量，米）
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BodyOffset {
    pub offset: Vector3<f64>,
}

impl BodyOffset {
    /// 偏移运动时长固定为 1 秒
    pub const MOV_TIME: f64 = 1.0;

    pub fn new(dx: f64, dy: f64, dz: f64) -> Self {
        Self {
            offset: Vector3::new(dx, dy, dz),
        }
    }
}

/// 全身笛卡尔目标
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WholebodyGoal {
    pub group: TaskGroup,
    pub mov_time: f64,
    /// 任务组的目标位姿（世界系）
    pub pose: Pose6D,
}

impl WholebodyGoal {
    pub fn validate(&self) -> Result<(), ProtocolError> {
        check_duration("mov_time", self.mov_time)
    }
}

/// 步行方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StepDirection {
    Forward,
    Backward,
    Left,
    Right,
    TurnLeft,
    TurnRight,
    Stop,
}

impl FromStr for StepDirection {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "forward" => Ok(StepDirection::Forward),
            "backward" => Ok(StepDirection::Backward),
            "left" => Ok(StepDirection::Left),
            "right" => Ok(StepDirection::Right),
            "turn_left" => Ok(StepDirection::TurnLeft),
            "turn_right" => Ok(StepDirection::TurnRight),
            "stop" => Ok(StepDirection::Stop),
            other => Err(ProtocolError::UnknownStepDirection(other.to_string())),
        }
    }
}

/// 步行命令
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FootStepCommand {
    pub direction: StepDirection,
    /// 迈步数（不含起步与收步）
    pub step_num: u32,
    /// 单步时长（秒）
    pub step_time: f64,
    /// 前后步长（米）
    pub step_length: f64,
    /// 侧向步长（米）
    pub side_step_length: f64,
    /// 转向角（rad）
    pub step_angle: f64,
}

impl FootStepCommand {
    /// 总步数（起步 + 迈步 + 收步）
    pub fn total_steps(&self) -> usize {
        self.step_num as usize + 2
    }

    pub fn validate(&self) -> Result<(), ProtocolError> {
        check_duration("step_time", self.step_time)
    }
}

/// 步态参数
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WalkingParam {
    /// 双脚支撑时间占比
    pub dsp_ratio: f64,
    /// LIPM 质心高度（米）
    pub lipm_height: f64,
    /// 最大抬脚高度（米）
    pub foot_height_max: f64,
    pub zmp_offset_x: f64,
    pub zmp_offset_y: f64,
}

impl Default for WalkingParam {
    fn default() -> Self {
        Self {
            dsp_ratio: 0.2,
            lipm_height: 0.12,
            foot_height_max: 0.05,
            zmp_offset_x: 0.0,
            zmp_offset_y: 0.0,
        }
    }
}

/// 平衡开关令牌
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BalanceToken {
    On,
    Off,
}

impl BalanceToken {
    /// 增益比例目标值
    pub const fn target_ratio(self) -> f64 {
        match self {
            BalanceToken::On => 1.0,
            BalanceToken::Off => 0.0,
        }
    }
}

impl FromStr for BalanceToken {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "balance_on" => Ok(BalanceToken::On),
            "balance_off" => Ok(BalanceToken::Off),
            other => Err(ProtocolError::UnknownBalanceToken(other.to_string())),
        }
    }
}

/// 入站命令
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Command {
    JointPose(JointPoseGoal),
    BodyOffset(BodyOffset),
    Wholebody(WholebodyGoal),
    FootStep(FootStepCommand),
    WalkingParam(WalkingParam),
    Balance(BalanceToken),
    ResetBody,
    FootDistance(f64),
    /// 重新加载增益表
    ReloadGains,
}

impl Command {
    /// 命令名称（用于日志）
    pub fn name(&self) -> &'static str {
        match self {
            Command::JointPose(_) => "joint_pose",
            Command::BodyOffset(_) => "body_offset",
            Command::Wholebody(_) => "wholebody",
            Command::FootStep(_) => "foot_step",
            Command::WalkingParam(_) => "walking_param",
            Command::Balance(_) => "balance",
            Command::ResetBody => "reset_body",
            Command::FootDistance(_) => "foot_distance",
            Command::ReloadGains => "reload_gains",
        }
    }

    /// 基本参数检查
    pub fn validate(&self) -> Result<(), ProtocolError> {
        match self {
            Command::JointPose(goal) => goal.validate(),
            Command::Wholebody(goal) => goal.validate(),
            Command::FootStep(cmd) => cmd.validate(),
            Command::FootDistance(d) if !(d.is_finite() && *d > 0.0) => {
                Err(ProtocolError::InvalidValue {
                    field: "foot_distance".to_string(),
                    value: *d,
                })
            },
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_pose_from_names() {
        let goal = JointPoseGoal::from_names([("r_knee", 0.5), ("l_knee", -0.5)], 1.0).unwrap();
        assert_eq!(goal.goals.len(), 2);
        assert_eq!(goal.goals[1], (Joint::LKnee, -0.5));

        // 未知关节名
        assert!(JointPoseGoal::from_names([("neck", 0.1)], 1.0).is_err());

        // 非法时长
        assert!(JointPoseGoal::from_names([("r_knee", 0.1)], 0.0).is_err());
    }

    #[test]
    fn test_balance_token() {
        assert_eq!("balance_on".parse::<BalanceToken>().unwrap(), BalanceToken::On);
        assert_eq!(BalanceToken::Off.target_ratio(), 0.0);
        assert!("on".parse::<BalanceToken>().is_err());
    }

    #[test]
    fn test_walking_param_default() {
        let param = WalkingParam::default();
        assert_eq!(param.dsp_ratio, 0.2);
        assert_eq!(param.lipm_height, 0.12);
        assert_eq!(param.foot_height_max, 0.05);
    }

    #[test]
    fn test_foot_step_total_steps() {
        let cmd = FootStepCommand {
            direction: StepDirection::Forward,
            step_num: 4,
            step_time: 1.0,
            step_length: 0.04,
            side_step_length: 0.0,
            step_angle: 0.0,
        };
        assert_eq!(cmd.total_steps(), 6);
        assert!(Command::FootStep(cmd).validate().is_ok());
    }

    #[test]
    fn test_command_validate_foot_distance() {
        assert!(Command::FootDistance(0.07).validate().is_ok());
        assert!(Command::FootDistance(-1.0).validate().is_err());
    }
    #[cfg(feature = "serde")]
    #[test]
    fn test_command_json() {
        let commands: Vec<Command> = serde_json::from_str(
            r#"[
                { "JointPose": { "goals": [["RKnee", 0.5]], "mov_time": 1.0 } },
                { "Balance": "On" },
                { "WalkingParam": { "dsp_ratio": 0.3 } },
                "ResetBody"
            ]"#,
        )
        .unwrap();

        assert_eq!(
            commands[0],
            Command::JointPose(JointPoseGoal {
                goals: vec![(Joint::RKnee, 0.5)],
                mov_time: 1.0,
            })
        );
        assert_eq!(commands[1], Command::Balance(BalanceToken::On));
        // 未给出的步行参数取默认值
        let Command::WalkingParam(param) = commands[2] else {
            panic!("expected walking param, got {:?}", commands[2]);
        };
        assert_eq!(param.dsp_ratio, 0.3);
        assert_eq!(param.lipm_height, WalkingParam::default().lipm_height);
        assert_eq!(commands[3], Command::ResetBody);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_wholebody_goal_json_round_trip() {
        let goal = Command::Wholebody(WholebodyGoal {
            group: TaskGroup::LeftLeg,
            mov_time: 2.0,
            pose: Pose6D::from_translation(0.25, 0.125, -0.5),
        });

        let json = serde_json::to_string(&goal).unwrap();
        let back: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(back, goal);
    }
}
