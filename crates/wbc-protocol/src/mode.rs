//! 控制模式与步态状态

use crate::ProtocolError;
use crate::joint::Leg;
use std::fmt;
use std::str::FromStr;

/// 控制模式（任意时刻只有一个处于激活状态）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ControlMode {
    /// 空闲
    #[default]
    None,
    /// 关节空间运动
    Joint,
    /// 躯干偏移
    Offset,
    /// 全身笛卡尔运动
    Wholebody,
    /// 动态行走
    Walking,
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControlMode::None => "NONE",
            ControlMode::Joint => "JOINT",
            ControlMode::Offset => "OFFSET",
            ControlMode::Wholebody => "WHOLEBODY",
            ControlMode::Walking => "WALKING",
        };
        f.write_str(name)
    }
}

/// 平衡模式（与控制模式正交）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BalanceMode {
    #[default]
    Off,
    On,
}

/// 步行相位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WalkingPhase {
    /// 双脚支撑
    #[default]
    Dsp,
    /// 单脚支撑
    Ssp,
}

/// 支撑腿（仅在 SSP 时有意义）
pub type SupportLeg = Leg;

/// 全身运动的任务组
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TaskGroup {
    Body,
    LeftLeg,
    RightLeg,
}

impl TaskGroup {
    pub const fn name(self) -> &'static str {
        match self {
            TaskGroup::Body => "body",
            TaskGroup::LeftLeg => "left_leg",
            TaskGroup::RightLeg => "right_leg",
        }
    }
}

impl fmt::Display for TaskGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TaskGroup {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "body" => Ok(TaskGroup::Body),
            "left_leg" => Ok(TaskGroup::LeftLeg),
            "right_leg" => Ok(TaskGroup::RightLeg),
            other => Err(ProtocolError::UnknownTaskGroup(other.to_string())),
        }
    }
}
