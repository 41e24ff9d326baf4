//! 传感器采样
//!
//! 原始采样（未经坐标变换和限幅）在此定义，调理逻辑在 `wbc-control::sensor`。

use crate::joint::{JointArray, Leg};
use nalgebra::{UnitQuaternion, Vector3};

/// IMU 采样
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImuSample {
    /// 角速度（rad/s）
    pub angular_velocity: Vector3<f64>,
    /// 姿态
    pub orientation: UnitQuaternion<f64>,
}

impl Default for ImuSample {
    fn default() -> Self {
        Self {
            angular_velocity: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
        }
    }
}

/// 力/力矩
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Wrench {
    /// 力（N）
    pub force: Vector3<f64>,
    /// 力矩（N·m）
    pub torque: Vector3<f64>,
}

impl Wrench {
    pub fn new(force: Vector3<f64>, torque: Vector3<f64>) -> Self {
        Self { force, torque }
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

/// 左右脚成对数据
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FootPair<T> {
    pub left: T,
    pub right: T,
}

impl<T> FootPair<T> {
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    pub fn get(&self, leg: Leg) -> &T {
        match leg {
            Leg::Left => &self.left,
            Leg::Right => &self.right,
        }
    }

    pub fn get_mut(&mut self, leg: Leg) -> &mut T {
        match leg {
            Leg::Left => &mut self.left,
            Leg::Right => &mut self.right,
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, mut f: F) -> FootPair<U> {
        FootPair {
            left: f(self.left),
            right: f(self.right),
        }
    }
}

/// 执行器反馈
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActuatorFeedback {
    /// 当前位置（rad）
    pub present: JointArray<f64>,
    /// 执行器当前持有的目标位置（rad）
    pub goal: JointArray<f64>,
}
