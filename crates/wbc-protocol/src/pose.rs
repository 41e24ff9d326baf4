//! 笛卡尔位姿
//!
//! `Pose6D` = 位置 + 单位四元数，用于躯干、左脚、右脚（世界系或躯干相对系）。
//! 任何复合运算之后都会重新归一化四元数。

use crate::joint::Leg;
use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

/// 名义站姿躯干高度（米）
pub const NOMINAL_BODY_HEIGHT: f64 = 0.3402256;

/// 默认足间距（米）
pub const DEFAULT_FOOT_DISTANCE: f64 = 0.07;

/// 6 自由度位姿
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose6D {
    /// 位置（米）
    pub position: Vector3<f64>,
    /// 姿态（单位四元数）
    pub orientation: UnitQuaternion<f64>,
}

impl Default for Pose6D {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose6D {
    /// 单位位姿
    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
        }
    }

    /// 创建位姿（四元数会被重新归一化）
    pub fn new(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        let mut pose = Self {
            position,
            orientation,
        };
        pose.orientation.renormalize();
        pose
    }

    /// 纯平移位姿
    pub fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            orientation: UnitQuaternion::identity(),
        }
    }

    /// 从 `Isometry3` 转换
    pub fn from_isometry(iso: &Isometry3<f64>) -> Self {
        Self::new(iso.translation.vector, iso.rotation)
    }

    /// 转换为 `Isometry3`
    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.position), self.orientation)
    }

    /// 位姿复合 `self · other`
    pub fn compose(&self, other: &Pose6D) -> Pose6D {
        Pose6D::from_isometry(&(self.to_isometry() * other.to_isometry()))
    }

    /// 逆位姿
    pub fn inverse(&self) -> Pose6D {
        Pose6D::from_isometry(&self.to_isometry().inverse())
    }

    /// 姿态的 (roll, pitch, yaw)
    pub fn euler_angles(&self) -> (f64, f64, f64) {
        self.orientation.euler_angles()
    }
}

/// 站姿：躯干 + 双脚（世界系）
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StancePoses {
    pub body: Pose6D,
    pub left_foot: Pose6D,
    pub right_foot: Pose6D,
}

impl StancePoses {
    /// 名义站姿
    ///
    /// 躯干位于 `(0, 0, 0.3402256)`，双脚位于 `y = ±½·foot_distance`，
    /// 所有姿态为单位四元数。
    pub fn nominal(foot_distance: f64) -> Self {
        Self {
            body: Pose6D::from_translation(0.0, 0.0, NOMINAL_BODY_HEIGHT),
            left_foot: Pose6D::from_translation(0.0, 0.5 * foot_distance, 0.0),
            right_foot: Pose6D::from_translation(0.0, -0.5 * foot_distance, 0.0),
        }
    }

    /// 获取指定腿的足部位姿
    pub fn foot(&self, leg: Leg) -> &Pose6D {
        match leg {
            Leg::Left => &self.left_foot,
            Leg::Right => &self.right_foot,
        }
    }

    /// 获取指定腿的足部位姿（可变）
    pub fn foot_mut(&mut self, leg: Leg) -> &mut Pose6D {
        match leg {
            Leg::Left => &mut self.left_foot,
            Leg::Right => &mut self.right_foot,
        }
    }
}
