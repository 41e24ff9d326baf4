//! 传感器坐标变换与限幅
//!
//! - IMU：角速度 x/y 取反（安装方向）
//! - 足底六维力：旋转 `RotX(π)·RotZ(-π/2)` 后逐分量限幅（力 ±2000 N，力矩 ±300 N·m）
//! - 平衡计算时：IMU 姿态经 `RotX(π)·R·RotZ(π)` 转为 roll/pitch，
//!   足底力经 `R_body_to_foot·RotX(π)` 转到躯干系

use nalgebra::{Rotation3, UnitQuaternion, Vector3};
use std::f64::consts::{FRAC_PI_2, PI};
use wbc_protocol::{FootPair, ImuSample, Wrench};

/// 足底力限幅（N）
pub const FORCE_LIMIT: f64 = 2000.0;
/// 足底力矩限幅（N·m）
pub const TORQUE_LIMIT: f64 = 300.0;

/// 已调理的传感器帧
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorFrame {
    pub imu: ImuSample,
    /// 足底力（传感器系，已旋转、限幅）
    pub feet: FootPair<Wrench>,
}

impl SensorFrame {
    /// 从原始数据构造
    pub fn from_raw(imu: ImuSample, left: Wrench, right: Wrench) -> Self {
        Self {
            imu: condition_imu(imu),
            feet: FootPair::new(condition_wrench(left), condition_wrench(right)),
        }
    }

    /// 已调理的角速度
    pub fn gyro(&self) -> Vector3<f64> {
        self.imu.angular_velocity
    }
}

/// IMU 调理：角速度 x/y 取反
pub fn condition_imu(raw: ImuSample) -> ImuSample {
    let mut imu = raw;
    imu.angular_velocity.x = -imu.angular_velocity.x;
    imu.angular_velocity.y = -imu.angular_velocity.y;
    imu
}

/// 足底力调理：旋转后逐分量限幅
pub fn condition_wrench(raw: Wrench) -> Wrench {
    let rot = Rotation3::from_axis_angle(&Vector3::x_axis(), PI)
        * Rotation3::from_axis_angle(&Vector3::z_axis(), -FRAC_PI_2);

    Wrench::new(
        saturate(rot * raw.force, FORCE_LIMIT),
        saturate(rot * raw.torque, TORQUE_LIMIT),
    )
}

/// 逐分量对称限幅
pub fn saturate(v: Vector3<f64>, limit: f64) -> Vector3<f64> {
    v.map(|x| x.clamp(-limit, limit))
}

/// 机体水平时 IMU 的原始姿态读数
pub fn level_orientation() -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), PI)
}

/// IMU 姿态 → (roll, pitch)
pub fn imu_roll_pitch(orientation: &UnitQuaternion<f64>) -> (f64, f64) {
    let rot = Rotation3::from_axis_angle(&Vector3::x_axis(), PI)
        * orientation.to_rotation_matrix()
        * Rotation3::from_axis_angle(&Vector3::z_axis(), PI);
    let (roll, pitch, _) = rot.euler_angles();
    (roll, pitch)
}

/// 足底力从足部传感器系转到躯干系
///
/// # 参数
///
/// - `body_to_foot`: 躯干到足部的姿态
/// - `wrench`: 已调理的足底力
pub fn wrench_to_body(body_to_foot: &UnitQuaternion<f64>, wrench: &Wrench) -> Wrench {
    let rot = body_to_foot.to_rotation_matrix() * Rotation3::from_axis_angle(&Vector3::x_axis(), PI);
    Wrench::new(rot * wrench.force, rot * wrench.torque)
}
