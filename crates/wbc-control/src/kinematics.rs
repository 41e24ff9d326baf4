//! 腿部运动学
//!
//! 每条腿 6 个关节（髋偏航 z、髋横滚 x、髋俯仰 y、膝 y、踝俯仰 y、踝横滚 x），
//! 连杆沿 -z 方向。逆解采用闭式解（Kajita），不可达时返回
//! [`ControlError::IkUnreachable`]，不做数值迭代。
//!
//! 运动学角度与执行器角度之间只差一个轴向符号（见 [`axis_sign`]）。

use crate::error::ControlError;
use nalgebra::{Isometry3, Rotation3, UnitQuaternion, Vector3};
use std::f64::consts::{FRAC_PI_2, PI};
use wbc_protocol::{Leg, Pose6D};

/// 腿部几何参数（米）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegGeometry {
    /// 大腿长度
    pub thigh: f64,
    /// 小腿长度
    pub calf: f64,
    /// 踝关节到脚底
    pub ankle_to_sole: f64,
    /// 髋关节侧向偏移（绝对值）
    pub hip_offset_y: f64,
    /// 髋关节相对躯干原点的下沉
    ///
    /// 名义站姿下髋到踝约 0.19 m，膝关节弯曲，留出约 3 cm 的伸展余量
    pub hip_offset_z: f64,
}

impl Default for LegGeometry {
    fn default() -> Self {
        Self {
            thigh: 0.11015,
            calf: 0.110,
            ankle_to_sole: 0.0305,
            hip_offset_y: 0.035,
            hip_offset_z: 0.12,
        }
    }
}

impl LegGeometry {
    /// 膝关节伸直时髋到踝的距离
    pub fn reach(&self) -> f64 {
        self.thigh + self.calf
    }

    /// 髋关节在躯干系中的位置
    pub fn hip(&self, leg: Leg) -> Vector3<f64> {
        Vector3::new(0.0, leg.lateral_sign() * self.hip_offset_y, -self.hip_offset_z)
    }
}

/// 执行器方向相对运动学正方向的符号（链顺序）
pub const fn axis_sign(leg: Leg) -> [f64; 6] {
    match leg {
        Leg::Right => [-1.0, -1.0, 1.0, 1.0, -1.0, 1.0],
        Leg::Left => [-1.0, -1.0, -1.0, -1.0, 1.0, 1.0],
    }
}

/// 腿部正/逆运动学
pub trait LegKinematics: Send {
    /// 逆运动学
    ///
    /// # 参数
    ///
    /// - `leg`: 哪条腿
    /// - `body`: 躯干世界位姿
    /// - `foot`: 脚底世界位姿
    /// - `seed`: 当前关节角（数值解法的初值，闭式解可忽略）
    ///
    /// # 返回
    ///
    /// 链顺序的 6 个执行器角度（rad）
    fn inverse(
        &self,
        leg: Leg,
        body: &Pose6D,
        foot: &Pose6D,
        seed: &[f64; 6],
    ) -> Result<[f64; 6], ControlError>;

    /// 正运动学：执行器角度 → 脚底在躯干系中的位姿
    fn forward(&self, leg: Leg, joints: &[f64; 6]) -> Pose6D;
}

/// 闭式解腿部运动学
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticLegKinematics {
    geometry: LegGeometry,
}

impl AnalyticLegKinematics {
    pub fn new(geometry: LegGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &LegGeometry {
        &self.geometry
    }

    /// 脚底相对躯干的位姿 → 运动学角度
    fn solve(&self, leg: Leg, rel: &Isometry3<f64>) -> Option<[f64; 6]> {
        let g = &self.geometry;
        let (a, b) = (g.thigh, g.calf);

        let r7 = rel.rotation.to_rotation_matrix();
        let ankle = rel.translation.vector + r7 * Vector3::new(0.0, 0.0, g.ankle_to_sole);

        // 踝 → 髋向量（足部坐标系）
        let r = r7.inverse() * (g.hip(leg) - ankle);
        let c = r.norm();

        let cos_knee = (c * c - a * a - b * b) / (2.0 * a * b);
        if !(cos_knee.abs() < 1.0) {
            return None;
        }
        let knee = cos_knee.acos();
        let alpha = ((a / c) * (PI - knee).sin()).asin();

        let mut ankle_roll = r.y.atan2(r.z);
        if ankle_roll > FRAC_PI_2 {
            ankle_roll -= PI;
        } else if ankle_roll < -FRAC_PI_2 {
            ankle_roll += PI;
        }
        let ankle_pitch = -r.x.atan2(r.z.signum() * (r.y * r.y + r.z * r.z).sqrt()) - alpha;

        // 髋关节姿态 = Rz(yaw)·Rx(roll)·Ry(pitch)
        let hip_rot = r7
            * Rotation3::from_axis_angle(&Vector3::x_axis(), -ankle_roll)
            * Rotation3::from_axis_angle(&Vector3::y_axis(), -ankle_pitch - knee);
        let m = hip_rot.matrix();

        let hip_yaw = (-m[(0, 1)]).atan2(m[(1, 1)]);
        let (sy, cy) = hip_yaw.sin_cos();
        let hip_roll = m[(2, 1)].atan2(-m[(0, 1)] * sy + m[(1, 1)] * cy);
        let hip_pitch = (-m[(2, 0)]).atan2(m[(2, 2)]);

        let q = [hip_yaw, hip_roll, hip_pitch, knee, ankle_pitch, ankle_roll];
        q.iter().all(|v| v.is_finite()).then_some(q)
    }
}

impl LegKinematics for AnalyticLegKinematics {
    fn inverse(
        &self,
        leg: Leg,
        body: &Pose6D,
        foot: &Pose6D,
        _seed: &[f64; 6],
    ) -> Result<[f64; 6], ControlError> {
        let rel = body.to_isometry().inverse() * foot.to_isometry();
        let q = self.solve(leg, &rel).ok_or(ControlError::IkUnreachable { leg })?;

        let sign = axis_sign(leg);
        Ok(std::array::from_fn(|i| sign[i] * q[i]))
    }

    fn forward(&self, leg: Leg, joints: &[f64; 6]) -> Pose6D {
        let g = &self.geometry;
        let sign = axis_sign(leg);
        let q: [f64; 6] = std::array::from_fn(|i| sign[i] * joints[i]);

        let rx = |angle: f64| Rotation3::from_axis_angle(&Vector3::x_axis(), angle);
        let ry = |angle: f64| Rotation3::from_axis_angle(&Vector3::y_axis(), angle);
        let rz = |angle: f64| Rotation3::from_axis_angle(&Vector3::z_axis(), angle);

        let hip_rot = rz(q[0]) * rx(q[1]) * ry(q[2]);
        let knee = g.hip(leg) + hip_rot * Vector3::new(0.0, 0.0, -g.thigh);
        let knee_rot = hip_rot * ry(q[3]);
        let ankle = knee + knee_rot * Vector3::new(0.0, 0.0, -g.calf);
        let foot_rot = knee_rot * ry(q[4]) * rx(q[5]);
        let sole = ankle + foot_rot * Vector3::new(0.0, 0.0, -g.ankle_to_sole);

        Pose6D::new(sole, UnitQuaternion::from_rotation_matrix(&foot_rot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;
    use wbc_protocol::{DEFAULT_FOOT_DISTANCE, StancePoses};

    fn assert_pose_eq(a: &Pose6D, b: &Pose6D) {
        assert_abs_diff_eq!(a.position, b.position, epsilon = 1e-9);
        assert!(a.orientation.angle_to(&b.orientation) < 1e-9);
    }

    #[test]
    fn test_zero_angles_forward() {
        let kin = AnalyticLegKinematics::default();
        let foot = kin.forward(Leg::Left, &[0.0; 6]);

        // 直腿：髋 (0, 0.035, -0.12) 向下 0.25065
        assert_abs_diff_eq!(
            foot.position,
            Vector3::new(0.0, 0.035, -0.37065),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_nominal_stance_is_reachable() {
        let kin = AnalyticLegKinematics::default();
        let stance = StancePoses::nominal(DEFAULT_FOOT_DISTANCE);

        for leg in [Leg::Left, Leg::Right] {
            let q = kin.inverse(leg, &stance.body, stance.foot(leg), &[0.0; 6]).unwrap();
            let rel = stance.body.inverse().compose(stance.foot(leg));
            assert_pose_eq(&kin.forward(leg, &q), &rel);
        }
    }

    #[test]
    fn test_nominal_stance_keeps_reach_margin() {
        let geometry = LegGeometry::default();
        let stance = StancePoses::nominal(DEFAULT_FOOT_DISTANCE);

        for leg in [Leg::Left, Leg::Right] {
            let rel = stance.body.inverse().compose(stance.foot(leg));
            let ankle = rel.position + Vector3::new(0.0, 0.0, geometry.ankle_to_sole);
            let span = (geometry.hip(leg) - ankle).norm();
            assert!(span < geometry.reach() - 0.02, "span = {span}");
        }
    }

    #[test]
    fn test_shifted_body_is_reachable() {
        let kin = AnalyticLegKinematics::default();
        let stance = StancePoses::nominal(DEFAULT_FOOT_DISTANCE);

        // 质心移到支撑脚上方且另一只脚落在前方一步
        for (dy, leg) in [(-0.035, Leg::Left), (0.035, Leg::Right)] {
            let mut body = stance.body;
            body.position.y += dy;
            let mut foot = *stance.foot(leg);
            foot.position.x += 0.04;

            let q = kin.inverse(leg, &body, &foot, &[0.0; 6]).unwrap();
            assert_pose_eq(&kin.forward(leg, &q), &body.inverse().compose(&foot));
        }
    }

    #[test]
    fn test_nominal_stance_is_mirrored() {
        let kin = AnalyticLegKinematics::default();
        let stance = StancePoses::nominal(DEFAULT_FOOT_DISTANCE);

        let left = kin.inverse(Leg::Left, &stance.body, &stance.left_foot, &[0.0; 6]).unwrap();
        let right = kin.inverse(Leg::Right, &stance.body, &stance.right_foot, &[0.0; 6]).unwrap();

        // 膝、髋俯仰、踝俯仰左右符号相反
        for i in 2..5 {
            assert_abs_diff_eq!(left[i], -right[i], epsilon = 1e-9);
        }
        assert!(right[3] > 0.0);
    }

    #[test]
    fn test_unreachable_foot() {
        let kin = AnalyticLegKinematics::default();
        let body = Pose6D::from_translation(0.0, 0.0, 0.3402256);
        let foot = Pose6D::from_translation(0.0, 0.035, -0.5);

        assert_eq!(
            kin.inverse(Leg::Left, &body, &foot, &[0.0; 6]),
            Err(ControlError::IkUnreachable { leg: Leg::Left })
        );
    }

    #[test]
    fn test_rotated_foot_round_trip() {
        let kin = AnalyticLegKinematics::default();
        let body = Pose6D::from_translation(0.01, -0.02, 0.33);
        let foot = Pose6D::new(
            Vector3::new(0.03, -0.04, 0.01),
            UnitQuaternion::from_euler_angles(0.05, -0.08, 0.1),
        );

        let q = kin.inverse(Leg::Right, &body, &foot, &[0.0; 6]).unwrap();
        let rel = body.inverse().compose(&foot);
        assert_pose_eq(&kin.forward(Leg::Right, &q), &rel);
    }

    proptest! {
        #[test]
        fn test_ik_inverts_fk(
            yaw in -0.3f64..0.3,
            roll in -0.2f64..0.2,
            pitch in -0.6f64..0.3,
            knee in 0.2f64..1.2,
            ank_pitch in -0.5f64..0.5,
            ank_roll in -0.2f64..0.2,
            left in any::<bool>(),
        ) {
            let kin = AnalyticLegKinematics::default();
            let leg = if left { Leg::Left } else { Leg::Right };
            let sign = axis_sign(leg);
            let kinematic = [yaw, roll, pitch, knee, ank_pitch, ank_roll];
            let joints: [f64; 6] = std::array::from_fn(|i| sign[i] * kinematic[i]);

            let rel = kin.forward(leg, &joints);
            let solved = kin.inverse(leg, &Pose6D::identity(), &rel, &joints).unwrap();

            for i in 0..6 {
                prop_assert!((solved[i] - joints[i]).abs() < 1e-7);
            }
        }
    }
}
