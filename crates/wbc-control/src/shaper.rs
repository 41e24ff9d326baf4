//! 关节命令整形
//!
//! ```text
//! command = desired + feedforward + PD(desired, present) + sensory
//! ```
//!
//! - 反馈：逐关节 PD（无积分项）
//! - 前馈：仅行走时非零，`gain · value · mask`，支撑腿 mask = 1，摆动腿为 0
//! - 陀螺仪补偿：髋/踝横滚随 roll 角速度，膝/踝俯仰随 pitch 角速度（左右反号）

use crate::filter::PdController;
use nalgebra::Vector3;
use wbc_protocol::{Joint, JointArray, Leg};
use wbc_tools::{BalanceGains, PdGain};

/// 陀螺仪补偿内部增益
pub const SENSORY_GAIN: f64 = 0.05;

/// 陀螺仪补偿量
///
/// # 参数
///
/// - `gyro`: 已调理的角速度
/// - `gains`: 平衡增益表中的陀螺仪补偿系数
pub fn sensory_offsets(gyro: &Vector3<f64>, gains: &BalanceGains) -> JointArray<f64> {
    let rl = -gyro.x;
    let fb = -gyro.y;
    let g = SENSORY_GAIN;

    let mut offsets = JointArray::splat(0.0);
    offsets[Joint::RHipRoll] = -g * rl * gains.hip_roll_gain;
    offsets[Joint::LHipRoll] = -g * rl * gains.hip_roll_gain;
    offsets[Joint::RKnee] = g * fb * gains.knee_gain;
    offsets[Joint::LKnee] = -g * fb * gains.knee_gain;
    offsets[Joint::RAnkPitch] = -g * fb * gains.ankle_pitch_gain;
    offsets[Joint::LAnkPitch] = g * fb * gains.ankle_pitch_gain;
    offsets[Joint::RAnkRoll] = -g * rl * gains.ankle_roll_gain;
    offsets[Joint::LAnkRoll] = -g * rl * gains.ankle_roll_gain;
    offsets
}

/// 行走前馈
///
/// # 参数
///
/// - `gains`: 逐关节前馈增益
/// - `value`: 前馈基准值（rad）
/// - `support`: 支撑腿
pub fn feedforward(gains: &JointArray<f64>, value: f64, support: Leg) -> JointArray<f64> {
    gains.map_with_joint(|joint, gain| {
        if joint.leg() == support {
            gain * value
        } else {
            0.0
        }
    })
}

/// 关节命令整形器
#[derive(Debug, Clone, Default)]
pub struct CommandShaper {
    feedback: JointArray<PdController>,
}

impl CommandShaper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_gains(&mut self, gains: &JointArray<PdGain>) {
        for (joint, gain) in gains.iter_joints() {
            self.feedback[joint].set_gain(*gain);
        }
    }

    pub fn reset(&mut self) {
        for pd in self.feedback.iter_mut() {
            pd.reset();
        }
    }

    /// 计算最终关节命令
    pub fn shape(
        &mut self,
        desired: &JointArray<f64>,
        present: &JointArray<f64>,
        feedforward: &JointArray<f64>,
        sensory: &JointArray<f64>,
    ) -> JointArray<f64> {
        JointArray::from_fn(|joint| {
            let fb = self.feedback[joint].update(desired[joint], present[joint]);
            desired[joint] + feedforward[joint] + fb + sensory[joint]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_sensory_pattern() {
        let gains = BalanceGains {
            hip_roll_gain: 1.0,
            knee_gain: 1.0,
            ankle_roll_gain: 1.0,
            ankle_pitch_gain: 1.0,
            ..BalanceGains::default()
        };
        let offsets = sensory_offsets(&Vector3::new(0.2, 0.4, 0.0), &gains);

        assert_abs_diff_eq!(offsets[Joint::RHipRoll], 0.01, epsilon = 1e-12);
        assert_abs_diff_eq!(offsets[Joint::LHipRoll], 0.01, epsilon = 1e-12);
        assert_abs_diff_eq!(offsets[Joint::RKnee], -0.02, epsilon = 1e-12);
        assert_abs_diff_eq!(offsets[Joint::LKnee], 0.02, epsilon = 1e-12);
        assert_abs_diff_eq!(offsets[Joint::RAnkPitch], 0.02, epsilon = 1e-12);
        assert_abs_diff_eq!(offsets[Joint::LAnkPitch], -0.02, epsilon = 1e-12);
        assert_eq!(offsets[Joint::RHipYaw], 0.0);
    }

    #[test]
    fn test_feedforward_support_mask() {
        let gains = JointArray::splat(2.0);
        let ff = feedforward(&gains, 0.01, Leg::Left);

        assert_abs_diff_eq!(ff[Joint::LKnee], 0.02, epsilon = 1e-12);
        assert_eq!(ff[Joint::RKnee], 0.0);
    }

    #[test]
    fn test_shape_sums_terms() {
        let mut shaper = CommandShaper::new();
        shaper.set_gains(&JointArray::splat(PdGain::new(0.5, 0.0)));

        let desired = JointArray::splat(1.0);
        let present = JointArray::splat(0.8);
        let ff = JointArray::splat(0.01);
        let sensory = JointArray::splat(-0.02);
        let cmd = shaper.shape(&desired, &present, &ff, &sensory);

        // 1.0 + 0.01 + 0.5·0.2 - 0.02
        assert_abs_diff_eq!(cmd[Joint::RKnee], 1.09, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_gains_pass_desired_through() {
        let mut shaper = CommandShaper::new();
        let desired = JointArray::from_fn(|joint| joint.index() as f64 * 0.1);
        let zero = JointArray::splat(0.0);

        let cmd = shaper.shape(&desired, &JointArray::splat(0.3), &zero, &zero);
        assert_eq!(cmd, desired);
    }
}
