//! 支撑相地面反力（GRF）调度
//!
//! 每个控制周期根据步态相位和支撑腿重新计算双脚目标力：
//!
//! - DSP：每只脚承担一半，`F = -½·m·(ax, ay, g)`
//! - SSP：支撑脚承担全部 `F = -m·(ax, ay, g)`，摆动脚为 0
//!
//! 任何情况下 `ΣFz = -m·g`。目标力矩恒为 0。

use nalgebra::Vector3;
use wbc_protocol::{FootPair, Leg, WalkingPhase, Wrench};

/// 重力加速度（m/s²）
pub const GRAVITY: f64 = 9.81;

/// 双脚目标地面反力
pub type TargetGrf = FootPair<Wrench>;

/// 计算目标地面反力
///
/// # 参数
///
/// - `mass`: 整机质量（kg）
/// - `acc`: 质心水平加速度 (ax, ay)
/// - `phase`: 步态相位
/// - `support`: 支撑腿（仅 SSP 有效）
///
/// # 示例
///
/// ```rust
/// use wbc_control::grf::schedule;
/// use wbc_protocol::{Leg, WalkingPhase};
///
/// let grf = schedule(3.5, (0.0, 0.0), WalkingPhase::Dsp, Leg::Left);
/// assert!((grf.left.force.z + 17.1675).abs() < 1e-9);
/// ```
pub fn schedule(mass: f64, acc: (f64, f64), phase: WalkingPhase, support: Leg) -> TargetGrf {
    let full = Wrench::new(
        -mass * Vector3::new(acc.0, acc.1, GRAVITY),
        Vector3::zeros(),
    );

    match phase {
        WalkingPhase::Dsp => {
            let half = Wrench::new(0.5 * full.force, Vector3::zeros());
            FootPair::new(half, half)
        },
        WalkingPhase::Ssp => {
            let mut grf = FootPair::new(Wrench::zero(), Wrench::zero());
            *grf.get_mut(support) = full;
            grf
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn test_dsp_split() {
        let grf = schedule(3.5, (0.0, 0.0), WalkingPhase::Dsp, Leg::Right);

        assert_abs_diff_eq!(grf.left.force.z, -17.1675, epsilon = 1e-9);
        assert_abs_diff_eq!(grf.right.force.z, -17.1675, epsilon = 1e-9);
    }

    #[test]
    fn test_ssp_left_support() {
        let grf = schedule(3.5, (0.0, 0.0), WalkingPhase::Ssp, Leg::Left);

        assert_abs_diff_eq!(grf.left.force.z, -34.335, epsilon = 1e-9);
        assert_eq!(grf.right, Wrench::zero());
    }

    #[test]
    fn test_horizontal_acceleration() {
        let grf = schedule(2.0, (1.0, -0.5), WalkingPhase::Dsp, Leg::Left);

        assert_abs_diff_eq!(grf.left.force.x, -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(grf.right.force.y, 0.5, epsilon = 1e-12);
    }

    proptest! {
        #[test]
        fn test_vertical_force_sum(
            mass in 0.1f64..100.0,
            ax in -5.0f64..5.0,
            ay in -5.0f64..5.0,
            ssp in any::<bool>(),
            left in any::<bool>(),
        ) {
            let phase = if ssp { WalkingPhase::Ssp } else { WalkingPhase::Dsp };
            let support = if left { Leg::Left } else { Leg::Right };
            let grf = schedule(mass, (ax, ay), phase, support);

            let sum = grf.left.force.z + grf.right.force.z;
            prop_assert!((sum + mass * GRAVITY).abs() < 1e-9 * mass.max(1.0));
        }
    }
}
