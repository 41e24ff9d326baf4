//! 执行器接口
//!
//! 控制线程每个周期调用一次 [`ActuatorPort::feedback`]，
//! 计算完成后调用一次 [`ActuatorPort::write_goal`]。

use crate::error::DriverError;
use wbc_protocol::{ActuatorFeedback, JointArray};

/// 执行器端口
pub trait ActuatorPort: Send {
    /// 读取当前位置和执行器持有的目标位置
    fn feedback(&mut self) -> ActuatorFeedback;

    /// 写入新的目标位置
    fn write_goal(&mut self, goal: &JointArray<f64>) -> Result<(), DriverError>;
}

/// 回环执行器（仿真 / 测试用）
///
/// 写入的目标在下一个周期成为当前位置（一个周期的延迟，理想跟踪）。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoopbackActuators {
    state: ActuatorFeedback,
}

impl LoopbackActuators {
    /// 所有关节静止于 `initial`
    pub fn new(initial: JointArray<f64>) -> Self {
        Self {
            state: ActuatorFeedback {
                present: initial,
                goal: initial,
            },
        }
    }

    pub fn state(&self) -> &ActuatorFeedback {
        &self.state
    }
}

impl ActuatorPort for LoopbackActuators {
    fn feedback(&mut self) -> ActuatorFeedback {
        let feedback = self.state;
        self.state.present = self.state.goal;
        feedback
    }

    fn write_goal(&mut self, goal: &JointArray<f64>) -> Result<(), DriverError> {
        self.state.goal = *goal;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wbc_protocol::Joint;

    #[test]
    fn test_loopback_tracks_with_one_cycle_delay() {
        let mut port = LoopbackActuators::new(JointArray::splat(0.0));
        let mut goal = JointArray::splat(0.0);
        goal[Joint::RKnee] = 0.3;
        port.write_goal(&goal).unwrap();

        // 本周期读到新的目标，当前位置尚未到达
        let fb = port.feedback();
        assert_eq!(fb.goal[Joint::RKnee], 0.3);
        assert_eq!(fb.present[Joint::RKnee], 0.0);

        let fb = port.feedback();
        assert_eq!(fb.present[Joint::RKnee], 0.3);
    }
}
