//! 关节空间运动

use super::{DesiredState, JointState, MotionSource, Progress, StepClock};
use crate::trajectory::MinimumJerk;
use wbc_protocol::{JOINT_COUNT, JointArray, JointPoseGoal};

/// 关节空间最小加加速度运动
///
/// 起点为当前期望位置/速度/加速度，终点速度、加速度为 0。
/// 未在目标中列出的关节保持当前期望值。
#[derive(Debug, Clone)]
pub struct JointMotion {
    trajectory: MinimumJerk<JOINT_COUNT>,
    goal: JointArray<f64>,
    clock: StepClock,
    control_cycle: f64,
}

impl JointMotion {
    pub fn new(goal: &JointPoseGoal, current: &JointState, control_cycle: f64) -> Self {
        let mut target = current.position;
        for &(joint, angle) in &goal.goals {
            target[joint] = angle;
        }

        let zero = [0.0; JOINT_COUNT];
        let trajectory = MinimumJerk::new(
            0.0,
            goal.mov_time,
            current.position.into_array(),
            current.velocity.into_array(),
            current.acceleration.into_array(),
            target.into_array(),
            zero,
            zero,
        );

        Self {
            trajectory,
            goal: target,
            clock: StepClock::new(goal.mov_time, control_cycle),
            control_cycle,
        }
    }

    /// 目标关节角
    pub fn goal(&self) -> &JointArray<f64> {
        &self.goal
    }
}

impl MotionSource for JointMotion {
    fn name(&self) -> &'static str {
        "Joint Control"
    }

    fn tick(&mut self, desired: &mut DesiredState) -> Progress {
        let point = self.trajectory.evaluate(self.clock.time(self.control_cycle));
        desired.joints = JointState {
            position: point.position.into(),
            velocity: point.velocity.into(),
            acceleration: point.acceleration.into(),
        };

        if self.clock.advance() {
            desired.joints = JointState::at_rest(self.goal);
            Progress::Finished
        } else {
            Progress::Running
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wbc_protocol::Joint;

    #[test]
    fn test_reaches_goal_after_total_steps() {
        let goal = JointPoseGoal {
            goals: vec![(Joint::RKnee, 0.5)],
            mov_time: 1.0,
        };
        let mut desired = DesiredState::default();
        desired.joints.position[Joint::LKnee] = -0.3;
        let mut motion = JointMotion::new(&goal, &desired.joints, 0.008);

        let mut ticks = 0;
        loop {
            ticks += 1;
            if motion.tick(&mut desired) == Progress::Finished {
                break;
            }
        }

        assert_eq!(ticks, 126);
        assert_eq!(desired.joints.position[Joint::RKnee], 0.5);
        // 未列出的关节保持不变
        assert_eq!(desired.joints.position[Joint::LKnee], -0.3);
        assert_eq!(desired.joints.velocity[Joint::RKnee], 0.0);
    }

    #[test]
    fn test_first_sample_is_start() {
        let goal = JointPoseGoal {
            goals: vec![(Joint::RHipPitch, 1.0)],
            mov_time: 0.5,
        };
        let mut desired = DesiredState::default();
        let mut motion = JointMotion::new(&goal, &desired.joints, 0.008);

        assert_eq!(motion.tick(&mut desired), Progress::Running);
        assert_eq!(desired.joints.position[Joint::RHipPitch], 0.0);
        assert_eq!(motion.goal()[Joint::RHipPitch], 1.0);
    }
}
