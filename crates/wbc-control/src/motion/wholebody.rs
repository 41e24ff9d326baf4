//! 全身笛卡尔运动
//!
//! 任务组（躯干 / 左腿 / 右腿）的世界系位姿从当前期望值运动到目标位姿。
//! 插值方式由 [`WholebodyPlanner`] 决定，默认 [`MinimumJerkBlender`]：
//! 位置线性插值、姿态球面插值，进度参数 s(t) 为最小加加速度曲线。

use super::{DesiredState, MotionSource, Progress, StepClock};
use crate::trajectory::MinimumJerk;
use wbc_protocol::{Pose6D, StancePoses, TaskGroup, WholebodyGoal};

/// 位姿轨迹
pub trait PoseTrajectory: Send {
    /// 在时刻 t 采样（t 超出范围时保持端点）
    fn sample(&self, t: f64) -> Pose6D;
}

/// 全身运动轨迹规划器
pub trait WholebodyPlanner: Send {
    fn plan(&self, start: &Pose6D, goal: &Pose6D, duration: f64) -> Box<dyn PoseTrajectory>;
}

/// 最小加加速度位姿混合
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimumJerkBlender;

struct BlendedPose {
    start: Pose6D,
    goal: Pose6D,
    progress: MinimumJerk<1>,
}

impl PoseTrajectory for BlendedPose {
    fn sample(&self, t: f64) -> Pose6D {
        let s = self.progress.position(t)[0];
        // 相差 180° 时插值方向不唯一，直接跳到较近的端点
        let orientation = self
            .start
            .orientation
            .try_slerp(&self.goal.orientation, s, 1e-9)
            .unwrap_or(if s < 0.5 {
                self.start.orientation
            } else {
                self.goal.orientation
            });
        Pose6D::new(self.start.position.lerp(&self.goal.position, s), orientation)
    }
}

impl WholebodyPlanner for MinimumJerkBlender {
    fn plan(&self, start: &Pose6D, goal: &Pose6D, duration: f64) -> Box<dyn PoseTrajectory> {
        Box::new(BlendedPose {
            start: *start,
            goal: *goal,
            progress: MinimumJerk::rest_to_rest(0.0, duration, [0.0], [1.0]),
        })
    }
}

fn group_pose(stance: &mut StancePoses, group: TaskGroup) -> &mut Pose6D {
    match group {
        TaskGroup::Body => &mut stance.body,
        TaskGroup::LeftLeg => &mut stance.left_foot,
        TaskGroup::RightLeg => &mut stance.right_foot,
    }
}

/// 全身运动
pub struct WholebodyMotion {
    group: TaskGroup,
    goal: Pose6D,
    trajectory: Box<dyn PoseTrajectory>,
    clock: StepClock,
    control_cycle: f64,
}

impl std::fmt::Debug for WholebodyMotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WholebodyMotion")
            .field("group", &self.group)
            .field("goal", &self.goal)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl WholebodyMotion {
    pub fn new(
        goal: &WholebodyGoal,
        stance: &StancePoses,
        planner: &dyn WholebodyPlanner,
        control_cycle: f64,
    ) -> Self {
        let mut stance = *stance;
        let start = *group_pose(&mut stance, goal.group);

        Self {
            group: goal.group,
            goal: goal.pose,
            trajectory: planner.plan(&start, &goal.pose, goal.mov_time),
            clock: StepClock::new(goal.mov_time, control_cycle),
            control_cycle,
        }
    }

    pub fn group(&self) -> TaskGroup {
        self.group
    }
}

impl MotionSource for WholebodyMotion {
    fn name(&self) -> &'static str {
        "Wholebody Control"
    }

    fn tick(&mut self, desired: &mut DesiredState) -> Progress {
        let pose = self.trajectory.sample(self.clock.time(self.control_cycle));
        *group_pose(&mut desired.stance, self.group) = pose;

        if self.clock.advance() {
            *group_pose(&mut desired.stance, self.group) = self.goal;
            Progress::Finished
        } else {
            Progress::Running
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use nalgebra::{UnitQuaternion, Vector3};

    #[test]
    fn test_blender_endpoints_and_midpoint() {
        let start = Pose6D::from_translation(0.0, 0.0, 0.3);
        let goal = Pose6D::new(
            Vector3::new(0.02, 0.0, 0.28),
            UnitQuaternion::from_euler_angles(0.0, 0.0, 0.2),
        );
        let traj = MinimumJerkBlender.plan(&start, &goal, 1.0);

        assert_eq!(traj.sample(0.0).position, start.position);
        let mid = traj.sample(0.5);
        assert_abs_diff_eq!(mid.position, Vector3::new(0.01, 0.0, 0.29), epsilon = 1e-12);
        assert_abs_diff_eq!(mid.euler_angles().2, 0.1, epsilon = 1e-9);
        assert!(traj.sample(2.0).orientation.angle_to(&goal.orientation) < 1e-9);
    }

    #[test]
    fn test_moves_only_its_group() {
        let mut desired = DesiredState::default();
        let before = desired.stance;
        let goal = WholebodyGoal {
            group: TaskGroup::LeftLeg,
            mov_time: 0.1,
            pose: Pose6D::from_translation(0.01, 0.035, 0.02),
        };
        let mut motion = WholebodyMotion::new(&goal, &desired.stance, &MinimumJerkBlender, 0.008);
        assert_eq!(motion.group(), TaskGroup::LeftLeg);

        while motion.tick(&mut desired) == Progress::Running {}

        assert_eq!(desired.stance.left_foot, goal.pose);
        assert_eq!(desired.stance.body, before.body);
        assert_eq!(desired.stance.right_foot, before.right_foot);
    }
}
