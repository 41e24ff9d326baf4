//! 躯干偏移运动

use super::{DesiredState, MotionSource, Progress, StepClock};
use crate::trajectory::MinimumJerk;
use nalgebra::Vector3;
use wbc_protocol::BodyOffset;

/// 躯干手动偏移（作为平衡控制器的 COB 偏移输入）
#[derive(Debug, Clone)]
pub struct OffsetMotion {
    trajectory: MinimumJerk<3>,
    goal: Vector3<f64>,
    clock: StepClock,
    control_cycle: f64,
}

impl OffsetMotion {
    pub fn new(goal: &BodyOffset, current: &Vector3<f64>, control_cycle: f64) -> Self {
        let duration = BodyOffset::MOV_TIME;
        Self {
            trajectory: MinimumJerk::rest_to_rest(0.0, duration, (*current).into(), goal.offset.into()),
            goal: goal.offset,
            clock: StepClock::new(duration, control_cycle),
            control_cycle,
        }
    }
}

impl MotionSource for OffsetMotion {
    fn name(&self) -> &'static str {
        "Body Offset"
    }

    fn tick(&mut self, desired: &mut DesiredState) -> Progress {
        let p = self.trajectory.position(self.clock.time(self.control_cycle));
        desired.body_offset = Vector3::from(p);

        if self.clock.advance() {
            desired.body_offset = self.goal;
            Progress::Finished
        } else {
            Progress::Running
        }
    }
}
