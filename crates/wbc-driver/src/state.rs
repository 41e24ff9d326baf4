//! 共享状态上下文
//!
//! 所有跨线程数据都通过 `ArcSwap` 交换：
//!
//! - 传感器（外部线程写入，控制线程每周期读取一次）
//! - 执行器反馈（控制线程写入）
//! - 控制器快照与最终关节命令（控制线程每周期发布，查询方无锁读取）

use arc_swap::ArcSwap;
use std::sync::Arc;
use wbc_control::sensor::{condition_imu, condition_wrench};
use wbc_control::{ControllerSnapshot, SensorFrame};
use wbc_protocol::{ActuatorFeedback, FootPair, ImuSample, JointArray, Wrench};

/// 运行时共享状态
#[derive(Debug)]
pub struct RuntimeContext {
    /// 已调理的传感器帧
    pub sensors: Arc<ArcSwap<SensorFrame>>,
    /// 最近一次读到的执行器反馈
    pub actuators: Arc<ArcSwap<ActuatorFeedback>>,
    /// 最近一个周期结束时的控制器快照
    pub controller: Arc<ArcSwap<ControllerSnapshot>>,
    /// 最近一个周期发送的关节命令
    pub command: Arc<ArcSwap<JointArray<f64>>>,
}

impl RuntimeContext {
    pub fn new(snapshot: ControllerSnapshot) -> Self {
        let command = snapshot.desired_joints;
        Self {
            sensors: Arc::new(ArcSwap::from_pointee(SensorFrame::default())),
            actuators: Arc::new(ArcSwap::from_pointee(ActuatorFeedback::default())),
            controller: Arc::new(ArcSwap::from_pointee(snapshot)),
            command: Arc::new(ArcSwap::from_pointee(command)),
        }
    }

    /// 写入原始 IMU 采样（调理后发布）
    pub fn update_imu(&self, raw: ImuSample) {
        let imu = condition_imu(raw);
        self.sensors.rcu(|frame| SensorFrame { imu, ..**frame });
    }

    /// 写入原始足底力采样（调理后发布）
    pub fn update_wrench(&self, left: Wrench, right: Wrench) {
        let feet = FootPair::new(condition_wrench(left), condition_wrench(right));
        self.sensors.rcu(|frame| SensorFrame { feet, ..**frame });
    }
}
