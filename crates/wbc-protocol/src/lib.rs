//! # WBC Protocol
//!
//! 双足全身控制器的数据与消息定义（无硬件依赖、无控制逻辑）
//!
//! ## 模块
//!
//! - `joint`: 关节 id、名称映射、`JointArray`
//! - `pose`: `Pose6D`、名义站姿
//! - `mode`: 控制模式 / 平衡模式 / 步行相位 / 任务组
//! - `command`: 入站命令
//! - `sensor`: IMU、足底力传感器、执行器反馈
//! - `status`: 状态通知

pub mod command;
pub mod joint;
pub mod mode;
pub mod pose;
pub mod sensor;
pub mod status;

// 重新导出常用类型
pub use command::*;
pub use joint::*;
pub use mode::*;
pub use pose::*;
pub use sensor::*;
pub use status::*;

/// 协议层错误
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Unknown joint name: {0}")]
    UnknownJoint(String),

    #[error("Invalid joint id: {0}")]
    InvalidJointId(u8),

    #[error("Unknown task group: {0}")]
    UnknownTaskGroup(String),

    #[error("Unknown balance token: {0}")]
    UnknownBalanceToken(String),

    #[error("Unknown step direction: {0}")]
    UnknownStepDirection(String),

    #[error("Invalid value for field {field}: {value}")]
    InvalidValue { field: String, value: f64 },
}
