//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use wbc_sdk::prelude::*;
//! ```

// 控制层
pub use crate::control::{
    BalanceStatus, ControlCommand, ControlEvent, ControllerConfig, ControllerSnapshot,
    PreviewMatrixService, RiccatiPreviewService, SensorFrame, TickInput, TickOutput,
    WholebodyController,
};

// 驱动层
pub use crate::driver::{ActuatorPort, LoopbackActuators, RuntimeBuilder, WholebodyRuntime};

// 协议层
pub use crate::protocol::{
    ActuatorFeedback, BalanceMode, BalanceToken, BodyOffset, Command, ControlMode,
    FootStepCommand, ImuSample, Joint, JointArray, JointPoseGoal, Leg, Pose6D, StancePoses,
    StatusLevel, StatusMessage, StepDirection, TaskGroup, WalkingParam, WalkingPhase,
    WholebodyGoal, Wrench,
};

// 配置层
pub use crate::tools::{BalanceGains, GainSet, ModuleConfig, PdGain};

// 错误类型
pub use crate::control::ControlError;
pub use crate::driver::DriverError;
pub use crate::protocol::ProtocolError;
pub use crate::tools::ConfigError;
