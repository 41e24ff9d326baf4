//! # WBC Control
//!
//! 双足全身控制核心（纯计算，无线程、无 IO）
//!
//! ## 模块
//!
//! - `controller`: 每周期流水线与命令处理（[`WholebodyController`]）
//! - `arbiter`: 控制模式 × 平衡模式状态机、增益渐变
//! - `motion`: 运动源（关节 / 躯干偏移 / 全身 / 行走）
//! - `balance`: 平衡修正 + 逆运动学
//! - `preview`: LIPM 预观控制增益
//! - `grf`: 目标地面反力
//! - `shaper`: 关节命令整形
//! - `sensor`: 传感器调理
//! - `kinematics`: 腿部运动学
//! - `filter` / `trajectory`: 基础构件
//!
//! 驱动线程、传感器缓冲和命令通道在 `wbc-driver` 中。

pub mod arbiter;
pub mod balance;
pub mod controller;
mod error;
pub mod filter;
pub mod grf;
pub mod kinematics;
pub mod motion;
pub mod preview;
pub mod sensor;
pub mod shaper;
pub mod trajectory;

pub use arbiter::{BALANCE_RAMP_TIME, GainRamp};
pub use balance::{
    BalanceController, BalanceCorrector, BalanceInput, BalanceOutput, BalanceStatus,
    PdBalanceController,
};
pub use controller::{
    CALC_TIME_BUDGET, ControlCommand, ControlEvent, ControlEvents, ControllerConfig,
    ControllerSnapshot, TickInput, TickOutput, WholebodyController, WholebodyControllerBuilder,
};
pub use error::ControlError;
pub use grf::{GRAVITY, TargetGrf};
pub use kinematics::{AnalyticLegKinematics, LegGeometry, LegKinematics};
pub use motion::{
    DesiredState, MinimumJerkBlender, PoseTrajectory, PreviewWalkingGenerator, WalkingGenerator,
    WalkingPattern, WalkingRequest, WholebodyPlanner,
};
pub use preview::{PreviewMatrix, PreviewMatrixService, RiccatiPreviewService};
pub use sensor::SensorFrame;
