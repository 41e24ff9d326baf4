//! WBC SDK - 双足机器人平衡感知全身控制器
//!
//! 12 关节双足机器人的全身控制：关节空间运动、躯干偏移、全身笛卡尔运动、
//! 预观控制步行，以及基于 IMU 和足底力的平衡修正。
//!
//! # 架构设计
//!
//! 本 SDK 采用分层架构，从底层到高层：
//!
//! - **协议层** (`protocol`): 关节、位姿、命令、传感器、状态消息
//! - **配置层** (`tools`): 增益表与模块配置
//! - **控制层** (`control`): 纯计算的控制核心，`tick(sensors) -> commands`
//! - **驱动层** (`driver`): 实时控制线程、状态同步、命令通道
//!
//! # 快速开始
//!
//! ```rust
//! use wbc_sdk::prelude::*;
//!
//! let mut controller = WholebodyController::new(ControllerConfig::default());
//! controller
//!     .handle_command(ControlCommand::Balance {
//!         token: BalanceToken::On,
//!         gains: None,
//!     })
//!     .unwrap();
//! let output = controller.tick(&TickInput::default());
//! assert_eq!(output.command.as_array().len(), 12);
//! ```
//!
//! 需要后台实时线程的用户使用驱动层：
//!
//! ```rust,no_run
//! use wbc_sdk::prelude::*;
//!
//! # fn main() -> Result<(), DriverError> {
//! let runtime = RuntimeBuilder::new().build(LoopbackActuators::default())?;
//! runtime.send(Command::Balance(BalanceToken::On))?;
//! # Ok(())
//! # }
//! ```

pub use wbc_control as control;
pub use wbc_driver as driver;
pub use wbc_protocol as protocol;
pub use wbc_tools as tools;

mod logging;
pub mod prelude;

pub use logging::init_logger;

// --- 用户以此为界 ---

pub use control::{
    ControlCommand, ControlError, ControlEvent, ControllerConfig, ControllerSnapshot, TickInput,
    TickOutput, WholebodyController,
};
pub use driver::{DriverError, LoopbackActuators, RuntimeBuilder, WholebodyRuntime};
pub use protocol::{Command, ProtocolError};
pub use tools::{ConfigError, GainSet, ModuleConfig};
