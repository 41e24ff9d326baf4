//! 驱动层模块
//!
//! 本模块提供全身控制器的实时运行时，包括：
//! - 控制线程管理（绝对时间锚点定时，可选实时优先级）
//! - 状态同步（ArcSwap 无锁读取）
//! - 命令解析与有界命令通道
//! - 状态事件通道
//! - 运行时指标
//!
//! 控制算法本身在 `wbc-control` 中，这里只负责线程、通道和数据交换。

mod actuator;
mod builder;
pub mod command;
mod error;
pub mod metrics;
mod runtime;
pub mod state;

pub use actuator::{ActuatorPort, LoopbackActuators};
pub use builder::{COMMAND_CHANNEL_CAPACITY, RuntimeBuilder, STATUS_CHANNEL_CAPACITY};
pub use command::{CommandResolver, RuntimeRequest};
pub use error::DriverError;
pub use metrics::{MetricsSnapshot, RuntimeMetrics};
pub use runtime::WholebodyRuntime;
pub use state::RuntimeContext;
