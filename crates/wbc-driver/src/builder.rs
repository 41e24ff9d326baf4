//! Builder 模式实现
//!
//! 提供链式构造 [`WholebodyRuntime`] 实例的便捷方式。

use crate::actuator::ActuatorPort;
use crate::command::CommandResolver;
use crate::error::DriverError;
use crate::metrics::RuntimeMetrics;
use crate::runtime::{ControlLoop, WholebodyRuntime};
use crate::state::RuntimeContext;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::{info, warn};
use wbc_control::{
    ControllerConfig, PreviewMatrixService, RiccatiPreviewService, WholebodyController,
};
use wbc_tools::{GainSet, ModuleConfig};

/// 命令通道容量
pub const COMMAND_CHANNEL_CAPACITY: usize = 10;
/// 状态通道默认容量
pub const STATUS_CHANNEL_CAPACITY: usize = 64;

/// 运行时 Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use wbc_driver::{LoopbackActuators, RuntimeBuilder};
/// use wbc_protocol::JointArray;
/// use wbc_tools::ModuleConfig;
///
/// let config = ModuleConfig::load_from_file("wholebody.toml").unwrap();
/// let runtime = RuntimeBuilder::new()
///     .config(config)
///     .build(LoopbackActuators::new(JointArray::splat(0.0)))
///     .unwrap();
/// ```
pub struct RuntimeBuilder {
    config: ModuleConfig,
    gains: Option<GainSet>,
    preview: Option<Box<dyn PreviewMatrixService>>,
    controller: Option<WholebodyController>,
    status_capacity: usize,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config: ModuleConfig::default(),
            gains: None,
            preview: None,
            controller: None,
            status_capacity: STATUS_CHANNEL_CAPACITY,
        }
    }

    /// 模块配置（默认 [`ModuleConfig::default`]）
    pub fn config(mut self, config: ModuleConfig) -> Self {
        self.config = config;
        self
    }

    /// 初始增益（默认从 `config.gain_dir` 读取，未配置目录时为零增益）
    pub fn gains(mut self, gains: GainSet) -> Self {
        self.gains = Some(gains);
        self
    }

    /// 预观增益服务（默认 [`RiccatiPreviewService`]）
    pub fn preview_service(mut self, service: Box<dyn PreviewMatrixService>) -> Self {
        self.preview = Some(service);
        self
    }

    /// 使用预先构造的控制器（忽略 `gains`，控制周期取控制器自身配置）
    pub fn controller(mut self, controller: WholebodyController) -> Self {
        self.controller = Some(controller);
        self
    }

    /// 状态通道容量
    pub fn status_capacity(mut self, capacity: usize) -> Self {
        self.status_capacity = capacity.max(1);
        self
    }

    /// 构建并启动控制线程
    ///
    /// # Errors
    /// - `DriverError::Config`: 配置非法或增益文件读取失败
    /// - `DriverError::Thread`: 控制线程创建失败
    pub fn build(self, port: impl ActuatorPort + 'static) -> Result<WholebodyRuntime, DriverError> {
        let config = self.config;
        config.validate()?;

        let controller = match self.controller {
            Some(controller) => controller,
            None => {
                let gains = match (self.gains, &config.gain_dir) {
                    (Some(gains), _) => gains,
                    (None, Some(dir)) => GainSet::load_dir(dir)?,
                    (None, None) => {
                        warn!("No gain directory configured, using zero gains");
                        GainSet::default()
                    },
                };
                WholebodyController::builder(ControllerConfig::from(&config))
                    .gains(gains)
                    .build()
            },
        };
        let control_cycle = controller.config().control_cycle;

        let (cmd_tx, cmd_rx) = crossbeam_channel::bounded(COMMAND_CHANNEL_CAPACITY);
        let (status_tx, status_rx) = crossbeam_channel::bounded(self.status_capacity);

        let resolver = CommandResolver::new(
            self.preview
                .unwrap_or_else(|| Box::new(RiccatiPreviewService::new())),
            *controller.walking_param(),
            config.gain_dir.clone(),
            control_cycle,
        );

        let control = ControlLoop {
            ctx: Arc::new(RuntimeContext::new(controller.snapshot())),
            controller,
            port: Box::new(port),
            cmd_rx,
            status_tx,
            is_running: Arc::new(AtomicBool::new(true)),
            metrics: Arc::new(RuntimeMetrics::new()),
        };

        info!(control_cycle, "Starting wholebody runtime");
        WholebodyRuntime::start(control, cmd_tx, status_rx, resolver)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
