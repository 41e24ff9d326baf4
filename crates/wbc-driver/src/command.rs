//! 命令解析
//!
//! 协议命令 [`Command`] 在调用线程上解析为 [`ControlCommand`]：
//! 预观增益计算和增益文件读取都比较慢，不能放进控制周期。
//!
//! - 步行命令：按当前步态参数的 LIPM 高度请求预观增益，失败时携带 `None`，
//!   由控制器发布 "[FAIL] Cannot get preview matrix"
//! - 平衡命令：重新读取增益目录，失败时记录错误并保留原增益
//! - 重载增益：失败时返回错误，不发送任何命令

use crate::error::DriverError;
use parking_lot::Mutex;
use std::path::PathBuf;
use tracing::{debug, error};
use wbc_control::{ControlCommand, PreviewMatrixService};
use wbc_protocol::{Command, WalkingParam};
use wbc_tools::GainSet;

/// 控制线程请求
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeRequest {
    Command(ControlCommand),
    /// 硬复位
    Stop,
}

/// 命令解析器
pub struct CommandResolver {
    preview: Mutex<Box<dyn PreviewMatrixService>>,
    /// 最近一次发出的步态参数（决定预观增益的 LIPM 高度）
    walking: Mutex<WalkingParam>,
    gain_dir: Option<PathBuf>,
    control_cycle: f64,
}

impl std::fmt::Debug for CommandResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandResolver")
            .field("walking", &*self.walking.lock())
            .field("gain_dir", &self.gain_dir)
            .field("control_cycle", &self.control_cycle)
            .finish_non_exhaustive()
    }
}

impl CommandResolver {
    pub fn new(
        preview: Box<dyn PreviewMatrixService>,
        walking: WalkingParam,
        gain_dir: Option<PathBuf>,
        control_cycle: f64,
    ) -> Self {
        Self {
            preview: Mutex::new(preview),
            walking: Mutex::new(walking),
            gain_dir,
            control_cycle,
        }
    }

    pub fn gain_dir(&self) -> Option<&PathBuf> {
        self.gain_dir.as_ref()
    }

    /// 解析一条协议命令
    ///
    /// # 错误
    ///
    /// - [`DriverError::Protocol`]：参数检查失败
    /// - [`DriverError::NoGainDir`] / [`DriverError::Config`]：重载增益失败
    pub fn resolve(&self, command: Command) -> Result<ControlCommand, DriverError> {
        command.validate()?;
        debug!(command = command.name(), "resolve command");

        let resolved = match command {
            Command::JointPose(goal) => ControlCommand::JointPose(goal),
            Command::BodyOffset(offset) => ControlCommand::BodyOffset(offset),
            Command::Wholebody(goal) => ControlCommand::Wholebody(goal),
            Command::FootStep(command) => ControlCommand::FootStep {
                command,
                preview: self.preview_matrix(),
            },
            Command::WalkingParam(param) => {
                *self.walking.lock() = param;
                ControlCommand::WalkingParam(param)
            },
            Command::Balance(token) => ControlCommand::Balance {
                token,
                gains: self.try_load_gains(),
            },
            Command::ResetBody => ControlCommand::ResetBody,
            Command::FootDistance(distance) => ControlCommand::FootDistance(distance),
            Command::ReloadGains => ControlCommand::Gains(self.load_gains()?),
        };
        Ok(resolved)
    }

    fn preview_matrix(&self) -> Option<wbc_control::PreviewMatrix> {
        let lipm_height = self.walking.lock().lipm_height;
        match self
            .preview
            .lock()
            .preview_matrix(lipm_height, self.control_cycle)
        {
            Ok(matrix) => Some(matrix),
            Err(e) => {
                error!("Failed to get preview matrix: {}", e);
                None
            },
        }
    }

    fn load_gains(&self) -> Result<GainSet, DriverError> {
        let dir = self.gain_dir.as_ref().ok_or(DriverError::NoGainDir)?;
        Ok(GainSet::load_dir(dir)?)
    }

    /// 平衡命令附带的增益重载（未配置目录时不重载）
    fn try_load_gains(&self) -> Option<GainSet> {
        self.gain_dir.as_ref()?;
        match self.load_gains() {
            Ok(gains) => Some(gains),
            Err(e) => {
                error!("Failed to reload gains, keeping previous: {}", e);
                None
            },
        }
    }
}
