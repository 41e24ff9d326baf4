//! 状态通知

use std::fmt;

/// 状态模块名
pub const MODULE_NAME: &str = "Wholebody";

/// 状态级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

/// 状态消息
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub module_name: String,
    pub message: String,
}

impl StatusMessage {
    pub fn new(level: StatusLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            module_name: MODULE_NAME.to_string(),
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Info, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Warn, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(StatusLevel::Error, message)
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {:?}: {}", self.module_name, self.level, self.message)
    }
}
