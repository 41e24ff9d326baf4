//! 控制错误类型

use thiserror::Error;
use wbc_protocol::Leg;

/// 控制错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlError {
    /// 命令不满足前置条件，已丢弃，状态不变
    #[error("Command `{command}` rejected: {reason}")]
    CommandRejected {
        command: &'static str,
        reason: String,
    },

    /// 逆运动学无解
    #[error("IK unreachable for {leg:?} leg")]
    IkUnreachable { leg: Leg },

    /// 预观增益矩阵不可用
    #[error("Preview matrix unavailable: {0}")]
    PreviewUnavailable(String),
}

impl ControlError {
    pub(crate) fn rejected(command: &'static str, reason: impl Into<String>) -> Self {
        ControlError::CommandRejected {
            command,
            reason: reason.into(),
        }
    }
}
