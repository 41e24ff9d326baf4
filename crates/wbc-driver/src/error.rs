//! 驱动层错误类型定义

use thiserror::Error;
use wbc_protocol::ProtocolError;
use wbc_tools::ConfigError;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 协议参数错误
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 配置或增益文件错误
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// 未配置增益目录
    #[error("No gain directory configured")]
    NoGainDir,

    /// 命令通道已关闭（控制线程退出）
    #[error("Command channel closed")]
    ChannelClosed,

    /// 命令通道已满（缓冲区容量 10）
    #[error("Command channel full (buffer size: 10)")]
    ChannelFull,

    /// 执行器写入失败
    #[error("Actuator error: {0}")]
    Actuator(String),

    /// 控制线程错误
    #[error("Control thread error: {0}")]
    Thread(String),
}

#[cfg(test)]
mod tests {
    use super::DriverError;
    use wbc_protocol::ProtocolError;

    #[test]
    fn test_driver_error_display() {
        let err = DriverError::ChannelClosed;
        assert_eq!(format!("{}", err), "Command channel closed");

        let err = DriverError::ChannelFull;
        assert!(format!("{}", err).contains("channel full"));

        let err = DriverError::Thread("spawn failed".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("Control thread") && msg.contains("spawn failed"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: DriverError = ProtocolError::UnknownJoint("neck".to_string()).into();
        match err {
            DriverError::Protocol(ProtocolError::UnknownJoint(name)) => assert_eq!(name, "neck"),
            other => panic!("Expected Protocol variant, got {other:?}"),
        }
    }
}
