//! # WBC Tools - 配置与增益表
//!
//! **依赖原则**: 只依赖 `wbc-protocol`，避免依赖 `wbc-control`
//!
//! ## 包含模块
//!
//! - `gains` - 关节反馈/前馈增益、平衡增益（扁平 TOML 表）
//! - `config` - 模块配置（控制周期、质量、足间距）

pub mod config;
pub mod gains;

use std::path::PathBuf;

// 重新导出常用类型
pub use config::ModuleConfig;
pub use gains::{BalanceGains, GainSet, PdGain};

/// 配置加载错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },

    #[error("Missing key `{key}` in {file}")]
    MissingKey { file: String, key: String },

    #[error("Key `{key}` in {file} is not a number")]
    NotNumeric { file: String, key: String },

    #[error("Invalid value for `{key}`: {value}")]
    InvalidValue { key: String, value: f64 },
}
