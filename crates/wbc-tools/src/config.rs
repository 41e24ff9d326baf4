//! # 模块配置
//!
//! 控制周期、整机质量、足间距、增益目录和默认步态参数。

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use wbc_protocol::{DEFAULT_FOOT_DISTANCE, WalkingParam};

/// 模块配置
///
/// ```toml
/// control_cycle = 0.008
/// total_mass = 3.5
/// foot_distance = 0.07
/// gain_dir = "config/gains"
///
/// [walking]
/// dsp_ratio = 0.2
/// lipm_height = 0.12
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// 控制周期（秒）
    pub control_cycle: f64,
    /// 整机质量（kg）
    pub total_mass: f64,
    /// 足间距（米）
    pub foot_distance: f64,
    /// 增益文件目录（`None` 表示使用零增益）
    pub gain_dir: Option<PathBuf>,
    /// 默认步态参数
    pub walking: WalkingParam,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            control_cycle: 0.008,
            total_mass: 3.5,
            foot_distance: DEFAULT_FOOT_DISTANCE,
            gain_dir: None,
            walking: WalkingParam::default(),
        }
    }
}

impl ModuleConfig {
    /// 从 TOML 文件加载（未给出的字段使用默认值）
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ModuleConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 参数合法性检查
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("control_cycle", self.control_cycle),
            ("total_mass", self.total_mass),
            ("foot_distance", self.foot_distance),
            ("walking.lipm_height", self.walking.lipm_height),
        ];
        for (key, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value,
                });
            }
        }
        if !(0.0..=1.0).contains(&self.walking.dsp_ratio) {
            return Err(ConfigError::InvalidValue {
                key: "walking.dsp_ratio".to_string(),
                value: self.walking.dsp_ratio,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ModuleConfig::default();
        assert_eq!(config.control_cycle, 0.008);
        assert_eq!(config.total_mass, 3.5);
        assert_eq!(config.foot_distance, 0.07);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wholebody.toml");
        fs::write(&path, "total_mass = 4.0\n[walking]\nlipm_height = 0.2\n").unwrap();

        let config = ModuleConfig::load_from_file(&path).unwrap();
        assert_eq!(config.total_mass, 4.0);
        assert_eq!(config.control_cycle, 0.008);
        assert_eq!(config.walking.lipm_height, 0.2);
        assert_eq!(config.walking.dsp_ratio, 0.2);
    }

    #[test]
    fn test_invalid_cycle_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("wholebody.toml");
        fs::write(&path, "control_cycle = 0.0\n").unwrap();

        assert!(matches!(
            ModuleConfig::load_from_file(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
