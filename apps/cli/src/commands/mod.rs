//! 命令定义和实现

pub mod gains;
pub mod run;
pub mod simulate;

pub use gains::GainsCommand;
pub use run::RunCommand;
pub use simulate::SimulateCommand;

use std::path::Path;
use wbc_sdk::prelude::*;

/// 打印关节表
pub fn print_joints() {
    println!("{:>3}  {:<12}", "ID", "NAME");
    for joint in Joint::ALL {
        println!("{:>3}  {:<12}", joint.index(), joint.name());
    }
}

/// 加载模块配置（未指定时使用默认值）
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ModuleConfig> {
    match path {
        Some(path) => Ok(ModuleConfig::load_from_file(path)?),
        None => Ok(ModuleConfig::default()),
    }
}

/// 打印期望关节角
pub fn print_pose(pose: &[(&'static str, f64)]) {
    for (name, angle) in pose {
        println!("  {:<12} {:>9.4} rad ({:>7.2}°)", name, angle, angle.to_degrees());
    }
}
