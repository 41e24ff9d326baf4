//! 增益文件命令
//!
//! 生成默认增益文件模板，或检查目录中的三个增益文件能否完整加载

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::PathBuf;
use wbc_sdk::prelude::*;

/// 增益命令
#[derive(Subcommand, Debug)]
pub enum GainsCommand {
    /// 写出默认增益文件
    Init {
        /// 目标目录
        dir: PathBuf,
    },

    /// 检查增益目录
    Check {
        /// 增益目录
        dir: PathBuf,
    },
}

impl GainsCommand {
    pub fn execute(&self) -> Result<()> {
        match self {
            GainsCommand::Init { dir } => {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;
                GainSet::default().write_dir(dir)?;
                println!("✅ 已写出默认增益文件: {}", dir.display());
                Ok(())
            },
            GainsCommand::Check { dir } => {
                let gains = GainSet::load_dir(dir)
                    .with_context(|| format!("invalid gain directory {}", dir.display()))?;
                print_gains(&gains);
                Ok(())
            },
        }
    }
}

fn print_gains(gains: &GainSet) {
    println!("{:<12} {:>10} {:>10} {:>10}", "JOINT", "P", "D", "FF");
    for joint in Joint::ALL {
        let pd = gains.feedback[joint];
        println!(
            "{:<12} {:>10.4} {:>10.4} {:>10.4}",
            joint.name(),
            pd.p,
            pd.d,
            gains.feedforward[joint]
        );
    }

    let balance = &gains.balance;
    println!();
    println!("平衡增益:");
    println!(
        "  foot_roll_angle  p={:.4} d={:.4}",
        balance.foot_roll_angle.p, balance.foot_roll_angle.d
    );
    println!(
        "  foot_pitch_angle p={:.4} d={:.4}",
        balance.foot_pitch_angle.p, balance.foot_pitch_angle.d
    );
    println!(
        "  foot_z_force     p={:.4} d={:.4}",
        balance.foot_z_force.p, balance.foot_z_force.d
    );
    println!(
        "  gyro feedback    hip_roll={:.4} knee={:.4} ankle_roll={:.4} ankle_pitch={:.4}",
        balance.hip_roll_gain, balance.knee_gain, balance.ankle_roll_gain, balance.ankle_pitch_gain
    );
}
