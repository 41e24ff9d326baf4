//! # WBC CLI
//!
//! Command-line interface for the biped whole-body controller.
//!
//! ```bash
//! # 列出关节
//! wbc-cli joints
//!
//! # 生成并检查增益文件
//! wbc-cli gains init ./gains
//! wbc-cli gains check ./gains
//!
//! # 单线程闭环仿真（回环执行器）
//! wbc-cli simulate --balance --walk forward --steps 2
//!
//! # 后台控制线程执行 JSON 脚本，Ctrl+C 停止
//! wbc-cli run --script walk.json
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod script;

use commands::{GainsCommand, RunCommand, SimulateCommand};

/// WBC CLI - 全身控制器命令行工具
#[derive(Parser, Debug)]
#[command(name = "wbc-cli")]
#[command(about = "Command-line interface for the biped whole-body controller", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 列出关节 ID 和名称
    Joints,

    /// 增益文件管理
    #[command(subcommand)]
    Gains(GainsCommand),

    /// 单线程闭环仿真
    Simulate {
        #[command(flatten)]
        args: SimulateCommand,
    },

    /// 启动控制线程并执行脚本
    Run {
        #[command(flatten)]
        args: RunCommand,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wbc_cli=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Joints => {
            commands::print_joints();
            Ok(())
        },
        Commands::Gains(cmd) => cmd.execute(),
        Commands::Simulate { args } => args.execute(),
        Commands::Run { args } => args.execute(),
    }
}
