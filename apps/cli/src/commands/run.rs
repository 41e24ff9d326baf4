//! run 命令
//!
//! 启动后台控制线程（回环执行器）并执行 JSON 脚本。Ctrl+C 中断脚本并硬复位。

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use wbc_sdk::control::sensor::level_orientation;
use wbc_sdk::prelude::*;

use super::load_config;
use crate::script::{ScriptConfig, ScriptExecutor};

/// 脚本执行命令参数
#[derive(Args, Debug)]
pub struct RunCommand {
    /// 脚本文件路径
    #[arg(short, long)]
    pub script: PathBuf,

    /// 模块配置文件（TOML）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 失败时继续执行
    #[arg(long)]
    pub continue_on_error: bool,

    /// 命令间延迟（毫秒）
    #[arg(long, default_value_t = 20)]
    pub delay_ms: u64,
}

impl RunCommand {
    pub fn execute(&self) -> Result<()> {
        println!("📜 加载脚本: {}", self.script.display());
        let script = ScriptExecutor::load_script(&self.script)?;
        println!("📋 脚本: {}", script.name);
        if !script.description.is_empty() {
            println!("    {}", script.description);
        }
        println!("    {} 个命令", script.commands.len());
        println!();

        let config = load_config(self.config.as_deref())?;
        let runtime = RuntimeBuilder::new()
            .config(config)
            .build(LoopbackActuators::default())?;
        runtime.update_imu(ImuSample {
            orientation: level_orientation(),
            ..ImuSample::default()
        });

        let running = Arc::new(AtomicBool::new(true));
        let handler_flag = running.clone();
        ctrlc::set_handler(move || {
            println!("\n🛑 收到中断信号");
            handler_flag.store(false, Ordering::Release);
        })?;

        let executor = ScriptExecutor::new(&runtime, running.clone()).config(ScriptConfig {
            continue_on_error: self.continue_on_error,
            execution_delay_ms: self.delay_ms,
        });
        let result = executor.execute(&script)?;

        if result.interrupted {
            runtime.stop()?;
        }

        let metrics = runtime.get_metrics();
        println!();
        println!("📊 执行结果:");
        println!("  总命令数: {}", result.total_commands);
        println!("  成功: {}", result.succeeded.len());
        println!("  失败: {}", result.failed.len());
        println!("  耗时: {:.2} 秒", result.duration_secs);
        println!(
            "  控制周期: {} (超时 {:.2}%, 被拒命令 {})",
            metrics.ticks,
            metrics.slow_tick_rate() * 100.0,
            metrics.rejected_commands
        );

        if !result.failed.is_empty() {
            println!();
            println!("❌ 失败的命令:");
            for (idx, err) in &result.failed {
                println!("  命令 {}: {}", idx + 1, err);
            }
        }

        // 打印运行期间的状态消息
        for event in runtime.events().try_iter() {
            if let ControlEvent::Status(msg) = event {
                tracing::info!("{msg}");
            }
        }

        Ok(())
    }
}
