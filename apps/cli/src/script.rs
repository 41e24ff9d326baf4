//! 脚本系统
//!
//! JSON 脚本：按顺序向运行时发送命令、等待时间或等待事件

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use wbc_sdk::prelude::*;

/// 脚本命令序列
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    /// 脚本名称
    pub name: String,

    /// 脚本描述
    #[serde(default)]
    pub description: String,

    /// 命令序列
    pub commands: Vec<ScriptCommand>,
}

/// 脚本命令
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ScriptCommand {
    /// 发送控制命令
    Send { command: Command },

    /// 等待固定时间
    Wait { duration_ms: u64 },

    /// 等待当前运动结束
    WaitDone {
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u64,
    },

    /// 打印当前期望关节角
    Pose,

    /// 硬复位
    Stop,
}

fn default_timeout_ms() -> u64 {
    30_000
}

/// 脚本配置
#[derive(Debug, Clone)]
pub struct ScriptConfig {
    /// 失败时是否继续
    pub continue_on_error: bool,

    /// 命令间延迟（毫秒）
    pub execution_delay_ms: u64,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            continue_on_error: false,
            execution_delay_ms: 20,
        }
    }
}

/// 脚本执行结果
#[derive(Debug)]
pub struct ScriptResult {
    /// 总命令数
    pub total_commands: usize,

    /// 成功的命令索引
    pub succeeded: Vec<usize>,

    /// 失败的命令索引和错误
    pub failed: Vec<(usize, String)>,

    /// 是否被中断
    pub interrupted: bool,

    /// 执行时长（秒）
    pub duration_secs: f64,
}

/// 脚本执行器
pub struct ScriptExecutor<'a> {
    runtime: &'a WholebodyRuntime,
    config: ScriptConfig,
    running: Arc<AtomicBool>,
}

impl<'a> ScriptExecutor<'a> {
    pub fn new(runtime: &'a WholebodyRuntime, running: Arc<AtomicBool>) -> Self {
        Self {
            runtime,
            config: ScriptConfig::default(),
            running,
        }
    }

    /// 设置配置
    pub fn config(mut self, config: ScriptConfig) -> Self {
        self.config = config;
        self
    }

    /// 加载脚本文件
    pub fn load_script<P: AsRef<std::path::Path>>(path: P) -> Result<Script> {
        let content = fs::read_to_string(path).context("failed to read script file")?;
        let script: Script =
            serde_json::from_str(&content).context("failed to parse script JSON")?;
        Ok(script)
    }

    /// 执行脚本
    pub fn execute(&self, script: &Script) -> Result<ScriptResult> {
        let start = Instant::now();
        let mut result = ScriptResult {
            total_commands: script.commands.len(),
            succeeded: Vec::new(),
            failed: Vec::new(),
            interrupted: false,
            duration_secs: 0.0,
        };

        for (i, cmd) in script.commands.iter().enumerate() {
            if !self.running.load(Ordering::Acquire) {
                result.interrupted = true;
                break;
            }
            println!("命令 {}/{}:", i + 1, result.total_commands);

            match self.execute_command(cmd) {
                Ok(()) => result.succeeded.push(i),
                Err(err) => {
                    println!("  ❌ 失败: {err:#}");
                    result.failed.push((i, format!("{err:#}")));
                    if !self.config.continue_on_error {
                        break;
                    }
                },
            }

            if i + 1 < script.commands.len() {
                std::thread::sleep(Duration::from_millis(self.config.execution_delay_ms));
            }
        }

        result.duration_secs = start.elapsed().as_secs_f64();
        Ok(result)
    }

    fn execute_command(&self, cmd: &ScriptCommand) -> Result<()> {
        match cmd {
            ScriptCommand::Send { command } => {
                println!("  发送: {}", command.name());
                self.runtime.send(command.clone())?;
                Ok(())
            },

            ScriptCommand::Wait { duration_ms } => {
                println!("  等待: {duration_ms} ms");
                self.sleep(Duration::from_millis(*duration_ms));
                Ok(())
            },

            ScriptCommand::WaitDone { timeout_ms } => {
                println!("  等待运动结束");
                // 给控制线程一个周期开始运动
                std::thread::sleep(Duration::from_millis(50));
                let deadline = Instant::now() + Duration::from_millis(*timeout_ms);
                while self.runtime.is_moving() {
                    if !self.running.load(Ordering::Acquire) {
                        bail!("interrupted");
                    }
                    if Instant::now() >= deadline {
                        bail!("motion still running after {timeout_ms} ms");
                    }
                    std::thread::sleep(Duration::from_millis(10));
                }
                Ok(())
            },

            ScriptCommand::Pose => {
                crate::commands::print_pose(&self.runtime.joint_pose());
                Ok(())
            },

            ScriptCommand::Stop => {
                println!("  硬复位");
                self.runtime.stop()?;
                Ok(())
            },
        }
    }

    /// 可被 Ctrl+C 打断的等待
    fn sleep(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while self.running.load(Ordering::Acquire) {
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                break;
            };
            std::thread::sleep(remaining.min(Duration::from_millis(50)));
        }
    }
}
