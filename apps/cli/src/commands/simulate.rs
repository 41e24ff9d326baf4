//! simulate 命令
//!
//! 在当前线程上逐周期驱动控制器，执行器为回环模型（下一周期的当前位置等于本周期目标）。
//! 不做实时定时，用于离线检查运动和平衡修正是否可解。

use anyhow::{Result, bail};
use clap::Args;
use std::path::PathBuf;
use wbc_sdk::control::sensor::level_orientation;
use wbc_sdk::prelude::*;

use super::{load_config, print_pose};

/// 仿真命令参数
#[derive(Args, Debug)]
pub struct SimulateCommand {
    /// 模块配置文件（TOML）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 增益目录（覆盖配置）
    #[arg(short, long)]
    pub gains: Option<PathBuf>,

    /// 关节目标，如 `r_knee=0.5`（可重复）
    #[arg(short, long, value_parser = parse_joint_goal)]
    pub joint: Vec<(String, f64)>,

    /// 关节运动时长（秒）
    #[arg(long, default_value_t = 1.0)]
    pub mov_time: f64,

    /// 开启平衡
    #[arg(short, long)]
    pub balance: bool,

    /// 步行方向（forward/backward/left/right/turn_left/turn_right/stop），隐含 --balance
    #[arg(short, long)]
    pub walk: Option<StepDirection>,

    /// 步数
    #[arg(long, default_value_t = 2)]
    pub steps: u32,

    /// 单步时长（秒）
    #[arg(long, default_value_t = 0.5)]
    pub step_time: f64,

    /// 步长（米）
    #[arg(long, default_value_t = 0.02)]
    pub step_length: f64,

    /// 每个阶段最长仿真时间（秒）
    #[arg(long, default_value_t = 30.0)]
    pub max_time: f64,
}

fn parse_joint_goal(s: &str) -> Result<(String, f64), String> {
    let (name, angle) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=ANGLE, got `{s}`"))?;
    let angle = angle
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid angle `{angle}`: {e}"))?;
    Ok((name.trim().to_string(), angle))
}

/// 单线程闭环
struct Simulation {
    controller: WholebodyController,
    port: LoopbackActuators,
    sensors: SensorFrame,
    max_ticks: usize,
    ticks: usize,
}

impl Simulation {
    fn tick(&mut self) -> Result<Vec<ControlEvent>> {
        let input = TickInput {
            sensors: self.sensors,
            actuators: self.port.feedback(),
        };
        let output = self.controller.tick(&input);
        self.port.write_goal(&output.command)?;
        self.ticks += 1;

        for event in &output.events {
            match event {
                ControlEvent::Status(msg) => println!("  [{:>6}] {}", self.ticks, msg),
                other => println!("  [{:>6}] {:?}", self.ticks, other),
            }
        }
        Ok(output.events.into_vec())
    }

    /// 运行直到事件满足条件；返回满足条件的事件
    fn run_until<F>(&mut self, mut predicate: F) -> Result<ControlEvent>
    where
        F: FnMut(&ControlEvent) -> bool,
    {
        for _ in 0..self.max_ticks {
            if let Some(event) = self.tick()?.into_iter().find(|e| predicate(e)) {
                return Ok(event);
            }
        }
        bail!("no completion within {} ticks", self.max_ticks)
    }

    fn send(&mut self, command: ControlCommand) -> Result<()> {
        let name = command.name();
        self.controller
            .handle_command(command)
            .map_err(|e| anyhow::anyhow!("{name}: {e}"))
    }
}

impl SimulateCommand {
    pub fn execute(&self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        let gains = match self.gains.as_ref().or(config.gain_dir.as_ref()) {
            Some(dir) => GainSet::load_dir(dir)?,
            None => GainSet::default(),
        };

        let controller_config = ControllerConfig::from(&config);
        let max_ticks = (self.max_time / controller_config.control_cycle).ceil() as usize;
        let mut sim = Simulation {
            controller: WholebodyController::builder(controller_config)
                .gains(gains)
                .build(),
            port: LoopbackActuators::default(),
            sensors: SensorFrame {
                imu: ImuSample {
                    orientation: level_orientation(),
                    ..ImuSample::default()
                },
                ..SensorFrame::default()
            },
            max_ticks,
            ticks: 0,
        };

        // 采用执行器目标
        sim.tick()?;

        if !self.joint.is_empty() {
            println!("🦿 关节运动");
            let goal = JointPoseGoal::from_names(
                self.joint.iter().map(|(name, angle)| (name.as_str(), *angle)),
                self.mov_time,
            )?;
            sim.send(ControlCommand::JointPose(goal))?;
            sim.run_until(|e| matches!(e, ControlEvent::MovementDone(ControlMode::Joint)))?;
        }

        if self.balance || self.walk.is_some() {
            println!("⚖️  开启平衡");
            sim.send(ControlCommand::Balance {
                token: BalanceToken::On,
                gains: None,
            })?;
            let event = sim.run_until(|e| {
                matches!(e, ControlEvent::Aborted(_))
                    || matches!(e, ControlEvent::Status(msg) if msg.message.starts_with("[END]"))
            })?;
            if let ControlEvent::Aborted(err) = event {
                bail!("balance aborted: {err}");
            }
        }

        if let Some(direction) = self.walk {
            println!("🚶 步行 {direction:?} × {}", self.steps);
            let preview = RiccatiPreviewService::new()
                .preview_matrix(config.walking.lipm_height, config.control_cycle)?;
            sim.send(ControlCommand::FootStep {
                command: FootStepCommand {
                    direction,
                    step_num: self.steps,
                    step_time: self.step_time,
                    step_length: self.step_length,
                    side_step_length: 0.5 * self.step_length,
                    step_angle: 0.1,
                },
                preview: Some(preview),
            })?;
            let event = sim.run_until(|e| {
                matches!(
                    e,
                    ControlEvent::MovementDone(ControlMode::Walking) | ControlEvent::Aborted(_)
                )
            })?;
            if let ControlEvent::Aborted(err) = event {
                bail!("walking aborted: {err}");
            }
        }

        let snapshot = sim.controller.snapshot();
        println!();
        println!("📊 仿真结果 ({} 周期):", sim.ticks);
        println!("  mode={} balance={:?}", snapshot.mode, snapshot.balance);
        let body = snapshot.stance.body.position;
        println!("  body=({:.4}, {:.4}, {:.4})", body.x, body.y, body.z);
        print_pose(&sim.controller.joint_pose());
        Ok(())
    }
}
