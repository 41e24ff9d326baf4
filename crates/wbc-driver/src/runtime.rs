//! 实时运行时
//!
//! [`WholebodyRuntime`] 独占一个控制线程，线程内拥有 [`WholebodyController`]：
//!
//! - 命令：调用线程解析后经有界通道（容量 10）送入，控制线程在每个周期开始时取空
//! - 传感器：调用线程写入 `ArcSwap`，控制线程每周期读取一次
//! - 状态：每周期发布控制器快照；事件经状态通道送出（满时丢弃并计数）
//! - 定时：绝对时间锚点 + `spin_sleep`，错过锚点时重置锚点

use crate::actuator::ActuatorPort;
use crate::command::{CommandResolver, RuntimeRequest};
use crate::error::DriverError;
use crate::metrics::{MetricsSnapshot, RuntimeMetrics};
use crate::state::RuntimeContext;
use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use wbc_control::{
    CALC_TIME_BUDGET, ControlCommand, ControlError, ControlEvent, ControllerSnapshot, SensorFrame,
    TickInput, WholebodyController,
};
use wbc_protocol::{
    BalanceMode, Command, ControlMode, ImuSample, JointArray, Joint, Pose6D, TaskGroup, Wrench,
};

/// 控制线程循环
pub(crate) struct ControlLoop {
    pub(crate) controller: WholebodyController,
    pub(crate) port: Box<dyn ActuatorPort>,
    pub(crate) ctx: Arc<RuntimeContext>,
    pub(crate) cmd_rx: Receiver<RuntimeRequest>,
    pub(crate) status_tx: Sender<ControlEvent>,
    pub(crate) is_running: Arc<AtomicBool>,
    pub(crate) metrics: Arc<RuntimeMetrics>,
}

impl ControlLoop {
    pub(crate) fn run(mut self) {
        // 设置线程优先级（可选 feature）
        #[cfg(feature = "realtime")]
        {
            use thread_priority::*;

            match set_current_thread_priority(ThreadPriority::Max) {
                Ok(_) => {
                    info!("Control thread priority set to MAX (realtime)");
                },
                Err(e) => {
                    warn!(
                        "Failed to set control thread priority: {}. \
                        On Linux, you may need to run with CAP_SYS_NICE or use rtkit.",
                        e
                    );
                },
            }
        }

        let period = Duration::from_secs_f64(self.controller.config().control_cycle);
        let mut next_tick = Instant::now();
        info!("Control loop started (period {:?})", period);

        while self.is_running.load(Ordering::Acquire) {
            // 1. 设定下一个锚点（绝对时间）
            next_tick += period;

            // 2. 处理积压的命令
            if !self.drain_commands() {
                info!("Command channel disconnected, control loop exiting");
                break;
            }

            // 3. 一个控制周期
            self.step();

            // 4. 睡眠到下一个锚点
            let now = Instant::now();
            if next_tick > now {
                spin_sleep::sleep(next_tick - now);
            } else {
                self.metrics.loop_overruns.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "Control loop overrun: cycle took {:?} (period {:?})",
                    now.duration_since(next_tick - period),
                    period
                );
                next_tick = now;
            }
        }

        info!("Control loop stopped");
    }

    /// 返回 `false` 表示命令通道已断开
    fn drain_commands(&mut self) -> bool {
        loop {
            match self.cmd_rx.try_recv() {
                Ok(RuntimeRequest::Command(command)) => self.apply(command),
                Ok(RuntimeRequest::Stop) => self.controller.stop(),
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn apply(&mut self, command: ControlCommand) {
        self.metrics.commands.fetch_add(1, Ordering::Relaxed);
        if let Err(ControlError::CommandRejected { .. }) = self.controller.handle_command(command)
        {
            self.metrics.rejected_commands.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn step(&mut self) {
        let actuators = self.port.feedback();
        self.ctx.actuators.store(Arc::new(actuators));

        let input = TickInput {
            sensors: **self.ctx.sensors.load(),
            actuators,
        };
        let output = self.controller.tick(&input);

        if let Err(e) = self.port.write_goal(&output.command) {
            self.metrics.actuator_errors.fetch_add(1, Ordering::Relaxed);
            warn!("Failed to write actuator goal: {}", e);
        }

        self.ctx.command.store(Arc::new(output.command));
        self.ctx.controller.store(Arc::new(self.controller.snapshot()));

        self.metrics.ticks.fetch_add(1, Ordering::Relaxed);
        if output.compute_time > CALC_TIME_BUDGET {
            self.metrics.slow_ticks.fetch_add(1, Ordering::Relaxed);
        }

        for event in output.events {
            if matches!(event, ControlEvent::Aborted(_)) {
                self.metrics.ik_aborts.fetch_add(1, Ordering::Relaxed);
            }
            match self.status_tx.try_send(event) {
                Ok(()) | Err(TrySendError::Disconnected(_)) => {},
                Err(TrySendError::Full(_)) => {
                    self.metrics.status_drops.fetch_add(1, Ordering::Relaxed);
                },
            }
        }
    }
}

/// 全身控制运行时（对外 API）
///
/// # 示例
///
/// ```rust,no_run
/// use wbc_driver::{LoopbackActuators, RuntimeBuilder};
/// use wbc_protocol::{Command, JointArray, JointPoseGoal};
///
/// # fn main() -> Result<(), wbc_driver::DriverError> {
/// let runtime = RuntimeBuilder::new().build(LoopbackActuators::new(JointArray::splat(0.0)))?;
///
/// let goal = JointPoseGoal::from_names([("r_knee", 0.5)], 1.0)?;
/// runtime.send(Command::JointPose(goal))?;
///
/// while let Ok(event) = runtime.events().recv() {
///     println!("{event:?}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct WholebodyRuntime {
    /// 命令发送通道
    ///
    /// Drop 时先关闭通道再 join，控制线程收到 `Disconnected` 后退出。
    cmd_tx: Option<Sender<RuntimeRequest>>,
    status_rx: Receiver<ControlEvent>,
    resolver: CommandResolver,
    ctx: Arc<RuntimeContext>,
    thread: Option<JoinHandle<()>>,
    is_running: Arc<AtomicBool>,
    metrics: Arc<RuntimeMetrics>,
}

impl WholebodyRuntime {
    pub(crate) fn start(
        control: ControlLoop,
        cmd_tx: Sender<RuntimeRequest>,
        status_rx: Receiver<ControlEvent>,
        resolver: CommandResolver,
    ) -> Result<Self, DriverError> {
        let ctx = control.ctx.clone();
        let is_running = control.is_running.clone();
        let metrics = control.metrics.clone();

        let thread = std::thread::Builder::new()
            .name("wbc-control".to_string())
            .spawn(move || control.run())
            .map_err(|e| DriverError::Thread(e.to_string()))?;

        Ok(Self {
            cmd_tx: Some(cmd_tx),
            status_rx,
            resolver,
            ctx,
            thread: Some(thread),
            is_running,
            metrics,
        })
    }

    fn request(&self, request: RuntimeRequest) -> Result<(), DriverError> {
        let tx = self.cmd_tx.as_ref().ok_or(DriverError::ChannelClosed)?;
        tx.try_send(request).map_err(|e| match e {
            TrySendError::Full(_) => DriverError::ChannelFull,
            TrySendError::Disconnected(_) => DriverError::ChannelClosed,
        })
    }

    // ==================== 命令 ====================

    /// 发送协议命令
    ///
    /// 在调用线程上完成参数检查、预观增益获取和增益文件读取。
    ///
    /// # 错误
    /// - `DriverError::Protocol`: 参数检查失败
    /// - `DriverError::NoGainDir` / `DriverError::Config`: 重载增益失败
    /// - `DriverError::ChannelFull`: 命令队列已满（缓冲区容量 10）
    /// - `DriverError::ChannelClosed`: 控制线程已退出
    pub fn send(&self, command: Command) -> Result<(), DriverError> {
        let resolved = self.resolver.resolve(command)?;
        self.request(RuntimeRequest::Command(resolved))
    }

    /// 发送已解析的控制命令
    pub fn send_control(&self, command: ControlCommand) -> Result<(), DriverError> {
        self.request(RuntimeRequest::Command(command))
    }

    /// 硬复位（清空期望轨迹，下一个周期重新采用执行器目标位置）
    pub fn stop(&self) -> Result<(), DriverError> {
        self.request(RuntimeRequest::Stop)
    }

    // ==================== 传感器 ====================

    pub fn update_imu(&self, raw: ImuSample) {
        self.ctx.update_imu(raw);
    }

    pub fn update_wrench(&self, left: Wrench, right: Wrench) {
        self.ctx.update_wrench(left, right);
    }

    pub fn sensors(&self) -> SensorFrame {
        **self.ctx.sensors.load()
    }

    // ==================== 查询 ====================

    /// 最近一个周期结束时的控制器快照（无锁）
    pub fn snapshot(&self) -> Arc<ControllerSnapshot> {
        self.ctx.controller.load_full()
    }

    pub fn mode(&self) -> ControlMode {
        self.ctx.controller.load().mode
    }

    pub fn balance(&self) -> BalanceMode {
        self.ctx.controller.load().balance
    }

    pub fn is_moving(&self) -> bool {
        self.ctx.controller.load().is_moving
    }

    /// 最近一个周期发送的关节命令
    pub fn last_command(&self) -> JointArray<f64> {
        **self.ctx.command.load()
    }

    /// 当前期望关节角（关节名 → 角度）
    pub fn joint_pose(&self) -> Vec<(&'static str, f64)> {
        let snapshot = self.ctx.controller.load();
        Joint::ALL
            .iter()
            .map(|joint| (joint.name(), snapshot.desired_joints[*joint]))
            .collect()
    }

    /// 任务组的世界系期望位姿
    pub fn task_pose(&self, group: TaskGroup) -> Pose6D {
        let stance = self.ctx.controller.load().stance;
        match group {
            TaskGroup::Body => stance.body,
            TaskGroup::LeftLeg => stance.left_foot,
            TaskGroup::RightLeg => stance.right_foot,
        }
    }

    /// 状态事件接收端
    pub fn events(&self) -> &Receiver<ControlEvent> {
        &self.status_rx
    }

    /// 等待满足条件的事件
    ///
    /// 超时或通道关闭返回 `None`，期间收到的其他事件被丢弃。
    pub fn wait_for_event<F>(&self, timeout: Duration, mut predicate: F) -> Option<ControlEvent>
    where
        F: FnMut(&ControlEvent) -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            match self.status_rx.recv_timeout(remaining) {
                Ok(event) if predicate(&event) => return Some(event),
                Ok(event) => debug!(?event, "skipping event"),
                Err(_) => return None,
            }
        }
    }

    pub fn get_metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    /// 控制线程是否存活
    pub fn is_healthy(&self) -> bool {
        self.thread.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for WholebodyRuntime {
    fn drop(&mut self) {
        // 通知控制线程退出
        self.is_running.store(false, Ordering::Release);

        // 关闭命令通道（在 join 之前）
        self.cmd_tx.take();

        if let Some(handle) = self.thread.take()
            && handle.join().is_err()
        {
            error!("Control thread panicked");
        }
    }
}
