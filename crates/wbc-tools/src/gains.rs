//! # 增益表
//!
//! 三个扁平 key/value 表：
//!
//! - `joint_feedback_gain.toml`：`{joint}_p_gain` / `{joint}_d_gain`
//! - `joint_feedforward_gain.toml`：`{joint}_gain`
//! - `balance_gain.toml`：各通道 PD 增益、低通截止频率、陀螺仪感觉反馈增益
//!
//! 加载失败时调用方应保留之前的增益（见 `wbc-control`）。

use crate::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};
use toml::{Table, Value};
use wbc_protocol::{Joint, JointArray};

pub const FEEDBACK_GAIN_FILE: &str = "joint_feedback_gain.toml";
pub const FEEDFORWARD_GAIN_FILE: &str = "joint_feedforward_gain.toml";
pub const BALANCE_GAIN_FILE: &str = "balance_gain.toml";

/// PD 增益
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PdGain {
    pub p: f64,
    pub d: f64,
}

impl PdGain {
    pub const fn new(p: f64, d: f64) -> Self {
        Self { p, d }
    }

    /// 按比例缩放（平衡增益渐变）
    pub fn scaled(self, ratio: f64) -> Self {
        Self {
            p: self.p * ratio,
            d: self.d * ratio,
        }
    }
}

/// 平衡控制增益
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceGains {
    // === PD 增益 ===
    pub foot_roll_gyro: PdGain,
    pub foot_pitch_gyro: PdGain,
    pub foot_roll_angle: PdGain,
    pub foot_pitch_angle: PdGain,
    pub foot_x_force: PdGain,
    pub foot_y_force: PdGain,
    pub foot_z_force: PdGain,
    pub foot_roll_torque: PdGain,
    pub foot_pitch_torque: PdGain,

    // === 低通截止频率（Hz） ===
    pub roll_gyro_cutoff: f64,
    pub pitch_gyro_cutoff: f64,
    pub roll_angle_cutoff: f64,
    pub pitch_angle_cutoff: f64,
    pub foot_x_force_cutoff: f64,
    pub foot_y_force_cutoff: f64,
    pub foot_z_force_cutoff: f64,
    pub foot_roll_torque_cutoff: f64,
    pub foot_pitch_torque_cutoff: f64,

    // === 陀螺仪感觉反馈 ===
    pub hip_roll_gain: f64,
    pub knee_gain: f64,
    pub ankle_roll_gain: f64,
    pub ankle_pitch_gain: f64,
}

impl Default for BalanceGains {
    fn default() -> Self {
        Self {
            foot_roll_gyro: PdGain::default(),
            foot_pitch_gyro: PdGain::default(),
            foot_roll_angle: PdGain::default(),
            foot_pitch_angle: PdGain::default(),
            foot_x_force: PdGain::default(),
            foot_y_force: PdGain::default(),
            foot_z_force: PdGain::default(),
            foot_roll_torque: PdGain::default(),
            foot_pitch_torque: PdGain::default(),
            roll_gyro_cutoff: 10.0,
            pitch_gyro_cutoff: 10.0,
            roll_angle_cutoff: 10.0,
            pitch_angle_cutoff: 10.0,
            foot_x_force_cutoff: 10.0,
            foot_y_force_cutoff: 10.0,
            foot_z_force_cutoff: 10.0,
            foot_roll_torque_cutoff: 10.0,
            foot_pitch_torque_cutoff: 10.0,
            hip_roll_gain: 0.0,
            knee_gain: 0.0,
            ankle_roll_gain: 0.0,
            ankle_pitch_gain: 0.0,
        }
    }
}

/// PD 通道名（`{name}_p_gain` / `{name}_d_gain`）
const BALANCE_PD_KEYS: [&str; 9] = [
    "foot_roll_gyro",
    "foot_pitch_gyro",
    "foot_roll_angle",
    "foot_pitch_angle",
    "foot_x_force",
    "foot_y_force",
    "foot_z_force",
    "foot_roll_torque",
    "foot_pitch_torque",
];

/// 截止频率通道名（`{name}_cut_off_frequency`）
const BALANCE_CUTOFF_KEYS: [&str; 9] = [
    "roll_gyro",
    "pitch_gyro",
    "roll_angle",
    "pitch_angle",
    "foot_x_force",
    "foot_y_force",
    "foot_z_force",
    "foot_roll_torque",
    "foot_pitch_torque",
];

const BALANCE_SENSORY_KEYS: [&str; 4] = [
    "balance_hip_roll_gain",
    "balance_knee_gain",
    "balance_ankle_roll_gain",
    "balance_ankle_pitch_gain",
];

impl BalanceGains {
    fn pd_slots(&mut self) -> [&mut PdGain; 9] {
        [
            &mut self.foot_roll_gyro,
            &mut self.foot_pitch_gyro,
            &mut self.foot_roll_angle,
            &mut self.foot_pitch_angle,
            &mut self.foot_x_force,
            &mut self.foot_y_force,
            &mut self.foot_z_force,
            &mut self.foot_roll_torque,
            &mut self.foot_pitch_torque,
        ]
    }

    fn cutoff_slots(&mut self) -> [&mut f64; 9] {
        [
            &mut self.roll_gyro_cutoff,
            &mut self.pitch_gyro_cutoff,
            &mut self.roll_angle_cutoff,
            &mut self.pitch_angle_cutoff,
            &mut self.foot_x_force_cutoff,
            &mut self.foot_y_force_cutoff,
            &mut self.foot_z_force_cutoff,
            &mut self.foot_roll_torque_cutoff,
            &mut self.foot_pitch_torque_cutoff,
        ]
    }

    fn sensory_slots(&mut self) -> [&mut f64; 4] {
        [
            &mut self.hip_roll_gain,
            &mut self.knee_gain,
            &mut self.ankle_roll_gain,
            &mut self.ankle_pitch_gain,
        ]
    }

    /// 从扁平表解析（所有键必须存在）
    pub fn from_table(table: &Table, file: &str) -> Result<Self, ConfigError> {
        let mut gains = Self::default();

        for (slot, name) in gains.pd_slots().into_iter().zip(BALANCE_PD_KEYS) {
            slot.p = read_number(table, file, &format!("{name}_p_gain"))?;
            slot.d = read_number(table, file, &format!("{name}_d_gain"))?;
        }
        for (slot, name) in gains.cutoff_slots().into_iter().zip(BALANCE_CUTOFF_KEYS) {
            *slot = read_number(table, file, &format!("{name}_cut_off_frequency"))?;
        }
        for (slot, key) in gains.sensory_slots().into_iter().zip(BALANCE_SENSORY_KEYS) {
            *slot = read_number(table, file, key)?;
        }

        Ok(gains)
    }

    /// 转换为扁平表
    pub fn to_table(&self) -> Table {
        let mut copy = *self;
        let mut table = Table::new();

        for (slot, name) in copy.pd_slots().into_iter().zip(BALANCE_PD_KEYS) {
            table.insert(format!("{name}_p_gain"), Value::Float(slot.p));
            table.insert(format!("{name}_d_gain"), Value::Float(slot.d));
        }
        for (slot, name) in copy.cutoff_slots().into_iter().zip(BALANCE_CUTOFF_KEYS) {
            table.insert(format!("{name}_cut_off_frequency"), Value::Float(*slot));
        }
        for (slot, key) in copy.sensory_slots().into_iter().zip(BALANCE_SENSORY_KEYS) {
            table.insert(key.to_string(), Value::Float(*slot));
        }

        table
    }
}

/// 完整增益集合
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GainSet {
    /// 关节 PD 反馈增益
    pub feedback: JointArray<PdGain>,
    /// 关节前馈增益
    pub feedforward: JointArray<f64>,
    /// 平衡增益
    pub balance: BalanceGains,
}

impl GainSet {
    /// 从目录加载三个增益文件
    ///
    /// # 错误
    ///
    /// 任一文件缺失、格式错误或缺少键都会返回 `ConfigError`。
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();

        let feedback = load_table(&dir.join(FEEDBACK_GAIN_FILE))?;
        let feedforward = load_table(&dir.join(FEEDFORWARD_GAIN_FILE))?;
        let balance = load_table(&dir.join(BALANCE_GAIN_FILE))?;

        Self::from_tables(&feedback, &feedforward, &balance)
    }

    /// 从已解析的表构造
    pub fn from_tables(
        feedback: &Table,
        feedforward: &Table,
        balance: &Table,
    ) -> Result<Self, ConfigError> {
        let mut gains = GainSet::default();

        for joint in Joint::ALL {
            let name = joint.name();
            gains.feedback[joint] = PdGain::new(
                read_number(feedback, FEEDBACK_GAIN_FILE, &format!("{name}_p_gain"))?,
                read_number(feedback, FEEDBACK_GAIN_FILE, &format!("{name}_d_gain"))?,
            );
            gains.feedforward[joint] =
                read_number(feedforward, FEEDFORWARD_GAIN_FILE, &format!("{name}_gain"))?;
        }
        gains.balance = BalanceGains::from_table(balance, BALANCE_GAIN_FILE)?;

        Ok(gains)
    }

    /// 写出三个增益文件（用于生成模板）
    pub fn write_dir(&self, dir: impl AsRef<Path>) -> Result<(), ConfigError> {
        let dir = dir.as_ref();

        let mut feedback = Table::new();
        let mut feedforward = Table::new();
        for joint in Joint::ALL {
            let name = joint.name();
            feedback.insert(format!("{name}_p_gain"), Value::Float(self.feedback[joint].p));
            feedback.insert(format!("{name}_d_gain"), Value::Float(self.feedback[joint].d));
            feedforward.insert(format!("{name}_gain"), Value::Float(self.feedforward[joint]));
        }

        write_table(&dir.join(FEEDBACK_GAIN_FILE), &feedback)?;
        write_table(&dir.join(FEEDFORWARD_GAIN_FILE), &feedforward)?;
        write_table(&dir.join(BALANCE_GAIN_FILE), &self.balance.to_table())
    }
}

fn load_table(path: &Path) -> Result<Table, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str::<Table>(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_table(path: &Path, table: &Table) -> Result<(), ConfigError> {
    let content = toml::to_string(table).map_err(|source| ConfigError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;

    fs::write(path, content).map_err(|source| ConfigError::Io {
        path: PathBuf::from(path),
        source,
    })
}

/// 读取数值键（整数会被转换为浮点）
fn read_number(table: &Table, file: &str, key: &str) -> Result<f64, ConfigError> {
    match table.get(key) {
        Some(Value::Float(v)) => Ok(*v),
        Some(Value::Integer(v)) => Ok(*v as f64),
        Some(_) => Err(ConfigError::NotNumeric {
            file: file.to_string(),
            key: key.to_string(),
        }),
        None => Err(ConfigError::MissingKey {
            file: file.to_string(),
            key: key.to_string(),
        }),
    }
}
