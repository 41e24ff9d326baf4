//! 关节索引和数组
//!
//! 双足下肢共 12 个关节（左右腿各 6 个），使用紧凑枚举作为 id，
//! 名称只在 I/O 边界（消息、增益文件）使用。
//!
//! # 示例
//!
//! ```rust
//! use wbc_protocol::{Joint, JointArray, Leg};
//!
//! let mut desired = JointArray::splat(0.0);
//! desired[Joint::RKnee] = 0.5;
//!
//! // 名称 ↔ id
//! let knee: Joint = "r_knee".parse().unwrap();
//! assert_eq!(knee.index(), 6);
//!
//! // 按腿取运动链（髋 → 踝）
//! let chain = Joint::chain(Leg::Right);
//! assert_eq!(chain[3], Joint::RKnee);
//! ```

use crate::ProtocolError;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// 关节数量
pub const JOINT_COUNT: usize = 12;

/// 腿
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Leg {
    Left,
    Right,
}

impl Leg {
    /// 另一条腿
    pub const fn opposite(self) -> Self {
        match self {
            Leg::Left => Leg::Right,
            Leg::Right => Leg::Left,
        }
    }

    /// 侧向符号（左 +1，右 -1），用于站姿足间距
    pub const fn lateral_sign(self) -> f64 {
        match self {
            Leg::Left => 1.0,
            Leg::Right => -1.0,
        }
    }
}

/// 关节枚举
///
/// 判别值即关节 id（舵机 id - 1），左右交错排列。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Joint {
    RHipYaw = 0,
    LHipYaw = 1,
    RHipRoll = 2,
    LHipRoll = 3,
    RHipPitch = 4,
    LHipPitch = 5,
    RKnee = 6,
    LKnee = 7,
    RAnkPitch = 8,
    LAnkPitch = 9,
    RAnkRoll = 10,
    LAnkRoll = 11,
}

impl Joint {
    /// 所有关节（按 id 顺序）
    pub const ALL: [Joint; JOINT_COUNT] = [
        Joint::RHipYaw,
        Joint::LHipYaw,
        Joint::RHipRoll,
        Joint::LHipRoll,
        Joint::RHipPitch,
        Joint::LHipPitch,
        Joint::RKnee,
        Joint::LKnee,
        Joint::RAnkPitch,
        Joint::LAnkPitch,
        Joint::RAnkRoll,
        Joint::LAnkRoll,
    ];

    /// 获取关节索引（0-11）
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 从索引创建关节（范围检查）
    pub fn from_index(index: usize) -> Option<Self> {
        u8::try_from(index).ok().and_then(|id| Joint::try_from(id).ok())
    }

    /// 从关节 id 创建（越界返回错误）
    pub fn from_id(id: u8) -> Result<Self, ProtocolError> {
        Joint::try_from(id).map_err(|_| ProtocolError::InvalidJointId(id))
    }

    /// 关节名称（与增益文件、消息中的名称一致）
    pub const fn name(self) -> &'static str {
        match self {
            Joint::RHipYaw => "r_hip_yaw",
            Joint::LHipYaw => "l_hip_yaw",
            Joint::RHipRoll => "r_hip_roll",
            Joint::LHipRoll => "l_hip_roll",
            Joint::RHipPitch => "r_hip_pitch",
            Joint::LHipPitch => "l_hip_pitch",
            Joint::RKnee => "r_knee",
            Joint::LKnee => "l_knee",
            Joint::RAnkPitch => "r_ank_pitch",
            Joint::LAnkPitch => "l_ank_pitch",
            Joint::RAnkRoll => "r_ank_roll",
            Joint::LAnkRoll => "l_ank_roll",
        }
    }

    /// 所属的腿
    pub const fn leg(self) -> Leg {
        if self.index() % 2 == 0 { Leg::Right } else { Leg::Left }
    }

    /// 腿部运动链（髋偏航、髋横滚、髋俯仰、膝、踝俯仰、踝横滚）
    pub const fn chain(leg: Leg) -> [Joint; 6] {
        match leg {
            Leg::Right => [
                Joint::RHipYaw,
                Joint::RHipRoll,
                Joint::RHipPitch,
                Joint::RKnee,
                Joint::RAnkPitch,
                Joint::RAnkRoll,
            ],
            Leg::Left => [
                Joint::LHipYaw,
                Joint::LHipRoll,
                Joint::LHipPitch,
                Joint::LKnee,
                Joint::LAnkPitch,
                Joint::LAnkRoll,
            ],
        }
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Joint {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Joint::ALL
            .iter()
            .copied()
            .find(|joint| joint.name() == s)
            .ok_or_else(|| ProtocolError::UnknownJoint(s.to_string()))
    }
}

/// 关节数组
///
/// 类型安全的 12 关节数组容器，支持索引、迭代和映射操作。
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointArray<T> {
    data: [T; JOINT_COUNT],
}

impl<T: Copy> Copy for JointArray<T> {}

impl<T> JointArray<T> {
    /// 创建新的关节数组
    #[inline]
    pub const fn new(data: [T; JOINT_COUNT]) -> Self {
        JointArray { data }
    }

    /// 从关节映射函数构造
    pub fn from_fn<F>(mut f: F) -> Self
    where
        F: FnMut(Joint) -> T,
    {
        JointArray::new(Joint::ALL.map(&mut f))
    }

    /// 获取内部数组的引用
    #[inline]
    pub fn as_array(&self) -> &[T; JOINT_COUNT] {
        &self.data
    }

    /// 获取内部数组（消耗 self）
    #[inline]
    pub fn into_array(self) -> [T; JOINT_COUNT] {
        self.data
    }

    /// 迭代器
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// 可变迭代器
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }

    /// 带关节的迭代器
    pub fn iter_joints(&self) -> impl Iterator<Item = (Joint, &T)> {
        Joint::ALL.into_iter().zip(self.data.iter())
    }

    /// 映射转换
    pub fn map<U, F>(self, f: F) -> JointArray<U>
    where
        F: FnMut(T) -> U,
    {
        JointArray::new(self.data.map(f))
    }
}

impl<T: Copy> JointArray<T> {
    /// 创建所有元素相同的数组
    #[inline]
    pub const fn splat(value: T) -> Self {
        JointArray::new([value; JOINT_COUNT])
    }

    /// 带关节的映射转换
    pub fn map_with_joint<U, F>(self, mut f: F) -> JointArray<U>
    where
        F: FnMut(Joint, T) -> U,
    {
        JointArray::new(std::array::from_fn(|i| f(Joint::ALL[i], self.data[i])))
    }

    /// 与另一个数组逐元素组合
    pub fn map_with<U: Copy, V, F>(self, other: JointArray<U>, mut f: F) -> JointArray<V>
    where
        F: FnMut(T, U) -> V,
    {
        JointArray::new(std::array::from_fn(|i| f(self.data[i], other.data[i])))
    }

    /// 取一条腿的 6 个值（运动链顺序）
    pub fn leg(&self, leg: Leg) -> [T; 6] {
        Joint::chain(leg).map(|joint| self.data[joint.index()])
    }

    /// 写入一条腿的 6 个值（运动链顺序）
    pub fn set_leg(&mut self, leg: Leg, values: [T; 6]) {
        for (joint, value) in Joint::chain(leg).into_iter().zip(values) {
            self.data[joint.index()] = value;
        }
    }
}

impl<T: Default> Default for JointArray<T> {
    fn default() -> Self {
        JointArray::new(std::array::from_fn(|_| T::default()))
    }
}

impl<T> Index<Joint> for JointArray<T> {
    type Output = T;

    #[inline]
    fn index(&self, joint: Joint) -> &T {
        &self.data[joint.index()]
    }
}

impl<T> IndexMut<Joint> for JointArray<T> {
    #[inline]
    fn index_mut(&mut self, joint: Joint) -> &mut T {
        &mut self.data[joint.index()]
    }
}

impl<T> From<[T; JOINT_COUNT]> for JointArray<T> {
    #[inline]
    fn from(data: [T; JOINT_COUNT]) -> Self {
        JointArray::new(data)
    }
}

impl<T> From<JointArray<T>> for [T; JOINT_COUNT] {
    #[inline]
    fn from(arr: JointArray<T>) -> Self {
        arr.data
    }
}

impl<T> IntoIterator for JointArray<T> {
    type Item = T;
    type IntoIter = std::array::IntoIter<T, JOINT_COUNT>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a JointArray<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

/// 关节位置（弧度）
pub type JointPositions = JointArray<f64>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_index() {
        assert_eq!(Joint::RHipYaw.index(), 0);
        assert_eq!(Joint::RKnee.index(), 6);
        assert_eq!(Joint::LAnkRoll.index(), 11);
    }

    #[test]
    fn test_joint_from_index() {
        assert_eq!(Joint::from_index(7), Some(Joint::LKnee));
        assert_eq!(Joint::from_index(12), None);
        assert!(Joint::from_id(200).is_err());
    }

    #[test]
    fn test_joint_name_round_trip() {
        for joint in Joint::ALL {
            let parsed: Joint = joint.name().parse().unwrap();
            assert_eq!(parsed, joint);
        }
        assert!("head_pan".parse::<Joint>().is_err());
    }

    #[test]
    fn test_joint_leg() {
        assert_eq!(Joint::RHipRoll.leg(), Leg::Right);
        assert_eq!(Joint::LAnkPitch.leg(), Leg::Left);

        // 每条腿 6 个关节，且链内都属于同一条腿
        for leg in [Leg::Left, Leg::Right] {
            assert!(Joint::chain(leg).iter().all(|j| j.leg() == leg));
        }
    }

    #[test]
    fn test_joint_array_leg_access() {
        let mut arr = JointArray::splat(0.0);
        arr.set_leg(Leg::Left, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        assert_eq!(arr[Joint::LHipYaw], 1.0);
        assert_eq!(arr[Joint::LKnee], 4.0);
        assert_eq!(arr[Joint::RKnee], 0.0);
        assert_eq!(arr.leg(Leg::Left), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_joint_array_map_with() {
        let a = JointArray::from_fn(|j| j.index() as f64);
        let b = JointArray::splat(0.5);
        let c = a.map_with(b, |x, y| x * y);

        assert_eq!(c[Joint::RHipYaw], 0.0);
        assert_eq!(c[Joint::LAnkRoll], 5.5);
    }

    #[test]
    fn test_joint_array_default() {
        let arr: JointArray<i32> = JointArray::default();
        assert!(arr.iter().all(|v| *v == 0));
    }
}
