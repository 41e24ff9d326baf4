//! 预观控制增益
//!
//! 步行质心轨迹由 cart-table 模型的 LQ 预观控制生成：
//!
//! ```text
//! x[k+1] = A·x[k] + B·u[k],   zmp[k] = C·x[k]
//!
//!     | 1  dt  dt²/2 |       | dt³/6 |
//! A = | 0   1  dt    |,  B = | dt²/2 |,  C = [1, 0, -zc/g]
//!     | 0   0  1     |       | dt    |
//!
//! u[k] = -K·x[k] + Σ_{j=1..N} f[j] · zmp_ref[k+j]
//! ```
//!
//! 增益矩阵由外部服务按 (质心高度, 控制周期) 提供，请求可能较慢，
//! 只能在非实时线程中调用。[`RiccatiPreviewService`] 是本地实现：
//! 迭代求解离散 Riccati 方程并缓存结果。

use crate::error::ControlError;
use crate::grf::GRAVITY;
use nalgebra::{Matrix1x3, Matrix3, Vector3};
use tracing::debug;

/// 预观增益
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewMatrix {
    /// 质心高度（米）
    pub lipm_height: f64,
    /// 控制周期（秒）
    pub control_cycle: f64,
    /// 状态反馈增益 K
    pub k: [f64; 3],
    /// 预观增益 f[1..=N]
    pub f: Vec<f64>,
}

impl PreviewMatrix {
    /// 预观步数 N
    pub fn horizon(&self) -> usize {
        self.f.len()
    }

    /// 系统矩阵 A、B、C
    pub fn system(&self) -> (Matrix3<f64>, Vector3<f64>, Matrix1x3<f64>) {
        cart_table(self.lipm_height, self.control_cycle)
    }
}

/// 预观增益服务
pub trait PreviewMatrixService: Send {
    /// 按质心高度和控制周期获取增益
    fn preview_matrix(
        &mut self,
        lipm_height: f64,
        control_cycle: f64,
    ) -> Result<PreviewMatrix, ControlError>;
}

fn cart_table(lipm_height: f64, dt: f64) -> (Matrix3<f64>, Vector3<f64>, Matrix1x3<f64>) {
    let a = Matrix3::new(
        1.0, dt, 0.5 * dt * dt, //
        0.0, 1.0, dt, //
        0.0, 0.0, 1.0,
    );
    let b = Vector3::new(dt * dt * dt / 6.0, 0.5 * dt * dt, dt);
    let c = Matrix1x3::new(1.0, 0.0, -lipm_height / GRAVITY);
    (a, b, c)
}

/// 本地 Riccati 迭代求解
#[derive(Debug, Clone)]
pub struct RiccatiPreviewService {
    /// 预观时长（秒）
    preview_time: f64,
    /// ZMP 误差权重
    q: f64,
    /// 控制输入权重
    r: f64,
    max_iterations: usize,
    cache: Vec<PreviewMatrix>,
}

impl Default for RiccatiPreviewService {
    fn default() -> Self {
        Self {
            preview_time: 1.6,
            q: 1.0,
            r: 1e-6,
            max_iterations: 100_000,
            cache: Vec::new(),
        }
    }
}

impl RiccatiPreviewService {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置预观时长
    pub fn with_preview_time(mut self, preview_time: f64) -> Self {
        self.preview_time = preview_time;
        self
    }

    /// 设置权重
    pub fn with_weights(mut self, q: f64, r: f64) -> Self {
        self.q = q;
        self.r = r;
        self
    }

    fn solve(&self, lipm_height: f64, dt: f64) -> Result<PreviewMatrix, ControlError> {
        let (a, b, c) = cart_table(lipm_height, dt);
        let qx = c.transpose() * self.q * c;

        let mut p = qx;
        let mut converged = false;
        for iteration in 0..self.max_iterations {
            let pb = p * b;
            let denom = self.r + (b.transpose() * pb)[(0, 0)];
            let next = qx + a.transpose() * p * a
                - (a.transpose() * pb) * (pb.transpose() * a) / denom;

            let diff = (next - p).abs().max();
            p = next;
            if diff <= 1e-10 * p.abs().max().max(1.0) {
                debug!(iteration, "Riccati iteration converged");
                converged = true;
                break;
            }
        }
        if !converged || !p.iter().all(|v| v.is_finite()) {
            return Err(ControlError::PreviewUnavailable(format!(
                "Riccati iteration did not converge (zc = {lipm_height}, dt = {dt})"
            )));
        }

        let pb = p * b;
        let denom = self.r + (b.transpose() * pb)[(0, 0)];
        let k = (pb.transpose() * a) / denom;
        let ac = a - b * k;

        let horizon = (self.preview_time / dt).round() as usize;
        let mut f = Vec::with_capacity(horizon);
        let mut s = c.transpose() * self.q;
        for _ in 0..horizon {
            f.push((b.transpose() * s)[(0, 0)] / denom);
            s = ac.transpose() * s;
        }

        Ok(PreviewMatrix {
            lipm_height,
            control_cycle: dt,
            k: [k[(0, 0)], k[(0, 1)], k[(0, 2)]],
            f,
        })
    }
}

impl PreviewMatrixService for RiccatiPreviewService {
    fn preview_matrix(
        &mut self,
        lipm_height: f64,
        control_cycle: f64,
    ) -> Result<PreviewMatrix, ControlError> {
        if !(lipm_height > 0.0 && control_cycle > 0.0) {
            return Err(ControlError::PreviewUnavailable(format!(
                "invalid request (zc = {lipm_height}, dt = {control_cycle})"
            )));
        }

        if let Some(cached) = self
            .cache
            .iter()
            .find(|m| m.lipm_height == lipm_height && m.control_cycle == control_cycle)
        {
            return Ok(cached.clone());
        }

        let matrix = self.solve(lipm_height, control_cycle)?;
        self.cache.push(matrix.clone());
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizon_length() {
        let mut service = RiccatiPreviewService::new();
        let m = service.preview_matrix(0.12, 0.008).unwrap();

        assert_eq!(m.horizon(), 200);
        assert!(m.k.iter().all(|v| v.is_finite()));
        // 预观增益随距离衰减
        assert!(m.f[0].abs() > m.f[199].abs());
    }

    #[test]
    fn test_invalid_request() {
        let mut service = RiccatiPreviewService::new();
        assert!(matches!(
            service.preview_matrix(0.0, 0.008),
            Err(ControlError::PreviewUnavailable(_))
        ));
    }

    #[test]
    fn test_cached_result() {
        let mut service = RiccatiPreviewService::new();
        let first = service.preview_matrix(0.12, 0.008).unwrap();
        let second = service.preview_matrix(0.12, 0.008).unwrap();
        assert_eq!(first, second);
        assert_eq!(service.cache.len(), 1);
    }

    #[test]
    fn test_tracks_constant_reference() {
        let mut service = RiccatiPreviewService::new();
        let m = service.preview_matrix(0.12, 0.008).unwrap();
        let (a, b, c) = m.system();

        let reference = 0.05;
        let mut x = Vector3::<f64>::zeros();
        for _ in 0..500 {
            let u = -(m.k[0] * x[0] + m.k[1] * x[1] + m.k[2] * x[2])
                + m.f.iter().sum::<f64>() * reference;
            x = a * x + b * u;
        }

        let zmp = (c * x)[(0, 0)];
        assert!((zmp - reference).abs() < 2e-3, "zmp = {zmp}");
        assert!((x[0] - reference).abs() < 2e-3, "com = {}", x[0]);
    }
}
