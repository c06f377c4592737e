//! # Impulse responses
//!
//! $$
//! \Psi_0=I_K,\quad \Psi_h=\sum_{j=1}^{\min(h,p)}A_j\Psi_{h-j},\quad
//! \Theta_h=\Psi_h P,\ PP'=\Sigma_u
//! $$
//!
//! Standard errors follow the asymptotic delta method: for the moving-average
//! coefficients `Cov(vec Ψ_h) = G_h Σ_α G_h'`, and the orthogonalized responses add
//! the uncertainty of `P` through `vech Σ_u`.
use nalgebra::DMatrix;
use ndarray::Array3;
use statrs::distribution::ContinuousCDF;
use statrs::distribution::Normal;
use tracing::info;

use super::matrices::commutation;
use super::matrices::duplication_pinv;
use super::matrices::elimination;
use super::model::VarModel;
use crate::error::Result;
use crate::error::VarError;

#[derive(Debug, Clone, Copy)]
pub struct IrfConfig {
  /// Last period traced; surfaces hold periods `0..=horizon`.
  pub horizon: usize,
  /// Shock the Cholesky-orthogonalized innovations instead of `u_t`.
  pub orthogonalized: bool,
  /// Critical value for `estimate ± z·se` bands.
  pub z: f64,
}

impl Default for IrfConfig {
  fn default() -> Self {
    Self {
      horizon: 20,
      orthogonalized: false,
      z: 1.96,
    }
  }
}

impl IrfConfig {
  /// Two-sided bands at significance `alpha`, `z = Φ⁻¹(1 - α/2)`.
  pub fn with_significance(self, alpha: f64) -> Result<Self> {
    if !(alpha > 0.0 && alpha < 1.0) {
      return Err(VarError::InvalidArgument(format!(
        "significance must be in (0, 1), got {alpha}"
      )));
    }
    let normal = Normal::new(0.0, 1.0).map_err(|e| VarError::Distribution(e.to_string()))?;
    Ok(Self {
      z: normal.inverse_cdf(1.0 - alpha / 2.0),
      ..self
    })
  }
}

/// Response surfaces indexed `[period, response, shock]`.
#[derive(Debug, Clone)]
pub struct ImpulseResponse {
  pub names: Vec<String>,
  pub lag_order: usize,
  pub horizon: usize,
  pub orthogonalized: bool,
  pub z: f64,
  pub responses: Array3<f64>,
  pub stderr: Array3<f64>,
  pub cumulative: Array3<f64>,
  pub cumulative_stderr: Array3<f64>,
}

/// One flattened row of an IRF surface.
#[derive(Debug, Clone, PartialEq)]
pub struct IrfRecord {
  pub period: usize,
  pub irf: f64,
  pub lower: f64,
  pub upper: f64,
  pub shock: String,
  pub response: String,
}

/// Moving-average coefficients `Ψ_0..=Ψ_horizon`.
pub fn ma_rep(coefs: &[DMatrix<f64>], nvars: usize, horizon: usize) -> Vec<DMatrix<f64>> {
  let mut psi: Vec<DMatrix<f64>> = Vec::with_capacity(horizon + 1);
  psi.push(DMatrix::identity(nvars, nvars));
  for h in 1..=horizon {
    let mut acc = DMatrix::zeros(nvars, nvars);
    for j in 1..=h.min(coefs.len()) {
      acc += &coefs[j - 1] * &psi[h - j];
    }
    psi.push(acc);
  }
  psi
}

fn cumsum(mats: &[DMatrix<f64>]) -> Vec<DMatrix<f64>> {
  let mut out: Vec<DMatrix<f64>> = Vec::with_capacity(mats.len());
  for m in mats {
    let next = match out.last() {
      Some(prev) => prev + m,
      None => m.clone(),
    };
    out.push(next);
  }
  out
}

/// `G_h = Σ_{m<h} J(A')^{h-1-m} ⊗ Ψ_m` for `h = 0..=horizon` (`G_0 = 0`).
fn g_matrices(model: &VarModel, psi: &[DMatrix<f64>], horizon: usize) -> Vec<DMatrix<f64>> {
  let k = model.nvars();
  let kp = k * model.lag_order();
  let at = model.companion().transpose();

  // J (A')^n: the first K rows of the n-th power, updated one product at a time.
  let mut j_pow = Vec::with_capacity(horizon);
  let mut cur = DMatrix::zeros(k, kp);
  cur.view_mut((0, 0), (k, k)).fill_with_identity();
  for _ in 0..horizon {
    let next = &cur * &at;
    j_pow.push(cur);
    cur = next;
  }

  let mut g = Vec::with_capacity(horizon + 1);
  g.push(DMatrix::zeros(k * k, k * kp));
  for h in 1..=horizon {
    let mut acc = DMatrix::zeros(k * k, k * kp);
    for m in 0..h {
      acc += j_pow[h - 1 - m].kronecker(&psi[m]);
    }
    g.push(acc);
  }
  g
}

/// `∂ vec P / ∂ vech Σ_u'` for the lower Cholesky factor `P`.
fn cholesky_jacobian(p: &DMatrix<f64>) -> Result<DMatrix<f64>> {
  let k = p.nrows();
  let eye = DMatrix::<f64>::identity(k, k);
  let l = elimination(k);
  let inner = eye.kronecker(p) * commutation(k, k) + p.kronecker(&eye);
  let b = &l * inner * l.transpose();
  let b_inv = b
    .try_inverse()
    .ok_or_else(|| VarError::SingularMatrix("Cholesky Jacobian is not invertible".into()))?;
  Ok(l.transpose() * b_inv)
}

/// Asymptotic covariance of `vech Σ_u`, `2 D⁺ (Σ ⊗ Σ) D⁺'`.
fn sigma_vech_cov(sigma: &DMatrix<f64>) -> DMatrix<f64> {
  let d_pinv = duplication_pinv(sigma.nrows());
  (&d_pinv * sigma.kronecker(sigma) * d_pinv.transpose()) * 2.0
}

/// Square roots of the diagonal of `Cov(vec M)` laid back out as `K × K`.
fn unvec_stderr(cov: &DMatrix<f64>, k: usize) -> DMatrix<f64> {
  DMatrix::from_fn(k, k, |i, j| {
    let idx = j * k + i;
    cov[(idx, idx)].max(0.0).sqrt()
  })
}

fn to_surface(mats: &[DMatrix<f64>], k: usize) -> Array3<f64> {
  Array3::from_shape_fn((mats.len(), k, k), |(h, i, j)| mats[h][(i, j)])
}

struct StderrInputs<'a> {
  cov_alpha: &'a DMatrix<f64>,
  k: usize,
  orth: Option<OrthInputs>,
}

struct OrthInputs {
  p_kron: DMatrix<f64>,
  jacobian: DMatrix<f64>,
  cov_sigma: DMatrix<f64>,
  nobs: f64,
}

impl StderrInputs<'_> {
  fn stderr(&self, g: &[DMatrix<f64>], psi: &[DMatrix<f64>]) -> Vec<DMatrix<f64>> {
    let eye = DMatrix::<f64>::identity(self.k, self.k);
    g.iter()
      .zip(psi)
      .map(|(g_h, psi_h)| {
        let cov = match &self.orth {
          None => g_h * self.cov_alpha * g_h.transpose(),
          Some(o) => {
            let c = &o.p_kron * g_h;
            let c_bar = eye.kronecker(psi_h) * &o.jacobian;
            &c * self.cov_alpha * c.transpose()
              + &c_bar * &o.cov_sigma * c_bar.transpose() / o.nobs
          }
        };
        unvec_stderr(&cov, self.k)
      })
      .collect()
  }
}

impl ImpulseResponse {
  pub fn compute(model: &VarModel, cfg: IrfConfig) -> Result<Self> {
    if model.lag_order() == 0 {
      return Err(VarError::InvalidArgument(
        "impulse responses need at least one lag".into(),
      ));
    }
    let k = model.nvars();
    let horizon = cfg.horizon;

    let psi = ma_rep(model.coefs(), k, horizon);
    let psi_cum = cumsum(&psi);
    let g = g_matrices(model, &psi, horizon);
    let f = cumsum(&g);
    let cov_alpha = model.cov_alpha();

    let (point, orth) = if cfg.orthogonalized {
      let p = model
        .sigma_u()
        .clone()
        .cholesky()
        .ok_or_else(|| VarError::SingularMatrix("residual covariance is not positive definite".into()))?
        .l();
      let orth = OrthInputs {
        p_kron: p.transpose().kronecker(&DMatrix::<f64>::identity(k, k)),
        jacobian: cholesky_jacobian(&p)?,
        cov_sigma: sigma_vech_cov(model.sigma_u()),
        nobs: model.nobs() as f64,
      };
      let theta: Vec<DMatrix<f64>> = psi.iter().map(|m| m * &p).collect();
      (theta, Some(orth))
    } else {
      (psi.clone(), None)
    };
    let point_cum = cumsum(&point);

    let inputs = StderrInputs {
      cov_alpha: &cov_alpha,
      k,
      orth,
    };
    let se = inputs.stderr(&g, &psi);
    let se_cum = inputs.stderr(&f, &psi_cum);

    info!(
      lag_order = model.lag_order(),
      horizon,
      orthogonalized = cfg.orthogonalized,
      "computed impulse responses"
    );

    Ok(Self {
      names: model.names().to_vec(),
      lag_order: model.lag_order(),
      horizon,
      orthogonalized: cfg.orthogonalized,
      z: cfg.z,
      responses: to_surface(&point, k),
      stderr: to_surface(&se, k),
      cumulative: to_surface(&point_cum, k),
      cumulative_stderr: to_surface(&se_cum, k),
    })
  }

  pub fn lower(&self) -> Array3<f64> {
    &self.responses - &(&self.stderr * self.z)
  }

  pub fn upper(&self) -> Array3<f64> {
    &self.responses + &(&self.stderr * self.z)
  }

  pub fn cumulative_lower(&self) -> Array3<f64> {
    &self.cumulative - &(&self.cumulative_stderr * self.z)
  }

  pub fn cumulative_upper(&self) -> Array3<f64> {
    &self.cumulative + &(&self.cumulative_stderr * self.z)
  }

  /// Rows ordered by shock, then response, then period.
  pub fn records(&self, cumulative: bool) -> Vec<IrfRecord> {
    let (value, se) = if cumulative {
      (&self.cumulative, &self.cumulative_stderr)
    } else {
      (&self.responses, &self.stderr)
    };
    let k = self.names.len();
    let mut out = Vec::with_capacity(k * k * (self.horizon + 1));
    for (shock_idx, shock) in self.names.iter().enumerate() {
      for (resp_idx, response) in self.names.iter().enumerate() {
        for period in 0..=self.horizon {
          let irf = value[[period, resp_idx, shock_idx]];
          let half = self.z * se[[period, resp_idx, shock_idx]];
          out.push(IrfRecord {
            period,
            irf,
            lower: irf - half,
            upper: irf + half,
            shock: shock.clone(),
            response: response.clone(),
          });
        }
      }
    }
    out
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use approx::assert_relative_eq;
  use ndarray::Array2;
  use ndarray::s;

  use super::*;
  use crate::var::sim::quarterly;
  use crate::var::sim::simulate;
  use crate::var::sim::simulate_var1;

  fn ar1_model() -> VarModel {
    let a = DMatrix::from_element(1, 1, 0.6);
    let nu = nalgebra::DVector::from_element(1, 0.2);
    VarModel::fit(&simulate(&a, &nu, 0.5, 200, 31), 1).unwrap()
  }

  #[test]
  fn first_response_is_identity_and_second_is_a1() {
    let model = VarModel::fit(&simulate_var1(0.5, 150, 2), 2).unwrap();
    let irf = ImpulseResponse::compute(&model, IrfConfig::default()).unwrap();

    assert_eq!(irf.responses.shape(), &[21, 2, 2]);
    assert_eq!(irf.responses.slice(s![0, .., ..]), Array2::<f64>::eye(2));
    for i in 0..2 {
      for j in 0..2 {
        assert_abs_diff_eq!(irf.responses[[1, i, j]], model.coefs()[0][(i, j)], epsilon = 1e-12);
      }
    }
  }

  #[test]
  fn cumulative_is_running_sum() {
    let model = VarModel::fit(&simulate_var1(0.5, 150, 2), 2).unwrap();
    let irf = ImpulseResponse::compute(
      &model,
      IrfConfig {
        horizon: 10,
        orthogonalized: true,
        ..IrfConfig::default()
      },
    )
    .unwrap();
    for h in 0..=10 {
      let summed = irf.responses.slice(s![..=h, .., ..]).sum_axis(ndarray::Axis(0));
      for (a, b) in summed.iter().zip(irf.cumulative.slice(s![h, .., ..]).iter()) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-12);
      }
    }
  }

  #[test]
  fn non_orthogonal_stderr_starts_at_zero_then_matches_coefficients() {
    let model = VarModel::fit(&simulate_var1(0.5, 150, 2), 1).unwrap();
    let irf = ImpulseResponse::compute(&model, IrfConfig::default()).unwrap();
    assert!(irf.stderr.slice(s![0, .., ..]).iter().all(|v| *v == 0.0));

    let xtx_inv = model.xtx_inv();
    let sigma = model.sigma_u();
    for i in 0..2 {
      for j in 0..2 {
        let expected = (xtx_inv[(1 + j, 1 + j)] * sigma[(i, i)]).sqrt();
        assert_relative_eq!(irf.stderr[[1, i, j]], expected, max_relative = 1e-10);
      }
    }
  }

  #[test]
  fn univariate_stderr_follows_delta_method() {
    let model = ar1_model();
    let a = model.coefs()[0][(0, 0)];
    let se_a = model.cov_alpha()[(0, 0)].sqrt();
    let sigma2 = model.sigma_u()[(0, 0)];
    let t = model.nobs() as f64;

    let plain = ImpulseResponse::compute(&model, IrfConfig::default()).unwrap();
    let orth = ImpulseResponse::compute(
      &model,
      IrfConfig {
        orthogonalized: true,
        ..IrfConfig::default()
      },
    )
    .unwrap();

    for h in 1..=6 {
      let d = h as f64 * a.powi(h as i32 - 1);
      assert_relative_eq!(plain.stderr[[h, 0, 0]], d * se_a, max_relative = 1e-9);

      let var = sigma2 * (d * se_a).powi(2) + a.powi(2 * h as i32) * sigma2 / (2.0 * t);
      assert_relative_eq!(orth.stderr[[h, 0, 0]], var.sqrt(), max_relative = 1e-9);
    }
    assert_relative_eq!(orth.responses[[0, 0, 0]], sigma2.sqrt(), max_relative = 1e-12);
  }

  #[test]
  fn orthogonal_impact_is_cholesky_factor() {
    let model = VarModel::fit(&simulate_var1(0.4, 200, 5), 1).unwrap();
    let p = model.sigma_u().clone().cholesky().unwrap().l();
    let irf = ImpulseResponse::compute(
      &model,
      IrfConfig {
        orthogonalized: true,
        horizon: 4,
        ..IrfConfig::default()
      },
    )
    .unwrap();
    for i in 0..2 {
      for j in 0..2 {
        assert_abs_diff_eq!(irf.responses[[0, i, j]], p[(i, j)], epsilon = 1e-12);
      }
    }
    assert_eq!(irf.responses[[0, 0, 1]], 0.0);
    assert!(irf.stderr[[0, 0, 0]] > 0.0);
  }

  #[test]
  fn records_are_ordered_by_shock_response_period() {
    let model = VarModel::fit(&simulate_var1(0.5, 120, 9), 1).unwrap();
    let irf = ImpulseResponse::compute(
      &model,
      IrfConfig {
        horizon: 3,
        ..IrfConfig::default()
      },
    )
    .unwrap();
    let recs = irf.records(false);
    assert_eq!(recs.len(), 2 * 2 * 4);
    assert_eq!((recs[0].shock.as_str(), recs[0].response.as_str()), ("gdp", "gdp"));
    assert_eq!(recs[5].period, 1);
    assert_eq!((recs[5].shock.as_str(), recs[5].response.as_str()), ("gdp", "cpi"));
    assert_eq!(recs[8].shock, "cpi");

    let lower = irf.lower();
    let r = &recs[5];
    assert_abs_diff_eq!(r.lower, lower[[1, 1, 0]], epsilon = 1e-12);
    assert_abs_diff_eq!(r.upper - r.irf, r.irf - r.lower, epsilon = 1e-12);
  }

  #[test]
  fn lag_zero_model_is_rejected() {
    let model = VarModel::fit(&quarterly(DMatrix::from_fn(20, 1, |r, _| (r as f64).sin())), 0).unwrap();
    assert!(matches!(
      ImpulseResponse::compute(&model, IrfConfig::default()),
      Err(VarError::InvalidArgument(_))
    ));
  }

  #[test]
  fn significance_maps_to_normal_quantile() {
    let cfg = IrfConfig::default().with_significance(0.05).unwrap();
    assert_abs_diff_eq!(cfg.z, 1.959964, epsilon = 1e-5);
    assert!(IrfConfig::default().with_significance(1.5).is_err());
  }
}
