use nalgebra::DMatrix;
use nalgebra::DVector;

use crate::error::Result;
use crate::error::VarError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeterministicTerm {
  None,
  Constant,
  ConstantTrend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LagSelection {
  Fixed(usize),
  Aic,
  Bic,
  TStat,
}

#[derive(Debug, Clone, Copy)]
pub struct CriticalValues {
  pub one_percent: f64,
  pub five_percent: f64,
  pub ten_percent: f64,
}

#[derive(Debug, Clone)]
pub struct OlsResult {
  pub beta: Vec<f64>,
  pub std_err: Vec<f64>,
  pub residuals: Vec<f64>,
  pub sse: f64,
  pub sigma2: f64,
  pub nobs: usize,
  pub k: usize,
}

#[derive(Debug, Clone)]
pub struct AdfFit {
  pub lag: usize,
  pub statistic: f64,
  pub gamma: f64,
  pub std_err_gamma: f64,
  pub nobs: usize,
  pub residuals: Vec<f64>,
  pub sigma2: f64,
}

pub fn validate_series(y: &[f64], min_n: usize) -> Result<()> {
  if y.len() < min_n {
    return Err(VarError::InsufficientData {
      nobs: y.len(),
      required: min_n.saturating_sub(1),
    });
  }
  if let Some(row) = y.iter().position(|v| !v.is_finite()) {
    return Err(VarError::NonFinite {
      column: "series".into(),
      row,
    });
  }
  Ok(())
}

pub fn validate_alpha(alpha: f64) -> Result<()> {
  if alpha > 0.0 && alpha < 1.0 {
    Ok(())
  } else {
    Err(VarError::InvalidArgument(format!(
      "alpha must be in (0, 1), got {alpha}"
    )))
  }
}

pub fn difference(y: &[f64]) -> Vec<f64> {
  y.windows(2).map(|w| w[1] - w[0]).collect()
}

pub fn schwert_max_lags(n: usize) -> usize {
  if n <= 1 {
    return 0;
  }
  (12.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize
}

pub fn adf_critical_values(det: DeterministicTerm) -> CriticalValues {
  match det {
    // Asymptotic MacKinnon values.
    DeterministicTerm::None => CriticalValues {
      one_percent: -2.58,
      five_percent: -1.95,
      ten_percent: -1.62,
    },
    DeterministicTerm::Constant => CriticalValues {
      one_percent: -3.43,
      five_percent: -2.86,
      ten_percent: -2.57,
    },
    DeterministicTerm::ConstantTrend => CriticalValues {
      one_percent: -3.96,
      five_percent: -3.41,
      ten_percent: -3.13,
    },
  }
}

pub fn ols(y: &[f64], x: &[Vec<f64>]) -> Result<OlsResult> {
  if y.is_empty() || y.len() != x.len() {
    return Err(VarError::InvalidArgument(format!(
      "OLS needs matching non-empty rows, got {} responses and {} regressor rows",
      y.len(),
      x.len()
    )));
  }
  let n = y.len();
  let k = x[0].len();
  if k == 0 || x.iter().any(|row| row.len() != k) {
    return Err(VarError::InvalidArgument(
      "OLS design matrix must be rectangular with at least one regressor".into(),
    ));
  }
  if n <= k {
    return Err(VarError::InsufficientData {
      nobs: n,
      required: k,
    });
  }

  let mut flat_x = Vec::with_capacity(n * k);
  for row in x {
    flat_x.extend_from_slice(row);
  }

  let x_mat = DMatrix::from_row_slice(n, k, &flat_x);
  let y_vec = DVector::from_row_slice(y);

  let xtx = x_mat.transpose() * &x_mat;
  let Some(xtx_inv) = xtx.try_inverse() else {
    return Err(VarError::SingularMatrix(
      "unit-root test regression has collinear regressors".into(),
    ));
  };

  let beta = &xtx_inv * x_mat.transpose() * &y_vec;
  let fitted = &x_mat * &beta;
  let residuals_vec = y_vec - fitted;

  let residuals: Vec<f64> = residuals_vec.iter().copied().collect();
  let sse = residuals.iter().map(|u| u * u).sum::<f64>();
  let dof = (n - k) as f64;
  let sigma2 = (sse / dof).max(0.0);

  let cov = xtx_inv * sigma2;
  let std_err = (0..k).map(|i| cov[(i, i)].max(0.0).sqrt()).collect();

  Ok(OlsResult {
    beta: beta.iter().copied().collect(),
    std_err,
    residuals,
    sse,
    sigma2,
    nobs: n,
    k,
  })
}

/// Regression rows for `Δy_t = det + γ y_{t-1} + Σ δ_i Δy_{t-i}`, starting at
/// difference index `start` (≥ `lags`) so that several lag orders can share a sample.
fn build_adf_design(
  y: &[f64],
  lags: usize,
  start: usize,
  det: DeterministicTerm,
) -> Result<(Vec<f64>, Vec<Vec<f64>>, usize)> {
  validate_series(y, 3 + lags)?;
  let dy = difference(y);
  let n_dy = dy.len();
  if n_dy <= start {
    return Err(VarError::InsufficientData {
      nobs: n_dy,
      required: start,
    });
  }

  let mut lhs = Vec::with_capacity(n_dy - start);
  let mut rhs = Vec::with_capacity(n_dy - start);

  for t in start..n_dy {
    lhs.push(dy[t]);

    let mut row = Vec::with_capacity(3 + lags);
    match det {
      DeterministicTerm::None => {}
      DeterministicTerm::Constant => row.push(1.0),
      DeterministicTerm::ConstantTrend => {
        row.push(1.0);
        row.push((t + 1) as f64);
      }
    }

    // dy index t corresponds to original time t+1, so y[t] is the lagged level.
    row.push(y[t]);

    for i in 1..=lags {
      row.push(dy[t - i]);
    }

    rhs.push(row);
  }

  let gamma_index = match det {
    DeterministicTerm::None => 0,
    DeterministicTerm::Constant => 1,
    DeterministicTerm::ConstantTrend => 2,
  };

  Ok((lhs, rhs, gamma_index))
}

pub fn fit_adf(y: &[f64], lags: usize, det: DeterministicTerm) -> Result<AdfFit> {
  let (lhs, rhs, gamma_index) = build_adf_design(y, lags, lags, det)?;
  let ols_fit = ols(&lhs, &rhs)?;

  let gamma = ols_fit.beta[gamma_index];
  let se = ols_fit.std_err[gamma_index];
  let statistic = if se > 0.0 { gamma / se } else { f64::NAN };

  Ok(AdfFit {
    lag: lags,
    statistic,
    gamma,
    std_err_gamma: se,
    nobs: ols_fit.nobs,
    residuals: ols_fit.residuals,
    sigma2: ols_fit.sigma2,
  })
}

pub fn aic_from_sse(sse: f64, nobs: usize, k: usize) -> f64 {
  let n = nobs as f64;
  n * (sse / n).ln() + 2.0 * k as f64
}

pub fn bic_from_sse(sse: f64, nobs: usize, k: usize) -> f64 {
  let n = nobs as f64;
  n * (sse / n).ln() + (k as f64) * n.ln()
}

/// Picks the ADF augmentation order; every candidate is fit on the sample left
/// after dropping `max_lags` differences so the criteria are comparable.
pub fn choose_lag_for_adf(
  y: &[f64],
  det: DeterministicTerm,
  lag_selection: LagSelection,
  max_lags: usize,
) -> Result<usize> {
  if let LagSelection::Fixed(p) = lag_selection {
    return Ok(p);
  }

  let mut best_lag = 0usize;
  let mut best_score = f64::INFINITY;

  // (lag, tstat_last_lag)
  let mut candidates: Vec<(usize, f64)> = Vec::new();

  for lag in 0..=max_lags {
    let (lhs, rhs, _gamma_idx) = build_adf_design(y, lag, max_lags, det)?;
    let fit = ols(&lhs, &rhs)?;

    let ic = match lag_selection {
      LagSelection::Aic => aic_from_sse(fit.sse, fit.nobs, fit.k),
      LagSelection::Bic => bic_from_sse(fit.sse, fit.nobs, fit.k),
      LagSelection::Fixed(_) | LagSelection::TStat => 0.0,
    };

    let t_last = if lag > 0 {
      let idx = fit.k - 1;
      let se = fit.std_err[idx];
      if se > 0.0 {
        fit.beta[idx] / se
      } else {
        0.0
      }
    } else {
      0.0
    };

    if matches!(lag_selection, LagSelection::Aic | LagSelection::Bic) && ic < best_score {
      best_score = ic;
      best_lag = lag;
    }

    candidates.push((lag, t_last));
  }

  Ok(match lag_selection {
    LagSelection::TStat => candidates
      .into_iter()
      .rev()
      .find(|(lag, t_last)| *lag == 0 || t_last.abs() >= 1.644_853_626_951_472_2)
      .map_or(0, |(lag, _)| lag),
    _ => best_lag,
  })
}

pub fn newey_west_long_run_variance(u: &[f64], lags: usize) -> f64 {
  let n = u.len();
  if n == 0 {
    return 0.0;
  }
  let n_f = n as f64;

  let gamma0 = u.iter().map(|v| v * v).sum::<f64>() / n_f;
  let mut lr_var = gamma0;

  for j in 1..=lags.min(n - 1) {
    let weight = 1.0 - (j as f64) / (lags as f64 + 1.0);
    let cov = (j..n).map(|t| u[t] * u[t - j]).sum::<f64>() / n_f;
    lr_var += 2.0 * weight * cov;
  }

  if lr_var <= 0.0 || !lr_var.is_finite() {
    gamma0.max(1e-12)
  } else {
    lr_var
  }
}

pub fn regress_on_deterministics(y: &[f64], include_trend: bool) -> Result<OlsResult> {
  validate_series(y, if include_trend { 3 } else { 2 })?;
  let x: Vec<Vec<f64>> = (0..y.len())
    .map(|t| {
      if include_trend {
        vec![1.0, (t + 1) as f64]
      } else {
        vec![1.0]
      }
    })
    .collect();
  ols(y, &x)
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;

  #[test]
  fn ols_recovers_exact_line() {
    let y: Vec<f64> = (0..10).map(|t| 2.0 + 0.5 * t as f64).collect();
    let x: Vec<Vec<f64>> = (0..10).map(|t| vec![1.0, t as f64]).collect();
    let fit = ols(&y, &x).unwrap();
    assert_abs_diff_eq!(fit.beta[0], 2.0, epsilon = 1e-10);
    assert_abs_diff_eq!(fit.beta[1], 0.5, epsilon = 1e-10);
    assert!(fit.sse < 1e-18);
  }

  #[test]
  fn ols_flags_collinear_columns() {
    let y = vec![1.0, 2.0, 3.0, 5.0];
    let x: Vec<Vec<f64>> = (0..4).map(|t| vec![1.0, t as f64, t as f64]).collect();
    assert!(matches!(ols(&y, &x), Err(VarError::SingularMatrix(_))));
  }

  #[test]
  fn schwert_rule_matches_reference_points() {
    assert_eq!(schwert_max_lags(100), 12);
    assert_eq!(schwert_max_lags(1), 0);
  }

  #[test]
  fn newey_west_without_lags_is_mean_square() {
    let u = [1.0, -1.0, 2.0, -2.0];
    assert_abs_diff_eq!(newey_west_long_run_variance(&u, 0), 2.5, epsilon = 1e-12);
  }
}
