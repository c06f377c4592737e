//! # Information criteria
//!
//! $$
//! \mathrm{AIC}=\ln|\tilde\Sigma_u|+\frac{2pK^2}{T},\quad
//! \mathrm{BIC}=\ln|\tilde\Sigma_u|+\frac{\ln T}{T}pK^2,\quad
//! \mathrm{HQIC}=\ln|\tilde\Sigma_u|+\frac{2\ln\ln T}{T}pK^2
//! $$
//!
use std::f64::consts::PI;
use std::fmt;

use nalgebra::DMatrix;
use tracing::warn;

use super::model::VarModel;

/// Divisor used for the residual covariance entering the criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CovarianceNormalization {
  /// `U'U / T_eff`
  #[default]
  MaximumLikelihood,
  /// `U'U / (T_eff - Kp - 1)`
  BiasCorrected,
}

impl fmt::Display for CovarianceNormalization {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::MaximumLikelihood => write!(f, "maximum-likelihood"),
      Self::BiasCorrected => write!(f, "bias-corrected"),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
  Aic,
  Bic,
  Hqic,
  Fpe,
}

impl fmt::Display for Criterion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Aic => "AIC",
      Self::Bic => "BIC",
      Self::Hqic => "HQIC",
      Self::Fpe => "FPE",
    };
    f.write_str(name)
  }
}

/// Model-selection statistics of one fitted lag order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfoCriteria {
  /// Lag order `p`.
  pub lag_order: usize,
  /// Effective sample size `T_eff`.
  pub nobs: usize,
  pub aic: f64,
  pub bic: f64,
  pub hqic: f64,
  /// Final prediction error.
  pub fpe: f64,
  /// Gaussian log-likelihood.
  pub llf: f64,
  /// Covariance divisor shared by all of the above.
  pub normalization: CovarianceNormalization,
}

impl InfoCriteria {
  pub fn from_model(model: &VarModel, normalization: CovarianceNormalization) -> Self {
    let sigma = model.sigma(normalization);
    let ld = log_det(&sigma);
    let t = model.nobs() as f64;
    let k = model.nvars() as f64;
    let p = model.lag_order() as f64;
    let free = p * k * k;

    let fpe_ratio = (t + p * k + 1.0) / (t - p * k - 1.0);

    Self {
      lag_order: model.lag_order(),
      nobs: model.nobs(),
      aic: ld + 2.0 * free / t,
      bic: ld + t.ln() * free / t,
      hqic: ld + 2.0 * t.ln().ln() * free / t,
      fpe: ld.exp() * fpe_ratio.powf(k),
      llf: log_likelihood_from_log_det(ld, model.nobs(), model.nvars()),
      normalization,
    }
  }

  pub fn value(&self, criterion: Criterion) -> f64 {
    match criterion {
      Criterion::Aic => self.aic,
      Criterion::Bic => self.bic,
      Criterion::Hqic => self.hqic,
      Criterion::Fpe => self.fpe,
    }
  }
}

/// `ln det Σ` through the Cholesky factor, floored at `ln f64::MIN_POSITIVE`.
pub fn log_det(sigma: &DMatrix<f64>) -> f64 {
  let floor = f64::MIN_POSITIVE.ln();
  let ld = sigma
    .clone()
    .cholesky()
    .map(|ch| 2.0 * ch.l().diagonal().iter().map(|d| d.ln()).sum::<f64>());

  match ld {
    Some(ld) if ld.is_finite() && ld > floor => ld,
    _ => {
      warn!("residual covariance is singular, flooring its determinant");
      floor
    }
  }
}

pub fn log_likelihood(model: &VarModel, normalization: CovarianceNormalization) -> f64 {
  let ld = log_det(&model.sigma(normalization));
  log_likelihood_from_log_det(ld, model.nobs(), model.nvars())
}

fn log_likelihood_from_log_det(ld: f64, nobs: usize, nvars: usize) -> f64 {
  let t = nobs as f64;
  let k = nvars as f64;
  -(t * k / 2.0) * (2.0 * PI).ln() - (t / 2.0) * ld - t * k / 2.0
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use tracing_test::traced_test;

  use super::*;
  use crate::var::sim::simulate_var1;

  #[test]
  fn log_det_matches_product_of_diagonal() {
    let sigma = DMatrix::from_row_slice(2, 2, &[4.0, 0.0, 0.0, 9.0]);
    assert_abs_diff_eq!(log_det(&sigma), 36.0_f64.ln(), epsilon = 1e-12);
  }

  #[test]
  #[traced_test]
  fn singular_covariance_is_floored_and_logged() {
    let sigma = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
    let ld = log_det(&sigma);
    assert!(ld.is_finite());
    assert_abs_diff_eq!(ld, f64::MIN_POSITIVE.ln(), epsilon = 1e-9);
    assert!(logs_contain("flooring its determinant"));
  }

  #[test]
  fn bic_penalizes_more_than_aic() {
    let series = simulate_var1(0.5, 120, 3);
    for p in 1..=4 {
      let model = VarModel::fit(&series, p).unwrap();
      let ic = InfoCriteria::from_model(&model, CovarianceNormalization::MaximumLikelihood);
      assert!(ic.bic >= ic.aic, "lag {p}: {ic:?}");
      assert!(ic.hqic >= ic.aic, "lag {p}: {ic:?}");
      assert!(ic.fpe > 0.0);
    }
  }

  #[test]
  fn normalization_shifts_log_det_by_df_ratio() {
    let series = simulate_var1(0.5, 80, 11);
    let model = VarModel::fit(&series, 2).unwrap();
    let ml = InfoCriteria::from_model(&model, CovarianceNormalization::MaximumLikelihood);
    let bc = InfoCriteria::from_model(&model, CovarianceNormalization::BiasCorrected);

    let k = model.nvars() as f64;
    let ratio = model.nobs() as f64 / model.df_resid() as f64;
    assert_abs_diff_eq!(bc.aic - ml.aic, k * ratio.ln(), epsilon = 1e-9);
    assert_eq!(bc.normalization, CovarianceNormalization::BiasCorrected);
  }

  #[test]
  fn log_likelihood_agrees_with_record() {
    let series = simulate_var1(0.3, 60, 5);
    let model = VarModel::fit(&series, 1).unwrap();
    let ic = InfoCriteria::from_model(&model, CovarianceNormalization::MaximumLikelihood);
    assert_abs_diff_eq!(
      ic.llf,
      log_likelihood(&model, CovarianceNormalization::MaximumLikelihood),
      epsilon = 1e-12
    );
  }
}
