//! # VAR fitter
//!
//! $$
//! Y = XB + U,\qquad \hat B=(X'X)^{-1}X'Y,\qquad
//! \hat\Sigma_u=\frac{\hat U'\hat U}{T-Kp-1}
//! $$
//!
use nalgebra::DMatrix;
use nalgebra::DVector;
use tracing::debug;

use super::criteria::CovarianceNormalization;
use super::design::lag_design;
use crate::data::MultivariateSeries;
use crate::error::Result;
use crate::error::VarError;

/// Rows `start..end` of the source series used as regression observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleWindow {
  pub start: usize,
  pub end: usize,
}

impl SampleWindow {
  pub fn len(&self) -> usize {
    self.end - self.start
  }

  pub fn is_empty(&self) -> bool {
    self.end <= self.start
  }
}

/// OLS estimate of a VAR(p) with intercept.
#[derive(Debug, Clone)]
pub struct VarModel {
  names: Vec<String>,
  lag_order: usize,
  window: SampleWindow,
  intercept: DVector<f64>,
  /// `coefs[j - 1]` is `A_j`.
  coefs: Vec<DMatrix<f64>>,
  residuals: DMatrix<f64>,
  sigma_u: DMatrix<f64>,
  xtx_inv: DMatrix<f64>,
}

impl VarModel {
  /// Fits on every usable row, i.e. the window starting at `lags`.
  pub fn fit(series: &MultivariateSeries, lags: usize) -> Result<Self> {
    Self::fit_window(series, lags, lags)
  }

  /// Fits on rows `start..T`. Nested lag orders fit with a shared `start` have
  /// identical samples.
  pub fn fit_window(series: &MultivariateSeries, lags: usize, start: usize) -> Result<Self> {
    if start < lags {
      return Err(VarError::InvalidArgument(format!(
        "window start {start} leaves no room for {lags} lags"
      )));
    }
    let k = series.nvars();
    let n_params = k * lags + 1;
    let nobs = series.nobs().saturating_sub(start);
    if nobs <= n_params {
      return Err(VarError::InsufficientData {
        nobs,
        required: n_params,
      });
    }

    let design = lag_design(series.values(), lags, start);
    let x = &design.x;

    let svd = x.clone().svd(true, true);
    let tol = svd.singular_values.max() * f64::EPSILON * nobs.max(n_params) as f64;
    let rank = svd.rank(tol);
    if rank < n_params {
      return Err(VarError::SingularMatrix(format!(
        "lag-{lags} regressor matrix has rank {rank} but {n_params} columns"
      )));
    }
    let beta = svd
      .solve(&design.y, tol)
      .map_err(|e| VarError::SingularMatrix(e.to_string()))?;

    let xtx_inv = (x.transpose() * x)
      .cholesky()
      .ok_or_else(|| VarError::SingularMatrix(format!("X'X is not positive definite at lag {lags}")))?
      .inverse();

    let residuals = &design.y - x * &beta;
    let df = (nobs - n_params) as f64;
    let sigma_u = residuals.transpose() * &residuals / df;

    let intercept = beta.row(0).transpose();
    let coefs = (0..lags)
      .map(|j| beta.rows(1 + j * k, k).transpose())
      .collect();

    debug!(lags, start, nobs, nvars = k, "fitted VAR");

    Ok(Self {
      names: series.names().to_vec(),
      lag_order: lags,
      window: SampleWindow {
        start,
        end: series.nobs(),
      },
      intercept,
      coefs,
      residuals,
      sigma_u,
      xtx_inv,
    })
  }

  pub fn names(&self) -> &[String] {
    &self.names
  }

  pub fn lag_order(&self) -> usize {
    self.lag_order
  }

  pub fn window(&self) -> SampleWindow {
    self.window
  }

  /// Effective sample size `T_eff`.
  pub fn nobs(&self) -> usize {
    self.window.len()
  }

  pub fn nvars(&self) -> usize {
    self.names.len()
  }

  /// Residual degrees of freedom per equation.
  pub fn df_resid(&self) -> usize {
    self.nobs() - (self.nvars() * self.lag_order + 1)
  }

  pub fn intercept(&self) -> &DVector<f64> {
    &self.intercept
  }

  pub fn coefs(&self) -> &[DMatrix<f64>] {
    &self.coefs
  }

  /// `T_eff × K`, aligned with the window rows.
  pub fn residuals(&self) -> &DMatrix<f64> {
    &self.residuals
  }

  /// Bias-corrected residual covariance.
  pub fn sigma_u(&self) -> &DMatrix<f64> {
    &self.sigma_u
  }

  pub fn sigma_u_mle(&self) -> DMatrix<f64> {
    &self.sigma_u * (self.df_resid() as f64 / self.nobs() as f64)
  }

  pub fn sigma(&self, normalization: CovarianceNormalization) -> DMatrix<f64> {
    match normalization {
      CovarianceNormalization::MaximumLikelihood => self.sigma_u_mle(),
      CovarianceNormalization::BiasCorrected => self.sigma_u.clone(),
    }
  }

  pub fn xtx_inv(&self) -> &DMatrix<f64> {
    &self.xtx_inv
  }

  /// `Cov(vec[A_1 … A_p])`, dropping the intercept block.
  pub fn cov_alpha(&self) -> DMatrix<f64> {
    let kp = self.nvars() * self.lag_order;
    self
      .xtx_inv
      .view((1, 1), (kp, kp))
      .into_owned()
      .kronecker(&self.sigma_u)
  }

  /// `Kp × Kp` companion form of the lag polynomial.
  pub fn companion(&self) -> DMatrix<f64> {
    let k = self.nvars();
    let kp = k * self.lag_order;
    let mut a = DMatrix::zeros(kp, kp);
    for (j, coef) in self.coefs.iter().enumerate() {
      a.view_mut((0, j * k), (k, k)).copy_from(coef);
    }
    if kp > k {
      a.view_mut((k, 0), (kp - k, kp - k))
        .fill_with_identity();
    }
    a
  }

  /// True when every companion eigenvalue lies strictly inside the unit circle.
  pub fn is_stable(&self) -> bool {
    if self.lag_order == 0 {
      return true;
    }
    self
      .companion()
      .complex_eigenvalues()
      .iter()
      .all(|z| z.norm() < 1.0)
  }
}
