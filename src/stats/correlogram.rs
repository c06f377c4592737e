//! # Correlogram
//!
//! $$
//! \hat\rho_k=\frac{\sum_{t=k+1}^{n}(x_t-\bar x)(x_{t-k}-\bar x)}{\sum_{t=1}^{n}(x_t-\bar x)^2},
//! \qquad |\hat\rho_k| \lessgtr \frac{z}{\sqrt n}
//! $$
//!
//! Sample ACF / PACF and residual whiteness diagnostics for fitted VAR models.
use nalgebra::DMatrix;
use nalgebra::DVector;
use tracing::debug;

use crate::error::Result;
use crate::error::VarError;
use crate::var::VarModel;

/// Autocovariance estimator used for the Yule-Walker PACF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacfMethod {
  /// Lag-k autocovariance divided by `n - k`.
  YuleWalkerAdjusted,
  /// Lag-k autocovariance divided by `n`.
  YuleWalkerMle,
}

#[derive(Debug, Clone, Copy)]
pub struct CorrelogramConfig {
  /// Highest lag reported.
  pub nlags: usize,
  pub pacf_method: PacfMethod,
  /// Normal quantile for the ±z/√n band.
  pub z: f64,
}

impl Default for CorrelogramConfig {
  fn default() -> Self {
    Self {
      nlags: 20,
      pacf_method: PacfMethod::YuleWalkerAdjusted,
      z: 1.96,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Correlogram {
  /// `acf[k]` for k = 0..=nlags, `acf[0] == 1`.
  pub acf: Vec<f64>,
  /// `pacf[k]` for k = 0..=nlags, `pacf[0] == 1`.
  pub pacf: Vec<f64>,
  /// Half-width of the white-noise band.
  pub band: f64,
  pub nobs: usize,
}

/// Residual correlogram of one equation of a fitted VAR.
#[derive(Debug, Clone)]
pub struct ResidualCorrelogram {
  pub variable: String,
  pub lag_order: usize,
  pub correlogram: Correlogram,
}

fn autocovariances(x: &[f64], nlags: usize, adjusted: bool) -> Vec<f64> {
  let n = x.len();
  let mean = x.iter().sum::<f64>() / n as f64;
  let d: Vec<f64> = x.iter().map(|v| v - mean).collect();
  (0..=nlags)
    .map(|k| {
      let s = (k..n).map(|t| d[t] * d[t - k]).sum::<f64>();
      let denom = if adjusted { n - k } else { n };
      s / denom as f64
    })
    .collect()
}

/// Sample autocorrelations up to `nlags` (biased autocovariance).
pub fn acf(x: &[f64], nlags: usize) -> Result<Vec<f64>> {
  if x.len() < 2 || nlags >= x.len() {
    return Err(VarError::InvalidArgument(format!(
      "acf needs nlags < nobs, got nlags = {nlags} for {} observations",
      x.len()
    )));
  }
  let acov = autocovariances(x, nlags, false);
  if acov[0] <= 0.0 {
    return Err(VarError::InvalidArgument(
      "acf of a constant series is undefined".into(),
    ));
  }
  Ok(acov.iter().map(|c| c / acov[0]).collect())
}

/// Partial autocorrelations from successive Yule-Walker systems.
pub fn pacf(x: &[f64], nlags: usize, method: PacfMethod) -> Result<Vec<f64>> {
  if 2 * nlags >= x.len() {
    return Err(VarError::InvalidArgument(format!(
      "pacf needs nlags < nobs / 2, got nlags = {nlags} for {} observations",
      x.len()
    )));
  }
  let r = autocovariances(x, nlags, method == PacfMethod::YuleWalkerAdjusted);
  if r[0] <= 0.0 {
    return Err(VarError::InvalidArgument(
      "pacf of a constant series is undefined".into(),
    ));
  }

  let mut out = vec![0.0; nlags + 1];
  out[0] = 1.0;
  for k in 1..=nlags {
    let toeplitz = DMatrix::from_fn(k, k, |i, j| r[i.abs_diff(j)]);
    let rhs = DVector::from_fn(k, |i, _| r[i + 1]);
    out[k] = match toeplitz.lu().solve(&rhs) {
      Some(phi) => phi[k - 1],
      None => f64::NAN,
    };
  }
  Ok(out)
}

pub fn correlogram(x: &[f64], cfg: CorrelogramConfig) -> Result<Correlogram> {
  Ok(Correlogram {
    acf: acf(x, cfg.nlags)?,
    pacf: pacf(x, cfg.nlags, cfg.pacf_method)?,
    band: cfg.z / (x.len() as f64).sqrt(),
    nobs: x.len(),
  })
}

/// ACF / PACF of each equation's residuals.
pub fn residual_correlograms(
  model: &VarModel,
  cfg: CorrelogramConfig,
) -> Result<Vec<ResidualCorrelogram>> {
  let resid = model.residuals();
  model
    .names()
    .iter()
    .enumerate()
    .map(|(idx, name)| {
      let x: Vec<f64> = resid.column(idx).iter().copied().collect();
      let correlogram = correlogram(&x, cfg)?;
      debug!(variable = %name, lag_order = model.lag_order(), "residual correlogram");
      Ok(ResidualCorrelogram {
        variable: name.clone(),
        lag_order: model.lag_order(),
        correlogram,
      })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use rand::SeedableRng;
  use rand::rngs::StdRng;
  use rand_distr::Distribution;
  use rand_distr::Normal;

  use super::*;

  fn ar1(phi: f64, n: usize) -> Vec<f64> {
    let dist = Normal::new(0.0, 1.0).unwrap();
    let mut rng = StdRng::seed_from_u64(23);
    let mut x = vec![0.0; n];
    for t in 1..n {
      x[t] = phi * x[t - 1] + dist.sample(&mut rng);
    }
    x
  }

  #[test]
  fn acf_starts_at_one_and_pacf_matches_first_lag() {
    let x = ar1(0.6, 500);
    let c = correlogram(
      &x,
      CorrelogramConfig {
        pacf_method: PacfMethod::YuleWalkerMle,
        ..CorrelogramConfig::default()
      },
    )
    .unwrap();
    assert_eq!(c.acf[0], 1.0);
    assert_abs_diff_eq!(c.pacf[1], c.acf[1], epsilon = 1e-12);
    assert_eq!(c.acf.len(), 21);
  }

  #[test]
  fn ar1_pacf_cuts_off_after_first_lag() {
    let x = ar1(0.6, 4000);
    let c = correlogram(&x, CorrelogramConfig::default()).unwrap();
    assert!((c.pacf[1] - 0.6).abs() < 0.05, "{:?}", &c.pacf[..3]);
    assert!(c.pacf[2..6].iter().all(|p| p.abs() < 4.0 * c.band));
  }

  #[test]
  fn band_is_z_over_root_n() {
    let x = ar1(0.1, 400);
    let c = correlogram(&x, CorrelogramConfig::default()).unwrap();
    assert_abs_diff_eq!(c.band, 1.96 / 20.0, epsilon = 1e-12);
  }

  #[test]
  fn too_many_pacf_lags_is_rejected() {
    let x = ar1(0.1, 30);
    assert!(matches!(
      pacf(&x, 15, PacfMethod::YuleWalkerAdjusted),
      Err(VarError::InvalidArgument(_))
    ));
  }
}
