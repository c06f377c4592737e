use tracing::debug;

use super::common::CriticalValues;
use super::common::DeterministicTerm;
use super::common::LagSelection;
use super::common::adf_critical_values;
use super::common::choose_lag_for_adf;
use super::common::fit_adf;
use super::common::schwert_max_lags;
use super::common::validate_alpha;
use super::common::validate_series;
use super::mackinnon::mackinnon_p_value;
use crate::error::Result;
use crate::error::VarError;

/// Configuration for the Augmented Dickey-Fuller unit-root test.
#[derive(Debug, Clone, Copy)]
pub struct ADFConfig {
  /// Deterministic terms included in the test regression.
  pub deterministic: DeterministicTerm,
  /// Lag-order selection strategy.
  pub lag_selection: LagSelection,
  /// Maximum lag considered by automatic lag selection.
  pub max_lags: Option<usize>,
  /// Significance level used to compute `reject_unit_root`.
  pub alpha: f64,
}

impl Default for ADFConfig {
  fn default() -> Self {
    Self {
      deterministic: DeterministicTerm::Constant,
      lag_selection: LagSelection::Aic,
      max_lags: None,
      alpha: 0.05,
    }
  }
}

/// Result of the Augmented Dickey-Fuller test.
#[derive(Debug, Clone, Copy)]
pub struct ADFResult {
  /// ADF t-statistic for the lagged level coefficient.
  pub statistic: f64,
  /// MacKinnon approximate p-value.
  pub p_value: f64,
  /// Selected lag order.
  pub used_lags: usize,
  /// Number of regression observations used by the fitted model.
  pub nobs: usize,
  /// Critical values at 1%, 5%, 10% levels.
  pub critical_values: CriticalValues,
  /// Whether the null (unit root) is rejected at `alpha`.
  pub reject_unit_root: bool,
}

/// Augmented Dickey-Fuller unit-root test.
pub fn adf_test(y: &[f64], cfg: ADFConfig) -> Result<ADFResult> {
  validate_series(y, 20)?;
  validate_alpha(cfg.alpha)?;

  let max_possible_lag = y.len().saturating_sub(5);
  let max_lags = cfg
    .max_lags
    .unwrap_or_else(|| schwert_max_lags(y.len()))
    .min(max_possible_lag);

  let used_lags = match cfg.lag_selection {
    LagSelection::Fixed(p) => {
      if p > max_possible_lag {
        return Err(VarError::InvalidArgument(format!(
          "fixed ADF lag {p} too large for {} observations",
          y.len()
        )));
      }
      p
    }
    _ => choose_lag_for_adf(y, cfg.deterministic, cfg.lag_selection, max_lags)?,
  };

  let fit = fit_adf(y, used_lags, cfg.deterministic)?;
  let critical_values = adf_critical_values(cfg.deterministic);
  let p_value = mackinnon_p_value(fit.statistic, cfg.deterministic);
  let reject_unit_root = p_value < cfg.alpha;
  debug!(
    statistic = fit.statistic,
    p_value,
    used_lags,
    nobs = fit.nobs,
    reject_unit_root,
    "ADF regression"
  );

  Ok(ADFResult {
    statistic: fit.statistic,
    p_value,
    used_lags,
    nobs: fit.nobs,
    critical_values,
    reject_unit_root,
  })
}
