use tracing::debug;

use super::common::newey_west_long_run_variance;
use super::common::regress_on_deterministics;
use super::common::schwert_max_lags;
use super::common::validate_alpha;
use super::common::validate_series;
use crate::error::Result;

/// KPSS deterministic specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KPSSTrend {
  /// Stationary around a constant mean.
  Level,
  /// Trend-stationary around a linear trend.
  Trend,
}

/// KPSS critical values.
#[derive(Debug, Clone, Copy)]
pub struct KPSSCriticalValues {
  pub one_percent: f64,
  pub two_point_five_percent: f64,
  pub five_percent: f64,
  pub ten_percent: f64,
}

impl KPSSCriticalValues {
  /// `p < alpha` on the interpolated p-value. Past the 1% point p is below 0.01;
  /// under the 10% point it is above 0.10.
  fn rejects(self, statistic: f64, alpha: f64) -> bool {
    if statistic > self.one_percent {
      alpha >= 0.01
    } else if statistic < self.ten_percent {
      false
    } else {
      self.p_value(statistic) < alpha
    }
  }

  /// Linear interpolation of the tabulated tail probabilities, clipped to [0.01, 0.10].
  fn p_value(self, statistic: f64) -> f64 {
    let table = [
      (self.ten_percent, 0.10),
      (self.five_percent, 0.05),
      (self.two_point_five_percent, 0.025),
      (self.one_percent, 0.01),
    ];
    if statistic <= table[0].0 {
      return 0.10;
    }
    for w in table.windows(2) {
      let ((x0, p0), (x1, p1)) = (w[0], w[1]);
      if statistic <= x1 {
        return p0 + (statistic - x0) * (p1 - p0) / (x1 - x0);
      }
    }
    0.01
  }
}

/// Newey-West bandwidth rule for the long-run variance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KPSSBandwidth {
  /// Data-dependent bandwidth of Hobijn, Franses and Ooms (2004).
  Auto,
  /// `12·(n/100)^{1/4}`.
  Schwert,
  Fixed(usize),
}

/// Configuration for the KPSS stationarity test.
#[derive(Debug, Clone, Copy)]
pub struct KPSSConfig {
  /// Deterministic component under the null.
  pub trend: KPSSTrend,
  /// Newey-West lag length rule.
  pub bandwidth: KPSSBandwidth,
  /// Significance level used to compute `reject_stationarity`.
  pub alpha: f64,
}

impl Default for KPSSConfig {
  fn default() -> Self {
    Self {
      trend: KPSSTrend::Level,
      bandwidth: KPSSBandwidth::Auto,
      alpha: 0.05,
    }
  }
}

/// Result of the KPSS stationarity test.
#[derive(Debug, Clone, Copy)]
pub struct KPSSResult {
  /// KPSS LM statistic.
  pub statistic: f64,
  /// Interpolated p-value.
  pub p_value: f64,
  /// Newey-West lag length used.
  pub used_lags: usize,
  /// Critical values for the chosen deterministic term.
  pub critical_values: KPSSCriticalValues,
  /// Whether the null (stationarity) is rejected at `alpha`.
  pub reject_stationarity: bool,
}

fn kpss_critical_values(trend: KPSSTrend) -> KPSSCriticalValues {
  match trend {
    KPSSTrend::Level => KPSSCriticalValues {
      one_percent: 0.739,
      two_point_five_percent: 0.574,
      five_percent: 0.463,
      ten_percent: 0.347,
    },
    KPSSTrend::Trend => KPSSCriticalValues {
      one_percent: 0.216,
      two_point_five_percent: 0.176,
      five_percent: 0.146,
      ten_percent: 0.119,
    },
  }
}

/// Hobijn et al. automatic bandwidth, capped at `n - 1`.
///
/// $$
/// \hat s = \frac{\sum_{i=1}^{m} i\,\hat\gamma_i}{\hat\gamma_0 + \sum_{i=1}^{m}\hat\gamma_i},\quad
/// \ell = \lfloor 1.1447\,(\hat s^2)^{1/3} n^{1/3} \rfloor,\quad m = \lfloor n^{2/9} \rfloor
/// $$
///
/// where $\hat\gamma_i = \frac{2}{n}\sum_{t>i} u_t u_{t-i}$ for $i \ge 1$ and $\hat\gamma_0 = \frac{1}{n}\sum u_t^2$.
fn hobijn_bandwidth(resid: &[f64]) -> usize {
  let n = resid.len();
  if n < 2 {
    return 0;
  }
  let n_f = n as f64;
  let cov_lags = (n_f.powf(2.0 / 9.0) as usize).min(n - 1);
  let mut s0 = resid.iter().map(|u| u * u).sum::<f64>() / n_f;
  let mut s1 = 0.0;
  for i in 1..=cov_lags {
    let prod = resid[i..]
      .iter()
      .zip(&resid[..n - i])
      .map(|(a, b)| a * b)
      .sum::<f64>()
      / (n_f / 2.0);
    s0 += prod;
    s1 += i as f64 * prod;
  }
  if s0 <= 0.0 || !s1.is_finite() {
    return 0;
  }
  let s_hat = s1 / s0;
  let gamma_hat = 1.1447 * (s_hat * s_hat).powf(1.0 / 3.0);
  ((gamma_hat * n_f.powf(1.0 / 3.0)) as usize).min(n - 1)
}

/// KPSS stationarity test.
pub fn kpss_test(y: &[f64], cfg: KPSSConfig) -> Result<KPSSResult> {
  validate_series(y, 20)?;
  validate_alpha(cfg.alpha)?;

  let include_trend = matches!(cfg.trend, KPSSTrend::Trend);
  let reg = regress_on_deterministics(y, include_trend)?;
  let resid = reg.residuals;
  let n = resid.len();
  let n_f = n as f64;

  let mut cum = 0.0;
  let mut eta = 0.0;
  for u in &resid {
    cum += *u;
    eta += cum * cum;
  }
  eta /= n_f * n_f;

  let used_lags = match cfg.bandwidth {
    KPSSBandwidth::Auto => hobijn_bandwidth(&resid),
    KPSSBandwidth::Schwert => schwert_max_lags(n),
    KPSSBandwidth::Fixed(lags) => lags,
  };
  let long_run_var = newey_west_long_run_variance(&resid, used_lags).max(1e-12);
  let statistic = eta / long_run_var;

  let critical_values = kpss_critical_values(cfg.trend);
  let p_value = critical_values.p_value(statistic);
  let reject_stationarity = critical_values.rejects(statistic, cfg.alpha);
  debug!(statistic, p_value, used_lags, long_run_var, reject_stationarity, "KPSS statistic");

  Ok(KPSSResult {
    statistic,
    p_value,
    used_lags,
    critical_values,
    reject_stationarity,
  })
}
