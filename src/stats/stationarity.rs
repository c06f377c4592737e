//! Stationarity and unit-root tests.

mod common;
pub mod mackinnon;

pub mod adf;
pub mod kpss;
#[cfg(test)]
mod sim;

pub use adf::ADFConfig;
pub use adf::ADFResult;
pub use adf::adf_test;
pub use common::DeterministicTerm;
pub use common::LagSelection;
pub use kpss::KPSSBandwidth;
pub use kpss::KPSSConfig;
pub use kpss::KPSSResult;
pub use kpss::KPSSTrend;
pub use kpss::kpss_test;
use tracing::info;

use crate::data::MultivariateSeries;
use crate::error::Result;

/// ADF and KPSS outcomes for one variable.
#[derive(Debug, Clone)]
pub struct StationarityReport {
  pub variable: String,
  pub adf: ADFResult,
  pub kpss: KPSSResult,
}

impl StationarityReport {
  /// Both tests point to stationarity: ADF rejects a unit root and KPSS does not
  /// reject stationarity.
  pub fn is_stationary(&self) -> bool {
    self.adf.reject_unit_root && !self.kpss.reject_stationarity
  }
}

/// Runs both tests on every variable of `series`.
pub fn check_stationarity(
  series: &MultivariateSeries,
  adf: ADFConfig,
  kpss: KPSSConfig,
) -> Result<Vec<StationarityReport>> {
  series
    .names()
    .iter()
    .enumerate()
    .map(|(idx, name)| {
      let y: Vec<f64> = series.values().column(idx).iter().copied().collect();
      let report = StationarityReport {
        variable: name.clone(),
        adf: adf_test(&y, adf)?,
        kpss: kpss_test(&y, kpss)?,
      };
      info!(
        variable = %name,
        adf_stat = report.adf.statistic,
        adf_p = report.adf.p_value,
        kpss_stat = report.kpss.statistic,
        kpss_p = report.kpss.p_value,
        "stationarity checked"
      );
      Ok(report)
    })
    .collect()
}
