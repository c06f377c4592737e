//! # Report
//!
//! $$
//! \text{records}\mapsto\text{CSV},\ \text{console table}
//! $$
//!
//! Fixed-schema CSV output for every analysis step.
use std::path::Path;

use csv::Writer;
use prettytable::Cell;
use prettytable::Row;
use prettytable::Table;
use tracing::info;

use crate::error::Result;
use crate::stats::correlogram::ResidualCorrelogram;
use crate::stats::stationarity::StationarityReport;
use crate::var::ImpulseResponse;
use crate::var::LrTestResult;
use crate::var::OrderSelection;

pub const ORDER_SELECTION_HEADER: [&str; 5] = ["Lag Length", "AIC", "BIC", "HQIC", "FPE"];
pub const LR_TEST_HEADER: [&str; 5] = [
  "Lag p-1",
  "Lag p",
  "LR Statistic",
  "p-value",
  "Degrees of Freedom",
];
pub const IRF_HEADER: [&str; 6] = [
  "Period",
  "IRF",
  "Lower Conf",
  "Upper Conf",
  "Shock Variable",
  "Response Variable",
];
pub const CORRELOGRAM_HEADER: [&str; 9] = [
  "Variable",
  "Lag Length",
  "Lag",
  "ACF Value",
  "ACF Conf Int Low",
  "ACF Conf Int High",
  "PACF Value",
  "PACF Conf Int Low",
  "PACF Conf Int High",
];

pub fn write_order_selection<P: AsRef<Path>>(path: P, selection: &OrderSelection) -> Result<()> {
  let mut writer = Writer::from_path(path.as_ref())?;
  writer.write_record(ORDER_SELECTION_HEADER)?;
  for ic in &selection.criteria {
    writer.write_record([
      ic.lag_order.to_string(),
      ic.aic.to_string(),
      ic.bic.to_string(),
      ic.hqic.to_string(),
      ic.fpe.to_string(),
    ])?;
  }
  writer.flush()?;
  info!(path = %path.as_ref().display(), "wrote order-selection table");
  Ok(())
}

pub fn write_lr_tests<P: AsRef<Path>>(path: P, tests: &[LrTestResult]) -> Result<()> {
  let mut writer = Writer::from_path(path.as_ref())?;
  writer.write_record(LR_TEST_HEADER)?;
  for lr in tests {
    writer.write_record([
      lr.restricted_lag.to_string(),
      lr.unrestricted_lag.to_string(),
      lr.statistic.to_string(),
      lr.p_value.to_string(),
      lr.df.to_string(),
    ])?;
  }
  writer.flush()?;
  info!(path = %path.as_ref().display(), "wrote likelihood-ratio tests");
  Ok(())
}

/// IRF rows ordered by shock, response, period.
pub fn write_irf<P: AsRef<Path>>(path: P, irf: &ImpulseResponse, cumulative: bool) -> Result<()> {
  let mut writer = Writer::from_path(path.as_ref())?;
  writer.write_record(IRF_HEADER)?;
  for rec in irf.records(cumulative) {
    writer.write_record([
      rec.period.to_string(),
      rec.irf.to_string(),
      rec.lower.to_string(),
      rec.upper.to_string(),
      rec.shock,
      rec.response,
    ])?;
  }
  writer.flush()?;
  info!(path = %path.as_ref().display(), cumulative, "wrote impulse responses");
  Ok(())
}

pub fn write_correlograms<P: AsRef<Path>>(path: P, results: &[ResidualCorrelogram]) -> Result<()> {
  let mut writer = Writer::from_path(path.as_ref())?;
  writer.write_record(CORRELOGRAM_HEADER)?;
  for res in results {
    let c = &res.correlogram;
    for (lag, (acf, pacf)) in c.acf.iter().zip(&c.pacf).enumerate() {
      writer.write_record([
        res.variable.clone(),
        res.lag_order.to_string(),
        lag.to_string(),
        acf.to_string(),
        (-c.band).to_string(),
        c.band.to_string(),
        pacf.to_string(),
        (-c.band).to_string(),
        c.band.to_string(),
      ])?;
    }
  }
  writer.flush()?;
  info!(path = %path.as_ref().display(), "wrote residual correlograms");
  Ok(())
}

fn text_row<I, S>(cells: I) -> Row
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  Row::new(cells.into_iter().map(|c| Cell::new(c.as_ref())).collect())
}

pub fn order_selection_table(selection: &OrderSelection) -> Table {
  let mut table = Table::new();
  table.set_titles(text_row(ORDER_SELECTION_HEADER));
  for ic in &selection.criteria {
    table.add_row(text_row([
      ic.lag_order.to_string(),
      format!("{:.6}", ic.aic),
      format!("{:.6}", ic.bic),
      format!("{:.6}", ic.hqic),
      format!("{:.6e}", ic.fpe),
    ]));
  }
  table
}

pub fn lr_test_table(tests: &[LrTestResult]) -> Table {
  let mut table = Table::new();
  table.set_titles(text_row(["Lag p-1", "Lag p", "LR Statistic", "p-value", "df"]));
  for lr in tests {
    table.add_row(text_row([
      lr.restricted_lag.to_string(),
      lr.unrestricted_lag.to_string(),
      format!("{:.4}", lr.statistic),
      format!("{:.4}", lr.p_value),
      lr.df.to_string(),
    ]));
  }
  table
}

pub fn stationarity_table(reports: &[StationarityReport]) -> Table {
  let mut table = Table::new();
  table.set_titles(text_row([
    "Variable",
    "ADF Statistic",
    "ADF p-value",
    "KPSS Statistic",
    "KPSS p-value",
    "Stationary",
  ]));
  for r in reports {
    table.add_row(text_row([
      r.variable.clone(),
      format!("{:.4}", r.adf.statistic),
      format!("{:.4}", r.adf.p_value),
      format!("{:.4}", r.kpss.statistic),
      format!("{:.4}", r.kpss.p_value),
      if r.is_stationary() { "yes" } else { "no" }.to_string(),
    ]));
  }
  table
}
