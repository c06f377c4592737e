use std::collections::HashSet;

use chrono::NaiveDate;
use nalgebra::DMatrix;
use nalgebra::DVector;

use crate::error::Result;
use crate::error::VarError;

/// Date-indexed T×K panel of finite observations with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct MultivariateSeries {
  dates: Vec<NaiveDate>,
  names: Vec<String>,
  values: DMatrix<f64>,
}

impl MultivariateSeries {
  /// Builds a series after checking every invariant.
  ///
  /// `values` is T×K: one row per date, one column per name.
  pub fn new(dates: Vec<NaiveDate>, names: Vec<String>, values: DMatrix<f64>) -> Result<Self> {
    if names.is_empty() {
      return Err(VarError::Schema("series needs at least one variable".into()));
    }
    if values.ncols() != names.len() {
      return Err(VarError::Schema(format!(
        "{} variable names for {} value columns",
        names.len(),
        values.ncols()
      )));
    }
    if values.nrows() != dates.len() {
      return Err(VarError::Schema(format!(
        "{} dates for {} value rows",
        dates.len(),
        values.nrows()
      )));
    }

    let mut seen = HashSet::with_capacity(names.len());
    for name in &names {
      if name.trim().is_empty() {
        return Err(VarError::Schema("variable names must be non-empty".into()));
      }
      if !seen.insert(name.as_str()) {
        return Err(VarError::Schema(format!("duplicate variable '{name}'")));
      }
    }

    for w in dates.windows(2) {
      if w[1] <= w[0] {
        return Err(VarError::UnorderedDates {
          previous: w[0].to_string(),
          next: w[1].to_string(),
        });
      }
    }

    for (col, name) in names.iter().enumerate() {
      if let Some(row) = values.column(col).iter().position(|v| !v.is_finite()) {
        return Err(VarError::NonFinite {
          column: name.clone(),
          row,
        });
      }
    }

    Ok(Self {
      dates,
      names,
      values,
    })
  }

  /// Builds a series from per-variable columns (`columns[k]` has length T).
  pub fn from_columns(
    dates: Vec<NaiveDate>,
    names: Vec<String>,
    columns: &[Vec<f64>],
  ) -> Result<Self> {
    let nobs = dates.len();
    if let Some(bad) = columns.iter().position(|c| c.len() != nobs) {
      return Err(VarError::Schema(format!(
        "column {bad} has {} values, expected {nobs}",
        columns[bad].len()
      )));
    }
    let values = DMatrix::from_fn(nobs, columns.len(), |r, c| columns[c][r]);
    Self::new(dates, names, values)
  }

  /// Number of observations T.
  pub fn nobs(&self) -> usize {
    self.values.nrows()
  }

  /// Number of variables K.
  pub fn nvars(&self) -> usize {
    self.values.ncols()
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn names(&self) -> &[String] {
    &self.names
  }

  /// Raw T×K value matrix.
  pub fn values(&self) -> &DMatrix<f64> {
    &self.values
  }

  pub fn index_of(&self, name: &str) -> Result<usize> {
    self
      .names
      .iter()
      .position(|n| n == name)
      .ok_or_else(|| VarError::Schema(format!("unknown variable '{name}'")))
  }

  /// Copy of one variable's observations.
  pub fn column(&self, name: &str) -> Result<DVector<f64>> {
    let idx = self.index_of(name)?;
    Ok(self.values.column(idx).into_owned())
  }

  /// Reorders / subsets the variables by name.
  pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
    let idx = names
      .iter()
      .map(|n| self.index_of(n.as_ref()))
      .collect::<Result<Vec<_>>>()?;
    let values = self.values.select_columns(idx.iter());
    let names = names.iter().map(|n| n.as_ref().to_string()).collect();
    Self::new(self.dates.clone(), names, values)
  }

  /// Rows `start..` as a new series.
  pub fn slice_from(&self, start: usize) -> Result<Self> {
    if start >= self.nobs() {
      return Err(VarError::InsufficientData {
        nobs: self.nobs(),
        required: start,
      });
    }
    let rows = self.nobs() - start;
    let values = self.values.rows(start, rows).into_owned();
    Self::new(self.dates[start..].to_vec(), self.names.clone(), values)
  }

  /// Same dates and names with replaced values.
  pub fn with_values(&self, values: DMatrix<f64>) -> Result<Self> {
    Self::new(self.dates.clone(), self.names.clone(), values)
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use nalgebra::DMatrix;

  use super::MultivariateSeries;
  use crate::error::VarError;

  fn quarters(n: usize) -> Vec<NaiveDate> {
    (0..n)
      .map(|i| {
        let year = 2000 + (i / 4) as i32;
        let month = 3 * (i % 4) as u32 + 1;
        NaiveDate::from_ymd_opt(year, month, 1).unwrap()
      })
      .collect()
  }

  fn sample() -> MultivariateSeries {
    MultivariateSeries::from_columns(
      quarters(4),
      vec!["cpi".into(), "ip".into(), "rate".into()],
      &[
        vec![1.0, 2.0, 3.0, 4.0],
        vec![10.0, 20.0, 30.0, 40.0],
        vec![0.1, 0.2, 0.3, 0.4],
      ],
    )
    .unwrap()
  }

  #[test]
  fn select_reorders_by_name() {
    let s = sample().select(&["rate", "cpi"]).unwrap();
    assert_eq!(s.names(), &["rate".to_string(), "cpi".to_string()]);
    assert_eq!(s.values()[(2, 0)], 0.3);
    assert_eq!(s.values()[(2, 1)], 3.0);
  }

  #[test]
  fn unknown_column_is_schema_error() {
    let err = sample().select(&["gdp"]).unwrap_err();
    assert!(matches!(err, VarError::Schema(_)));
  }

  #[test]
  fn rejects_duplicate_names() {
    let err = MultivariateSeries::new(
      quarters(2),
      vec!["a".into(), "a".into()],
      DMatrix::zeros(2, 2),
    )
    .unwrap_err();
    assert!(matches!(err, VarError::Schema(_)));
  }

  #[test]
  fn rejects_unordered_dates() {
    let mut dates = quarters(3);
    dates.swap(1, 2);
    let err = MultivariateSeries::new(dates, vec!["a".into()], DMatrix::zeros(3, 1)).unwrap_err();
    assert!(matches!(err, VarError::UnorderedDates { .. }));
  }

  #[test]
  fn rejects_nan() {
    let mut values = DMatrix::zeros(3, 1);
    values[(1, 0)] = f64::NAN;
    let err = MultivariateSeries::new(quarters(3), vec!["a".into()], values).unwrap_err();
    assert!(matches!(err, VarError::NonFinite { row: 1, .. }));
  }

  #[test]
  fn slice_keeps_dates_aligned() {
    let s = sample().slice_from(2).unwrap();
    assert_eq!(s.nobs(), 2);
    assert_eq!(s.dates()[0], quarters(4)[2]);
    assert_eq!(s.column("ip").unwrap()[0], 30.0);
  }
}
