//! # Transform
//!
//! $$
//! \Delta_s y_t = y_t - y_{t-s},\qquad z_t=\frac{y_t-\bar y}{\hat\sigma_y}
//! $$
//!
//! Preprocessing applied before stationarity testing and VAR estimation.
use nalgebra::DMatrix;
use tracing::info;

use crate::data::MultivariateSeries;
use crate::error::Result;
use crate::error::VarError;

/// Lag-`periods` differences of the chosen variables (all when `variables` is `None`).
///
/// The first `periods` rows are dropped from every variable so the result stays
/// rectangular; variables that are not differenced keep their levels.
pub fn difference<S: AsRef<str>>(
  series: &MultivariateSeries,
  periods: usize,
  variables: Option<&[S]>,
) -> Result<MultivariateSeries> {
  if periods == 0 {
    return Err(VarError::InvalidArgument(
      "difference periods must be at least 1".into(),
    ));
  }
  if periods >= series.nobs() {
    return Err(VarError::InsufficientData {
      nobs: series.nobs(),
      required: periods,
    });
  }

  let targets: Vec<usize> = match variables {
    Some(names) => names
      .iter()
      .map(|n| series.index_of(n.as_ref()))
      .collect::<Result<_>>()?,
    None => (0..series.nvars()).collect(),
  };

  let y = series.values();
  let nobs = series.nobs() - periods;
  let values = DMatrix::from_fn(nobs, series.nvars(), |r, c| {
    let t = r + periods;
    if targets.contains(&c) {
      y[(t, c)] - y[(t - periods, c)]
    } else {
      y[(t, c)]
    }
  });

  info!(periods, differenced = targets.len(), nobs, "differenced series");
  MultivariateSeries::new(
    series.dates()[periods..].to_vec(),
    series.names().to_vec(),
    values,
  )
}

/// Column-wise z-scores using the population standard deviation.
///
/// Constant columns are centred to zero rather than divided by zero.
pub fn standardize(series: &MultivariateSeries) -> Result<MultivariateSeries> {
  let n = series.nobs() as f64;
  let mut values = series.values().clone();

  for mut col in values.column_iter_mut() {
    let mean = col.sum() / n;
    let var = col.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    let std = var.sqrt();
    let scale = if std > 0.0 { std } else { 1.0 };
    for v in col.iter_mut() {
      *v = (*v - mean) / scale;
    }
  }

  series.with_values(values)
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use chrono::Duration;
  use chrono::NaiveDate;

  use super::*;

  fn series(columns: &[Vec<f64>], names: &[&str]) -> MultivariateSeries {
    let start = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
    let dates = (0..columns[0].len())
      .map(|i| start + Duration::days(91 * i as i64))
      .collect();
    MultivariateSeries::from_columns(
      dates,
      names.iter().map(|n| n.to_string()).collect(),
      columns,
    )
    .unwrap()
  }

  #[test]
  fn seasonal_difference_only_touches_selected_variables() {
    let s = series(
      &[
        vec![1.0, 2.0, 3.0, 4.0, 6.0, 8.0],
        vec![5.0, 5.5, 6.0, 6.5, 7.0, 7.5],
      ],
      &["cpi", "tbill"],
    );
    let d = difference(&s, 4, Some(&["cpi"][..])).unwrap();

    assert_eq!(d.nobs(), 2);
    assert_eq!(d.dates()[0], s.dates()[4]);
    assert_eq!(d.column("cpi").unwrap().as_slice(), &[5.0, 6.0]);
    assert_eq!(d.column("tbill").unwrap().as_slice(), &[7.0, 7.5]);
  }

  #[test]
  fn difference_rejects_long_period() {
    let s = series(&[vec![1.0, 2.0, 3.0]], &["x"]);
    let err = difference::<&str>(&s, 3, None).unwrap_err();
    assert!(matches!(err, VarError::InsufficientData { .. }));
  }

  #[test]
  fn standardized_columns_have_zero_mean_unit_variance() {
    let s = series(
      &[vec![1.0, 4.0, 2.0, 9.0, -3.0], vec![2.0, 2.0, 2.0, 2.0, 2.0]],
      &["x", "flat"],
    );
    let z = standardize(&s).unwrap();
    let x = z.column("x").unwrap();
    let mean = x.mean();
    let var = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / 5.0;

    assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(var, 1.0, epsilon = 1e-12);
    assert!(z.column("flat").unwrap().iter().all(|v| *v == 0.0));
  }
}
