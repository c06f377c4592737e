use nalgebra::DMatrix;

/// Left- and right-hand sides of the stacked VAR regression.
pub(crate) struct LagDesign {
  /// `y_t` for t in `start..T`, one row per observation.
  pub y: DMatrix<f64>,
  /// `[1, y_{t-1}', …, y_{t-p}']` for the same rows.
  pub x: DMatrix<f64>,
}

/// Caller guarantees `lags <= start < values.nrows()`.
pub(crate) fn lag_design(values: &DMatrix<f64>, lags: usize, start: usize) -> LagDesign {
  let k = values.ncols();
  let nobs = values.nrows() - start;

  let y = values.rows(start, nobs).into_owned();
  let x = DMatrix::from_fn(nobs, 1 + k * lags, |r, c| {
    if c == 0 {
      return 1.0;
    }
    let lag = (c - 1) / k + 1;
    let var = (c - 1) % k;
    values[(start + r - lag, var)]
  });

  LagDesign { y, x }
}
