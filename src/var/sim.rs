use chrono::Months;
use chrono::NaiveDate;
use nalgebra::DMatrix;
use nalgebra::DVector;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::Distribution;
use rand_distr::Normal;

use crate::data::MultivariateSeries;

const NAMES: [&str; 4] = ["gdp", "cpi", "rate", "m2"];

pub(crate) fn quarterly(values: DMatrix<f64>) -> MultivariateSeries {
  let start = NaiveDate::from_ymd_opt(1960, 1, 1).unwrap();
  let dates = (0..values.nrows())
    .map(|i| start + Months::new(3 * i as u32))
    .collect();
  let names = NAMES[..values.ncols()].iter().map(|n| n.to_string()).collect();
  MultivariateSeries::new(dates, names, values).unwrap()
}

/// `y_t = nu + A y_{t-1} + u_t` with Gaussian shocks, after a burn-in.
pub(crate) fn simulate(
  a: &DMatrix<f64>,
  nu: &DVector<f64>,
  sd: f64,
  n: usize,
  seed: u64,
) -> MultivariateSeries {
  let k = a.nrows();
  let burn = 50;
  let dist = Normal::new(0.0, sd).unwrap();
  let mut rng = StdRng::seed_from_u64(seed);

  let mut y = DVector::zeros(k);
  let mut values = DMatrix::zeros(n, k);
  for t in 0..n + burn {
    let mut u = DVector::from_fn(k, |_, _| dist.sample(&mut rng));
    if k > 1 {
      u[1] += 0.4 * u[0];
    }
    y = nu + a * &y + u;
    if t >= burn {
      values.set_row(t - burn, &y.transpose());
    }
  }
  quarterly(values)
}

/// Bivariate stable VAR(1) with own-lag persistence `rho`.
pub(crate) fn simulate_var1(rho: f64, n: usize, seed: u64) -> MultivariateSeries {
  let a = DMatrix::from_row_slice(2, 2, &[rho, 0.1, 0.2, 0.8 * rho]);
  let nu = DVector::from_vec(vec![1.0, 0.5]);
  simulate(&a, &nu, 1.0, n, seed)
}
