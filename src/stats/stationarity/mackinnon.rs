//! MacKinnon (1994) response-surface p-values for the single-series ADF statistic.

use statrs::distribution::ContinuousCDF;
use statrs::distribution::Normal;

use super::common::DeterministicTerm;

struct Surface {
  max_stat: f64,
  min_stat: f64,
  star_stat: f64,
  small_p: [f64; 3],
  large_p: [f64; 4],
}

const NO_CONSTANT: Surface = Surface {
  max_stat: f64::INFINITY,
  min_stat: -19.04,
  star_stat: -1.04,
  small_p: [0.6344, 1.2378, 3.2496e-2],
  large_p: [0.4797, 9.3557e-1, -6.999e-2, 3.3066e-2],
};

const CONSTANT: Surface = Surface {
  max_stat: 2.74,
  min_stat: -18.83,
  star_stat: -1.61,
  small_p: [2.1659, 1.4412, 3.8269e-2],
  large_p: [1.7339, 9.3202e-1, -1.2745e-1, -1.0368e-2],
};

const CONSTANT_TREND: Surface = Surface {
  max_stat: 0.7,
  min_stat: -16.18,
  star_stat: -2.89,
  small_p: [3.2512, 1.6047, 4.9588e-2],
  large_p: [2.5261, 6.1654e-1, -3.7956e-1, -6.0285e-2],
};

/// Evaluates `c[0] + c[1] x + c[2] x² + …`.
fn poly(coefs: &[f64], x: f64) -> f64 {
  coefs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Approximate p-value of an ADF t-statistic.
pub fn mackinnon_p_value(statistic: f64, det: DeterministicTerm) -> f64 {
  if statistic.is_nan() {
    return f64::NAN;
  }
  let surface = match det {
    DeterministicTerm::None => &NO_CONSTANT,
    DeterministicTerm::Constant => &CONSTANT,
    DeterministicTerm::ConstantTrend => &CONSTANT_TREND,
  };

  if statistic > surface.max_stat {
    return 1.0;
  }
  if statistic < surface.min_stat {
    return 0.0;
  }

  let z = if statistic <= surface.star_stat {
    poly(&surface.small_p, statistic)
  } else {
    poly(&surface.large_p, statistic)
  };

  match Normal::new(0.0, 1.0) {
    Ok(normal) => normal.cdf(z),
    Err(_) => f64::NAN,
  }
}
