use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::Distribution;
use rand_distr::Normal;

/// `x_t = phi x_{t-1} + e_t`, `x_0 = 0`; `phi = 1` gives a random walk.
pub(crate) fn ar1(phi: f64, n: usize, seed: u64) -> Vec<f64> {
  let dist = Normal::new(0.0, 1.0).unwrap();
  let mut rng = StdRng::seed_from_u64(seed);
  let mut x = vec![0.0; n];
  for t in 1..n {
    x[t] = phi * x[t - 1] + dist.sample(&mut rng);
  }
  x
}
