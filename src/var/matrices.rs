//! Selection matrices for `vec` / `vech` calculus.
use nalgebra::DMatrix;

/// `K_{mn}` with `K vec(A) = vec(A')` for `A` of shape `m × n`.
pub(crate) fn commutation(m: usize, n: usize) -> DMatrix<f64> {
  let mut k = DMatrix::zeros(m * n, m * n);
  for i in 0..m {
    for j in 0..n {
      // vec(A)[j*m + i] = A[i, j] = vec(A')[i*n + j]
      k[(i * n + j, j * m + i)] = 1.0;
    }
  }
  k
}

/// Position of `A[r, c]` (r ≥ c) in `vech(A)`.
fn vech_index(n: usize, r: usize, c: usize) -> usize {
  c * n - c * c.saturating_sub(1) / 2 + r - c
}

/// `L_n` with `L vec(A) = vech(A)`.
pub(crate) fn elimination(n: usize) -> DMatrix<f64> {
  let mut l = DMatrix::zeros(n * (n + 1) / 2, n * n);
  for c in 0..n {
    for r in c..n {
      l[(vech_index(n, r, c), c * n + r)] = 1.0;
    }
  }
  l
}

/// `D_n` with `D vech(A) = vec(A)` for symmetric `A`.
pub(crate) fn duplication(n: usize) -> DMatrix<f64> {
  let mut d = DMatrix::zeros(n * n, n * (n + 1) / 2);
  for c in 0..n {
    for r in 0..n {
      let (hi, lo) = if r >= c { (r, c) } else { (c, r) };
      d[(c * n + r, vech_index(n, hi, lo))] = 1.0;
    }
  }
  d
}

/// Moore-Penrose inverse `(D'D)^{-1} D'`; `D'D` is diagonal.
pub(crate) fn duplication_pinv(n: usize) -> DMatrix<f64> {
  let mut dt = duplication(n).transpose();
  for mut row in dt.row_iter_mut() {
    let count = row.sum();
    row /= count;
  }
  dt
}
