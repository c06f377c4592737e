//! # Order selection
//!
//! $$
//! \hat p=\arg\min_{1\le p\le p_{\max}} \mathrm{IC}(p)
//! $$
//!
//! Every lag order is fit once per run; models are shared between the
//! criteria table and the likelihood-ratio sequence through [`ModelCache`].
use std::collections::HashMap;

use rayon::prelude::*;
use tracing::info;
use tracing::warn;

use super::criteria::CovarianceNormalization;
use super::criteria::Criterion;
use super::criteria::InfoCriteria;
use super::lr_test::LrTestResult;
use super::lr_test::likelihood_ratio_test;
use super::model::SampleWindow;
use super::model::VarModel;
use crate::data::MultivariateSeries;
use crate::error::Result;
use crate::error::VarError;

/// Which rows each candidate lag order is fit on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleAlignment {
  /// All lags share the window starting at `max_lag`.
  #[default]
  Common,
  /// Lag `p` uses every usable row (start = `p`); each LR pair still shares
  /// the VAR(p) window.
  Full,
}

#[derive(Debug, Clone, Copy)]
pub struct OrderSelectionConfig {
  /// Largest lag order tried.
  pub max_lag: usize,
  pub normalization: CovarianceNormalization,
  pub alignment: SampleAlignment,
  /// Fit lag orders on the rayon pool.
  pub parallel: bool,
}

impl Default for OrderSelectionConfig {
  fn default() -> Self {
    Self {
      max_lag: 15,
      normalization: CovarianceNormalization::MaximumLikelihood,
      alignment: SampleAlignment::Common,
      parallel: true,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ModelKey {
  lag: usize,
  start: usize,
}

/// Fitted models of one run keyed by (lag order, window start).
pub struct ModelCache<'a> {
  series: &'a MultivariateSeries,
  models: HashMap<ModelKey, VarModel>,
  parallel: bool,
}

impl<'a> ModelCache<'a> {
  pub fn new(series: &'a MultivariateSeries, parallel: bool) -> Self {
    Self {
      series,
      models: HashMap::new(),
      parallel,
    }
  }

  /// Fits every `(lag, start)` not already cached. Fails on the first
  /// model that cannot be estimated.
  pub fn ensure(&mut self, requests: &[(usize, usize)]) -> Result<()> {
    let mut missing: Vec<ModelKey> = requests
      .iter()
      .map(|&(lag, start)| ModelKey { lag, start })
      .filter(|key| !self.models.contains_key(key))
      .collect();
    missing.sort_by_key(|key| (key.start, key.lag));
    missing.dedup();

    let series = self.series;
    let fit = |key: &ModelKey| VarModel::fit_window(series, key.lag, key.start).map(|m| (*key, m));
    let fitted: Vec<(ModelKey, VarModel)> = if self.parallel {
      missing.par_iter().map(fit).collect::<Result<_>>()?
    } else {
      missing.iter().map(fit).collect::<Result<_>>()?
    };

    self.models.extend(fitted);
    Ok(())
  }

  pub fn get(&self, lag: usize, start: usize) -> Option<&VarModel> {
    self.models.get(&ModelKey { lag, start })
  }

  /// Cached model, fitting it first if needed.
  pub fn model(&mut self, lag: usize, start: usize) -> Result<&VarModel> {
    self.ensure(&[(lag, start)])?;
    self
      .get(lag, start)
      .ok_or_else(|| VarError::InvalidArgument(format!("no model cached for lag {lag}")))
  }

  pub fn len(&self) -> usize {
    self.models.len()
  }

  pub fn is_empty(&self) -> bool {
    self.models.is_empty()
  }
}

/// Criteria for lags `1..=max_lag` and the LR sequence `p-1` vs `p`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSelection {
  pub max_lag: usize,
  pub normalization: CovarianceNormalization,
  pub alignment: SampleAlignment,
  /// Shared window, `None` under [`SampleAlignment::Full`].
  pub window: Option<SampleWindow>,
  /// One record per lag order, ascending.
  pub criteria: Vec<InfoCriteria>,
  /// `lr_tests[i]` compares lags `i` and `i + 1`.
  pub lr_tests: Vec<LrTestResult>,
}

impl OrderSelection {
  /// Lag minimizing `criterion`; ties go to the smaller lag.
  pub fn selected(&self, criterion: Criterion) -> Option<usize> {
    self
      .criteria
      .iter()
      .min_by(|a, b| a.value(criterion).total_cmp(&b.value(criterion)))
      .map(|ic| ic.lag_order)
  }

  /// Sequential testing from lag 1 upward: the last lag before the first test
  /// that fails to reject at `alpha` (0 when lag 1 is already insignificant).
  pub fn lr_selected_lag(&self, alpha: f64) -> usize {
    self
      .lr_tests
      .iter()
      .take_while(|lr| lr.rejects(alpha))
      .last()
      .map_or(0, |lr| lr.unrestricted_lag)
  }
}

pub fn select_order(series: &MultivariateSeries, cfg: OrderSelectionConfig) -> Result<OrderSelection> {
  if cfg.max_lag == 0 {
    return Err(VarError::InvalidArgument("max_lag must be at least 1".into()));
  }
  let start_for = |lag: usize| match cfg.alignment {
    SampleAlignment::Common => cfg.max_lag,
    SampleAlignment::Full => lag,
  };

  let mut requests = Vec::with_capacity(2 * cfg.max_lag);
  for p in 1..=cfg.max_lag {
    requests.push((p, start_for(p)));
    requests.push((p - 1, start_for(p)));
  }

  let mut cache = ModelCache::new(series, cfg.parallel);
  cache.ensure(&requests)?;

  let mut criteria = Vec::with_capacity(cfg.max_lag);
  let mut lr_tests = Vec::with_capacity(cfg.max_lag);
  for p in 1..=cfg.max_lag {
    let start = start_for(p);
    let (Some(unrestricted), Some(restricted)) = (cache.get(p, start), cache.get(p - 1, start)) else {
      return Err(VarError::InvalidArgument(format!("lag {p} was not fitted")));
    };
    if !unrestricted.is_stable() {
      warn!(lag = p, "fitted VAR is not stable");
    }
    criteria.push(InfoCriteria::from_model(unrestricted, cfg.normalization));
    lr_tests.push(likelihood_ratio_test(restricted, unrestricted, cfg.normalization)?);
  }

  let window = match cfg.alignment {
    SampleAlignment::Common => cache.get(cfg.max_lag, cfg.max_lag).map(VarModel::window),
    SampleAlignment::Full => None,
  };

  let selection = OrderSelection {
    max_lag: cfg.max_lag,
    normalization: cfg.normalization,
    alignment: cfg.alignment,
    window,
    criteria,
    lr_tests,
  };
  info!(
    max_lag = cfg.max_lag,
    fitted = cache.len(),
    aic = ?selection.selected(Criterion::Aic),
    bic = ?selection.selected(Criterion::Bic),
    "selected lag order"
  );
  Ok(selection)
}
