//! # VAR
//!
//! $$
//! y_t = \nu + A_1 y_{t-1} + \dots + A_p y_{t-p} + u_t,\qquad u_t \sim (0,\Sigma_u)
//! $$
//!
//! Lag-order selection and impulse-response analysis for vector autoregressions.
mod design;
pub mod criteria;
pub mod irf;
pub(crate) mod matrices;
pub mod model;
pub mod selection;
#[cfg(test)]
pub(crate) mod sim;

pub use criteria::CovarianceNormalization;
pub use criteria::Criterion;
pub use criteria::InfoCriteria;
pub use irf::ImpulseResponse;
pub use irf::IrfConfig;
pub use irf::IrfRecord;
pub use lr_test::LrTestResult;
pub use lr_test::likelihood_ratio_test;
pub use model::SampleWindow;
pub use model::VarModel;
pub use selection::ModelCache;
pub use selection::OrderSelection;
pub use selection::OrderSelectionConfig;
pub use selection::SampleAlignment;
pub use selection::select_order;
