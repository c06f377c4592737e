//! # macrovar
//!
//! $$
//! Y_{T\times K}\ \mapsto\ \{\mathrm{IC}(p)\}_{p},\ \{\mathrm{LR}_p\}_{p},\ \{\Psi_h,\Theta_h\}_{h}
//! $$
//!
//! Macroeconomic time-series toolkit: CSV series handling, stationarity tests,
//! VAR lag-order selection and impulse-response analysis.
pub mod data;
pub mod error;
pub mod report;
pub mod stats;
pub mod transform;
pub mod var;
pub mod visualization;

pub use error::Result;
pub use error::VarError;
