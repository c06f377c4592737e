//! # Stats
//!
//! $$
//! H_0:\ \text{unit root}\quad\text{vs.}\quad H_0:\ \text{stationarity}
//! $$
//!
pub mod correlogram;
pub mod stationarity;
