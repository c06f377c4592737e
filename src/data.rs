//! # Data
//!
//! $$
//! Y=\{(t_i, y_i)\}_{i=1}^T,\quad y_i\in\mathbb R^K,\; t_1<t_2<\dots<t_T
//! $$
//!
//! Named multivariate series and their CSV representation.

pub mod csv_io;
pub mod series;

pub use csv_io::merge_on_date;
pub use csv_io::read_series;
pub use csv_io::read_value_file;
pub use csv_io::write_series;
pub use series::MultivariateSeries;
