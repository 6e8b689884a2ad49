//! Mathematical utilities: least squares, polynomial fits, the
//! Levenberg-Marquardt solver and the smoothing derivative.

pub mod derivative;
pub mod lm;
pub mod ols;
pub mod poly;

pub use derivative::*;
pub use lm::*;
pub use ols::*;
pub use poly::*;
