//! Kinetics extraction.
//!
//! Responsibilities:
//!
//! - lever rule between two extrapolated linear baselines (`lever`)
//! - Koistinen-Marburger fit and evaluation of the fraction curve (`km`)

pub mod km;
pub mod lever;

pub use km::*;
pub use lever::*;
