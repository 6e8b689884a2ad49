//! `dil-kinetics` library crate.
//!
//! The binary (`dil`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the segmentation and fitting code can be driven from other tools
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
