//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - intervals and row selections (`Interval`, `Selection`, `AlphaOptions`)
//! - channel and segment classifications (`Channel`, `SegmentKind`)
//! - fit outputs (`KmParams`, `KmFit`, `FractionCurve`, `FitFile`)
//! - run configuration (`FractionConfig`)

pub mod types;

pub use types::*;
