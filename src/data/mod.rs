//! Measurement data: the tabular source, the series container and the
//! segmentation/merge operations on it.

pub mod segment;
pub mod series;
pub mod table;

pub use segment::*;
pub use series::*;
pub use table::*;
