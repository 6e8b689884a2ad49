//! Input/output helpers.
//!
//! - instrument ASCII export parsing (`asc`)
//! - CSV tables in and out (`table_csv`)
//! - file → series loading (`ingest`)
//! - result exports (`export`)
//! - fit JSON read/write (`fit_json`)

pub mod asc;
pub mod export;
pub mod fit_json;
pub mod ingest;
pub mod table_csv;

pub use asc::*;
pub use export::*;
pub use fit_json::*;
pub use ingest::*;
pub use table_csv::*;
