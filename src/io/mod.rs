//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - curve/fairness CSV exports (`export`)
//! - JSON result bundles (`bundle`)

pub mod bundle;
pub mod export;
pub mod ingest;

pub use bundle::*;
pub use export::*;
pub use ingest::*;
