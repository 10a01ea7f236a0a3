//! Score aggregation.
//!
//! Every aggregator is a pure function of the joined records, the roster and
//! the catalogs plus a caller-supplied [`filter::RecordFilter`]. Results are
//! recomputed per call and serialize straight to JSON.

pub mod averaging;
pub mod boxplot;
pub mod category;
pub mod filter;
pub mod histogram;
pub mod tracking;
pub mod trend;
pub mod types;
pub mod utility;
