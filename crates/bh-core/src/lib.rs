//! bh-core: shared foundation for buckhil.
//!
//! Contains:
//! - units (uom SI types + constructors, single precision)
//! - numeric (Real + tolerances + float helpers)
//! - timing (wall-clock instrumentation for the real-time loop)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod timing;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{BhError, BhResult};
pub use numeric::*;
pub use units::*;
