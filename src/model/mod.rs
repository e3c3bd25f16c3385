//! Domain model for the console.
//!
//! Every type here is a value object rebuilt wholesale from a controller
//! response; the daemon is the system of record and nothing is persisted
//! client-side.

mod incident;
mod lifecycle;
mod slo;
mod trace;

pub use incident::*;
pub use lifecycle::*;
pub use slo::*;
pub use trace::*;
