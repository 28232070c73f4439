//! Country Cache Common Types
//!
//! Shared types used across the country cache crates: the raw payloads
//! returned by the external directories, the reconciled cache record, the
//! per-refresh rate table, and the error taxonomy surfaced to callers.

pub mod country;
pub mod rates;
pub mod error;
pub mod time;

pub use country::*;
pub use rates::*;
pub use error::*;
pub use time::*;
