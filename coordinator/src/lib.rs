//! Country Cache Coordinator
//!
//! Owns the refresh pipeline and the HTTP surface. A refresh fetches the
//! country directory and the rate table concurrently, reconciles every entry,
//! and commits the whole batch atomically; readers see either the previous
//! cache or the new one, never a mix.

pub mod api;
pub mod config;
pub mod coordinator;
pub mod metrics;
pub mod reconciler;
pub mod summary;

pub use config::CacheConfig;
pub use coordinator::{RefreshCoordinator, RefreshOutcome};
pub use metrics::{Metrics, SharedMetrics};
pub use reconciler::{FixedMultiplier, MultiplierSource, SeededMultiplier, UniformMultiplier};
pub use summary::{SummaryRenderer, SvgSummaryRenderer};
