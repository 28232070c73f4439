//! Country Cache Store
//!
//! Durable keyed storage for reconciled country records and the singleton
//! "last refreshed" timestamp. Writes happen only through a [`RefreshBatch`],
//! which commits every upsert and the timestamp together or not at all.

pub mod error;
pub mod schema;
pub mod row;
pub mod query;
pub mod batch;
pub mod store;

pub use batch::RefreshBatch;
pub use error::{StoreError, StoreResult};
pub use query::{CountryFilter, SortOrder};
pub use row::CountryRow;
pub use store::{CacheStore, StoreConfig};
