//! Title store: persisted tracking state for every followed release.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteTitleStore;
pub use store::{TitleStore, TitleStoreError};
pub use types::TitleRecord;
