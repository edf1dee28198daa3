//! Release synchronization engine.
//!
//! Binds titles from listing-source URLs, polls the listing source for new
//! episodes and hands qualifying torrents to the download client. Every
//! operation returns an [`OperationResult`](crate::operation::OperationResult).

mod engine;
mod error;
mod locks;
mod request;

pub use engine::{SyncContext, SyncEngine};
pub use error::SyncError;
pub use locks::{CodenameGuard, CodenameLocks};
pub use request::{AddReleaseRequest, SyncRequest, UpdateReleaseRequest};
