//! Download client abstraction.
//!
//! This module provides a `DownloadClient` trait for handing torrents to a
//! backend (qBittorrent, embedded librqbit). The backend is picked once at
//! start-up from configuration.

mod librqbit;
mod qbittorrent;
mod types;

pub use librqbit::LibrqbitClient;
pub use qbittorrent::QBittorrentClient;
pub use types::*;
