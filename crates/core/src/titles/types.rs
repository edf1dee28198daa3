//! Tracked title types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::listing::TorrentRecord;

/// Tracking state for one release the user follows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleRecord {
    /// Unique key chosen by the user.
    pub codename: String,
    /// Human-readable series name, also used as the search key.
    pub display_title: String,
    /// Season/arc this codename tracks.
    pub season: u32,
    /// `local episode = published episode + correction`.
    pub correction: i32,
    /// Episode index supplied when the title was bound.
    pub episode_index: i32,
    /// Listing-source URL the title was bound from.
    pub source_url: String,
    /// Guid of the most recently accepted torrent.
    #[serde(default)]
    pub last_torrent_reference: Option<String>,
    /// Publish date of the most recently accepted torrent.
    #[serde(default)]
    pub last_publish_date: Option<DateTime<Utc>>,
    /// Local episode number of the most recently accepted torrent.
    #[serde(default)]
    pub last_episode: Option<i64>,
    /// Preferred release group; when set, only its releases match.
    #[serde(default)]
    pub release_group: Option<String>,
    /// Save path handed to the download client.
    #[serde(default)]
    pub download_dir: Option<String>,
}

impl TitleRecord {
    /// Create a record that has not accepted any torrent yet.
    pub fn new(
        codename: impl Into<String>,
        display_title: impl Into<String>,
        season: u32,
        correction: i32,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            codename: codename.into(),
            display_title: display_title.into(),
            season,
            correction,
            episode_index: 0,
            source_url: source_url.into(),
            last_torrent_reference: None,
            last_publish_date: None,
            last_episode: None,
            release_group: None,
            download_dir: None,
        }
    }

    /// Set the episode index hint.
    pub fn with_episode_index(mut self, index: i32) -> Self {
        self.episode_index = index;
        self
    }

    /// Set the download directory.
    pub fn with_download_dir(mut self, dir: impl Into<String>) -> Self {
        self.download_dir = Some(dir.into());
        self
    }

    /// Query sent to the listing source when looking for new episodes.
    pub fn search_query(&self) -> &str {
        &self.display_title
    }

    /// Set the preferred release group.
    pub fn with_release_group(mut self, group: impl Into<String>) -> Self {
        self.release_group = Some(group.into());
        self
    }

    /// Whether a search hit belongs to this title.
    pub fn matches(&self, torrent: &TorrentRecord) -> bool {
        let raw = torrent.raw_title.to_lowercase();
        raw.contains(&self.display_title.to_lowercase())
            && self
                .release_group
                .as_deref()
                .is_none_or(|group| raw.contains(&group.to_lowercase()))
    }

    /// Whether a torrent is newer than what this title already accepted.
    pub fn is_new(&self, torrent: &TorrentRecord) -> bool {
        if self.last_torrent_reference.as_deref() == Some(torrent.guid.as_str()) {
            return false;
        }
        match self.last_publish_date {
            Some(last) => torrent.publish_date > last,
            None => true,
        }
    }

    /// Record a torrent as accepted. State never moves back to an older
    /// publish date.
    pub fn accept(&mut self, torrent: &TorrentRecord, local_episode: i64) -> bool {
        let advances = self
            .last_publish_date
            .is_none_or(|last| torrent.publish_date >= last);
        if advances {
            self.last_torrent_reference = Some(torrent.guid.clone());
            self.last_publish_date = Some(torrent.publish_date);
            self.last_episode = Some(local_episode);
        }
        advances
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn torrent(guid: &str, day: u32) -> TorrentRecord {
        TorrentRecord {
            guid: guid.to_string(),
            raw_title: format!("Frieren S2 - {:02} [1080p]", day),
            published_episode: day as i32,
            publish_date: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            download_url: None,
            info_hash: None,
            details_url: None,
            size_bytes: None,
        }
    }

    fn title() -> TitleRecord {
        TitleRecord::new("frieren", "Frieren", 2, 0, "https://source/t1")
    }

    #[test]
    fn test_fresh_title_accepts_anything() {
        assert!(title().is_new(&torrent("t1", 1)));
    }

    #[test]
    fn test_same_guid_is_not_new() {
        let mut t = title();
        t.accept(&torrent("t1", 1), 1);
        assert!(!t.is_new(&torrent("t1", 1)));
    }

    #[test]
    fn test_requires_strictly_newer_date() {
        let mut t = title();
        t.accept(&torrent("t2", 2), 2);
        assert!(!t.is_new(&torrent("t9", 2)));
        assert!(!t.is_new(&torrent("t1", 1)));
        assert!(t.is_new(&torrent("t3", 3)));
    }

    #[test]
    fn test_accept_never_regresses() {
        let mut t = title();
        assert!(t.accept(&torrent("t3", 3), 3));
        assert!(!t.accept(&torrent("t1", 1), 1));
        assert_eq!(t.last_torrent_reference.as_deref(), Some("t3"));
        assert_eq!(t.last_episode, Some(3));
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let t = title();
        assert!(t.matches(&torrent("t1", 1)));

        let mut other = torrent("x", 1);
        other.raw_title = "Dungeon Meshi - 01".to_string();
        assert!(!t.matches(&other));
    }

    #[test]
    fn test_release_group_narrows_matches() {
        let t = title().with_release_group("subsplease");

        let mut theirs = torrent("t1", 1);
        theirs.raw_title = "[SubsPlease] Frieren - 01 (1080p)".to_string();
        assert!(t.matches(&theirs));

        let mut other = torrent("t2", 1);
        other.raw_title = "[Erai-raws] Frieren - 01 (1080p)".to_string();
        assert!(!t.matches(&other));
    }
}
