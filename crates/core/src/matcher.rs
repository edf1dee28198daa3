//! Episode matcher.
//!
//! Maps an episode number as published by the listing source onto the local
//! numbering scheme of a tracked title. The listing source may number episodes
//! continuously across seasons while the library numbers them per season (or
//! the other way round); the per-title correction bridges the two.

use thiserror::Error;

/// Default upper bound for a plausible local episode number.
pub const DEFAULT_EPISODE_CEILING: i64 = 2000;

/// Error returned when a computed episode number cannot be a real episode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error(
        "episode {published} with correction {correction} gives {local}, outside 0..={ceiling}"
    )]
    Implausible {
        published: i32,
        correction: i32,
        local: i64,
        ceiling: i64,
    },
}

/// `published + correction`, widened so no pair of inputs can overflow.
pub fn compute_local_episode(published: i32, correction: i32) -> i64 {
    i64::from(published) + i64::from(correction)
}

/// Plausibility check around [`compute_local_episode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeMatcher {
    ceiling: i64,
}

impl Default for EpisodeMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_EPISODE_CEILING)
    }
}

impl EpisodeMatcher {
    pub fn new(ceiling: i64) -> Self {
        Self { ceiling }
    }

    /// Negative numbers and numbers above the ceiling signal a source format
    /// mismatch rather than a real episode. Episode 0 is allowed (prologues).
    pub fn is_plausible(&self, local: i64) -> bool {
        (0..=self.ceiling).contains(&local)
    }

    /// Compute the local episode and validate it.
    pub fn match_episode(&self, published: i32, correction: i32) -> Result<i64, MatchError> {
        let local = compute_local_episode(published, correction);
        if self.is_plausible(local) {
            Ok(local)
        } else {
            Err(MatchError::Implausible {
                published,
                correction,
                local,
                ceiling: self.ceiling,
            })
        }
    }
}
