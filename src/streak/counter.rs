//! Remote counter service contract

use async_trait::async_trait;

use super::Identity;
use crate::{error::RemoteError, state::StreakRecord};

/// Result of reading the remote streak
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Found(StreakRecord),
    /// The user has no streak row yet
    NotFound,
}

/// Remote owner of the streak value.
///
/// The service decides streak arithmetic, including day-boundary resets.
/// Callers treat every returned record as authoritative.
#[async_trait]
pub trait CounterService: Send + Sync {
    async fn fetch_streak(&self, identity: &Identity) -> Result<FetchOutcome, RemoteError>;

    async fn increment_streak(&self, identity: &Identity) -> Result<StreakRecord, RemoteError>;

    /// Where the user can fix a missing counter resource, if known
    fn setup_url(&self) -> Option<String> {
        None
    }
}
