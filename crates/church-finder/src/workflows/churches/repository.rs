use std::fmt;

use serde::{Deserialize, Serialize};

use super::mapping::{ChurchDetail, EvaluationRecord, EvaluationWrite};

/// Store-assigned church identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChurchId(pub i64);

impl fmt::Display for ChurchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage abstraction so the evaluation service can be exercised in isolation.
pub trait ChurchStore: Send + Sync {
    /// Upsert the church, replace its addresses and service times, and append the
    /// evaluation, all-or-nothing. Returns the re-read aggregate.
    fn record_evaluation(&self, write: EvaluationWrite) -> Result<ChurchDetail, StoreError>;
    fn find_by_website(&self, website: &str) -> Result<Option<ChurchDetail>, StoreError>;
    fn fetch(&self, id: ChurchId) -> Result<Option<ChurchDetail>, StoreError>;
    /// Every evaluation for the church, newest first.
    fn history(&self, id: ChurchId) -> Result<Vec<EvaluationRecord>, StoreError>;
    fn all(&self) -> Result<Vec<ChurchDetail>, StoreError>;
    /// Remove the church and everything it owns. Returns `false` when it did not exist.
    fn delete(&self, id: ChurchId) -> Result<bool, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("transaction failed and was rolled back: {0}")]
    Transaction(String),
    #[error("stored value could not be (de)serialized: {0}")]
    Serialization(String),
    #[error("record conflicts with existing data: {0}")]
    Conflict(String),
}
