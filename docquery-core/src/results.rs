//! Acknowledgements returned by write operations.

use bson::Bson;
use serde::{Deserialize, Serialize};

/// The outcome of [`Collection::insert_one`](crate::collection::Collection::insert_one).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertOneResult {
    /// The resolved `_id` of the inserted document.
    pub inserted_id: Bson,
    /// Whether the backend acknowledged the write.
    pub acknowledged: bool,
}

/// The outcome of [`Collection::insert_many`](crate::collection::Collection::insert_many).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertManyResult {
    /// The resolved `_id`s, in input order.
    pub inserted_ids: Vec<Bson>,
    /// Whether the backend acknowledged the write.
    pub acknowledged: bool,
}

/// The outcome of an update.
///
/// `modified_count` only counts documents whose content changed, so it may be
/// lower than `matched_count` (for example when `add_to_set` finds the value
/// already present).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResult {
    /// Number of documents the filter selected.
    pub matched_count: u64,
    /// Number of documents that changed.
    pub modified_count: u64,
}

impl UpdateResult {
    /// Creates a result from the matched and modified counts.
    pub fn new(matched_count: u64, modified_count: u64) -> Self {
        Self { matched_count, modified_count }
    }
}
