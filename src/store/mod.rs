//! Backing store seam
//!
//! The persistent source behind the cache. Implementations are external
//! collaborators (spreadsheet, table adapter); no transactionality is assumed
//! between calls.

mod memory;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{Activity, ActivityPatch};

pub use memory::InMemoryActivityStore;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<Activity>>;

    async fn get(&self, id: &str) -> StoreResult<Option<Activity>>;

    async fn create(&self, activity: Activity) -> StoreResult<Activity>;

    /// Applies a partial update. `None` when no activity has this id.
    async fn update(&self, id: &str, patch: ActivityPatch) -> StoreResult<Option<Activity>>;

    /// `false` when nothing was removed.
    async fn remove(&self, id: &str) -> StoreResult<bool>;
}
