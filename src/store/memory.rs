//! In-memory activity store used by the binary and tests.

use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::models::{Activity, ActivityPatch};
use crate::store::{ActivityStore, StoreResult};

/// Activities kept in insertion order behind an async lock.
#[derive(Debug, Default)]
pub struct InMemoryActivityStore {
    activities: RwLock<Vec<Activity>>,
}

impl InMemoryActivityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_activities(activities: Vec<Activity>) -> Self {
        Self {
            activities: RwLock::new(activities),
        }
    }

    /// Loads a JSON array of activities from disk.
    pub async fn from_seed_file(path: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading seed file {}", path.display()))?;
        let activities: Vec<Activity> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing seed file {}", path.display()))?;
        Ok(Self::with_activities(activities))
    }

    pub async fn len(&self) -> usize {
        self.activities.read().await.len()
    }
}

#[async_trait]
impl ActivityStore for InMemoryActivityStore {
    async fn list(&self) -> StoreResult<Vec<Activity>> {
        Ok(self.activities.read().await.clone())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Activity>> {
        Ok(self
            .activities
            .read()
            .await
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn create(&self, activity: Activity) -> StoreResult<Activity> {
        let mut activities = self.activities.write().await;
        if activities.iter().any(|a| a.id == activity.id) {
            return Err(StoreError::Backend(format!(
                "activity {} already exists",
                activity.id
            )));
        }
        activities.push(activity.clone());
        Ok(activity)
    }

    async fn update(&self, id: &str, patch: ActivityPatch) -> StoreResult<Option<Activity>> {
        let mut activities = self.activities.write().await;
        Ok(activities.iter_mut().find(|a| a.id == id).map(|activity| {
            activity.apply(patch);
            activity.clone()
        }))
    }

    async fn remove(&self, id: &str) -> StoreResult<bool> {
        let mut activities = self.activities.write().await;
        let before = activities.len();
        activities.retain(|a| a.id != id);
        Ok(activities.len() != before)
    }
}
