//! Read-only statistics and the recent activity trail.

use crate::domain::{Activity, AdminStats, DomainError, OwnerStats};
use crate::ports::{ActivityRepo, StatsRepo};
use std::sync::Arc;

pub struct StatsService {
    stats: Arc<dyn StatsRepo>,
    activity: Arc<dyn ActivityRepo>,
}

impl StatsService {
    pub fn new(stats: Arc<dyn StatsRepo>, activity: Arc<dyn ActivityRepo>) -> Self {
        Self { stats, activity }
    }

    pub async fn owner_stats(&self) -> Result<OwnerStats, DomainError> {
        self.stats.owner_stats().await
    }

    /// None when the admin has no active section.
    pub async fn admin_stats(&self, admin_telegram_id: i64) -> Result<Option<AdminStats>, DomainError> {
        self.stats.admin_stats(admin_telegram_id).await
    }

    pub async fn recent_activities(&self, limit: u32) -> Result<Vec<Activity>, DomainError> {
        self.activity.recent_activities(limit).await
    }
}
