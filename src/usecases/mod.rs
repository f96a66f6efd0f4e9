//! Application use cases. Orchestrate domain logic via ports.

pub mod assignment_service;
pub mod dispatcher;
pub mod notification_worker;
pub mod registration_service;
pub mod section_service;
pub mod settings_service;
pub mod stats_service;
pub mod update_loop;
pub mod user_service;

pub use assignment_service::AssignmentService;
pub use dispatcher::{BotDispatcher, BotServices};
pub use notification_worker::{
    DeliveryPolicy, NotificationJob, NotificationStores, NotificationWorker,
};
pub use registration_service::RegistrationService;
pub use section_service::SectionService;
pub use settings_service::SettingsService;
pub use stats_service::StatsService;
pub use update_loop::UpdateLoop;
pub use user_service::UserService;

use crate::ports::{
    ActivityRepo, AssignmentRepo, CatalogRepo, NotificationLog, RegistrationRepo, SectionRepo,
    SettingsRepo, StatsRepo, UserRepo,
};
use chrono_tz::Tz;
use std::sync::Arc;

/// Runtime knobs the services need.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub bot_username: String,
    pub max_students: i64,
    pub tz: Tz,
    pub edit_window: chrono::Duration,
}

impl BotServices {
    /// Build every service on top of one store implementing all storage ports.
    pub fn from_store<S>(store: Arc<S>, opts: ServiceOptions) -> Self
    where
        S: UserRepo
            + SectionRepo
            + RegistrationRepo
            + AssignmentRepo
            + ActivityRepo
            + StatsRepo
            + CatalogRepo
            + SettingsRepo
            + 'static,
    {
        let users: Arc<dyn UserRepo> = store.clone();
        let sections: Arc<dyn SectionRepo> = store.clone();
        let registrations: Arc<dyn RegistrationRepo> = store.clone();
        let assignments: Arc<dyn AssignmentRepo> = store.clone();
        let activity: Arc<dyn ActivityRepo> = store.clone();
        let stats: Arc<dyn StatsRepo> = store.clone();
        let catalog: Arc<dyn CatalogRepo> = store.clone();
        let settings: Arc<dyn SettingsRepo> = store;

        Self {
            users: Arc::new(UserService::new(
                users.clone(),
                registrations.clone(),
                settings.clone(),
                activity.clone(),
            )),
            sections: Arc::new(SectionService::new(
                sections.clone(),
                users.clone(),
                catalog.clone(),
                activity.clone(),
                opts.bot_username,
                opts.max_students,
            )),
            registrations: Arc::new(RegistrationService::new(
                registrations,
                sections.clone(),
                users,
                activity.clone(),
            )),
            assignments: Arc::new(AssignmentService::new(
                assignments,
                sections,
                activity.clone(),
                opts.tz,
                opts.edit_window,
            )),
            stats: Arc::new(StatsService::new(stats, activity.clone())),
            settings: Arc::new(SettingsService::new(settings, activity)),
            catalog,
        }
    }
}

impl NotificationStores {
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: AssignmentRepo + RegistrationRepo + NotificationLog + ActivityRepo + 'static,
    {
        Self {
            assignments: store.clone(),
            registrations: store.clone(),
            log: store.clone(),
            activity: store,
        }
    }
}
