//! Port traits. API boundaries for the hexagon.
//!
//! - Inbound: Called by the update loop into the application
//! - Outbound: Called by application into infrastructure (Telegram, storage, dialog state)

pub mod inbound;
pub mod outbound;
pub mod storage;

pub use inbound::InputPort;
pub use outbound::{BotGateway, DialogStatePort, PolledUpdate, UpdateSource};
pub use storage::{
    ActivityRepo, AssignmentRepo, CatalogRepo, NotificationLog, RegistrationRepo, SectionRepo,
    SettingsRepo, StatsRepo, UserRepo,
};
