//! Core domain layer. No external I/O dependencies.
//!
//! Entities, validation rules, formatting and permission checks live here. Dependencies flow inward.

pub mod codes;
pub mod dialog;
pub mod entities;
pub mod errors;
pub mod format;
pub mod messages;
pub mod permissions;
pub mod texts;
pub mod time;
pub mod validation;

pub use dialog::{AssignmentDraft, DialogState, EditField};
pub use entities::{
    AcademicLevel, Activity, ActivityType, AdminStats, Assignment, AssignmentChanges, Decision,
    DeliveryStats, DeliveryStatus, Division, Feature, NewActivity, NewAssignment,
    NewRegistration, NewSection, NewUser, NotificationStats, NotificationType, OwnerStats,
    RegistrationStatus, Section, SectionCreated, Setting, StudentEntry, StudyType, Subject, User,
    UserType,
};
pub use errors::DomainError;
pub use messages::{
    CallbackAction, Incoming, IncomingCallback, IncomingMessage, InlineButton, Keyboard, Sender,
};
