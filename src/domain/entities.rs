//! Domain entities. Pure data structures for the core business.
//!
//! No SQLite/Telegram types here; adapters map rows and updates into these.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a bot user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Owner,
    Admin,
    Student,
}

impl UserType {
    pub fn as_str(self) -> &'static str {
        match self {
            UserType::Owner => "owner",
            UserType::Admin => "admin",
            UserType::Student => "student",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "owner" => Some(UserType::Owner),
            "admin" => Some(UserType::Admin),
            "student" => Some(UserType::Student),
            _ => None,
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Morning or evening study. Stored with its Arabic label, as the schema CHECK requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyType {
    Morning,
    Evening,
}

impl StudyType {
    pub const ALL: [StudyType; 2] = [StudyType::Morning, StudyType::Evening];

    pub fn label(self) -> &'static str {
        match self {
            StudyType::Morning => "صباحي",
            StudyType::Evening => "مسائي",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == s.trim())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Division {
    A,
    B,
}

impl Division {
    pub const ALL: [Division; 2] = [Division::A, Division::B];

    pub fn label(self) -> &'static str {
        match self {
            Division::A => "A",
            Division::B => "B",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.label().eq_ignore_ascii_case(s.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
}

impl RegistrationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Approved => "approved",
            RegistrationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RegistrationStatus::Pending),
            "approved" => Some(RegistrationStatus::Approved),
            "rejected" => Some(RegistrationStatus::Rejected),
            _ => None,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            RegistrationStatus::Approved => "✅",
            RegistrationStatus::Pending => "⏳",
            RegistrationStatus::Rejected => "❌",
        }
    }
}

/// Admin decision on a pending registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    New,
    Edit,
    Delete,
    Reminder,
}

impl NotificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::New => "new",
            NotificationType::Edit => "edit",
            NotificationType::Delete => "delete",
            NotificationType::Reminder => "reminder",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
    Blocked,
}

impl DeliveryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Failed => "failed",
            DeliveryStatus::Blocked => "blocked",
        }
    }
}

/// Kinds of audited events written to `activity_logs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityType {
    UserRegistered,
    UserBlocked,
    UserUnblocked,
    SectionCreated,
    SectionUpdated,
    SectionDeleted,
    AdminAssigned,
    RegistrationRequested,
    RegistrationApproved,
    RegistrationRejected,
    AssignmentCreated,
    AssignmentEdited,
    AssignmentDeleted,
    NotificationSent,
    SettingChanged,
    FeatureToggled,
}

impl ActivityType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::UserRegistered => "user_registered",
            ActivityType::UserBlocked => "user_blocked",
            ActivityType::UserUnblocked => "user_unblocked",
            ActivityType::SectionCreated => "section_created",
            ActivityType::SectionUpdated => "section_updated",
            ActivityType::SectionDeleted => "section_deleted",
            ActivityType::AdminAssigned => "admin_assigned",
            ActivityType::RegistrationRequested => "registration_requested",
            ActivityType::RegistrationApproved => "registration_approved",
            ActivityType::RegistrationRejected => "registration_rejected",
            ActivityType::AssignmentCreated => "assignment_created",
            ActivityType::AssignmentEdited => "assignment_edited",
            ActivityType::AssignmentDeleted => "assignment_deleted",
            ActivityType::NotificationSent => "notification_sent",
            ActivityType::SettingChanged => "setting_changed",
            ActivityType::FeatureToggled => "feature_toggled",
        }
    }
}

/// A registered bot user (owner, admin or student).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: i64,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub full_name: String,
    pub user_type: UserType,
    pub is_active: bool,
    pub is_blocked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub telegram_id: i64,
    pub full_name: String,
    pub user_type: UserType,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcademicLevel {
    pub level_id: i64,
    pub level_name: String,
    pub level_number: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub subject_id: i64,
    pub subject_name: String,
    pub description: Option<String>,
}

/// A section with its joined level and admin names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub section_id: i64,
    pub section_name: String,
    pub level_id: i64,
    pub level_name: String,
    pub study_type: StudyType,
    pub division: Division,
    pub admin_id: Option<i64>,
    pub admin_name: Option<String>,
    pub join_code: String,
    pub max_students: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSection {
    pub section_name: String,
    pub level_id: i64,
    pub study_type: StudyType,
    pub division: Division,
    pub admin_id: i64,
    pub join_code: String,
    pub max_students: i64,
}

/// Result of a successful section creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionCreated {
    pub section_id: i64,
    pub section_name: String,
    pub join_code: String,
    pub admin_id: i64,
    pub join_link: String,
}

/// A student row in a section listing (pending or approved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentEntry {
    pub user_id: i64,
    pub telegram_id: i64,
    pub full_name: String,
    pub username: Option<String>,
    pub is_blocked: bool,
    pub status: RegistrationStatus,
    /// registered_at for pending rows, approved_at for approved rows.
    pub at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    pub telegram_id: i64,
    pub full_name: String,
    pub username: Option<String>,
    pub section_id: i64,
}

/// An assignment with subject and creator names.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub assignment_id: i64,
    pub section_id: i64,
    pub subject_id: i64,
    pub subject_name: String,
    pub title: String,
    pub description: Option<String>,
    pub deadline: DateTime<FixedOffset>,
    pub created_by: i64,
    pub creator_name: String,
    pub is_active: bool,
    pub is_edited: bool,
    pub created_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAssignment {
    pub section_id: i64,
    pub subject_name: String,
    pub title: String,
    pub description: Option<String>,
    pub deadline: DateTime<FixedOffset>,
    pub created_by: i64,
}

/// Optional field updates for an assignment. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<DateTime<FixedOffset>>,
}

impl AssignmentChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.deadline.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActivity {
    pub user_id: Option<i64>,
    pub action_type: ActivityType,
    pub details: Option<String>,
    pub target_type: Option<String>,
    pub target_id: Option<i64>,
}

impl NewActivity {
    pub fn new(user_id: i64, action_type: ActivityType, details: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id),
            action_type,
            details: Some(details.into()),
            target_type: None,
            target_id: None,
        }
    }

    pub fn target(mut self, target_type: &str, target_id: i64) -> Self {
        self.target_type = Some(target_type.to_string());
        self.target_id = Some(target_id);
        self
    }
}

/// A row of the activity log joined with the acting user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub log_id: i64,
    pub user_id: Option<i64>,
    pub action_type: String,
    pub details: Option<String>,
    pub target_type: Option<String>,
    pub target_id: Option<i64>,
    pub created_at: String,
    pub full_name: Option<String>,
    pub user_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    pub key: String,
    pub value: String,
    pub setting_type: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub key: String,
    pub name: String,
    pub is_enabled: bool,
    pub description: Option<String>,
}

/// Well-known feature keys seeded by `init-db`.
pub mod features {
    pub const STUDENT_BLOCKING: &str = "student_blocking";
}

/// Bot-wide statistics for the owner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerStats {
    pub sections_count: i64,
    pub students_count: i64,
    pub pending_count: i64,
    pub assignments_count: i64,
    pub admins_count: i64,
}

/// Statistics restricted to an admin's sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminStats {
    pub sections_count: i64,
    pub students_count: i64,
    pub pending_count: i64,
    pub assignments_count: i64,
}

/// Delivery counters recorded in `assignment_notifications` for one assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationStats {
    pub total: i64,
    pub sent: i64,
    pub failed: i64,
    pub blocked: i64,
}

/// Counters of a single broadcast run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    pub sent: usize,
    pub failed: usize,
    pub blocked: usize,
}

impl DeliveryStats {
    pub fn record(&mut self, status: DeliveryStatus) {
        match status {
            DeliveryStatus::Sent => self.sent += 1,
            DeliveryStatus::Failed => self.failed += 1,
            DeliveryStatus::Blocked => self.blocked += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.sent + self.failed + self.blocked
    }
}
