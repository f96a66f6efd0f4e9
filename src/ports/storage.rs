//! Storage ports. One trait per aggregate; the SQLite adapter implements all of them.

use crate::domain::{
    AcademicLevel, Activity, AdminStats, Assignment, AssignmentChanges, Decision, DeliveryStatus,
    DomainError, Feature, NewActivity, NewAssignment, NewRegistration, NewSection, NewUser,
    NotificationStats, NotificationType, OwnerStats, Section, Setting, StudentEntry, Subject,
    User, UserType,
};

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Insert a user. Returns the new `user_id`; `Conflict` when the telegram id exists.
    async fn create_user(&self, user: &NewUser) -> Result<i64, DomainError>;

    async fn get_user(&self, telegram_id: i64) -> Result<Option<User>, DomainError>;

    async fn get_user_by_id(&self, user_id: i64) -> Result<Option<User>, DomainError>;

    /// Update name and/or username and touch `last_active`. Returns false for an unknown user.
    async fn update_user(
        &self,
        telegram_id: i64,
        full_name: Option<&str>,
        username: Option<&str>,
    ) -> Result<bool, DomainError>;

    /// Returns false for an unknown user.
    async fn set_blocked(&self, telegram_id: i64, blocked: bool) -> Result<bool, DomainError>;

    /// Returns false for an unknown user.
    async fn set_user_type(&self, telegram_id: i64, user_type: UserType)
        -> Result<bool, DomainError>;

    /// Active users of the given type, ordered by name.
    async fn list_users_by_type(&self, user_type: UserType) -> Result<Vec<User>, DomainError>;
}

#[async_trait::async_trait]
pub trait SectionRepo: Send + Sync {
    /// Returns the new `section_id`. A duplicate (level, type, division) is a `Conflict`.
    async fn create_section(&self, section: &NewSection) -> Result<i64, DomainError>;

    /// Active section by join code.
    async fn get_section_by_code(&self, code: &str) -> Result<Option<Section>, DomainError>;

    async fn get_section_by_id(&self, section_id: i64) -> Result<Option<Section>, DomainError>;

    /// Active sections administered by the given telegram user.
    async fn list_admin_sections(&self, admin_telegram_id: i64)
        -> Result<Vec<Section>, DomainError>;

    /// Active sections ordered by level number, study type, division.
    async fn list_all_sections(&self) -> Result<Vec<Section>, DomainError>;

    async fn code_exists(&self, code: &str) -> Result<bool, DomainError>;
}

#[async_trait::async_trait]
pub trait RegistrationRepo: Send + Sync {
    /// Atomically: check capacity, create the student user if missing, refuse a prior
    /// request, insert a pending row and log `registration_requested`.
    /// Returns the student's `user_id`.
    async fn register(&self, registration: &NewRegistration) -> Result<i64, DomainError>;

    /// Resolve a pending request. `NotFound` when no pending row exists.
    /// Returns the student's `user_id`.
    async fn decide(
        &self,
        student_telegram_id: i64,
        section_id: i64,
        decision: Decision,
        decided_by: i64,
    ) -> Result<i64, DomainError>;

    /// Newest first.
    async fn list_pending(&self, section_id: i64) -> Result<Vec<StudentEntry>, DomainError>;

    /// Active, unblocked, approved students ordered by name.
    async fn list_approved(&self, section_id: i64) -> Result<Vec<StudentEntry>, DomainError>;

    /// Approved students of the section that are currently blocked.
    async fn list_blocked(&self, section_id: i64) -> Result<Vec<StudentEntry>, DomainError>;

    /// Section the student is approved in, if any.
    async fn student_section(&self, telegram_id: i64) -> Result<Option<Section>, DomainError>;

    async fn approved_count(&self, section_id: i64) -> Result<i64, DomainError>;
}

#[async_trait::async_trait]
pub trait AssignmentRepo: Send + Sync {
    /// Resolves (or inserts) the subject by name. Returns the new `assignment_id`.
    async fn create_assignment(&self, assignment: &NewAssignment) -> Result<i64, DomainError>;

    async fn get_assignment(&self, assignment_id: i64) -> Result<Option<Assignment>, DomainError>;

    /// Ordered by deadline, latest first.
    async fn list_section_assignments(
        &self,
        section_id: i64,
        include_inactive: bool,
    ) -> Result<Vec<Assignment>, DomainError>;

    /// Record the previous values in `assignment_edits`, then apply `changes`.
    async fn edit_assignment(
        &self,
        assignment_id: i64,
        changes: &AssignmentChanges,
        edited_by: i64,
    ) -> Result<(), DomainError>;

    /// Soft delete.
    async fn deactivate_assignment(&self, assignment_id: i64) -> Result<(), DomainError>;
}

#[async_trait::async_trait]
pub trait NotificationLog: Send + Sync {
    async fn log_notification(
        &self,
        assignment_id: i64,
        student_id: i64,
        kind: NotificationType,
        status: DeliveryStatus,
    ) -> Result<(), DomainError>;

    async fn notification_stats(&self, assignment_id: i64)
        -> Result<NotificationStats, DomainError>;
}

#[async_trait::async_trait]
pub trait ActivityRepo: Send + Sync {
    async fn log_activity(&self, activity: &NewActivity) -> Result<(), DomainError>;

    /// Most recent first, joined with the acting user's name and type.
    async fn recent_activities(&self, limit: u32) -> Result<Vec<Activity>, DomainError>;
}

#[async_trait::async_trait]
pub trait StatsRepo: Send + Sync {
    async fn owner_stats(&self) -> Result<OwnerStats, DomainError>;

    /// None when the admin has no active sections.
    async fn admin_stats(&self, admin_telegram_id: i64) -> Result<Option<AdminStats>, DomainError>;
}

#[async_trait::async_trait]
pub trait CatalogRepo: Send + Sync {
    /// Active levels ordered by number.
    async fn list_levels(&self) -> Result<Vec<AcademicLevel>, DomainError>;

    async fn get_level(&self, level_id: i64) -> Result<Option<AcademicLevel>, DomainError>;

    /// Active subjects ordered by name.
    async fn list_subjects(&self) -> Result<Vec<Subject>, DomainError>;

    async fn subjects_for_stage(&self, stage_id: i64) -> Result<Vec<Subject>, DomainError>;
}

#[async_trait::async_trait]
pub trait SettingsRepo: Send + Sync {
    async fn get_setting(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// `NotFound` for an unknown key.
    async fn set_setting(&self, key: &str, value: &str) -> Result<(), DomainError>;

    async fn list_settings(&self) -> Result<Vec<Setting>, DomainError>;

    /// Flip a feature flag and return its new state. `NotFound` for an unknown key.
    async fn toggle_feature(&self, key: &str) -> Result<bool, DomainError>;

    /// False for unknown keys.
    async fn is_feature_enabled(&self, key: &str) -> Result<bool, DomainError>;

    async fn list_features(&self) -> Result<Vec<Feature>, DomainError>;
}
