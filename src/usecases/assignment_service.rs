//! Assignments: publish, edit (within the edit window for admins), soft delete and listing.

use crate::domain::entities::ActivityType;
use crate::domain::permissions::{check_role, check_section_access};
use crate::domain::time::now_in;
use crate::domain::validation::{validate_assignment_title, validate_deadline, validate_description};
use crate::domain::{
    Assignment, AssignmentChanges, DomainError, NewActivity, NewAssignment, Section, User,
    UserType,
};
use crate::ports::{ActivityRepo, AssignmentRepo, SectionRepo};
use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::info;

/// Input of `AssignmentService::create`.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishRequest {
    pub section_id: i64,
    pub subject_name: String,
    pub title: String,
    pub description: Option<String>,
    pub deadline: DateTime<FixedOffset>,
}

pub struct AssignmentService {
    assignments: Arc<dyn AssignmentRepo>,
    sections: Arc<dyn SectionRepo>,
    activity: Arc<dyn ActivityRepo>,
    tz: Tz,
    edit_window: chrono::Duration,
}

impl AssignmentService {
    pub fn new(
        assignments: Arc<dyn AssignmentRepo>,
        sections: Arc<dyn SectionRepo>,
        activity: Arc<dyn ActivityRepo>,
        tz: Tz,
        edit_window: chrono::Duration,
    ) -> Self {
        Self {
            assignments,
            sections,
            activity,
            tz,
            edit_window,
        }
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    async fn managed_section(&self, actor: &User, section_id: i64) -> Result<Section, DomainError> {
        check_role(Some(actor), UserType::Admin)?;
        let section = self
            .sections
            .get_section_by_id(section_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("الشعبة غير موجودة".into()))?;
        check_section_access(actor, section.admin_id)?;
        Ok(section)
    }

    async fn existing(&self, assignment_id: i64) -> Result<Assignment, DomainError> {
        self.assignments
            .get_assignment(assignment_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("الواجب غير موجود".into()))
    }

    /// Active assignment in a section `actor` manages.
    pub async fn authorize(&self, actor: &User, assignment_id: i64) -> Result<Assignment, DomainError> {
        let current = self.existing(assignment_id).await?;
        if !current.is_active {
            return Err(DomainError::NotFound("الواجب غير موجود".into()));
        }
        self.managed_section(actor, current.section_id).await?;
        Ok(current)
    }

    pub async fn create(&self, actor: &User, req: PublishRequest) -> Result<Assignment, DomainError> {
        let title = req.title.trim();
        validate_assignment_title(title)?;
        let description = req
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());
        if let Some(d) = description {
            validate_description(d)?;
        }
        let subject_name = req.subject_name.trim();
        if subject_name.is_empty() {
            return Err(DomainError::Validation("اسم المادة فارغ".into()));
        }
        validate_deadline(&req.deadline, &now_in(self.tz))?;
        self.managed_section(actor, req.section_id).await?;

        let assignment_id = self
            .assignments
            .create_assignment(&NewAssignment {
                section_id: req.section_id,
                subject_name: subject_name.to_string(),
                title: title.to_string(),
                description: description.map(str::to_string),
                deadline: req.deadline,
                created_by: actor.user_id,
            })
            .await?;
        self.activity
            .log_activity(
                &NewActivity::new(
                    actor.user_id,
                    ActivityType::AssignmentCreated,
                    format!("إنشاء واجب: {}", title),
                )
                .target("assignment", assignment_id),
            )
            .await?;
        info!(assignment_id, section_id = req.section_id, "assignment published");
        self.existing(assignment_id).await
    }

    /// Apply `changes`. Admins may only edit within the edit window after creation.
    pub async fn edit(
        &self,
        actor: &User,
        assignment_id: i64,
        changes: AssignmentChanges,
    ) -> Result<Assignment, DomainError> {
        if changes.is_empty() {
            return Err(DomainError::Validation("لا توجد تحديثات".into()));
        }
        let current = self.existing(assignment_id).await?;
        if !current.is_active {
            return Err(DomainError::NotFound("الواجب غير موجود".into()));
        }
        self.managed_section(actor, current.section_id).await?;

        let now = now_in(self.tz);
        if actor.user_type != UserType::Owner
            && now.fixed_offset().signed_duration_since(current.created_at) >= self.edit_window
        {
            return Err(DomainError::PermissionDenied(format!(
                "انتهت مدة التعديل المسموحة ({} ساعة)",
                self.edit_window.num_hours()
            )));
        }

        let mut changes = changes;
        if let Some(t) = changes.title.as_mut() {
            *t = t.trim().to_string();
            validate_assignment_title(t)?;
        }
        if let Some(d) = changes.description.as_mut() {
            *d = d.trim().to_string();
            validate_description(d)?;
        }
        if let Some(deadline) = &changes.deadline {
            validate_deadline(deadline, &now)?;
        }

        self.assignments
            .edit_assignment(assignment_id, &changes, actor.user_id)
            .await?;
        self.activity
            .log_activity(
                &NewActivity::new(
                    actor.user_id,
                    ActivityType::AssignmentEdited,
                    format!("تعديل واجب: {}", current.title),
                )
                .target("assignment", assignment_id),
            )
            .await?;
        self.existing(assignment_id).await
    }

    /// Soft delete. Returns the assignment as it was.
    pub async fn delete(&self, actor: &User, assignment_id: i64) -> Result<Assignment, DomainError> {
        let current = self.existing(assignment_id).await?;
        if !current.is_active {
            return Err(DomainError::NotFound("الواجب غير موجود".into()));
        }
        self.managed_section(actor, current.section_id).await?;
        self.assignments.deactivate_assignment(assignment_id).await?;
        self.activity
            .log_activity(
                &NewActivity::new(
                    actor.user_id,
                    ActivityType::AssignmentDeleted,
                    format!("حذف واجب: {}", current.title),
                )
                .target("assignment", assignment_id),
            )
            .await?;
        Ok(current)
    }

    pub async fn get(&self, assignment_id: i64) -> Result<Option<Assignment>, DomainError> {
        self.assignments.get_assignment(assignment_id).await
    }

    pub async fn list(&self, section_id: i64, include_inactive: bool) -> Result<Vec<Assignment>, DomainError> {
        self.assignments
            .list_section_assignments(section_id, include_inactive)
            .await
    }
}
