//! Student registration: join-link entry, requests, admin decisions and section rosters.

use crate::domain::entities::ActivityType;
use crate::domain::permissions::{check_role, check_section_access};
use crate::domain::validation::{is_valid_section_code, validate_full_name};
use crate::domain::{
    Decision, DomainError, NewActivity, NewRegistration, Section, StudentEntry, User, UserType,
};
use crate::ports::{ActivityRepo, RegistrationRepo, SectionRepo, UserRepo};
use std::sync::Arc;
use tracing::info;

pub struct RegistrationService {
    registrations: Arc<dyn RegistrationRepo>,
    sections: Arc<dyn SectionRepo>,
    users: Arc<dyn UserRepo>,
    activity: Arc<dyn ActivityRepo>,
}

fn refuse_staff(user: Option<&User>) -> Result<(), DomainError> {
    match user {
        Some(u) if u.user_type != UserType::Student => Err(DomainError::PermissionDenied(
            "لا يمكن للمالك أو الأدمن التسجيل كطالب".into(),
        )),
        Some(u) if u.is_blocked => Err(DomainError::PermissionDenied(
            "أنت محظور من استخدام البوت".into(),
        )),
        _ => Ok(()),
    }
}

impl RegistrationService {
    pub fn new(
        registrations: Arc<dyn RegistrationRepo>,
        sections: Arc<dyn SectionRepo>,
        users: Arc<dyn UserRepo>,
        activity: Arc<dyn ActivityRepo>,
    ) -> Self {
        Self {
            registrations,
            sections,
            users,
            activity,
        }
    }

    async fn active_section(&self, section_id: i64) -> Result<Section, DomainError> {
        self.sections
            .get_section_by_id(section_id)
            .await?
            .filter(|s| s.is_active)
            .ok_or_else(|| DomainError::NotFound("الشعبة غير موجودة أو غير نشطة".into()))
    }

    /// Resolve a join code opened by `telegram_id`. Staff accounts are refused.
    pub async fn open_join_link(&self, telegram_id: i64, code: &str) -> Result<Section, DomainError> {
        if !is_valid_section_code(code) {
            return Err(DomainError::Validation("كود الشعبة غير صحيح".into()));
        }
        let section = self
            .sections
            .get_section_by_code(code)
            .await?
            .ok_or_else(|| DomainError::NotFound("كود الشعبة غير صحيح".into()))?;
        refuse_staff(self.users.get_user(telegram_id).await?.as_ref())?;
        Ok(section)
    }

    /// File a pending request. Returns the section for the admin notification.
    pub async fn register_student(
        &self,
        telegram_id: i64,
        full_name: &str,
        username: Option<&str>,
        section_id: i64,
    ) -> Result<Section, DomainError> {
        let full_name = full_name.trim();
        validate_full_name(full_name)?;
        let section = self.active_section(section_id).await?;
        refuse_staff(self.users.get_user(telegram_id).await?.as_ref())?;
        if self.registrations.approved_count(section_id).await? >= section.max_students {
            return Err(DomainError::Conflict("الشعبة ممتلئة".into()));
        }
        let student_id = self
            .registrations
            .register(&NewRegistration {
                telegram_id,
                full_name: full_name.to_string(),
                username: username.map(str::to_string),
                section_id,
            })
            .await?;
        info!(student_id, section_id, "registration requested");
        Ok(section)
    }

    async fn decide(
        &self,
        actor: &User,
        student_telegram_id: i64,
        section_id: i64,
        decision: Decision,
    ) -> Result<Section, DomainError> {
        check_role(Some(actor), UserType::Admin)?;
        let section = self.active_section(section_id).await?;
        check_section_access(actor, section.admin_id)?;
        let student_id = self
            .registrations
            .decide(student_telegram_id, section_id, decision, actor.user_id)
            .await?;
        let (kind, details) = match decision {
            Decision::Approve => (
                ActivityType::RegistrationApproved,
                format!("الموافقة على تسجيل الطالب {}", student_id),
            ),
            Decision::Reject => (
                ActivityType::RegistrationRejected,
                format!("رفض تسجيل الطالب {}", student_id),
            ),
        };
        self.activity
            .log_activity(&NewActivity::new(actor.user_id, kind, details).target("student", student_id))
            .await?;
        Ok(section)
    }

    pub async fn approve(
        &self,
        actor: &User,
        student_telegram_id: i64,
        section_id: i64,
    ) -> Result<Section, DomainError> {
        self.decide(actor, student_telegram_id, section_id, Decision::Approve)
            .await
    }

    pub async fn reject(
        &self,
        actor: &User,
        student_telegram_id: i64,
        section_id: i64,
    ) -> Result<Section, DomainError> {
        self.decide(actor, student_telegram_id, section_id, Decision::Reject)
            .await
    }

    pub async fn pending(&self, actor: &User, section_id: i64) -> Result<Vec<StudentEntry>, DomainError> {
        let section = self.active_section(section_id).await?;
        check_section_access(actor, section.admin_id)?;
        self.registrations.list_pending(section_id).await
    }

    pub async fn approved(&self, actor: &User, section_id: i64) -> Result<Vec<StudentEntry>, DomainError> {
        let section = self.active_section(section_id).await?;
        check_section_access(actor, section.admin_id)?;
        self.registrations.list_approved(section_id).await
    }

    pub async fn blocked(&self, actor: &User, section_id: i64) -> Result<Vec<StudentEntry>, DomainError> {
        let section = self.active_section(section_id).await?;
        check_section_access(actor, section.admin_id)?;
        self.registrations.list_blocked(section_id).await
    }

    /// The section a student is approved in, if any.
    pub async fn student_section(&self, telegram_id: i64) -> Result<Option<Section>, DomainError> {
        self.registrations.student_section(telegram_id).await
    }
}
