//! Sections: creation with a unique join code, lookup and listing.

use crate::domain::codes::{generate_section_code, MAX_CODE_GENERATION_ATTEMPTS};
use crate::domain::entities::ActivityType;
use crate::domain::format::{bot_link, section_name};
use crate::domain::permissions::check_role;
use crate::domain::{
    Division, DomainError, NewActivity, NewSection, Section, SectionCreated, StudyType, User,
    UserType,
};
use crate::ports::{ActivityRepo, CatalogRepo, SectionRepo, UserRepo};
use std::sync::Arc;
use tracing::{info, warn};

pub struct SectionService {
    sections: Arc<dyn SectionRepo>,
    users: Arc<dyn UserRepo>,
    catalog: Arc<dyn CatalogRepo>,
    activity: Arc<dyn ActivityRepo>,
    bot_username: String,
    max_students: i64,
}

impl SectionService {
    pub fn new(
        sections: Arc<dyn SectionRepo>,
        users: Arc<dyn UserRepo>,
        catalog: Arc<dyn CatalogRepo>,
        activity: Arc<dyn ActivityRepo>,
        bot_username: String,
        max_students: i64,
    ) -> Self {
        Self {
            sections,
            users,
            catalog,
            activity,
            bot_username,
            max_students,
        }
    }

    pub fn join_link(&self, code: &str) -> String {
        bot_link(&self.bot_username, Some(code))
    }

    pub fn bot_username(&self) -> &str {
        &self.bot_username
    }

    /// Random code not used by any section. Gives up after `MAX_CODE_GENERATION_ATTEMPTS`.
    pub async fn generate_unique_code(&self) -> Result<String, DomainError> {
        for attempt in 1..=MAX_CODE_GENERATION_ATTEMPTS {
            let code = generate_section_code();
            if !self.sections.code_exists(&code).await? {
                return Ok(code);
            }
            warn!(attempt, "join code collision");
        }
        Err(DomainError::Conflict("فشل توليد الكود الفريد".into()))
    }

    /// Owner creates `<level> - <type> - شعبة <div>` administered by `admin_telegram_id`.
    pub async fn create_section(
        &self,
        owner: &User,
        level_id: i64,
        study_type: &str,
        division: &str,
        admin_telegram_id: i64,
    ) -> Result<SectionCreated, DomainError> {
        check_role(Some(owner), UserType::Owner)?;
        let study_type = StudyType::from_label(study_type)
            .ok_or_else(|| DomainError::Validation("نوع الدراسة غير صحيح".into()))?;
        let division = Division::from_label(division)
            .ok_or_else(|| DomainError::Validation("الشعبة غير صحيحة".into()))?;
        let level = self
            .catalog
            .get_level(level_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("المرحلة الدراسية غير موجودة".into()))?;
        let admin = self
            .users
            .get_user(admin_telegram_id)
            .await?
            .ok_or_else(|| DomainError::NotFound("الأدمن غير موجود".into()))?;
        if admin.user_type == UserType::Student {
            return Err(DomainError::Validation(
                "المستخدم المحدد ليس أدمن. عيّنه كأدمن أولاً".into(),
            ));
        }

        let join_code = self.generate_unique_code().await?;
        let name = section_name(&level.level_name, study_type.label(), division.label());
        let section_id = self
            .sections
            .create_section(&NewSection {
                section_name: name.clone(),
                level_id,
                study_type,
                division,
                admin_id: admin.user_id,
                join_code: join_code.clone(),
                max_students: self.max_students,
            })
            .await?;

        self.activity
            .log_activity(
                &NewActivity::new(
                    owner.user_id,
                    ActivityType::SectionCreated,
                    format!("إنشاء شعبة: {}", name),
                )
                .target("section", section_id),
            )
            .await?;
        info!(section_id, %name, admin = admin_telegram_id, "section created");

        Ok(SectionCreated {
            section_id,
            section_name: name,
            join_link: self.join_link(&join_code),
            join_code,
            admin_id: admin.user_id,
        })
    }

    pub async fn get_by_id(&self, section_id: i64) -> Result<Option<Section>, DomainError> {
        self.sections.get_section_by_id(section_id).await
    }

    /// Owner sees every section; an admin only their own.
    pub async fn sections_for(&self, user: &User) -> Result<Vec<Section>, DomainError> {
        match user.user_type {
            UserType::Owner => self.sections.list_all_sections().await,
            UserType::Admin => self.sections.list_admin_sections(user.telegram_id).await,
            UserType::Student => Err(DomainError::PermissionDenied(
                "تحتاج إلى صلاحية admin".into(),
            )),
        }
    }
}
