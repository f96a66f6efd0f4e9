//! Student menus: own assignments with time remaining, and section info.

use super::BotDispatcher;
use crate::domain::format::{assignment_list, section_info_message};
use crate::domain::texts;
use crate::domain::time::now_in;
use crate::domain::{DomainError, User, UserType};

impl BotDispatcher {
    pub(super) async fn my_assignments(&self, chat_id: i64, user: &User) -> Result<(), DomainError> {
        if user.user_type != UserType::Student {
            return Err(DomainError::PermissionDenied("هذا الخيار للطلاب فقط".into()));
        }
        let Some(section) = self
            .services
            .registrations
            .student_section(user.telegram_id)
            .await?
        else {
            return self.send(chat_id, texts::ERROR_NOT_REGISTERED, None).await;
        };
        let assignments = self
            .services
            .assignments
            .list(section.section_id, false)
            .await?;
        if assignments.is_empty() {
            return self.send(chat_id, "✅ لا توجد واجبات حالياً", None).await;
        }
        let tz = self.services.assignments.tz();
        self.send(chat_id, &assignment_list(&assignments, &now_in(tz), tz), None)
            .await
    }

    pub(super) async fn section_info(&self, chat_id: i64, user: &User) -> Result<(), DomainError> {
        match self
            .services
            .registrations
            .student_section(user.telegram_id)
            .await?
        {
            Some(section) => self.send(chat_id, &section_info_message(&section), None).await,
            None => self.send(chat_id, texts::ERROR_NOT_REGISTERED, None).await,
        }
    }
}
