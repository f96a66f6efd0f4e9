//! Conversation states. One per chat, persisted between updates.

use crate::domain::entities::{Division, StudyType};
use serde::{Deserialize, Serialize};

/// Assignment fields collected step by step by the publish flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentDraft {
    pub section_id: i64,
    pub subject_name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
}

/// Field picked in the edit flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditField {
    Title,
    Description,
    Deadline,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DialogState {
    #[default]
    Idle,

    /// Student opened a join link and must send their full name.
    WaitingForName { section_id: i64, section_name: String },

    CreateSectionLevel,
    CreateSectionType { level_id: i64 },
    CreateSectionDivision { level_id: i64, study_type: StudyType },
    CreateSectionAdmin {
        level_id: i64,
        study_type: StudyType,
        division: Division,
    },

    /// Owner sends `<telegram_id> <full name>`.
    AssignAdmin,
    EditSetting { key: String },

    PublishSection,
    PublishSubject { draft: AssignmentDraft },
    PublishTitle { draft: AssignmentDraft },
    PublishDescription { draft: AssignmentDraft },
    PublishDate { draft: AssignmentDraft },
    PublishTime { draft: AssignmentDraft },

    EditChooseField { assignment_id: i64 },
    EditValue { assignment_id: i64, field: EditField },
}

impl DialogState {
    pub fn is_idle(&self) -> bool {
        matches!(self, DialogState::Idle)
    }
}
