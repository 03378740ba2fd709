use std::str::FromStr;

use async_trait::async_trait;
use shared::{
    domain::{CampaignId, Quest, QuestId, QuestStatus},
    error::ApiError,
    protocol::{NewQuest, QuestPatch},
};
use tracing::info;

use super::{optional_text, required, Draft, FormSession};
use crate::{
    error::{FieldError, ValidationError},
    records::Records,
    Confirm,
};

pub const DELETE_QUEST_PROMPT: &str = "Tem certeza que quer excluir essa missão?";

pub type QuestForm = FormSession<QuestDraft>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestDraft {
    pub title: String,
    pub description: String,
    pub status: QuestStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestField {
    Title,
    Description,
    Status,
}

impl FromStr for QuestField {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" | "titulo" | "título" => Ok(QuestField::Title),
            "description" | "descricao" | "descrição" => Ok(QuestField::Description),
            "status" => Ok(QuestField::Status),
            other => Err(FieldError::UnknownField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Declined,
}

#[async_trait]
impl Draft for QuestDraft {
    type Id = QuestId;
    type Owner = CampaignId;
    type Record = Quest;
    type Field = QuestField;

    const KIND: &'static str = "quest";

    fn seed(record: &Quest) -> (QuestId, Self) {
        (
            record.id,
            Self {
                title: record.title.clone(),
                description: record.description.clone().unwrap_or_default(),
                status: record.status,
            },
        )
    }

    fn set_field(&mut self, field: QuestField, value: &str) -> Result<(), FieldError> {
        match field {
            QuestField::Title => self.title = value.to_string(),
            QuestField::Description => self.description = value.to_string(),
            QuestField::Status => {
                self.status = value.parse().map_err(FieldError::UnknownStatus)?;
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        required(&self.title, ValidationError::QuestTitleRequired)
    }

    async fn create(&self, records: &Records, campaign: CampaignId) -> Result<(), ApiError> {
        let payload = NewQuest {
            campaign_id: campaign,
            title: self.title.trim().to_string(),
            description: optional_text(&self.description),
            status: self.status,
        };
        records.create_quest(&payload).await.map(|_| ())
    }

    async fn update(&self, records: &Records, id: QuestId) -> Result<(), ApiError> {
        let patch = QuestPatch {
            title: self.title.trim().to_string(),
            description: optional_text(&self.description),
            status: self.status,
        };
        records.update_quest(id, &patch).await
    }
}

impl FormSession<QuestDraft> {
    /// Deletes after an explicit yes. Deleting the quest under edit also
    /// drops the edit.
    pub async fn delete(
        &mut self,
        records: &Records,
        id: QuestId,
        confirm: &dyn Confirm,
    ) -> Result<DeleteOutcome, ApiError> {
        if !confirm.confirm(DELETE_QUEST_PROMPT) {
            return Ok(DeleteOutcome::Declined);
        }
        records.delete_quest(id).await?;
        info!(quest_id = %id, "form: quest deleted");
        if self.editing == Some(id) {
            self.cancel();
        }
        Ok(DeleteOutcome::Deleted)
    }
}
