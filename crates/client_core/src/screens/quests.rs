use shared::{
    domain::{CampaignId, Quest, QuestId},
    error::ApiError,
};
use tracing::warn;

use super::Notice;
use crate::{
    error::FormError,
    forms::{DeleteOutcome, QuestForm, Submitted},
    records::Records,
    Confirm,
};

pub const NO_QUESTS: &str = "Nenhuma missão cadastrada.";

/// The quests of one campaign with a single create/edit form.
#[derive(Debug, Clone)]
pub struct QuestListScreen {
    campaign_id: CampaignId,
    quests: Vec<Quest>,
    form: QuestForm,
    notice: Option<Notice>,
}

impl QuestListScreen {
    pub async fn load(records: &Records, campaign_id: CampaignId) -> Self {
        let mut screen = Self {
            campaign_id,
            quests: Vec::new(),
            form: QuestForm::new(campaign_id),
            notice: None,
        };
        screen.reload(records).await;
        screen
    }

    pub fn campaign_id(&self) -> CampaignId {
        self.campaign_id
    }

    pub fn quests(&self) -> &[Quest] {
        &self.quests
    }

    pub fn form(&self) -> &QuestForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut QuestForm {
        &mut self.form
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Puts the form in edit mode for a listed quest. False if not listed.
    pub fn edit(&mut self, id: QuestId) -> bool {
        match self.quests.iter().find(|quest| quest.id == id) {
            Some(quest) => {
                self.form.load(Some(quest));
                true
            }
            None => false,
        }
    }

    pub fn cancel(&mut self) {
        self.form.cancel();
    }

    pub async fn save(&mut self, records: &Records) -> Result<Submitted, FormError> {
        let editing = self.form.is_editing();
        match self.form.submit(records).await {
            Ok(submitted) => {
                self.notice = None;
                self.reload(records).await;
                Ok(submitted)
            }
            Err(err) => {
                let text = match (&err, editing) {
                    (FormError::Validation(_), _) => err.to_string(),
                    (FormError::Remote(_), true) => format!("Erro ao salvar missão: {err}"),
                    (FormError::Remote(_), false) => format!("Erro ao criar missão: {err}"),
                };
                self.notice = Some(Notice::error(text));
                Err(err)
            }
        }
    }

    pub async fn delete(
        &mut self,
        records: &Records,
        id: QuestId,
        confirm: &dyn Confirm,
    ) -> Result<DeleteOutcome, ApiError> {
        match self.form.delete(records, id, confirm).await {
            Ok(DeleteOutcome::Deleted) => {
                self.notice = None;
                self.reload(records).await;
                Ok(DeleteOutcome::Deleted)
            }
            Ok(DeleteOutcome::Declined) => Ok(DeleteOutcome::Declined),
            Err(err) => {
                self.notice = Some(Notice::error(format!("Erro ao excluir missão: {err}")));
                Err(err)
            }
        }
    }

    async fn reload(&mut self, records: &Records) {
        match records.list_quests(self.campaign_id).await {
            Ok(quests) => self.quests = quests,
            Err(err) => {
                warn!(campaign_id = %self.campaign_id, "quests: load failed: {err}");
                self.notice = Some(Notice::error(format!("Erro ao carregar missões: {err}")));
            }
        }
    }
}
