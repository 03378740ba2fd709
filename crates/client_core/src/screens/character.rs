use shared::{
    domain::{CampaignId, Character, CharacterId},
    error::ApiError,
};
use tracing::{info, warn};

use super::Notice;
use crate::{error::FormError, forms::CharacterForm, records::Records};

pub const CHARACTER_SAVED: &str = "Personagem salvo com sucesso!";

#[derive(Debug, Clone)]
pub struct CharacterScreen {
    campaign_id: CampaignId,
    character_id: CharacterId,
    character: Option<Character>,
    form: CharacterForm,
    notice: Option<Notice>,
}

impl CharacterScreen {
    pub async fn load(records: &Records, campaign_id: CampaignId, character_id: CharacterId) -> Self {
        let mut screen = Self {
            campaign_id,
            character_id,
            character: None,
            form: CharacterForm::new(campaign_id),
            notice: None,
        };
        screen.reload(records).await;
        screen
    }

    pub fn campaign_id(&self) -> CampaignId {
        self.campaign_id
    }

    pub fn character_id(&self) -> CharacterId {
        self.character_id
    }

    pub fn character(&self) -> Option<&Character> {
        self.character.as_ref()
    }

    pub fn form(&self) -> &CharacterForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut CharacterForm {
        &mut self.form
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Writes the form back to the character row, then re-seeds the form from
    /// the stored row.
    pub async fn save(&mut self, records: &Records) -> Result<(), FormError> {
        if self.character.is_none() {
            let err = FormError::from(ApiError::not_found(format!(
                "character {} not loaded",
                self.character_id
            )));
            self.notice = Some(Notice::error(format!("Erro ao salvar: {err}")));
            return Err(err);
        }

        match self.form.submit(records).await {
            Ok(_) => {
                info!(character_id = %self.character_id, "character: saved");
                self.reload(records).await;
                if self.character.is_some() {
                    self.notice = Some(Notice::info(CHARACTER_SAVED));
                }
                Ok(())
            }
            Err(err) => {
                let text = if err.is_validation() {
                    err.to_string()
                } else {
                    format!("Erro ao salvar: {err}")
                };
                self.notice = Some(Notice::error(text));
                Err(err)
            }
        }
    }

    async fn reload(&mut self, records: &Records) {
        match records.get_character(self.character_id).await {
            Ok(character) => {
                self.form.load(Some(&character));
                self.character = Some(character);
            }
            Err(err) => {
                warn!(character_id = %self.character_id, "character: load failed: {err}");
                // Keep the form in edit mode against the last row we saw.
                if let Some(previous) = &self.character {
                    self.form.load(Some(previous));
                }
                self.notice = Some(Notice::error(format!(
                    "Erro ao carregar personagem: {err}"
                )));
            }
        }
    }
}
