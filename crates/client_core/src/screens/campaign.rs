use shared::domain::{Campaign, CampaignId, Character, Location, Quest};
use tracing::warn;

use super::{tolerate, Notice};
use crate::{
    error::FormError,
    forms::{CharacterForm, LocationForm, QuestForm},
    records::Records,
};

pub const NO_CHARACTERS: &str = "Nenhum personagem.";
pub const NO_LOCATIONS: &str = "Nenhum local.";

/// One campaign with its three child collections and quick-add forms.
#[derive(Debug, Clone)]
pub struct CampaignScreen {
    campaign_id: CampaignId,
    campaign: Option<Campaign>,
    characters: Vec<Character>,
    quests: Vec<Quest>,
    locations: Vec<Location>,
    character_form: CharacterForm,
    location_form: LocationForm,
    quest_form: QuestForm,
    notice: Option<Notice>,
}

impl CampaignScreen {
    pub async fn load(records: &Records, campaign_id: CampaignId) -> Self {
        let campaign = match records.get_campaign(campaign_id).await {
            Ok(campaign) => Some(campaign),
            Err(err) => {
                warn!(%campaign_id, "screen: campaign load failed: {err}");
                None
            }
        };
        let mut screen = Self {
            campaign_id,
            campaign,
            characters: Vec::new(),
            quests: Vec::new(),
            locations: Vec::new(),
            character_form: CharacterForm::new(campaign_id),
            location_form: LocationForm::new(campaign_id),
            quest_form: QuestForm::new(campaign_id),
            notice: None,
        };
        screen.reload_characters(records).await;
        screen.reload_quests(records).await;
        screen.reload_locations(records).await;
        screen
    }

    pub fn campaign_id(&self) -> CampaignId {
        self.campaign_id
    }

    pub fn campaign(&self) -> Option<&Campaign> {
        self.campaign.as_ref()
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn quests(&self) -> &[Quest] {
        &self.quests
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn character_form(&self) -> &CharacterForm {
        &self.character_form
    }

    pub fn character_form_mut(&mut self) -> &mut CharacterForm {
        &mut self.character_form
    }

    pub fn location_form(&self) -> &LocationForm {
        &self.location_form
    }

    pub fn location_form_mut(&mut self) -> &mut LocationForm {
        &mut self.location_form
    }

    pub fn quest_form(&self) -> &QuestForm {
        &self.quest_form
    }

    pub fn quest_form_mut(&mut self) -> &mut QuestForm {
        &mut self.quest_form
    }

    pub async fn add_character(&mut self, records: &Records) -> Result<(), FormError> {
        let result = self.character_form.submit(records).await;
        self.settle(result.map(|_| ()))?;
        self.reload_characters(records).await;
        Ok(())
    }

    pub async fn add_location(&mut self, records: &Records) -> Result<(), FormError> {
        let result = self.location_form.submit(records).await;
        self.settle(result.map(|_| ()))?;
        self.reload_locations(records).await;
        Ok(())
    }

    pub async fn add_quest(&mut self, records: &Records) -> Result<(), FormError> {
        let result = self.quest_form.submit(records).await;
        self.settle(result.map(|_| ()))?;
        self.reload_quests(records).await;
        Ok(())
    }

    async fn reload_characters(&mut self, records: &Records) {
        self.characters = tolerate("characters", records.list_characters(self.campaign_id).await);
    }

    async fn reload_quests(&mut self, records: &Records) {
        self.quests = tolerate("quests", records.list_quests(self.campaign_id).await);
    }

    async fn reload_locations(&mut self, records: &Records) {
        self.locations = tolerate("locations", records.list_locations(self.campaign_id).await);
    }

    fn settle(&mut self, result: Result<(), FormError>) -> Result<(), FormError> {
        self.notice = result
            .as_ref()
            .err()
            .map(|err| Notice::error(err.to_string()));
        result
    }
}
