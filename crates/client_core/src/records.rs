//! Typed table access over a [`RecordStore`].

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shared::{
    domain::{
        Campaign, CampaignId, Character, CharacterId, Location, LocationId, Quest, QuestId,
    },
    error::ApiError,
    protocol::{
        CampaignPatch, CharacterPatch, Filter, LocationPatch, NewCampaign, NewCharacter,
        NewLocation, NewQuest, QuestPatch, Table,
    },
};
use tracing::{debug, warn};

use crate::RecordStore;

const CAMPAIGN_FK: &str = "campaign_id";

#[derive(Clone)]
pub struct Records {
    store: Arc<dyn RecordStore>,
}

impl Records {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn list_campaigns(&self) -> Result<Vec<Campaign>, ApiError> {
        self.fetch(Table::Campaigns, Filter::all().order_by("id", true))
            .await
    }

    pub async fn get_campaign(&self, id: CampaignId) -> Result<Campaign, ApiError> {
        self.fetch_one(Table::Campaigns, id.0).await
    }

    pub async fn create_campaign(&self, campaign: &NewCampaign) -> Result<Campaign, ApiError> {
        self.insert(Table::Campaigns, campaign).await
    }

    pub async fn update_campaign(
        &self,
        id: CampaignId,
        patch: &CampaignPatch,
    ) -> Result<(), ApiError> {
        self.update(Table::Campaigns, id.0, patch).await
    }

    pub async fn delete_campaign(&self, id: CampaignId) -> Result<(), ApiError> {
        self.store.delete(Table::Campaigns, id.0).await
    }

    /// Store order; the listing is not sorted client-side.
    pub async fn list_characters(&self, campaign: CampaignId) -> Result<Vec<Character>, ApiError> {
        self.fetch(Table::Characters, Filter::all().eq(CAMPAIGN_FK, campaign.0))
            .await
    }

    pub async fn get_character(&self, id: CharacterId) -> Result<Character, ApiError> {
        self.fetch_one(Table::Characters, id.0).await
    }

    pub async fn create_character(&self, character: &NewCharacter) -> Result<Character, ApiError> {
        self.insert(Table::Characters, character).await
    }

    pub async fn update_character(
        &self,
        id: CharacterId,
        patch: &CharacterPatch,
    ) -> Result<(), ApiError> {
        self.update(Table::Characters, id.0, patch).await
    }

    pub async fn delete_character(&self, id: CharacterId) -> Result<(), ApiError> {
        self.store.delete(Table::Characters, id.0).await
    }

    pub async fn list_quests(&self, campaign: CampaignId) -> Result<Vec<Quest>, ApiError> {
        self.fetch(
            Table::Quests,
            Filter::all()
                .eq(CAMPAIGN_FK, campaign.0)
                .order_by("id", true),
        )
        .await
    }

    pub async fn create_quest(&self, quest: &NewQuest) -> Result<Quest, ApiError> {
        self.insert(Table::Quests, quest).await
    }

    pub async fn update_quest(&self, id: QuestId, patch: &QuestPatch) -> Result<(), ApiError> {
        self.update(Table::Quests, id.0, patch).await
    }

    pub async fn delete_quest(&self, id: QuestId) -> Result<(), ApiError> {
        self.store.delete(Table::Quests, id.0).await
    }

    pub async fn list_locations(&self, campaign: CampaignId) -> Result<Vec<Location>, ApiError> {
        self.fetch(Table::Locations, Filter::all().eq(CAMPAIGN_FK, campaign.0))
            .await
    }

    pub async fn create_location(&self, location: &NewLocation) -> Result<Location, ApiError> {
        self.insert(Table::Locations, location).await
    }

    pub async fn update_location(
        &self,
        id: LocationId,
        patch: &LocationPatch,
    ) -> Result<(), ApiError> {
        self.update(Table::Locations, id.0, patch).await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        table: Table,
        filter: Filter,
    ) -> Result<Vec<T>, ApiError> {
        let rows = self.store.select(table, &filter).await?;
        debug!(table = table.as_str(), rows = rows.len(), "store: rows fetched");
        // One bad row must not hide its siblings.
        Ok(rows
            .into_iter()
            .filter_map(|row| match decode(table, row) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(table = table.as_str(), "store: skipping row: {err}");
                    None
                }
            })
            .collect())
    }

    async fn fetch_one<T: DeserializeOwned>(&self, table: Table, id: i64) -> Result<T, ApiError> {
        let row = self
            .store
            .select(table, &Filter::by_id(id))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::not_found(format!("{} {id} not found", table.as_str())))?;
        decode(table, row)
    }

    async fn insert<P: Serialize, T: DeserializeOwned>(
        &self,
        table: Table,
        payload: &P,
    ) -> Result<T, ApiError> {
        let row = self.store.insert(table, encode(table, payload)?).await?;
        decode(table, row)
    }

    async fn update<P: Serialize>(&self, table: Table, id: i64, patch: &P) -> Result<(), ApiError> {
        self.store.update(table, id, encode(table, patch)?).await
    }
}

fn encode<P: Serialize>(table: Table, payload: &P) -> Result<Value, ApiError> {
    serde_json::to_value(payload).map_err(|err| {
        ApiError::internal(format!("failed to encode {} row: {err}", table.as_str()))
    })
}

fn decode<T: DeserializeOwned>(table: Table, row: Value) -> Result<T, ApiError> {
    serde_json::from_value(row)
        .map_err(|err| ApiError::internal(format!("malformed {} row: {err}", table.as_str())))
}
