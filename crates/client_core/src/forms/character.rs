use std::str::FromStr;

use async_trait::async_trait;
use shared::{
    domain::{Attribute, Attributes, CampaignId, Character, CharacterId, Inventory, DEFAULT_LEVEL},
    error::ApiError,
    protocol::{CharacterPatch, NewCharacter},
};

use super::{optional_text, parse_positive, required, Draft, FormSession};
use crate::{
    error::{FieldError, ValidationError},
    records::Records,
};

pub type CharacterForm = FormSession<CharacterDraft>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterDraft {
    pub name: String,
    pub class: String,
    pub level: i32,
    pub attributes: Attributes,
    pub inventory: Inventory,
}

impl Default for CharacterDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            class: String::new(),
            level: DEFAULT_LEVEL,
            attributes: Attributes::default(),
            inventory: Inventory::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterField {
    Name,
    Class,
    Level,
}

impl FromStr for CharacterField {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" | "nome" => Ok(CharacterField::Name),
            "class" | "classe" => Ok(CharacterField::Class),
            "level" | "nivel" | "nível" => Ok(CharacterField::Level),
            other => Err(FieldError::UnknownField(other.to_string())),
        }
    }
}

#[async_trait]
impl Draft for CharacterDraft {
    type Id = CharacterId;
    type Owner = CampaignId;
    type Record = Character;
    type Field = CharacterField;

    const KIND: &'static str = "character";

    fn seed(record: &Character) -> (CharacterId, Self) {
        (
            record.id,
            Self {
                name: record.name.clone(),
                class: record.class.clone().unwrap_or_default(),
                level: record.level,
                attributes: record.attributes,
                inventory: record.inventory.clone(),
            },
        )
    }

    fn set_field(&mut self, field: CharacterField, value: &str) -> Result<(), FieldError> {
        match field {
            CharacterField::Name => self.name = value.to_string(),
            CharacterField::Class => self.class = value.to_string(),
            CharacterField::Level => self.level = parse_positive("level", value)?,
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        required(&self.name, ValidationError::CharacterNameRequired)
    }

    async fn create(&self, records: &Records, campaign: CampaignId) -> Result<(), ApiError> {
        let payload = NewCharacter {
            campaign_id: campaign,
            name: self.name.trim().to_string(),
            class: optional_text(&self.class),
            level: self.level,
            attributes: self.attributes,
            inventory: self.inventory.clone(),
        };
        records.create_character(&payload).await.map(|_| ())
    }

    async fn update(&self, records: &Records, id: CharacterId) -> Result<(), ApiError> {
        let patch = CharacterPatch {
            name: self.name.trim().to_string(),
            class: optional_text(&self.class),
            level: self.level,
            attributes: self.attributes,
            inventory: self.inventory.clone(),
        };
        records.update_character(id, &patch).await
    }
}

impl FormSession<CharacterDraft> {
    /// Replaces one ability score; the other five are carried over unchanged.
    pub fn set_attribute(&mut self, attribute: Attribute, value: &str) -> Result<(), FieldError> {
        let score = parse_positive(attribute.as_str(), value)?;
        self.draft.attributes = self.draft.attributes.with(attribute, score);
        Ok(())
    }

    pub fn set_named_attribute(&mut self, name: &str, value: &str) -> Result<(), FieldError> {
        let attribute = name
            .parse::<Attribute>()
            .map_err(FieldError::UnknownAttribute)?;
        self.set_attribute(attribute, value)
    }

    pub fn add_inventory_item(&mut self, text: &str) -> Result<(), ValidationError> {
        let item = text.trim();
        if item.is_empty() {
            return Err(ValidationError::ItemNameRequired);
        }
        self.draft.inventory = self.draft.inventory.with_item(item);
        Ok(())
    }

    pub fn remove_inventory_item(&mut self, index: usize) -> Result<(), ValidationError> {
        let inventory = self
            .draft
            .inventory
            .without_item(index)
            .ok_or(ValidationError::ItemIndexOutOfRange { index })?;
        self.draft.inventory = inventory;
        Ok(())
    }
}
