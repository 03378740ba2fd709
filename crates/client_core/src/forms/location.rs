use std::str::FromStr;

use async_trait::async_trait;
use shared::{
    domain::{CampaignId, Location, LocationId},
    error::ApiError,
    protocol::{LocationPatch, NewLocation},
};

use super::{optional_text, required, Draft, FormSession};
use crate::{
    error::{FieldError, ValidationError},
    records::Records,
};

pub type LocationForm = FormSession<LocationDraft>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationDraft {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationField {
    Name,
    Description,
}

impl FromStr for LocationField {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" | "nome" => Ok(LocationField::Name),
            "description" | "descricao" | "descrição" => Ok(LocationField::Description),
            other => Err(FieldError::UnknownField(other.to_string())),
        }
    }
}

#[async_trait]
impl Draft for LocationDraft {
    type Id = LocationId;
    type Owner = CampaignId;
    type Record = Location;
    type Field = LocationField;

    const KIND: &'static str = "location";

    fn seed(record: &Location) -> (LocationId, Self) {
        (
            record.id,
            Self {
                name: record.name.clone(),
                description: record.description.clone().unwrap_or_default(),
            },
        )
    }

    fn set_field(&mut self, field: LocationField, value: &str) -> Result<(), FieldError> {
        match field {
            LocationField::Name => self.name = value.to_string(),
            LocationField::Description => self.description = value.to_string(),
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        required(&self.name, ValidationError::LocationNameRequired)
    }

    async fn create(&self, records: &Records, campaign: CampaignId) -> Result<(), ApiError> {
        let payload = NewLocation {
            campaign_id: campaign,
            name: self.name.trim().to_string(),
            description: optional_text(&self.description),
        };
        records.create_location(&payload).await.map(|_| ())
    }

    async fn update(&self, records: &Records, id: LocationId) -> Result<(), ApiError> {
        let patch = LocationPatch {
            name: self.name.trim().to_string(),
            description: optional_text(&self.description),
        };
        records.update_location(id, &patch).await
    }
}
