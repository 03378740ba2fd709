use std::str::FromStr;

use async_trait::async_trait;
use shared::{
    domain::{Campaign, CampaignId},
    error::ApiError,
    protocol::{CampaignPatch, NewCampaign},
};

use super::{optional_text, required, Draft, FormSession};
use crate::{
    error::{FieldError, ValidationError},
    records::Records,
};

pub type CampaignForm = FormSession<CampaignDraft>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CampaignDraft {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignField {
    Name,
    Description,
}

impl FromStr for CampaignField {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" | "nome" => Ok(CampaignField::Name),
            "description" | "descricao" | "descrição" => Ok(CampaignField::Description),
            other => Err(FieldError::UnknownField(other.to_string())),
        }
    }
}

#[async_trait]
impl Draft for CampaignDraft {
    type Id = CampaignId;
    type Owner = ();
    type Record = Campaign;
    type Field = CampaignField;

    const KIND: &'static str = "campaign";

    fn seed(record: &Campaign) -> (CampaignId, Self) {
        (
            record.id,
            Self {
                name: record.name.clone(),
                description: record.description.clone().unwrap_or_default(),
            },
        )
    }

    fn set_field(&mut self, field: CampaignField, value: &str) -> Result<(), FieldError> {
        match field {
            CampaignField::Name => self.name = value.to_string(),
            CampaignField::Description => self.description = value.to_string(),
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ValidationError> {
        required(&self.name, ValidationError::CampaignNameRequired)
    }

    async fn create(&self, records: &Records, _owner: ()) -> Result<(), ApiError> {
        let payload = NewCampaign {
            name: self.name.trim().to_string(),
            description: optional_text(&self.description),
        };
        records.create_campaign(&payload).await.map(|_| ())
    }

    async fn update(&self, records: &Records, id: CampaignId) -> Result<(), ApiError> {
        let patch = CampaignPatch {
            name: self.name.trim().to_string(),
            description: optional_text(&self.description),
        };
        records.update_campaign(id, &patch).await
    }
}
