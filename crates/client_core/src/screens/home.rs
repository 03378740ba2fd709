use shared::{domain::Campaign, error::ApiError};
use tracing::info;

use super::{tolerate, Notice};
use crate::{
    error::FormError,
    forms::{CampaignDraft, CampaignForm, PendingSubmit, Submitted},
    records::Records,
};

pub const NO_CAMPAIGNS: &str = "Nenhuma campanha encontrada.";
pub const CREATING_LABEL: &str = "Criando...";
const CREATE_LABEL: &str = "Criar campanha";

#[derive(Debug, Clone)]
pub struct HomeScreen {
    campaigns: Vec<Campaign>,
    form: CampaignForm,
    notice: Option<Notice>,
}

impl HomeScreen {
    pub async fn load(records: &Records) -> Self {
        let mut screen = Self {
            campaigns: Vec::new(),
            form: CampaignForm::new(()),
            notice: None,
        };
        screen.reload(records).await;
        screen
    }

    pub async fn reload(&mut self, records: &Records) {
        self.campaigns = tolerate("campaigns", records.list_campaigns().await);
    }

    pub fn campaigns(&self) -> &[Campaign] {
        &self.campaigns
    }

    pub fn form(&self) -> &CampaignForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut CampaignForm {
        &mut self.form
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn submit_label(&self) -> &'static str {
        if self.form.is_busy() {
            CREATING_LABEL
        } else {
            CREATE_LABEL
        }
    }

    /// Creates (or updates, when editing) the drafted campaign and reloads the
    /// list so the new row shows up last.
    pub async fn create_campaign(&mut self, records: &Records) -> Result<Submitted, FormError> {
        let pending = self.begin_create()?;
        let result = pending.run(records).await;
        self.finish_create(records, result).await
    }

    /// Raises the busy flag; [`Self::submit_label`] reads "Criando..." until
    /// [`Self::finish_create`] is called.
    pub fn begin_create(&mut self) -> Result<PendingSubmit<CampaignDraft>, FormError> {
        self.form.begin_submit().map_err(|err| {
            self.notice = Some(Notice::error(err.to_string()));
            FormError::from(err)
        })
    }

    pub async fn finish_create(
        &mut self,
        records: &Records,
        result: Result<Submitted, ApiError>,
    ) -> Result<Submitted, FormError> {
        match self.form.finish_submit(result) {
            Ok(submitted) => {
                info!(?submitted, "home: campaign saved");
                self.notice = None;
                self.reload(records).await;
                Ok(submitted)
            }
            Err(err) => {
                self.notice = Some(Notice::error(err.to_string()));
                Err(err)
            }
        }
    }
}
