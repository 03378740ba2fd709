//! Applies parsed commands to the application root.

use std::fmt;

use client_core::{
    forms::{CampaignField, CharacterField, LocationField, QuestField},
    screens::{AuthMode, HomeScreen, Screen},
    CampaignApp, Confirm, FieldError, NavigationError, Records, RootView, ValidationError,
};
use shared::domain::QuestId;
use thiserror::Error;
use tracing::debug;

use crate::commands::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Rejections that no screen records on its own.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("comando indisponível nesta tela")]
    Unavailable,
    #[error("missão #{0} não está na lista")]
    UnknownQuest(QuestId),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Called with the app while a write is in flight.
pub type Progress = Box<dyn Fn(&CampaignApp)>;

pub struct Shell {
    app: CampaignApp,
    confirm: Box<dyn Confirm>,
    progress: Progress,
}

impl Shell {
    pub fn new(app: CampaignApp, confirm: Box<dyn Confirm>) -> Self {
        Self {
            app,
            confirm,
            progress: Box::new(|_: &CampaignApp| {}),
        }
    }

    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    pub fn app(&self) -> &CampaignApp {
        &self.app
    }

    pub async fn start(&mut self) {
        self.app.start().await;
    }

    pub async fn execute(&mut self, command: Command) -> Result<Flow, ShellError> {
        self.app.keep_session_fresh().await;
        match command {
            Command::Quit => return Ok(Flow::Quit),
            Command::Help => {}
            Command::Login { email, password } => {
                self.authenticate(AuthMode::Login, &email, &password).await?
            }
            Command::Register { email, password } => {
                self.authenticate(AuthMode::Register, &email, &password)
                    .await?
            }
            Command::Logout => {
                if !matches!(self.app.root_view(), RootView::SignedIn(_)) {
                    return Err(ShellError::Unavailable);
                }
                self.app.sign_out().await;
            }
            Command::CreateCampaign { name, description } => {
                self.create_campaign(&name, description.as_deref()).await?
            }
            other => self.navigate_or_apply(other).await?,
        }
        Ok(Flow::Continue)
    }

    async fn authenticate(
        &mut self,
        mode: AuthMode,
        email: &str,
        password: &str,
    ) -> Result<(), ShellError> {
        if self.app.root_view() != RootView::Auth {
            return Err(ShellError::Unavailable);
        }
        if self.app.auth().mode() != mode {
            self.app.auth_mut().toggle_mode();
        }
        report(self.app.submit_auth(email, password).await);
        Ok(())
    }

    async fn navigate_or_apply(&mut self, command: Command) -> Result<(), ShellError> {
        let confirm = self.confirm.as_ref();
        let navigator = self.app.navigator_mut().ok_or(ShellError::Unavailable)?;
        match command {
            Command::Back => {
                navigator.exit().await;
            }
            Command::Refresh => navigator.refresh().await,
            Command::Open(id) => navigator.enter_campaign(id).await?,
            Command::OpenCharacter(id) => navigator.enter_character(id).await?,
            Command::OpenQuests => navigator.enter_quest_list().await?,
            other => {
                let (records, screen) = navigator.parts_mut();
                apply(screen, records, other, confirm).await?;
            }
        }
        Ok(())
    }
}

impl Shell {
    async fn create_campaign(
        &mut self,
        name: &str,
        description: Option<&str>,
    ) -> Result<(), ShellError> {
        let pending = {
            let home = self.home_mut()?;
            let form = home.form_mut();
            form.set_field(CampaignField::Name, name)?;
            form.set_field(CampaignField::Description, description.unwrap_or_default())?;
            match home.begin_create() {
                Ok(pending) => pending,
                Err(err) => {
                    report(Err::<(), _>(err));
                    return Ok(());
                }
            }
        };
        (self.progress)(&self.app);

        let navigator = self.app.navigator_mut().ok_or(ShellError::Unavailable)?;
        let result = pending.run(navigator.records()).await;
        let (records, screen) = navigator.parts_mut();
        match screen {
            Screen::Home(home) => report(home.finish_create(records, result).await),
            _ => return Err(ShellError::Unavailable),
        }
        Ok(())
    }

    fn home_mut(&mut self) -> Result<&mut HomeScreen, ShellError> {
        match self.app.navigator_mut().map(|navigator| navigator.screen_mut()) {
            Some(Screen::Home(home)) => Ok(home),
            _ => Err(ShellError::Unavailable),
        }
    }
}

async fn apply(
    screen: &mut Screen,
    records: &Records,
    command: Command,
    confirm: &dyn Confirm,
) -> Result<(), ShellError> {
    match (screen, command) {
        (Screen::Campaign(campaign), Command::AddCharacter { name, class, level }) => {
            let form = campaign.character_form_mut();
            form.set_field(CharacterField::Name, &name)?;
            form.set_field(CharacterField::Class, class.as_deref().unwrap_or_default())?;
            if let Some(level) = level {
                form.set_field(CharacterField::Level, &level)?;
            }
            report(campaign.add_character(records).await);
        }
        (Screen::Campaign(campaign), Command::AddLocation { name, description }) => {
            let form = campaign.location_form_mut();
            form.set_field(LocationField::Name, &name)?;
            form.set_field(
                LocationField::Description,
                description.as_deref().unwrap_or_default(),
            )?;
            report(campaign.add_location(records).await);
        }
        (Screen::Campaign(campaign), Command::AddQuest { title }) => {
            campaign
                .quest_form_mut()
                .set_field(QuestField::Title, &title)?;
            report(campaign.add_quest(records).await);
        }
        (Screen::Character(character), Command::Set { field, value }) => {
            character.form_mut().set_named_field(&field, &value)?;
        }
        (Screen::Character(character), Command::Attribute { name, value }) => {
            character.form_mut().set_named_attribute(&name, &value)?;
        }
        (Screen::Character(character), Command::AddItem(text)) => {
            character.form_mut().add_inventory_item(&text)?;
        }
        (Screen::Character(character), Command::RemoveItem(index)) => {
            character.form_mut().remove_inventory_item(index)?;
        }
        (Screen::Character(character), Command::Save) => {
            report(character.save(records).await);
        }
        (Screen::Quests(quests), Command::Set { field, value }) => {
            quests.form_mut().set_named_field(&field, &value)?;
        }
        (Screen::Quests(quests), Command::Edit(id)) => {
            if !quests.edit(id) {
                return Err(ShellError::UnknownQuest(id));
            }
        }
        (Screen::Quests(quests), Command::Save) => {
            report(quests.save(records).await);
        }
        (Screen::Quests(quests), Command::Cancel) => quests.cancel(),
        (Screen::Quests(quests), Command::Delete(id)) => {
            report(quests.delete(records, id, confirm).await);
        }
        _ => return Err(ShellError::Unavailable),
    }
    Ok(())
}

/// The screen already shows the outcome; only trace it here.
fn report<T, E: fmt::Display>(result: Result<T, E>) {
    if let Err(err) = result {
        debug!("shell: operation failed: {err}");
    }
}

#[cfg(test)]
#[path = "tests/shell_tests.rs"]
mod tests;
