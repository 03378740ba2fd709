//! The signed-in view hierarchy.
//!
//! `Home > Campaign > {CharacterDetail | QuestList}`. [`ViewStack`] is the
//! pure state machine; [`Navigator`] pairs it with the loaded [`Screen`] for
//! the active view.

use shared::domain::{CampaignId, CharacterId};
use thiserror::Error;
use tracing::{debug, info};

use crate::{records::Records, screens::Screen};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Campaign {
        campaign_id: CampaignId,
    },
    CharacterDetail {
        campaign_id: CampaignId,
        character_id: CharacterId,
    },
    QuestList {
        campaign_id: CampaignId,
    },
}

impl View {
    /// One level up; `None` at Home.
    pub fn parent(self) -> Option<View> {
        match self {
            View::Home => None,
            View::Campaign { .. } => Some(View::Home),
            View::CharacterDetail { campaign_id, .. } | View::QuestList { campaign_id } => {
                Some(View::Campaign { campaign_id })
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            View::Home => "home",
            View::Campaign { .. } => "campaign",
            View::CharacterDetail { .. } => "character",
            View::QuestList { .. } => "quests",
        }
    }

    pub fn campaign_id(self) -> Option<CampaignId> {
        match self {
            View::Home => None,
            View::Campaign { campaign_id }
            | View::CharacterDetail { campaign_id, .. }
            | View::QuestList { campaign_id } => Some(campaign_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavigationError {
    #[error("cannot open {target} from {}", .from.name())]
    Unreachable { from: View, target: &'static str },
}

/// Identifies the view a load was started for. Only a ticket whose epoch is
/// still current may install its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub view: View,
    pub epoch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewStack {
    view: View,
    epoch: u64,
}

impl Default for ViewStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewStack {
    pub fn new() -> Self {
        Self {
            view: View::Home,
            epoch: 0,
        }
    }

    pub fn current(&self) -> View {
        self.view
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn ticket(&self) -> LoadTicket {
        LoadTicket {
            view: self.view,
            epoch: self.epoch,
        }
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.epoch == self.epoch && ticket.view == self.view
    }

    pub fn enter_home(&mut self) -> LoadTicket {
        self.go(View::Home)
    }

    pub fn enter_campaign(&mut self, campaign_id: CampaignId) -> Result<LoadTicket, NavigationError> {
        match self.view {
            View::Home => Ok(self.go(View::Campaign { campaign_id })),
            from => Err(NavigationError::Unreachable {
                from,
                target: "campaign",
            }),
        }
    }

    pub fn enter_character(
        &mut self,
        character_id: CharacterId,
    ) -> Result<LoadTicket, NavigationError> {
        match self.view {
            View::Campaign { campaign_id } => Ok(self.go(View::CharacterDetail {
                campaign_id,
                character_id,
            })),
            from => Err(NavigationError::Unreachable {
                from,
                target: "character",
            }),
        }
    }

    pub fn enter_quest_list(&mut self) -> Result<LoadTicket, NavigationError> {
        match self.view {
            View::Campaign { campaign_id } => Ok(self.go(View::QuestList { campaign_id })),
            from => Err(NavigationError::Unreachable {
                from,
                target: "quests",
            }),
        }
    }

    /// `None` (and no epoch bump) at Home.
    pub fn exit(&mut self) -> Option<LoadTicket> {
        let parent = self.view.parent()?;
        Some(self.go(parent))
    }

    /// New ticket for the current view, invalidating loads already running.
    pub fn reload(&mut self) -> LoadTicket {
        self.go(self.view)
    }

    fn go(&mut self, view: View) -> LoadTicket {
        self.view = view;
        self.epoch += 1;
        self.ticket()
    }
}

pub struct Navigator {
    stack: ViewStack,
    records: Records,
    screen: Screen,
}

impl Navigator {
    /// Opens Home and loads the campaign list.
    pub async fn start(records: Records) -> Self {
        let stack = ViewStack::new();
        let screen = Screen::load(&records, stack.current()).await;
        Self {
            stack,
            records,
            screen,
        }
    }

    pub fn view(&self) -> View {
        self.stack.current()
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen {
        &mut self.screen
    }

    pub fn records(&self) -> &Records {
        &self.records
    }

    /// Borrow the active screen together with the store it operates on.
    pub fn parts_mut(&mut self) -> (&Records, &mut Screen) {
        (&self.records, &mut self.screen)
    }

    pub fn ticket(&self) -> LoadTicket {
        self.stack.ticket()
    }

    pub async fn enter_home(&mut self) {
        let ticket = self.stack.enter_home();
        self.open(ticket).await;
    }

    pub async fn enter_campaign(&mut self, campaign_id: CampaignId) -> Result<(), NavigationError> {
        let ticket = self.stack.enter_campaign(campaign_id)?;
        self.open(ticket).await;
        Ok(())
    }

    pub async fn enter_character(&mut self, character_id: CharacterId) -> Result<(), NavigationError> {
        let ticket = self.stack.enter_character(character_id)?;
        self.open(ticket).await;
        Ok(())
    }

    pub async fn enter_quest_list(&mut self) -> Result<(), NavigationError> {
        let ticket = self.stack.enter_quest_list()?;
        self.open(ticket).await;
        Ok(())
    }

    /// Returns false when already at Home.
    pub async fn exit(&mut self) -> bool {
        match self.stack.exit() {
            Some(ticket) => {
                self.open(ticket).await;
                true
            }
            None => false,
        }
    }

    /// Reloads the active screen from the store.
    pub async fn refresh(&mut self) {
        let ticket = self.stack.reload();
        self.open(ticket).await;
    }

    /// Applies a screen loaded for `ticket`. Results for a view that has since
    /// been left are dropped.
    pub fn install(&mut self, ticket: LoadTicket, screen: Screen) -> bool {
        if !self.stack.is_current(ticket) {
            debug!(
                view = ticket.view.name(),
                epoch = ticket.epoch,
                current = self.stack.epoch(),
                "nav: discarding stale load"
            );
            return false;
        }
        self.screen = screen;
        true
    }

    async fn open(&mut self, ticket: LoadTicket) {
        info!(view = ticket.view.name(), epoch = ticket.epoch, "nav: entering view");
        let screen = Screen::load(&self.records, ticket.view).await;
        self.install(ticket, screen);
    }
}

#[cfg(test)]
#[path = "tests/navigator_tests.rs"]
mod tests;
