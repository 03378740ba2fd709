//! Loaded state for each signed-in view, plus the unauthenticated auth form.
//!
//! Loading a screen never fails: collection errors are either tolerated
//! (logged, empty fallback) or turned into an on-screen [`Notice`].

use std::fmt;

use shared::error::ApiError;
use tracing::warn;

use crate::{navigator::View, records::Records};

mod auth;
mod campaign;
mod character;
mod home;
mod quests;

pub use auth::{AuthMode, AuthScreen, ACCOUNT_CREATED, LOGIN_SUCCEEDED};
pub use campaign::{CampaignScreen, NO_CHARACTERS, NO_LOCATIONS};
pub use character::{CharacterScreen, CHARACTER_SAVED};
pub use home::{HomeScreen, CREATING_LABEL, NO_CAMPAIGNS};
pub use quests::{QuestListScreen, NO_QUESTS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// One-line status message shown above a screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone)]
pub enum Screen {
    Home(HomeScreen),
    Campaign(CampaignScreen),
    Character(CharacterScreen),
    Quests(QuestListScreen),
}

impl Screen {
    pub async fn load(records: &Records, view: View) -> Self {
        match view {
            View::Home => Screen::Home(HomeScreen::load(records).await),
            View::Campaign { campaign_id } => {
                Screen::Campaign(CampaignScreen::load(records, campaign_id).await)
            }
            View::CharacterDetail {
                campaign_id,
                character_id,
            } => Screen::Character(CharacterScreen::load(records, campaign_id, character_id).await),
            View::QuestList { campaign_id } => {
                Screen::Quests(QuestListScreen::load(records, campaign_id).await)
            }
        }
    }

    pub fn view(&self) -> View {
        match self {
            Screen::Home(_) => View::Home,
            Screen::Campaign(screen) => View::Campaign {
                campaign_id: screen.campaign_id(),
            },
            Screen::Character(screen) => View::CharacterDetail {
                campaign_id: screen.campaign_id(),
                character_id: screen.character_id(),
            },
            Screen::Quests(screen) => View::QuestList {
                campaign_id: screen.campaign_id(),
            },
        }
    }
}

/// Empty fallback for a collection whose load failed.
pub(crate) fn tolerate<T>(what: &'static str, result: Result<Vec<T>, ApiError>) -> Vec<T> {
    result.unwrap_or_else(|err| {
        warn!(collection = what, code = ?err.code, "screen: load failed: {err}");
        Vec::new()
    })
}

#[cfg(test)]
#[path = "../tests/screens_tests.rs"]
mod tests;
