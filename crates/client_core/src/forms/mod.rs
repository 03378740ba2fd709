//! Form sessions: the editable draft of one record and its save/cancel
//! lifecycle.
//!
//! A [`FormSession`] is in create mode until [`FormSession::load`] seeds it
//! from an existing record, after which a submit updates that record instead
//! of inserting a new one. Every successful submit and every cancel returns
//! the session to a fresh create-mode draft. Entity-specific edits (inventory,
//! attributes, quest deletion) live next to each draft type.

use std::{fmt, str::FromStr};

use async_trait::async_trait;
use shared::error::ApiError;
use tracing::{info, warn};

use crate::{
    error::{FieldError, FormError, ValidationError},
    records::Records,
};

mod campaign;
mod character;
mod location;
mod quest;

pub use campaign::{CampaignDraft, CampaignField, CampaignForm};
pub use character::{CharacterDraft, CharacterField, CharacterForm};
pub use location::{LocationDraft, LocationField, LocationForm};
pub use quest::{DeleteOutcome, QuestDraft, QuestField, QuestForm, DELETE_QUEST_PROMPT};

/// Per-entity draft behaviour plugged into [`FormSession`].
#[async_trait]
pub trait Draft: Clone + Default + fmt::Debug + Send + Sync {
    type Id: Copy + PartialEq + fmt::Debug + Send + Sync;
    /// What a newly created record hangs off (its campaign, or nothing).
    type Owner: Copy + fmt::Debug + Send + Sync;
    type Record;
    type Field: Copy + fmt::Debug + FromStr<Err = FieldError>;

    const KIND: &'static str;

    fn seed(record: &Self::Record) -> (Self::Id, Self);
    fn set_field(&mut self, field: Self::Field, value: &str) -> Result<(), FieldError>;
    fn validate(&self) -> Result<(), ValidationError>;

    async fn create(&self, records: &Records, owner: Self::Owner) -> Result<(), ApiError>;
    async fn update(&self, records: &Records, id: Self::Id) -> Result<(), ApiError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submitted {
    Created,
    Updated,
}

#[derive(Debug, Clone)]
pub struct FormSession<D: Draft> {
    owner: D::Owner,
    draft: D,
    editing: Option<D::Id>,
    busy: bool,
}

impl<D: Draft> FormSession<D> {
    pub fn new(owner: D::Owner) -> Self {
        Self {
            owner,
            draft: D::default(),
            editing: None,
            busy: false,
        }
    }

    /// Seeds the draft from `record` (edit mode) or from defaults.
    pub fn load(&mut self, record: Option<&D::Record>) {
        match record {
            Some(record) => {
                let (id, draft) = D::seed(record);
                self.draft = draft;
                self.editing = Some(id);
            }
            None => self.reset(),
        }
    }

    pub fn draft(&self) -> &D {
        &self.draft
    }

    pub fn editing(&self) -> Option<D::Id> {
        self.editing
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// True while a submit is waiting on the store.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn set_field(&mut self, field: D::Field, value: &str) -> Result<(), FieldError> {
        let mut next = self.draft.clone();
        next.set_field(field, value)?;
        self.draft = next;
        Ok(())
    }

    /// Field addressed by name, as typed in a form input.
    pub fn set_named_field(&mut self, name: &str, value: &str) -> Result<(), FieldError> {
        let field = name.parse::<D::Field>()?;
        self.set_field(field, value)
    }

    pub async fn submit(&mut self, records: &Records) -> Result<Submitted, FormError> {
        let pending = self.begin_submit()?;
        let result = pending.run(records).await;
        self.finish_submit(result)
    }

    /// Validates the draft and raises the busy flag. The returned write owns
    /// a copy of the draft, so the session stays readable while it runs.
    pub fn begin_submit(&mut self) -> Result<PendingSubmit<D>, ValidationError> {
        self.draft.validate()?;
        self.busy = true;
        let target = match self.editing {
            Some(id) => Target::Update(id),
            None => Target::Create(self.owner),
        };
        Ok(PendingSubmit {
            draft: self.draft.clone(),
            target,
        })
    }

    /// Lowers the busy flag and, on success, resets to a create-mode draft.
    pub fn finish_submit(
        &mut self,
        result: Result<Submitted, ApiError>,
    ) -> Result<Submitted, FormError> {
        self.busy = false;
        match result {
            Ok(submitted) => {
                info!(kind = D::KIND, ?submitted, "form: saved");
                self.reset();
                Ok(submitted)
            }
            Err(err) => {
                warn!(kind = D::KIND, code = ?err.code, "form: save failed: {err}");
                Err(err.into())
            }
        }
    }

    pub fn cancel(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.draft = D::default();
        self.editing = None;
    }
}

#[derive(Debug, Clone)]
enum Target<D: Draft> {
    Create(D::Owner),
    Update(D::Id),
}

/// A validated write detached from its [`FormSession`].
#[derive(Debug, Clone)]
pub struct PendingSubmit<D: Draft> {
    draft: D,
    target: Target<D>,
}

impl<D: Draft> PendingSubmit<D> {
    pub async fn run(self, records: &Records) -> Result<Submitted, ApiError> {
        match self.target {
            Target::Update(id) => self
                .draft
                .update(records, id)
                .await
                .map(|()| Submitted::Updated),
            Target::Create(owner) => self
                .draft
                .create(records, owner)
                .await
                .map(|()| Submitted::Created),
        }
    }
}

pub(crate) fn required(value: &str, err: ValidationError) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(err)
    } else {
        Ok(())
    }
}

pub(crate) fn optional_text(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Integer coercion for numeric inputs. Decimal input is truncated; anything
/// else, or a value below 1, is rejected.
pub(crate) fn parse_positive(field: &'static str, value: &str) -> Result<i32, FieldError> {
    let raw = value.trim();
    let parsed = match raw.parse::<i64>() {
        Ok(number) => number,
        Err(_) => match raw.parse::<f64>() {
            Ok(number) if number.is_finite() => number.trunc() as i64,
            _ => {
                return Err(FieldError::NotANumber {
                    field,
                    value: raw.to_string(),
                })
            }
        },
    };
    if parsed < 1 {
        return Err(FieldError::BelowMinimum {
            field,
            value: parsed,
        });
    }
    i32::try_from(parsed).map_err(|_| FieldError::NotANumber {
        field,
        value: raw.to_string(),
    })
}


#[cfg(test)]
#[path = "../tests/forms_tests.rs"]
mod session_tests;
