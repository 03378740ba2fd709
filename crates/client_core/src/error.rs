use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

/// Required-field and list-index failures. Always reported inline and never
/// sent to the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Nome da campanha é obrigatório")]
    CampaignNameRequired,
    #[error("Nome do personagem é obrigatório")]
    CharacterNameRequired,
    #[error("Título da missão é obrigatório")]
    QuestTitleRequired,
    #[error("Nome do local é obrigatório")]
    LocationNameRequired,
    #[error("Nome do item é obrigatório")]
    ItemNameRequired,
    #[error("Item {index} não existe no inventário")]
    ItemIndexOutOfRange { index: usize },
}

/// Rejected single-field edit. The draft keeps its prior value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Campo desconhecido: {0}")]
    UnknownField(String),
    #[error("Atributo desconhecido: {0}")]
    UnknownAttribute(String),
    #[error("{field}: '{value}' não é um número inteiro")]
    NotANumber { field: &'static str, value: String },
    #[error("{field} deve ser no mínimo 1")]
    BelowMinimum { field: &'static str, value: i64 },
    #[error("Status inválido: {0}")]
    UnknownStatus(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Remote(#[from] ApiError),
}

impl FormError {
    pub fn code(&self) -> ErrorCode {
        match self {
            FormError::Validation(_) => ErrorCode::Validation,
            FormError::Remote(err) => err.code,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, FormError::Validation(_))
    }
}
