use shared::error::ApiError;

use super::Notice;
use crate::session::SessionStore;

pub const LOGIN_SUCCEEDED: &str = "Login realizado com sucesso!";
pub const ACCOUNT_CREATED: &str = "Conta criada! Verifique seu e-mail.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

/// Login/register form shown while no account is signed in.
#[derive(Debug, Clone, Default)]
pub struct AuthScreen {
    mode: AuthMode,
    message: Option<Notice>,
}

impl AuthScreen {
    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn message(&self) -> Option<&Notice> {
        self.message.as_ref()
    }

    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        };
        self.message = None;
    }

    /// Logs in or registers depending on the mode. On error the provider's
    /// message is shown and the session is left as it was.
    pub async fn submit(
        &mut self,
        session: &SessionStore,
        email: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        let result = match self.mode {
            AuthMode::Login => session.sign_in(email, password).await.map(|_| LOGIN_SUCCEEDED),
            AuthMode::Register => session.sign_up(email, password).await.map(|_| ACCOUNT_CREATED),
        };
        match result {
            Ok(text) => {
                self.message = Some(Notice::info(text));
                Ok(())
            }
            Err(err) => {
                self.message = Some(Notice::error(err.message.clone()));
                Err(err)
            }
        }
    }
}
