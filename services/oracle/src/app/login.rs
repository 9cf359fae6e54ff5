//! services/oracle/src/app/login.rs
//!
//! The login form: sign-in and sign-up against the identity provider. Failures stay
//! on the form as a message; the view only changes through the session observer.

use literary_oracle_core::{AuthError, IdentityProvider};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    SignIn,
    SignUp,
}

#[derive(Debug, Default)]
pub struct LoginForm {
    mode: AuthMode,
    error: Option<String>,
}

pub struct Credentials<'a> {
    pub email: &'a str,
    pub password: &'a str,
    /// Only read in sign-up mode.
    pub display_name: &'a str,
}

impl LoginForm {
    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Switches to `mode`, clearing any stale error if the mode changed.
    pub fn set_mode(&mut self, mode: AuthMode) {
        if self.mode != mode {
            self.toggle_mode();
        }
    }

    pub fn toggle_mode(&mut self) -> AuthMode {
        self.mode = match self.mode {
            AuthMode::SignIn => AuthMode::SignUp,
            AuthMode::SignUp => AuthMode::SignIn,
        };
        self.error = None;
        self.mode
    }

    /// Submits the form in its current mode. On failure the themed message is kept
    /// on the form and returned.
    pub async fn submit(
        &mut self,
        provider: &dyn IdentityProvider,
        credentials: Credentials<'_>,
    ) -> Result<(), String> {
        self.error = None;
        let outcome = match self.mode {
            AuthMode::SignIn => provider.sign_in(credentials.email, credentials.password).await,
            AuthMode::SignUp if credentials.display_name.trim().is_empty() => {
                Err(AuthError::MissingDisplayName)
            }
            AuthMode::SignUp => {
                provider
                    .sign_up(credentials.email, credentials.password, credentials.display_name)
                    .await
            }
        };

        outcome.map_err(|e| {
            warn!("Authentication rejected: {}", e);
            let message = e.user_message();
            self.error = Some(message.clone());
            message
        })
    }
}
