//! crates/literary_oracle_core/src/state_machine.rs
//!
//! The application state machine: which view the user sees, who they are, and the
//! last Oracle answer. It is mutated only through the event methods below.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{OracleResult, PreferenceError, Preferences, SessionIdentity};
use crate::ports::OracleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppView {
    #[default]
    Login,
    Questionnaire,
    Loading,
    Results,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot {action} while in {from:?}")]
    Refused { action: &'static str, from: AppView },
    #[error("invalid preferences: {0}")]
    InvalidPreferences(#[from] PreferenceError),
}

#[derive(Debug, Default)]
pub struct StateMachine {
    view: AppView,
    identity: Option<SessionIdentity>,
    result: Option<OracleResult>,
    error: Option<String>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppView {
        self.view
    }

    pub fn identity(&self) -> Option<&SessionIdentity> {
        self.identity.as_ref()
    }

    pub fn result(&self) -> Option<&OracleResult> {
        self.result.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Applies an event from the session observer.
    ///
    /// A signed-in event only leaves `Login`; later ones (token refreshes) just
    /// refresh the identity. A signed-out event always returns to `Login`.
    pub fn on_auth_state_changed(&mut self, identity: Option<SessionIdentity>) -> AppView {
        match identity {
            Some(identity) => {
                debug!("Session identity refreshed for {}", identity.email);
                self.identity = Some(identity);
                if self.view == AppView::Login {
                    self.view = AppView::Questionnaire;
                }
            }
            None => {
                info!("Signed out; returning to login.");
                self.identity = None;
                self.result = None;
                self.error = None;
                self.view = AppView::Login;
            }
        }
        self.view
    }

    /// Accepts a questionnaire submission and enters `Loading`.
    pub fn submit(&mut self, prefs: &Preferences) -> Result<(), TransitionError> {
        self.expect(AppView::Questionnaire, "submit preferences")?;
        prefs.validate()?;
        self.error = None;
        self.view = AppView::Loading;
        Ok(())
    }

    /// Applies the outcome of the recommendation request. Outcomes arriving outside
    /// `Loading` are stale (e.g. the user signed out meanwhile) and are refused.
    pub fn on_recommendations(
        &mut self,
        outcome: Result<OracleResult, OracleError>,
    ) -> Result<(), TransitionError> {
        self.expect(AppView::Loading, "accept recommendations")?;
        match outcome {
            Ok(result) => {
                self.result = Some(result);
                self.view = AppView::Results;
            }
            Err(err) => {
                self.error = Some(err.user_message().to_string());
                self.view = AppView::Error;
            }
        }
        Ok(())
    }

    /// "Try again" on the error view.
    pub fn acknowledge_error(&mut self) -> Result<(), TransitionError> {
        self.expect(AppView::Error, "acknowledge error")?;
        self.view = AppView::Questionnaire;
        Ok(())
    }

    /// Starts over from the results view, discarding the stored result.
    pub fn reset(&mut self) -> Result<(), TransitionError> {
        self.expect(AppView::Results, "reset")?;
        self.result = None;
        self.view = AppView::Questionnaire;
        Ok(())
    }

    fn expect(&self, view: AppView, action: &'static str) -> Result<(), TransitionError> {
        if self.view == view {
            Ok(())
        } else {
            Err(TransitionError::Refused {
                action,
                from: self.view,
            })
        }
    }
}
