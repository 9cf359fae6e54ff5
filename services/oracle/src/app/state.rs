//! services/oracle/src/app/state.rs
//!
//! Defines the application's shared context and the per-session view state that is
//! not part of the core state machine.

use crate::adapters::{
    ConfiguredGeolocation, GeminiConfig, GeminiModel, InMemoryIdentityProvider, OpenAiModel,
};
use crate::config::{Config, OracleProvider};
use crate::error::AppError;
use literary_oracle_core::{
    GeolocationService, IdentityProvider, LanguageModel, LibraryLookupClient,
    LibraryLookupService, RecommendationClient, RecommendationService,
};
use std::sync::Arc;
use uuid::Uuid;

//=========================================================================================
// AppContext (Shared With Every Spawned Task)
//=========================================================================================

/// The collaborators of the runtime, created once at startup.
#[derive(Clone)]
pub struct AppContext {
    pub recommendations: Arc<dyn RecommendationService>,
    pub libraries: Arc<dyn LibraryLookupService>,
    pub identity: Arc<dyn IdentityProvider>,
    pub geolocation: Arc<dyn GeolocationService>,
}

impl AppContext {
    /// Wires the concrete adapters selected by the configuration.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let gemini = GeminiModel::new(GeminiConfig {
            api_key: config.gemini_api_key.clone(),
            structured_model: config.recommendation_model.clone(),
            grounded_model: config.library_model.clone(),
            endpoint: config.gemini_endpoint.clone(),
            timeout: config.request_timeout,
        })?;

        let recommendation_model: Arc<dyn LanguageModel> = match config.provider {
            OracleProvider::Gemini => Arc::new(gemini.clone()),
            OracleProvider::OpenAi => Arc::new(OpenAiModel::new(
                config.openai_api_key.as_deref(),
                config.recommendation_model.clone(),
            )),
        };

        Ok(Self {
            recommendations: Arc::new(
                RecommendationClient::new(recommendation_model)
                    .with_max_attempts(config.max_attempts),
            ),
            libraries: Arc::new(LibraryLookupClient::new(gemini)),
            identity: Arc::new(InMemoryIdentityProvider::new(config.archivists.clone())),
            geolocation: Arc::new(ConfiguredGeolocation::new(config.home_coordinates)),
        })
    }
}

//=========================================================================================
// LibrarySearch (Results View)
//=========================================================================================

/// The "currently searching" gate. At most one lookup is outstanding, and each one
/// carries a ticket so a completion from an abandoned search is never mistaken for
/// the current one, even for the same book.
#[derive(Debug, Default)]
pub struct LibrarySearch {
    current: Option<(Uuid, String)>,
}

impl LibrarySearch {
    /// Claims the gate for `book_title`; `None` if a search is already running.
    pub fn begin(&mut self, book_title: &str) -> Option<Uuid> {
        if self.current.is_some() {
            return None;
        }
        let ticket = Uuid::new_v4();
        self.current = Some((ticket, book_title.to_string()));
        Some(ticket)
    }

    pub fn searching(&self) -> Option<&str> {
        self.current.as_ref().map(|(_, title)| title.as_str())
    }

    pub fn is_current(&self, ticket: Uuid) -> bool {
        matches!(&self.current, Some((current, _)) if *current == ticket)
    }

    pub fn finish(&mut self) {
        self.current = None;
    }
}
