//! crates/literary_oracle_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the identity provider, the language model vendor and the
//! platform's geolocation capability.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;

use crate::domain::{
    Coordinates, GroundingChunk, LibraryLocation, OracleResult, Preferences, SessionIdentity,
};
use crate::schema::Schema;

//=========================================================================================
// Error Types
//=========================================================================================

/// Errors raised by a `LanguageModel` adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("no API credential is configured")]
    MissingCredential,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("provider error: {0}")]
    Provider(String),
    #[error("operation not supported by this model: {0}")]
    Unsupported(String),
}

pub type ModelResult<T> = Result<T, ModelError>;

/// The errors surfaced by the recommendation and library lookup clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("API key is missing")]
    MissingCredential,
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),
}

impl OracleError {
    /// The message shown on the error view.
    pub fn user_message(&self) -> &'static str {
        match self {
            OracleError::MissingCredential => {
                "API Key is missing. Please check your environment configuration."
            }
            OracleError::MalformedResponse(_) | OracleError::ProviderUnavailable(_) => {
                "The Oracle is currently silent. Please try again later."
            }
        }
    }
}

impl From<ModelError> for OracleError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::MissingCredential => OracleError::MissingCredential,
            other => OracleError::ProviderUnavailable(other.to_string()),
        }
    }
}

/// Identity provider rejections. Shown on the login form only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credential")]
    InvalidCredential,
    #[error("email already in use")]
    EmailAlreadyInUse,
    #[error("weak password")]
    WeakPassword,
    #[error("invalid email")]
    InvalidEmail,
    #[error("missing display name")]
    MissingDisplayName,
    #[error("{0}")]
    Provider(String),
}

impl AuthError {
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidCredential => "Incorrect secret phrase or raven address.".to_string(),
            AuthError::EmailAlreadyInUse => {
                "This raven address is already known to the Citadel.".to_string()
            }
            AuthError::WeakPassword => {
                "Your secret phrase is too weak. Strengthen your defenses.".to_string()
            }
            AuthError::MissingDisplayName => "You must declare your House Name.".to_string(),
            AuthError::InvalidEmail => "That raven address cannot be reached.".to_string(),
            AuthError::Provider(msg) if !msg.trim().is_empty() => msg.clone(),
            AuthError::Provider(_) => "The gates remain closed.".to_string(),
        }
    }
}

/// No coordinates could be obtained. Both cases are handled identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location unavailable")]
    Unavailable,
}

//=========================================================================================
// Language Model Port
//=========================================================================================

/// A structured-output generation request: prompt plus the schema the answer must follow.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredRequest {
    pub prompt: String,
    pub schema: Schema,
}

/// A location-grounded query pinned to coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundedRequest {
    pub query: String,
    pub coordinates: Coordinates,
}

/// The external generative model, reduced to the two calls the application makes.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Returns the raw text produced in JSON output mode.
    async fn generate_structured(&self, request: &StructuredRequest) -> ModelResult<String>;

    /// Returns the grounding chunks attached to the first candidate.
    async fn generate_grounded(&self, request: &GroundedRequest)
        -> ModelResult<Vec<GroundingChunk>>;
}

#[async_trait]
impl LanguageModel for Arc<dyn LanguageModel> {
    async fn generate_structured(&self, request: &StructuredRequest) -> ModelResult<String> {
        (**self).generate_structured(request).await
    }

    async fn generate_grounded(
        &self,
        request: &GroundedRequest,
    ) -> ModelResult<Vec<GroundingChunk>> {
        (**self).generate_grounded(request).await
    }
}

//=========================================================================================
// Application Service Ports
//=========================================================================================

#[async_trait]
pub trait RecommendationService: Send + Sync {
    async fn request_recommendations(&self, prefs: &Preferences)
        -> Result<OracleResult, OracleError>;
}

#[async_trait]
pub trait LibraryLookupService: Send + Sync {
    /// Only `MissingCredential` is ever returned; provider failures yield an empty list.
    async fn find_nearby_libraries(
        &self,
        coordinates: Coordinates,
    ) -> Result<Vec<LibraryLocation>, OracleError>;
}

#[async_trait]
pub trait GeolocationService: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError>;
}

/// A stream of identity events: `Some` when signed in, `None` when signed out.
/// Dropping the stream releases the subscription.
pub type AuthStateStream = Pin<Box<dyn Stream<Item = Option<SessionIdentity>> + Send>>;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<(), AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Subscribes to auth state changes. The current state is delivered first.
    fn on_auth_state_change(&self) -> AuthStateStream;
}
