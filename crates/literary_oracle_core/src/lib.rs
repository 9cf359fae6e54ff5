pub mod domain;
pub mod oracle;
pub mod ports;
pub mod prompt;
pub mod schema;
pub mod state_machine;
pub mod vocabulary;

pub use domain::{
    BookRecommendation, Coordinates, Difficulty, FormatSuggestion, GroundingChunk,
    GroundingReference, LibraryLocation, OracleResult, PreferenceError, Preferences,
    ReadingSpeed, Role, SessionIdentity,
};
pub use oracle::{LibraryLookupClient, RecommendationClient};
pub use ports::{
    AuthError, AuthStateStream, GeolocationError, GeolocationService, IdentityProvider,
    LanguageModel, LibraryLookupService, ModelError, ModelResult, OracleError,
    RecommendationService,
};
pub use state_machine::{AppView, StateMachine, TransitionError};
