//! crates/literary_oracle_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! The serialized field names follow the wire contract of the recommendation model,
//! so these structs double as the parse target for its JSON output.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Display name used when the identity provider has none on record.
pub const DEFAULT_DISPLAY_NAME: &str = "Traveler of the Realm";

/// Upper bound on the number of genres a reader may pick.
pub const MAX_GENRES: usize = 5;

//=========================================================================================
// Preference Model
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReadingSpeed {
    Slow,
    #[default]
    Moderate,
    Fast,
}

impl ReadingSpeed {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingSpeed::Slow => "Slow",
            ReadingSpeed::Moderate => "Moderate",
            ReadingSpeed::Fast => "Fast",
        }
    }
}

impl fmt::Display for ReadingSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The reading preferences a user submits once per recommendation cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub favorite_book: String,
    pub preferred_genres: Vec<String>,
    pub reading_speed: ReadingSpeed,
    pub current_mood: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PreferenceError {
    #[error("a favorite book is required")]
    MissingFavoriteBook,
    #[error("at least one genre must be selected")]
    NoGenres,
    #[error("no more than 5 genres may be selected, got {0}")]
    TooManyGenres(usize),
    #[error("a current mood is required")]
    MissingMood,
}

impl Preferences {
    /// Checks the submission invariant. A preference set that fails here must never
    /// reach the recommendation model.
    pub fn validate(&self) -> Result<(), PreferenceError> {
        if self.favorite_book.trim().is_empty() {
            return Err(PreferenceError::MissingFavoriteBook);
        }
        if self.preferred_genres.is_empty() {
            return Err(PreferenceError::NoGenres);
        }
        if self.preferred_genres.len() > MAX_GENRES {
            return Err(PreferenceError::TooManyGenres(self.preferred_genres.len()));
        }
        if self.current_mood.trim().is_empty() {
            return Err(PreferenceError::MissingMood);
        }
        Ok(())
    }
}

//=========================================================================================
// Oracle Result
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatSuggestion {
    Audiobook,
    Novel,
    #[serde(rename = "E-Book")]
    EBook,
}

impl FormatSuggestion {
    pub const ALL: [FormatSuggestion; 3] = [
        FormatSuggestion::Audiobook,
        FormatSuggestion::Novel,
        FormatSuggestion::EBook,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormatSuggestion::Audiobook => "Audiobook",
            FormatSuggestion::Novel => "Novel",
            FormatSuggestion::EBook => "E-Book",
        }
    }
}

/// A single recommended book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookRecommendation {
    pub title: String,
    pub author: String,
    pub summary: String,
    pub match_reason: String,
    pub difficulty: Difficulty,
    pub format_suggestion: FormatSuggestion,
}

/// The full answer of the Oracle for one preference submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleResult {
    pub recommendations: Vec<BookRecommendation>,
    pub motivational_message: String,
}

impl OracleResult {
    /// The exact number of entries a result must carry.
    pub const RECOMMENDATION_COUNT: usize = 5;
}

//=========================================================================================
// Library Lookup
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A library the grounding tool pointed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryLocation {
    pub name: String,
    pub uri: String,
}

/// A complete `uri` + `title` pair carried by a grounding chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroundingReference {
    pub uri: String,
    pub title: String,
}

/// One reference record returned alongside a grounded answer.
///
/// Provider payloads are classified into these cases once, at the adapter boundary,
/// so extraction never has to inspect optional fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroundingChunk {
    Map(GroundingReference),
    Web(GroundingReference),
    Other,
}

//=========================================================================================
// Session Identity
//=========================================================================================

/// Authorization claim carried on the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Reader,
    /// May view the registry of members.
    Archivist,
}

/// The signed-in user as mirrored from the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub uid: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl SessionIdentity {
    /// Builds the local mirror from what the provider reports, applying the
    /// display-name and email fallbacks.
    pub fn from_provider(
        uid: Uuid,
        display_name: Option<&str>,
        email: Option<&str>,
        role: Role,
    ) -> Self {
        let name = display_name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_DISPLAY_NAME)
            .to_string();
        Self {
            uid,
            name,
            email: email.unwrap_or_default().to_string(),
            role,
        }
    }

    pub fn is_archivist(&self) -> bool {
        self.role == Role::Archivist
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs() -> Preferences {
        Preferences {
            favorite_book: "Dune".to_string(),
            preferred_genres: vec!["Legends".to_string()],
            reading_speed: ReadingSpeed::Slow,
            current_mood: "Weary".to_string(),
            age_group: None,
        }
    }

    #[test]
    fn valid_preferences_pass() {
        assert_eq!(prefs().validate(), Ok(()));
    }

    #[test]
    fn blank_favorite_book_is_rejected() {
        let p = Preferences {
            favorite_book: "   ".to_string(),
            ..prefs()
        };
        assert_eq!(p.validate(), Err(PreferenceError::MissingFavoriteBook));
    }

    #[test]
    fn genre_bounds_are_enforced() {
        let none = Preferences {
            preferred_genres: vec![],
            ..prefs()
        };
        assert_eq!(none.validate(), Err(PreferenceError::NoGenres));

        let six = Preferences {
            preferred_genres: (0..6).map(|i| format!("g{i}")).collect(),
            ..prefs()
        };
        assert_eq!(six.validate(), Err(PreferenceError::TooManyGenres(6)));
    }

    #[test]
    fn missing_mood_is_rejected() {
        let p = Preferences {
            current_mood: String::new(),
            ..prefs()
        };
        assert_eq!(p.validate(), Err(PreferenceError::MissingMood));
    }

    #[test]
    fn format_suggestion_uses_hyphenated_ebook() {
        let json = serde_json::to_string(&FormatSuggestion::EBook).unwrap();
        assert_eq!(json, "\"E-Book\"");
        let parsed: FormatSuggestion = serde_json::from_str("\"E-Book\"").unwrap();
        assert_eq!(parsed, FormatSuggestion::EBook);
    }

    #[test]
    fn identity_falls_back_to_defaults() {
        let id = SessionIdentity::from_provider(Uuid::nil(), None, None, Role::Reader);
        assert_eq!(id.name, DEFAULT_DISPLAY_NAME);
        assert_eq!(id.email, "");
        assert!(!id.is_archivist());

        let blank =
            SessionIdentity::from_provider(Uuid::nil(), Some("  "), Some("a@b.c"), Role::Archivist);
        assert_eq!(blank.name, DEFAULT_DISPLAY_NAME);
        assert!(blank.is_archivist());
    }
}
