//! crates/literary_oracle_core/src/oracle.rs
//!
//! The recommendation and library lookup clients. Both are generic over the
//! `LanguageModel` port; the vendor specifics live in the service's adapters.

use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

use crate::domain::{
    Coordinates, GroundingChunk, LibraryLocation, OracleResult, Preferences,
};
use crate::ports::{
    GroundedRequest, LanguageModel, LibraryLookupService, ModelError, OracleError,
    RecommendationService,
};
use crate::prompt::{build_recommendation_request, LIBRARY_QUERY};

//=========================================================================================
// Response Parsing
//=========================================================================================

/// Parses and validates the raw model output. Anything short of a complete,
/// well-formed result is rejected whole.
pub fn parse_oracle_response(text: &str) -> Result<OracleResult, OracleError> {
    if text.trim().is_empty() {
        return Err(OracleError::MalformedResponse(
            "received empty response from the Oracle".to_string(),
        ));
    }

    let result: OracleResult = serde_json::from_str(text)
        .map_err(|e| OracleError::MalformedResponse(e.to_string()))?;

    if result.recommendations.len() != OracleResult::RECOMMENDATION_COUNT {
        return Err(OracleError::MalformedResponse(format!(
            "expected {} recommendations, got {}",
            OracleResult::RECOMMENDATION_COUNT,
            result.recommendations.len()
        )));
    }

    for (index, book) in result.recommendations.iter().enumerate() {
        let fields = [
            ("title", &book.title),
            ("author", &book.author),
            ("summary", &book.summary),
            ("matchReason", &book.match_reason),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(OracleError::MalformedResponse(format!(
                "recommendation {} has an empty {}",
                index + 1,
                name
            )));
        }
    }

    if result.motivational_message.trim().is_empty() {
        return Err(OracleError::MalformedResponse(
            "motivationalMessage is empty".to_string(),
        ));
    }

    Ok(result)
}

/// Turns grounding chunks into library locations: map references first-class, web
/// references as fallback, everything else skipped. Deduplicated by `uri`, first wins.
pub fn extract_libraries(chunks: &[GroundingChunk]) -> Vec<LibraryLocation> {
    let mut seen = HashSet::new();
    let mut libraries = Vec::new();

    for chunk in chunks {
        let reference = match chunk {
            GroundingChunk::Map(reference) | GroundingChunk::Web(reference) => reference,
            GroundingChunk::Other => continue,
        };
        if seen.insert(reference.uri.clone()) {
            libraries.push(LibraryLocation {
                name: reference.title.clone(),
                uri: reference.uri.clone(),
            });
        }
    }

    libraries
}

//=========================================================================================
// Recommendation Client
//=========================================================================================

/// Sends a preference set to the model and returns a validated `OracleResult`.
pub struct RecommendationClient<M: LanguageModel> {
    model: M,
    max_attempts: u32,
}

impl<M: LanguageModel> RecommendationClient<M> {
    /// A client that makes exactly one attempt per request.
    pub fn new(model: M) -> Self {
        Self {
            model,
            max_attempts: 1,
        }
    }

    /// Allows up to `max_attempts` tries, retrying only provider/transport failures.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }
}

#[async_trait]
impl<M: LanguageModel> RecommendationService for RecommendationClient<M> {
    async fn request_recommendations(
        &self,
        prefs: &Preferences,
    ) -> Result<OracleResult, OracleError> {
        let request = build_recommendation_request(prefs)
            .map_err(|e| {
                OracleError::MalformedResponse(format!("unsubmittable preferences: {e}"))
            })?;
        debug!("Recommendation prompt:\n{}", request.prompt);

        let mut attempt = 1;
        let text = loop {
            match self.model.generate_structured(&request).await {
                Ok(text) => break text,
                Err(ModelError::MissingCredential) => return Err(OracleError::MissingCredential),
                Err(e) if attempt < self.max_attempts => {
                    warn!(attempt, "Recommendation request failed, retrying: {}", e);
                    attempt += 1;
                }
                Err(e) => {
                    error!("Recommendation request failed: {}", e);
                    return Err(e.into());
                }
            }
        };
        debug!("Raw Oracle response:\n{}", text);

        let result = parse_oracle_response(&text).map_err(|e| {
            error!("Rejected Oracle response: {}", e);
            e
        })?;
        info!(
            "Oracle returned {} recommendations for '{}'",
            result.recommendations.len(),
            prefs.favorite_book
        );
        Ok(result)
    }
}

//=========================================================================================
// Library Lookup Client
//=========================================================================================

/// Asks the model for nearby libraries using its maps grounding tool.
pub struct LibraryLookupClient<M: LanguageModel> {
    model: M,
}

impl<M: LanguageModel> LibraryLookupClient<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }
}

#[async_trait]
impl<M: LanguageModel> LibraryLookupService for LibraryLookupClient<M> {
    async fn find_nearby_libraries(
        &self,
        coordinates: Coordinates,
    ) -> Result<Vec<LibraryLocation>, OracleError> {
        let request = GroundedRequest {
            query: LIBRARY_QUERY.to_string(),
            coordinates,
        };

        match self.model.generate_grounded(&request).await {
            Ok(chunks) => {
                let libraries = extract_libraries(&chunks);
                info!(
                    "Library search found {} locations from {} grounding chunks",
                    libraries.len(),
                    chunks.len()
                );
                Ok(libraries)
            }
            Err(ModelError::MissingCredential) => Err(OracleError::MissingCredential),
            Err(e) => {
                warn!("Library search failed: {}", e);
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Difficulty, FormatSuggestion, GroundingReference, ReadingSpeed};
    use crate::ports::{ModelResult, StructuredRequest};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct MockModel {
        structured: Mutex<Vec<ModelResult<String>>>,
        grounded: ModelResult<Vec<GroundingChunk>>,
        calls: AtomicU32,
    }

    impl MockModel {
        fn answering(responses: Vec<ModelResult<String>>) -> Self {
            Self {
                structured: Mutex::new(responses),
                grounded: Ok(Vec::new()),
                calls: AtomicU32::new(0),
            }
        }

        fn grounding(grounded: ModelResult<Vec<GroundingChunk>>) -> Self {
            Self {
                structured: Mutex::new(Vec::new()),
                grounded,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for MockModel {
        async fn generate_structured(&self, _request: &StructuredRequest) -> ModelResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.structured.lock().unwrap().remove(0)
        }

        async fn generate_grounded(
            &self,
            _request: &GroundedRequest,
        ) -> ModelResult<Vec<GroundingChunk>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.grounded.clone()
        }
    }

    fn entry(title: &str) -> Value {
        json!({
            "title": title,
            "author": "George R. R. Martin",
            "summary": "Kings and queens.",
            "matchReason": "You like intrigue.",
            "difficulty": "Intermediate",
            "formatSuggestion": "E-Book",
        })
    }

    fn response_with(entries: Vec<Value>) -> String {
        json!({ "recommendations": entries, "motivationalMessage": "Read on." }).to_string()
    }

    fn five() -> Vec<Value> {
        (1..=5).map(|i| entry(&format!("Book {i}"))).collect()
    }

    fn prefs() -> Preferences {
        Preferences {
            favorite_book: "A Game of Thrones".to_string(),
            preferred_genres: vec!["Epic Fantasy".to_string()],
            reading_speed: ReadingSpeed::Fast,
            current_mood: "Ambitious".to_string(),
            age_group: None,
        }
    }

    fn chunk_map(uri: &str, title: &str) -> GroundingChunk {
        GroundingChunk::Map(GroundingReference {
            uri: uri.to_string(),
            title: title.to_string(),
        })
    }

    fn chunk_web(uri: &str, title: &str) -> GroundingChunk {
        GroundingChunk::Web(GroundingReference {
            uri: uri.to_string(),
            title: title.to_string(),
        })
    }

    #[test]
    fn well_formed_response_round_trips() {
        let result = parse_oracle_response(&response_with(five())).unwrap();
        assert_eq!(result.recommendations.len(), 5);
        assert_eq!(result.recommendations[0].title, "Book 1");
        assert_eq!(result.recommendations[4].difficulty, Difficulty::Intermediate);
        assert_eq!(result.recommendations[4].format_suggestion, FormatSuggestion::EBook);
        assert_eq!(result.motivational_message, "Read on.");

        let back: Value = serde_json::to_value(&result).unwrap();
        let original: Value = serde_json::from_str(&response_with(five())).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn wrong_entry_counts_are_malformed() {
        let mut four = five();
        four.pop();
        let mut six = five();
        six.push(entry("Book 6"));

        for entries in [four, six] {
            let err = parse_oracle_response(&response_with(entries)).unwrap_err();
            assert!(matches!(err, OracleError::MalformedResponse(_)));
        }
    }

    #[test]
    fn missing_author_is_malformed() {
        let mut entries = five();
        entries[2].as_object_mut().unwrap().remove("author");
        let err = parse_oracle_response(&response_with(entries)).unwrap_err();
        assert!(matches!(err, OracleError::MalformedResponse(_)));
    }

    #[test]
    fn unknown_difficulty_is_malformed() {
        let mut entries = five();
        entries[0]["difficulty"] = json!("Expert");
        let err = parse_oracle_response(&response_with(entries)).unwrap_err();
        assert!(matches!(err, OracleError::MalformedResponse(_)));
    }

    #[test]
    fn empty_and_garbage_bodies_are_malformed() {
        for body in ["", "   ", "not json", "{\"recommendations\": []"] {
            let err = parse_oracle_response(body).unwrap_err();
            assert!(matches!(err, OracleError::MalformedResponse(_)), "body: {body:?}");
        }
    }

    #[test]
    fn blank_text_fields_are_malformed() {
        let mut entries = five();
        entries[1]["summary"] = json!("  ");
        assert!(parse_oracle_response(&response_with(entries)).is_err());

        let blank_message =
            json!({ "recommendations": five(), "motivationalMessage": "" }).to_string();
        assert!(parse_oracle_response(&blank_message).is_err());
    }

    #[test]
    fn duplicate_uri_keeps_first_seen() {
        let chunks = vec![
            chunk_map("https://maps/a", "Central Library"),
            GroundingChunk::Other,
            chunk_web("https://maps/a", "Central Library (web)"),
            chunk_web("https://web/b", "Branch Library"),
        ];
        let libraries = extract_libraries(&chunks);
        assert_eq!(
            libraries,
            vec![
                LibraryLocation {
                    name: "Central Library".to_string(),
                    uri: "https://maps/a".to_string()
                },
                LibraryLocation {
                    name: "Branch Library".to_string(),
                    uri: "https://web/b".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn client_returns_validated_result() {
        let model = MockModel::answering(vec![Ok(response_with(five()))]);
        let client = RecommendationClient::new(model);
        let result = client.request_recommendations(&prefs()).await.unwrap();
        assert_eq!(result.recommendations.len(), 5);
    }

    #[tokio::test]
    async fn missing_credential_is_not_retried() {
        let model = MockModel::answering(vec![Err(ModelError::MissingCredential)]);
        let client = RecommendationClient::new(model).with_max_attempts(3);
        let err = client.request_recommendations(&prefs()).await.unwrap_err();
        assert_eq!(err, OracleError::MissingCredential);
        assert_eq!(client.model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn provider_failure_is_single_attempt_by_default() {
        let model = MockModel::answering(vec![
            Err(ModelError::Provider("429 rate limited".to_string())),
            Ok(response_with(five())),
        ]);
        let client = RecommendationClient::new(model);
        let err = client.request_recommendations(&prefs()).await.unwrap_err();
        assert!(matches!(err, OracleError::ProviderUnavailable(_)));
        assert_eq!(client.model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn bounded_retry_recovers_from_transport_failure() {
        let model = MockModel::answering(vec![
            Err(ModelError::Transport("connection reset".to_string())),
            Ok(response_with(five())),
        ]);
        let client = RecommendationClient::new(model).with_max_attempts(2);
        assert!(client.request_recommendations(&prefs()).await.is_ok());
        assert_eq!(client.model.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalid_preferences_never_reach_the_model() {
        let client = RecommendationClient::new(MockModel::answering(vec![]));
        let no_genres = Preferences {
            preferred_genres: vec![],
            ..prefs()
        };
        assert!(client.request_recommendations(&no_genres).await.is_err());
        assert_eq!(client.model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn library_lookup_swallows_provider_failures() {
        let client = LibraryLookupClient::new(MockModel::grounding(Err(ModelError::Transport(
            "offline".to_string(),
        ))));
        let coords = Coordinates {
            latitude: 51.5,
            longitude: -0.12,
        };
        assert_eq!(client.find_nearby_libraries(coords).await, Ok(Vec::new()));
    }

    #[tokio::test]
    async fn library_lookup_reports_missing_credential() {
        let client =
            LibraryLookupClient::new(MockModel::grounding(Err(ModelError::MissingCredential)));
        let coords = Coordinates {
            latitude: 0.0,
            longitude: 0.0,
        };
        assert_eq!(
            client.find_nearby_libraries(coords).await,
            Err(OracleError::MissingCredential)
        );
    }

    #[tokio::test]
    async fn library_lookup_extracts_and_deduplicates() {
        let client = LibraryLookupClient::new(MockModel::grounding(Ok(vec![
            chunk_map("https://maps/a", "Central Library"),
            chunk_web("https://maps/a", "Duplicate"),
        ])));
        let coords = Coordinates {
            latitude: 40.7,
            longitude: -74.0,
        };
        let libraries = client.find_nearby_libraries(coords).await.unwrap();
        assert_eq!(libraries.len(), 1);
        assert_eq!(libraries[0].name, "Central Library");
    }
}
