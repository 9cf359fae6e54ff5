//! crates/literary_oracle_core/src/prompt.rs
//!
//! Renders a `Preferences` into the request sent to the recommendation model:
//! the persona prompt and the schema its answer must conform to.

use crate::domain::{Difficulty, FormatSuggestion, OracleResult, PreferenceError, Preferences};
use crate::ports::StructuredRequest;
use crate::schema::Schema;

/// Query sent with the maps grounding tool enabled.
pub const LIBRARY_QUERY: &str = "Find the 3 nearest public libraries to this location.";

const PROMPT_TEMPLATE: &str = r#"Act as "The Literary Oracle", a compassionate librarian and sharp book critic.
Analyze the following user profile and recommend 5 books.

User Profile:
- Favorite Book: "{favorite_book}"
- Preferred Genres: {genres}
- Reading Speed: {reading_speed}
- Current Mood: "{current_mood}"
- Age Group: "{age_group}"

Your response must be a JSON object containing exactly 5 book recommendations and one motivational message.
For each book, determine the best format (Audiobook/Novel/E-Book) based on their reading speed (Slow readers often benefit from Audiobooks or short Novels, Fast readers might like E-books or long Novels).
The 'difficulty' should range from Beginner to Advanced based on the book's complexity.
The 'matchReason' should explain why it fits their personality and mood.
The 'motivationalMessage' should be inspirational and polished."#;

/// Builds the recommendation request. Pure; fails only when the preferences would
/// not have been submittable in the first place.
pub fn build_recommendation_request(
    prefs: &Preferences,
) -> Result<StructuredRequest, PreferenceError> {
    prefs.validate()?;
    Ok(StructuredRequest {
        prompt: render_prompt(prefs),
        schema: oracle_result_schema(),
    })
}

/// Fills the template in one pass. Substituted values are never re-scanned, so user
/// text that looks like a placeholder stays literal.
fn render_prompt(prefs: &Preferences) -> String {
    let genres = prefs.preferred_genres.join(", ");
    let age_group = prefs.age_group.as_deref().unwrap_or("Not specified");

    let mut out = String::with_capacity(PROMPT_TEMPLATE.len() + 256);
    let mut rest = PROMPT_TEMPLATE;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let value = tail.find('}').and_then(|close| {
            let value = match &tail[1..close] {
                "favorite_book" => prefs.favorite_book.as_str(),
                "genres" => genres.as_str(),
                "reading_speed" => prefs.reading_speed.as_str(),
                "current_mood" => prefs.current_mood.as_str(),
                "age_group" => age_group,
                _ => return None,
            };
            Some((value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// The shape of `OracleResult` on the wire.
pub fn oracle_result_schema() -> Schema {
    let entry = Schema::strict_object([
        ("title", Schema::string()),
        ("author", Schema::string()),
        ("summary", Schema::string()),
        ("matchReason", Schema::string()),
        (
            "difficulty",
            Schema::enumeration(Difficulty::ALL.iter().map(|d| d.as_str())),
        ),
        (
            "formatSuggestion",
            Schema::enumeration(FormatSuggestion::ALL.iter().map(|f| f.as_str())),
        ),
    ]);

    Schema::strict_object([
        (
            "recommendations",
            Schema::exact_array(entry, OracleResult::RECOMMENDATION_COUNT),
        ),
        ("motivationalMessage", Schema::string()),
    ])
}
