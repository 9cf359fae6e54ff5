//! services/oracle/src/app/questionnaire.rs
//!
//! The questionnaire form. It only yields a `Preferences` once the submission
//! invariant holds, so front-ends can disable their submit control on `can_submit`.

use literary_oracle_core::domain::MAX_GENRES;
use literary_oracle_core::vocabulary;
use literary_oracle_core::{Preferences, ReadingSpeed};

#[derive(Debug, Default, Clone)]
pub struct QuestionnaireForm {
    favorite_book: String,
    genres: Vec<String>,
    reading_speed: ReadingSpeed,
    mood: Option<String>,
    age_group: Option<String>,
}

impl QuestionnaireForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_favorite_book(&mut self, title: &str) {
        self.favorite_book = title.trim().to_string();
    }

    /// Adds the genre if there is room, removes it if already selected.
    /// Returns whether the genre is selected afterwards.
    pub fn toggle_genre(&mut self, genre: &str) -> bool {
        if let Some(pos) = self.genres.iter().position(|g| g == genre) {
            self.genres.remove(pos);
            return false;
        }
        if !vocabulary::is_genre(genre) || self.genres.len() >= MAX_GENRES {
            return false;
        }
        self.genres.push(genre.to_string());
        true
    }

    pub fn set_reading_speed(&mut self, speed: ReadingSpeed) {
        self.reading_speed = speed;
    }

    /// Picks a mood from the fixed vocabulary. Unknown labels are ignored.
    pub fn select_mood(&mut self, label: &str) -> bool {
        match vocabulary::mood(label) {
            Some(mood) => {
                self.mood = Some(mood.label.to_string());
                true
            }
            None => false,
        }
    }

    /// Picks an age bracket by value; `None` or an unknown value means "Unknown".
    pub fn select_age_group(&mut self, value: Option<&str>) {
        self.age_group = value
            .and_then(vocabulary::age_bracket)
            .map(|bracket| bracket.value.to_string());
    }

    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    pub fn can_submit(&self) -> bool {
        !self.favorite_book.is_empty() && !self.genres.is_empty() && self.mood.is_some()
    }

    pub fn submit(&self) -> Option<Preferences> {
        if !self.can_submit() {
            return None;
        }
        Some(Preferences {
            favorite_book: self.favorite_book.clone(),
            preferred_genres: self.genres.clone(),
            reading_speed: self.reading_speed,
            current_mood: self.mood.clone().unwrap_or_default(),
            age_group: self.age_group.clone(),
        })
    }
}
