//! crates/literary_oracle_core/src/vocabulary.rs
//!
//! The fixed vocabularies offered by the questionnaire.

use crate::domain::ReadingSpeed;

pub const GENRES: [&str; 14] = [
    "Epic Fantasy",
    "History of Wars",
    "Political Intrigue",
    "Dark Mystery",
    "Philosophy",
    "Biography of Kings",
    "Strategies of War",
    "Forbidden Lore",
    "Legends",
    "Tragedy",
    "Adventure",
    "Dragons & Beasts",
    "Ancient Prophecies",
    "Noble Romance",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoodOption {
    pub label: &'static str,
    pub epigraph: &'static str,
}

pub const MOODS: [MoodOption; 8] = [
    MoodOption {
        label: "Vengeful",
        epigraph: "Fire and Blood",
    },
    MoodOption {
        label: "Ambitious",
        epigraph: "Chaos is a Ladder",
    },
    MoodOption {
        label: "Melancholic",
        epigraph: "Winter is Coming",
    },
    MoodOption {
        label: "Honorable",
        epigraph: "The Man Who Passes the Sentence",
    },
    MoodOption {
        label: "Cunning",
        epigraph: "I Drink and I Know Things",
    },
    MoodOption {
        label: "Romantic",
        epigraph: "The Things I Do for Love",
    },
    MoodOption {
        label: "Adventurous",
        epigraph: "Go Where the Maps End",
    },
    MoodOption {
        label: "Weary",
        epigraph: "My Watch Has Ended",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedOption {
    pub speed: ReadingSpeed,
    pub label: &'static str,
    pub description: &'static str,
}

pub const SPEEDS: [SpeedOption; 3] = [
    SpeedOption {
        speed: ReadingSpeed::Slow,
        label: "The Long Night",
        description: "Slow and deliberate",
    },
    SpeedOption {
        speed: ReadingSpeed::Moderate,
        label: "March of the Unsullied",
        description: "Steady and disciplined",
    },
    SpeedOption {
        speed: ReadingSpeed::Fast,
        label: "Flight of the Dragon",
        description: "Swift and conquering",
    },
];

/// An age bracket: `value` is what reaches the prompt, `title` is what the reader sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeBracket {
    pub value: &'static str,
    pub title: &'static str,
}

pub const AGE_BRACKETS: [AgeBracket; 6] = [
    AgeBracket {
        value: "Under 18",
        title: "Squire",
    },
    AgeBracket {
        value: "18-24",
        title: "Knight",
    },
    AgeBracket {
        value: "25-34",
        title: "Maester",
    },
    AgeBracket {
        value: "35-44",
        title: "Lord/Lady",
    },
    AgeBracket {
        value: "45-54",
        title: "Hand of the King",
    },
    AgeBracket {
        value: "55+",
        title: "Archmaester",
    },
];

pub fn is_genre(label: &str) -> bool {
    GENRES.contains(&label)
}

pub fn mood(label: &str) -> Option<&'static MoodOption> {
    MOODS.iter().find(|m| m.label == label)
}

pub fn age_bracket(value: &str) -> Option<&'static AgeBracket> {
    AGE_BRACKETS.iter().find(|a| a.value == value)
}
