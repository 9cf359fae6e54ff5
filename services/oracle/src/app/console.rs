//! services/oracle/src/app/console.rs
//!
//! Line-oriented front-end input. A line is either a JSON `UiCommand` or one of the
//! short console verbs below; questionnaire verbs fill a `QuestionnaireForm`.

use crate::app::{protocol::UiCommand, questionnaire::QuestionnaireForm};
use literary_oracle_core::vocabulary::{self, SPEEDS};
use literary_oracle_core::ReadingSpeed;

#[derive(Debug, PartialEq)]
pub enum ConsoleInput {
    Command(UiCommand),
    /// Local to the console, nothing to forward.
    Handled(String),
    Help,
    Quit,
}

#[derive(Debug, Default)]
pub struct Console {
    form: QuestionnaireForm,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interpret(&mut self, line: &str) -> Result<ConsoleInput, String> {
        let line = line.trim();
        if line.starts_with('{') {
            return serde_json::from_str::<UiCommand>(line)
                .map(ConsoleInput::Command)
                .map_err(|e| format!("Unreadable command: {}", e));
        }

        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let command = match verb.to_lowercase().as_str() {
            "" => return Ok(ConsoleInput::Handled(String::new())),
            "help" => return Ok(ConsoleInput::Help),
            "quit" | "exit" => return Ok(ConsoleInput::Quit),
            "signin" => {
                let (email, password) = two_words(rest, "signin <email> <password>")?;
                UiCommand::SignIn { email, password }
            }
            "signup" => {
                let (email, tail) = rest
                    .split_once(char::is_whitespace)
                    .ok_or("Usage: signup <email> <password> <house name>")?;
                let (password, display_name) = tail
                    .trim()
                    .split_once(char::is_whitespace)
                    .map(|(p, n)| (p.to_string(), n.trim().to_string()))
                    .unwrap_or_else(|| (tail.trim().to_string(), String::new()));
                UiCommand::SignUp {
                    email: email.to_string(),
                    password,
                    display_name,
                }
            }
            "toggle" => UiCommand::ToggleAuthMode,
            "favorite" => {
                self.form.set_favorite_book(rest);
                return Ok(ConsoleInput::Handled(format!("Favorite tome: {}", rest)));
            }
            "genre" => {
                let selected = self.form.toggle_genre(rest);
                return Ok(ConsoleInput::Handled(format!(
                    "Genres: {}{}",
                    self.form.genres().join(", "),
                    if selected || vocabulary::is_genre(rest) { "" } else { " (unknown or full)" }
                )));
            }
            "speed" => {
                let speed = parse_speed(rest).ok_or("Usage: speed slow|moderate|fast")?;
                self.form.set_reading_speed(speed);
                return Ok(ConsoleInput::Handled(format!("Pace: {}", speed)));
            }
            "mood" => {
                if !self.form.select_mood(rest) {
                    return Err(format!("Unknown mood: {}", rest));
                }
                return Ok(ConsoleInput::Handled(format!("Mood: {}", rest)));
            }
            "age" => {
                let unknown = rest.is_empty() || rest.eq_ignore_ascii_case("none");
                let value = (!unknown).then_some(rest);
                self.form.select_age_group(value);
                return Ok(ConsoleInput::Handled("Age noted.".to_string()));
            }
            "submit" => {
                let preferences = self
                    .form
                    .submit()
                    .ok_or("A favorite tome, at least one genre and a mood are required.")?;
                UiCommand::SubmitPreferences { preferences }
            }
            "retry" => UiCommand::TryAgain,
            "reset" => UiCommand::Reset,
            "signout" => UiCommand::SignOut,
            "library" => UiCommand::FindLibrary {
                book_title: rest.to_string(),
            },
            "community" => UiCommand::OpenCommunity {
                book_title: rest.to_string(),
            },
            "post" => UiCommand::PostComment {
                text: rest.to_string(),
            },
            "registry" => UiCommand::OpenRegistry,
            other => return Err(format!("Unknown verb: {}. Type `help`.", other)),
        };
        Ok(ConsoleInput::Command(command))
    }
}

fn two_words(rest: &str, usage: &str) -> Result<(String, String), String> {
    let mut words = rest.split_whitespace();
    match (words.next(), words.next()) {
        (Some(a), Some(b)) => Ok((a.to_string(), b.to_string())),
        _ => Err(format!("Usage: {}", usage)),
    }
}

fn parse_speed(word: &str) -> Option<ReadingSpeed> {
    SPEEDS
        .iter()
        .map(|option| option.speed)
        .find(|speed| speed.as_str().eq_ignore_ascii_case(word))
}

/// The console help text, including the questionnaire vocabularies.
pub fn help_text() -> String {
    let mut out = String::from(
        "Verbs: signin, signup, toggle, favorite, genre, speed, mood, age, submit,\n\
         retry, reset, signout, library, community, post, registry, help, quit.\n",
    );
    out.push_str(&format!("Genres: {}\n", vocabulary::GENRES.join(", ")));
    for mood in &vocabulary::MOODS {
        out.push_str(&format!("Mood {}: \"{}\"\n", mood.label, mood.epigraph));
    }
    for speed in &SPEEDS {
        out.push_str(&format!("Speed {}: {} ({})\n", speed.speed, speed.label, speed.description));
    }
    for bracket in &vocabulary::AGE_BRACKETS {
        out.push_str(&format!("Age {}: {}\n", bracket.value, bracket.title));
    }
    out
}
