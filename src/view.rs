//! What the player sees in the chat: notices, captions and reply keyboards.

use teloxide::types::{KeyboardButton, KeyboardMarkup};

use crate::error::QuizError;
use crate::quiz::game::LOAD_FAILED;
use crate::quiz::{Game, Round, Verdict};

pub const TITLE: &str = "🌍 Flag Quiz";
pub const SAVE_BUTTON: &str = "💾 Save score";
pub const LEADERBOARD_BUTTON: &str = "🏆 Leaderboard";
pub const RETRY_BUTTON: &str = "🔄 Retry";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

/// A short-lived message about what just happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn text(&self) -> String {
        let icon = match self.severity {
            Severity::Success => "✅",
            Severity::Warning => "⚠️",
            Severity::Error => "❌",
        };
        format!("{} {}", icon, self.message)
    }
}

impl From<&Verdict> for Notice {
    fn from(verdict: &Verdict) -> Self {
        if verdict.correct {
            Notice::success("Correct! Well done!")
        } else {
            Notice::error(format!(
                "Incorrect! The answer was {}",
                verdict.correct_answer.name
            ))
        }
    }
}

impl From<&QuizError> for Notice {
    fn from(err: &QuizError) -> Self {
        match err {
            QuizError::Validation(message) => Notice::warning(*message),
            QuizError::Submit(_) => Notice::error("Failed to save score. Please try again."),
            QuizError::Scores(_) => Notice::error("Failed to load the leaderboard."),
            QuizError::Load(_) => Notice::error(LOAD_FAILED),
            QuizError::InsufficientOptions { .. } => Notice::error(err.to_string()),
        }
    }
}

pub fn save_notice(result: &Result<(), QuizError>) -> Notice {
    match result {
        Ok(()) => Notice::success("Score saved successfully!"),
        Err(err) => Notice::from(err),
    }
}

pub fn greeting() -> String {
    format!("{}\nGuess the country by its flag!", TITLE)
}

pub fn round_caption(game: &Game) -> String {
    format!(
        "Flag #{}: guess the country by its flag\nScore: {}",
        game.round_no(),
        game.score()
    )
}

pub fn score_line(score: u32) -> String {
    format!("Score: {}", score)
}

pub fn unplayable(reason: &str) -> String {
    format!("{}\nTap \"{}\" to try again.", reason, RETRY_BUTTON)
}

pub fn round_keyboard(round: &Round) -> KeyboardMarkup {
    let mut rows: Vec<Vec<KeyboardButton>> = round
        .offered()
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|country| KeyboardButton::new(country.name.clone()))
                .collect()
        })
        .collect();
    rows.push(vec![
        KeyboardButton::new(SAVE_BUTTON),
        KeyboardButton::new(LEADERBOARD_BUTTON),
    ]);
    KeyboardMarkup::new(rows)
}

pub fn retry_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(RETRY_BUTTON)]])
}
