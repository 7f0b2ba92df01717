pub mod engine;
pub mod game;
pub mod round;
pub mod scheduler;

pub use game::{Game, GameState};

/// Number of countries offered in every round, the candidate included.
pub const OPTIONS_PER_ROUND: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    pub id: i64,
    pub name: String,
    pub flag_url: String,
}

impl Country {
    pub fn new(id: i64, name: impl Into<String>, flag_url: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            flag_url: flag_url.into(),
        }
    }

    /// Answers are compared by name. Two entries sharing a name count as the same answer
    /// even when their ids differ.
    pub fn same_answer(&self, other: &Country) -> bool {
        self.name == other.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Round {
    candidate: Country,
    offered: Vec<Country>,
}

impl Round {
    pub(crate) fn new(candidate: Country, offered: Vec<Country>) -> Self {
        Self { candidate, offered }
    }

    pub fn candidate(&self) -> &Country {
        &self.candidate
    }

    pub fn offered(&self) -> &[Country] {
        &self.offered
    }

    /// Looks up the offered country a player picked by its button label.
    pub fn offered_by_name(&self, name: &str) -> Option<&Country> {
        self.offered.iter().find(|c| c.name == name.trim())
    }

    pub fn judge(&self, guess: &Country) -> Verdict {
        Verdict {
            correct: guess.same_answer(&self.candidate),
            correct_answer: self.candidate.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub correct: bool,
    pub correct_answer: Country,
}
