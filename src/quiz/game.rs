//! Per-chat game state and its transitions.
//!
//! Every transition takes the old value and hands back the new one; nothing here touches
//! the network or the chat, so the whole flow can be driven from tests.

use rand::Rng;

use crate::error::QuizError;
use crate::quiz::round::start_round;
use crate::quiz::{Country, Round, Verdict};

pub const LOAD_FAILED: &str = "Failed to load countries. Please try again later.";

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum GameState {
    #[default]
    Loading,
    Ready(Game),
    Unplayable {
        reason: String,
    },
}

impl GameState {
    /// Leaves `Loading` once the country fetch has finished, one way or the other.
    pub fn loaded<R: Rng + ?Sized>(result: Result<Vec<Country>, QuizError>, rng: &mut R) -> Self {
        match result.and_then(|countries| Game::new(countries, rng)) {
            Ok(game) => GameState::Ready(game),
            Err(err) => {
                log::warn!("Game is unplayable: {}", err);
                GameState::Unplayable {
                    reason: unplayable_reason(&err),
                }
            }
        }
    }
}

fn unplayable_reason(err: &QuizError) -> String {
    match err {
        QuizError::InsufficientOptions { distinct, required } => format!(
            "Not enough different flags to play: found {}, need {}.",
            distinct, required
        ),
        _ => LOAD_FAILED.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Game {
    countries: Vec<Country>,
    round: Round,
    round_no: u64,
    score: u32,
    judged: bool,
    awaiting_name: bool,
}

impl Game {
    pub fn new<R: Rng + ?Sized>(countries: Vec<Country>, rng: &mut R) -> Result<Self, QuizError> {
        let round = start_round(&countries, rng)?;
        Ok(Self {
            countries,
            round,
            round_no: 1,
            score: 0,
            judged: false,
            awaiting_name: false,
        })
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn round_no(&self) -> u64 {
        self.round_no
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// True between a guess and the next round.
    pub fn is_judged(&self) -> bool {
        self.judged
    }

    pub fn is_awaiting_name(&self) -> bool {
        self.awaiting_name
    }

    /// Judges `guess` against the current round. A round takes one guess only, later ones
    /// get `None` back and change nothing.
    pub fn guess(mut self, guess: &Country) -> (Self, Option<Verdict>) {
        if self.judged {
            return (self, None);
        }
        let verdict = self.round.judge(guess);
        if verdict.correct {
            self.score += 1;
        }
        self.judged = true;
        (self, Some(verdict))
    }

    /// Whether an advance scheduled after round `round_no` should still be applied.
    pub fn awaits_advance_from(&self, round_no: u64) -> bool {
        self.judged && self.round_no == round_no
    }

    pub fn advance<R: Rng + ?Sized>(mut self, rng: &mut R) -> Result<Self, QuizError> {
        self.round = start_round(&self.countries, rng)?;
        self.round_no += 1;
        self.judged = false;
        // A new keyboard replaces the name prompt, an option tap must not become a name
        self.awaiting_name = false;
        Ok(self)
    }

    pub fn ask_for_name(mut self) -> Self {
        self.awaiting_name = true;
        self
    }

    pub fn cancel_name_prompt(mut self) -> Self {
        self.awaiting_name = false;
        self
    }

    pub fn score_saved(mut self) -> Self {
        self.score = 0;
        self.awaiting_name = false;
        self
    }

    /// Applies the outcome of a score submission. A blank name keeps the prompt open, a
    /// backend failure keeps the score so the player can try again.
    pub fn after_save(self, result: &Result<(), QuizError>) -> Self {
        match result {
            Ok(()) => self.score_saved(),
            Err(QuizError::Validation(_)) => self.ask_for_name(),
            Err(_) => self.cancel_name_prompt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::error::LoadError;
    use crate::gateway::GatewayError;
    use crate::quiz::test_support::pool;

    fn ready_game(rng: &mut StdRng) -> Game {
        let countries = pool(&["France", "Italy", "Japan", "Chile", "Peru"]);
        Game::new(countries, rng).unwrap()
    }

    fn wrong_option(game: &Game) -> Country {
        game.round()
            .offered()
            .iter()
            .find(|c| !c.same_answer(game.round().candidate()))
            .cloned()
            .unwrap()
    }

    #[test]
    fn loading_succeeds_into_a_fresh_game() {
        let mut rng = StdRng::seed_from_u64(1);
        let countries = pool(&["A", "B", "C", "D"]);
        match GameState::loaded(Ok(countries), &mut rng) {
            GameState::Ready(game) => {
                assert_eq!(game.score(), 0);
                assert_eq!(game.round_no(), 1);
                assert!(!game.is_judged());
            }
            other => panic!("expected a ready game, got {:?}", other),
        }
    }

    #[test]
    fn failed_load_is_unplayable() {
        let mut rng = StdRng::seed_from_u64(1);
        let state = GameState::loaded(Err(LoadError::Empty.into()), &mut rng);
        assert!(matches!(state, GameState::Unplayable { reason } if reason == LOAD_FAILED));
    }

    #[test]
    fn too_few_flags_is_unplayable() {
        let mut rng = StdRng::seed_from_u64(1);
        let state = GameState::loaded(Ok(pool(&["A", "B", "C"])), &mut rng);
        assert!(matches!(state, GameState::Unplayable { reason } if reason.contains("found 3")));
    }

    #[test]
    fn correct_guess_scores_a_point() {
        let mut rng = StdRng::seed_from_u64(11);
        let game = ready_game(&mut rng);
        let candidate = game.round().candidate().clone();

        let (game, verdict) = game.guess(&candidate);
        assert!(verdict.unwrap().correct);
        assert_eq!(game.score(), 1);
        assert!(game.is_judged());
    }

    #[test]
    fn wrong_guess_keeps_the_score() {
        let mut rng = StdRng::seed_from_u64(12);
        let game = ready_game(&mut rng);
        let wrong = wrong_option(&game);

        let (game, verdict) = game.guess(&wrong);
        let verdict = verdict.unwrap();
        assert!(!verdict.correct);
        assert_eq!(verdict.correct_answer, *game.round().candidate());
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn a_round_takes_one_guess() {
        let mut rng = StdRng::seed_from_u64(13);
        let game = ready_game(&mut rng);
        let candidate = game.round().candidate().clone();

        let (game, _) = game.guess(&candidate);
        let (game, verdict) = game.guess(&candidate);
        assert!(verdict.is_none());
        assert_eq!(game.score(), 1);
    }

    #[test]
    fn advancing_keeps_score_and_pool() {
        let mut rng = StdRng::seed_from_u64(14);
        let game = ready_game(&mut rng);
        let candidate = game.round().candidate().clone();
        let (game, _) = game.guess(&candidate);
        assert!(game.awaits_advance_from(1));

        let game = game.advance(&mut rng).unwrap();
        assert_eq!(game.round_no(), 2);
        assert_eq!(game.score(), 1);
        assert!(!game.is_judged());
        assert!(!game.awaits_advance_from(1));
    }

    #[test]
    fn stale_advance_is_not_awaited() {
        let mut rng = StdRng::seed_from_u64(15);
        let game = ready_game(&mut rng);
        assert!(!game.awaits_advance_from(1));

        let candidate = game.round().candidate().clone();
        let (game, _) = game.guess(&candidate);
        assert!(!game.awaits_advance_from(0));
    }

    #[test]
    fn saving_resets_score_and_name_prompt() {
        let mut rng = StdRng::seed_from_u64(16);
        let game = ready_game(&mut rng);
        let candidate = game.round().candidate().clone();
        let (game, _) = game.guess(&candidate);
        let game = game.ask_for_name();
        assert!(game.is_awaiting_name());

        let game = game.score_saved();
        assert_eq!(game.score(), 0);
        assert!(!game.is_awaiting_name());
    }

    #[test]
    fn advancing_closes_the_name_prompt() {
        let mut rng = StdRng::seed_from_u64(19);
        let game = ready_game(&mut rng);
        let candidate = game.round().candidate().clone();
        let (game, _) = game.guess(&candidate);

        let game = game.ask_for_name().advance(&mut rng).unwrap();
        assert_eq!(game.round_no(), 2);
        assert!(!game.is_awaiting_name());
        assert_eq!(game.score(), 1);
    }

    #[test]
    fn save_outcomes() {
        let mut rng = StdRng::seed_from_u64(18);
        let game = ready_game(&mut rng);
        let candidate = game.round().candidate().clone();
        let (game, _) = game.guess(&candidate);
        let game = game.ask_for_name();

        let saved = game.clone().after_save(&Ok(()));
        assert_eq!(saved.score(), 0);
        assert!(!saved.is_awaiting_name());

        let blank = game
            .clone()
            .after_save(&Err(QuizError::Validation("name required")));
        assert_eq!(blank.score(), 1);
        assert!(blank.is_awaiting_name());

        let failed = game.after_save(&Err(QuizError::Submit(GatewayError::Status(
            reqwest::StatusCode::SERVICE_UNAVAILABLE,
        ))));
        assert_eq!(failed.score(), 1);
        assert!(!failed.is_awaiting_name());
    }

    #[test]
    fn save_lands_on_the_round_current_when_it_returns() {
        let mut rng = StdRng::seed_from_u64(20);
        let game = ready_game(&mut rng);
        let candidate = game.round().candidate().clone();
        let (game, _) = game.guess(&candidate);

        // The advance timer fires while the score is being posted
        let advanced = game.advance(&mut rng).unwrap();
        let game = advanced.clone().after_save(&Ok(()));

        assert_eq!(game.round_no(), 2);
        assert_eq!(game.round(), advanced.round());
        assert!(!game.is_judged());
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn state_survives_dialogue_storage() {
        let mut rng = StdRng::seed_from_u64(17);
        let state = GameState::Ready(ready_game(&mut rng));
        let json = serde_json::to_string(&state).unwrap();
        match serde_json::from_str::<GameState>(&json).unwrap() {
            GameState::Ready(game) => assert_eq!(game.round_no(), 1),
            other => panic!("expected a ready game, got {:?}", other),
        }
    }
}
