use crate::error::{LoadError, QuizError};
use crate::gateway::Gateway;
use crate::quiz::Country;

pub const NAME_REQUIRED: &str = "Please enter your name to save the score";

pub async fn load_countries<G: Gateway>(gateway: &G) -> Result<Vec<Country>, QuizError> {
    let countries = gateway.list_countries().await.map_err(LoadError::from)?;
    if countries.is_empty() {
        return Err(LoadError::Empty.into());
    }
    log::info!("Loaded {} countries", countries.len());
    Ok(countries)
}

/// Saves `points` under `player_name`. Blank names are refused before anything is sent.
pub async fn submit_score<G: Gateway>(
    gateway: &G,
    player_name: &str,
    points: u32,
) -> Result<(), QuizError> {
    let player_name = player_name.trim();
    if player_name.is_empty() {
        return Err(QuizError::Validation(NAME_REQUIRED));
    }

    gateway
        .submit_score(player_name, points)
        .await
        .map_err(QuizError::Submit)?;
    log::info!("Saved {} points for {}", points, player_name);
    Ok(())
}
