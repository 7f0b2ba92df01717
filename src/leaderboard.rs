use crate::error::QuizError;
use crate::gateway::Gateway;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub player_name: String,
    pub points: u32,
}

pub async fn load_scores<G: Gateway>(gateway: &G) -> Result<Vec<LeaderboardEntry>, QuizError> {
    let scores = gateway.list_scores().await.map_err(QuizError::Scores)?;
    log::debug!("Loaded {} leaderboard entries", scores.len());
    Ok(scores)
}

/// The backend decides the order, entries are listed as received.
pub fn render(entries: &[LeaderboardEntry]) -> String {
    let mut text = String::from("🏆 Leaderboard\n");
    if entries.is_empty() {
        text.push_str("\nNo scores saved yet. Be the first!");
        return text;
    }
    for entry in entries {
        text.push_str(&format!("\n{}: {} points", entry.player_name, entry.points));
    }
    text
}
