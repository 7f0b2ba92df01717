use crate::gateway::GatewayError;

#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    #[error("failed to load countries: {0}")]
    Load(#[from] LoadError),

    #[error("only {distinct} distinct flags available, {required} are needed for a round")]
    InsufficientOptions { distinct: usize, required: usize },

    #[error("{0}")]
    Validation(&'static str),

    #[error("failed to save score: {0}")]
    Submit(#[source] GatewayError),

    #[error("failed to load the leaderboard: {0}")]
    Scores(#[source] GatewayError),
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("the backend returned no countries")]
    Empty,
}
