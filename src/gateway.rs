//! HTTP access to the quiz backend.
//!
//! The backend exposes three endpoints under one base URL:
//! `GET /countries`, `GET /scores` and `POST /scores`.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;

use crate::leaderboard::LeaderboardEntry;
use crate::quiz::Country;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("backend answered with status {0}")]
    Status(StatusCode),
}

pub trait Gateway: Send + Sync {
    fn list_countries(&self) -> impl Future<Output = Result<Vec<Country>, GatewayError>> + Send;

    fn list_scores(
        &self,
    ) -> impl Future<Output = Result<Vec<LeaderboardEntry>, GatewayError>> + Send;

    fn submit_score(
        &self,
        player_name: &str,
        points: u32,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoreSubmission<'a> {
    player_name: &'a str,
    points: u32,
}

pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        return Err(GatewayError::Status(status));
    }
    Ok(response)
}

impl Gateway for HttpGateway {
    async fn list_countries(&self) -> Result<Vec<Country>, GatewayError> {
        let response = self.client.get(self.endpoint("countries")).send().await?;
        let countries = check_status(response)?.json().await?;
        Ok(countries)
    }

    async fn list_scores(&self) -> Result<Vec<LeaderboardEntry>, GatewayError> {
        let response = self.client.get(self.endpoint("scores")).send().await?;
        let scores = check_status(response)?.json().await?;
        Ok(scores)
    }

    async fn submit_score(&self, player_name: &str, points: u32) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(self.endpoint("scores"))
            .json(&ScoreSubmission {
                player_name,
                points,
            })
            .send()
            .await?;
        // The backend may or may not echo the saved entry, nothing here reads it
        check_status(response)?;
        Ok(())
    }
}
