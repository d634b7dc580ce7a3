use std::time::Duration;

use async_trait::async_trait;
use memory_match_common::{
    models::{CardId, Difficulty, GameSnapshot},
    protocol::{
        ErrorResponse, FlipRequest, FlipResponse, GameStateResponse, HighScoresResponse,
        NewGameForm, ResetResponse, SaveScoreResponse,
    },
};
use reqwest::{Client, Response};
use tracing::{debug, instrument};
use url::Url;

use crate::{config::ClientConfig, error::ServiceError, service::GameService};

/// HTTP client for the memory match service API
///
/// The service tracks the game in a cookie session, so one client instance
/// stands for one player session.
pub struct MemoryMatchClient {
    client: Client,
    base_url: Url,
}

impl MemoryMatchClient {
    /// Create a new client connecting to the specified server URL
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        Self::with_timeout(base_url, ClientConfig::default().request_timeout)
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ServiceError> {
        Self::with_timeout(&config.server_url, config.request_timeout)
    }

    fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Resolve an endpoint relative to the base URL, keeping any path prefix
    pub fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Link to the presentational high-scores page
    pub fn high_scores_page(&self, difficulty: Difficulty) -> Result<Url, ServiceError> {
        let mut url = self.endpoint("highscores")?;
        url.query_pairs_mut()
            .append_pair("difficulty", difficulty.as_str());
        Ok(url)
    }
}

/// Turn a non-success status into an error carrying the service's message
async fn check_status(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error)
        .unwrap_or(body);

    Err(ServiceError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl GameService for MemoryMatchClient {
    #[instrument(level = "debug", skip(self))]
    async fn get_game_state(&self) -> Result<Option<GameSnapshot>, ServiceError> {
        let url = self.endpoint("get_game_state")?;
        let response = check_status(self.client.get(url).send().await?).await?;
        let state: GameStateResponse = response.json().await?;
        Ok(state.into_snapshot())
    }

    #[instrument(level = "debug", skip(self))]
    async fn flip_card(&self, card_id: CardId) -> Result<FlipResponse, ServiceError> {
        let url = self.endpoint("flip_card")?;
        let response = self
            .client
            .post(url)
            .json(&FlipRequest { card_id })
            .send()
            .await?;
        let flip: FlipResponse = check_status(response).await?.json().await?;
        debug!(
            "Flip response: match={}, completed={}, attempts={}",
            flip.is_match, flip.is_completed, flip.attempts
        );
        Ok(flip)
    }

    #[instrument(level = "debug", skip(self))]
    async fn reset_unmatched(&self) -> Result<ResetResponse, ServiceError> {
        let url = self.endpoint("reset_unmatched")?;
        let response = check_status(self.client.post(url).send().await?).await?;
        Ok(response.json().await?)
    }

    #[instrument(level = "debug", skip(self))]
    async fn save_score(&self) -> Result<SaveScoreResponse, ServiceError> {
        let url = self.endpoint("save_score")?;
        let response = check_status(self.client.post(url).send().await?).await?;
        Ok(response.json().await?)
    }

    #[instrument(level = "debug", skip(self))]
    async fn new_game(
        &self,
        player_name: &str,
        difficulty: Difficulty,
    ) -> Result<(), ServiceError> {
        let url = self.endpoint("new_game")?;
        let form = NewGameForm {
            player_name: player_name.to_string(),
            difficulty,
        };

        // The service answers with a redirect to its index page
        check_status(self.client.post(url).form(&form).send().await?).await?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    async fn high_scores(&self, difficulty: Difficulty) -> Result<HighScoresResponse, ServiceError> {
        let url = self.endpoint("get_highscores")?;
        let response = self
            .client
            .get(url)
            .query(&[("difficulty", difficulty.as_str())])
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }
}
