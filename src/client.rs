//! Async HTTP client for the arena API.

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};

use crate::constants::DEFAULT_ROUND_WAIT_SECS;
use crate::error::ClientError;
use crate::types::{Move, MoveBatch, RegisterResponse, ServerLogEntry, Snapshot};

const AUTH_HEADER: &str = "X-Auth-Token";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_RETRIES: u32 = 2;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Clone, Debug)]
pub struct ArenaClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
    retries: u32,
    retry_delay: Duration,
}

impl ArenaClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            http,
            retries: DEFAULT_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    pub fn with_retries(mut self, retries: u32, retry_delay: Duration) -> Self {
        self.retries = retries;
        self.retry_delay = retry_delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Registers for the next round. Returns the seconds until the round
    /// starts, or `None` while registration is closed.
    pub async fn register(&self) -> Result<Option<f64>, ClientError> {
        let url = self.url("/api/register");
        let response = self.execute("register", || self.http.post(&url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: RegisterResponse = ensure_success(response).await?.json().await?;
        tracing::info!(
            name = body.name.as_deref().unwrap_or("-"),
            realm = body.realm.as_deref().unwrap_or("-"),
            next_turn = ?body.next_turn,
            "registered"
        );
        Ok(Some(body.next_turn.unwrap_or(DEFAULT_ROUND_WAIT_SECS)))
    }

    /// Fetches the current arena. A 400 means the server forgot us, so the
    /// client registers again and retries once.
    pub async fn arena(&self) -> Result<Snapshot, ClientError> {
        let url = self.url("/api/arena");
        let response = self.execute("arena", || self.http.get(&url)).await?;
        if response.status() != StatusCode::BAD_REQUEST {
            return Ok(ensure_success(response).await?.json().await?);
        }

        tracing::warn!("arena rejected the token; registering again");
        if self.register().await?.is_none() {
            return Err(ClientError::RegistrationClosed);
        }
        let response = self.execute("arena", || self.http.get(&url)).await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    pub async fn send_moves(&self, moves: &[Move]) -> Result<(), ClientError> {
        if moves.is_empty() {
            return Ok(());
        }
        let url = self.url("/api/move");
        let batch = MoveBatch {
            moves: moves.to_vec(),
        };
        let response = self
            .execute("move", || self.http.post(&url).json(&batch))
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    pub async fn logs(&self) -> Result<Vec<ServerLogEntry>, ClientError> {
        let url = self.url("/api/logs");
        let response = self.execute("logs", || self.http.get(&url)).await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    /// Sends the request built by `build`, retrying transport failures and
    /// 5xx answers up to the configured count.
    async fn execute<F>(&self, label: &str, build: F) -> Result<Response, ClientError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            let result = build().header(AUTH_HEADER, &self.token).send().await;
            let error = match result {
                Ok(response) if response.status().is_server_error() => {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    ClientError::Status { status, body }
                }
                Ok(response) => return Ok(response),
                Err(error) => ClientError::Http(error),
            };

            if attempt >= self.retries || !error.is_transient() {
                return Err(error);
            }
            attempt += 1;
            tracing::warn!(request = label, attempt, %error, "retrying request");
            tokio::time::sleep(self.retry_delay).await;
        }
    }
}

async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}
