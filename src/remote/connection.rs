use reqwest::{Client, Response};
use serde::Serialize;
use thiserror::Error;
use tokio::time::Duration;
use url::Url;

use crate::config::DashboardConfig;

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Invalid store URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed store payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Subscription to {path} ended: {reason}")]
    SubscriptionEnded { path: String, reason: String },

    #[error("Stream for {0} closed")]
    StreamClosed(String),
}

/// REST handle on the realtime telemetry store.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    client: Client,
    base: Url,
    auth: Option<String>,
}

impl RemoteStore {
    pub fn new(database_url: &str, auth: Option<String>) -> Result<Self, RemoteError> {
        let mut base = Url::parse(database_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(RemoteStore {
            client: Client::new(),
            base,
            auth,
        })
    }

    pub fn from_config(config: &DashboardConfig) -> Result<Self, RemoteError> {
        Self::new(&config.database_url, config.database_auth.clone())
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// `<base>/<path>.json`, with the auth token as a query parameter.
    pub fn path_url(&self, path: &str) -> Result<Url, RemoteError> {
        let path = path.trim_matches('/');
        let mut url = self.base.join(&format!("{}.json", path))?;
        if let Some(auth) = &self.auth {
            url.query_pairs_mut().append_pair("auth", auth);
        }
        Ok(url)
    }

    /// Overwrite the value at `path`.
    pub async fn put_value<T: Serialize + ?Sized>(
        &self,
        path: &str,
        value: &T,
    ) -> Result<(), RemoteError> {
        let response = self
            .client
            .put(self.path_url(path)?)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .json(value)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// Whether the store answers at all. Any HTTP response counts as reachable.
    pub async fn is_reachable(&self) -> bool {
        let url = match self.path_url(".info/connected") {
            Ok(url) => url,
            Err(_) => return false,
        };
        self.client
            .get(url)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .send()
            .await
            .is_ok()
    }
}

pub(crate) async fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        body,
    })
}
