use reqwest::{Client, Response, StatusCode};
use url::Url;

use calshare_core::{CalendarConfiguration, SaveRequest, SaveResponse, StateId, StateResponse};

const STATE_PATH: &str = "api/state";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server responded with {0}")]
    Status(StatusCode),
    #[error("invalid server url: {0}")]
    Url(#[from] url::ParseError),
}

/// HTTP client for the state endpoints of a calshare server.
///
/// Endpoints resolve relative to the base URL, so a server mounted under a path
/// prefix needs a trailing slash (`https://host/calshare/`).
#[derive(Debug, Clone)]
pub struct Api {
    client: Client,
    base: Url,
}

impl Api {
    pub fn new(base: Url) -> Self {
        Self {
            client: Client::new(),
            base,
        }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn state_url(&self) -> Result<Url, Error> {
        Ok(self.base.join(STATE_PATH)?)
    }

    pub async fn fetch(&self, id: &StateId) -> Result<CalendarConfiguration, Error> {
        let response = self
            .client
            .get(self.state_url()?)
            .query(&[("id", id.as_str())])
            .send()
            .await?;

        let body: StateResponse = check(response)?.json().await?;
        Ok(body.state)
    }

    pub async fn save(&self, request: &SaveRequest) -> Result<StateId, Error> {
        let response = self
            .client
            .post(self.state_url()?)
            .json(request)
            .send()
            .await?;

        let body: SaveResponse = check(response)?.json().await?;
        Ok(body.id)
    }
}

fn check(response: Response) -> Result<Response, Error> {
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Status(status));
    }
    Ok(response)
}
