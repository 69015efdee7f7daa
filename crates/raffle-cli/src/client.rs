//! Async HTTP client wrapping the raffle JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use raffle_core::{
  entry::RaffleEntry,
  ledger::UserRecord,
  prize::{NewPrize, Prize},
  raffle::{PublicRaffleWinner, RaffleConfiguration, RaffleResult},
};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;

/// Connection settings for the raffle API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

/// Async HTTP client for the raffle JSON REST API.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

#[derive(Debug, Deserialize)]
pub struct AwardResponse {
  pub category: String,
  pub total:    i64,
}

#[derive(Debug, Default, Serialize)]
pub struct Profile {
  pub display_name: Option<String>,
  pub email:        Option<String>,
  pub school:       Option<String>,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  /// `{base_url}/api/{segments...}`, each segment percent-encoded.
  fn url(&self, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(&self.config.base_url)
      .with_context(|| format!("invalid server url {}", self.config.base_url))?;
    url
      .path_segments_mut()
      .map_err(|()| anyhow!("server url cannot be a base: {}", self.config.base_url))?
      .pop_if_empty()
      .push("api")
      .extend(segments);
    Ok(url)
  }

  fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
    let req = self.client.request(method, self.url(segments)?);
    Ok(if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    })
  }

  /// Send `req` and decode a JSON body, turning error statuses into the
  /// server's `{"error": ...}` message.
  async fn send<T: DeserializeOwned>(
    &self,
    label: &str,
    req: RequestBuilder,
  ) -> Result<T> {
    let resp = req
      .send()
      .await
      .with_context(|| format!("{label} failed"))?;
    let resp = check(label, resp).await?;
    resp
      .json()
      .await
      .with_context(|| format!("deserialising {label} response"))
  }

  // ── Public ────────────────────────────────────────────────────────────────

  /// `GET /api/raffle/prizes`
  pub async fn prizes(&self) -> Result<Vec<Prize>> {
    self
      .send("GET /raffle/prizes", self.request(Method::GET, &["raffle", "prizes"])?)
      .await
  }

  /// `GET /api/raffle/winners`
  pub async fn winners(&self) -> Result<Vec<PublicRaffleWinner>> {
    self
      .send("GET /raffle/winners", self.request(Method::GET, &["raffle", "winners"])?)
      .await
  }

  // ── Admin: raffle ─────────────────────────────────────────────────────────

  /// `GET /api/admin/raffle`
  pub async fn config(&self) -> Result<Option<RaffleConfiguration>> {
    self
      .send("GET /admin/raffle", self.request(Method::GET, &["admin", "raffle"])?)
      .await
  }

  /// `POST /api/admin/raffle/initialize`
  pub async fn initialize(&self, prizes: Vec<NewPrize>) -> Result<RaffleConfiguration> {
    let req = self
      .request(Method::POST, &["admin", "raffle", "initialize"])?
      .json(&json!({ "prizes": prizes }));
    self.send("POST /admin/raffle/initialize", req).await
  }

  /// `PUT /api/admin/raffle/prizes`
  pub async fn save_prizes(&self, prizes: Vec<NewPrize>) -> Result<RaffleConfiguration> {
    let req = self
      .request(Method::PUT, &["admin", "raffle", "prizes"])?
      .json(&prizes);
    self.send("PUT /admin/raffle/prizes", req).await
  }

  /// `GET /api/admin/raffle/entries`
  pub async fn entries(&self) -> Result<Vec<RaffleEntry>> {
    self
      .send(
        "GET /admin/raffle/entries",
        self.request(Method::GET, &["admin", "raffle", "entries"])?,
      )
      .await
  }

  /// `POST /api/admin/raffle/roll`
  pub async fn roll(&self) -> Result<Vec<RaffleResult>> {
    self
      .send(
        "POST /admin/raffle/roll",
        self.request(Method::POST, &["admin", "raffle", "roll"])?,
      )
      .await
  }

  /// `GET /api/admin/raffle/results`
  pub async fn results(&self) -> Result<Vec<RaffleResult>> {
    self
      .send(
        "GET /admin/raffle/results",
        self.request(Method::GET, &["admin", "raffle", "results"])?,
      )
      .await
  }

  /// `POST /api/admin/raffle/reset`
  pub async fn reset(&self, prizes: Vec<NewPrize>) -> Result<RaffleConfiguration> {
    let req = self
      .request(Method::POST, &["admin", "raffle", "reset"])?
      .json(&json!({ "prizes": prizes }));
    self.send("POST /admin/raffle/reset", req).await
  }

  // ── Admin: ledger ─────────────────────────────────────────────────────────

  /// `GET /api/admin/users/{id}`
  pub async fn user(&self, user_id: &str) -> Result<UserRecord> {
    let req = self.request(Method::GET, &["admin", "users", user_id])?;
    self.send(&format!("GET /admin/users/{user_id}"), req).await
  }

  /// `PUT /api/admin/users/{id}`
  pub async fn upsert_user(&self, user_id: &str, profile: &Profile) -> Result<UserRecord> {
    let req = self
      .request(Method::PUT, &["admin", "users", user_id])?
      .json(profile);
    self.send(&format!("PUT /admin/users/{user_id}"), req).await
  }

  /// `POST /api/admin/users/{id}/points`
  pub async fn award(
    &self,
    user_id: &str,
    category: &str,
    amount: i64,
  ) -> Result<AwardResponse> {
    let req = self
      .request(Method::POST, &["admin", "users", user_id, "points"])?
      .json(&json!({ "category": category, "amount": amount }));
    self
      .send(&format!("POST /admin/users/{user_id}/points"), req)
      .await
  }
}

async fn check(label: &str, resp: Response) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let message = resp
    .json::<ErrorBody>()
    .await
    .map(|b| b.error)
    .unwrap_or_else(|_| status.canonical_reason().unwrap_or("error").to_string());
  Err(anyhow!("{label} → {status}: {message}"))
}
