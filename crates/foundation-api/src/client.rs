// HTTP client for the Foundation REST surface.
//
// Base path: {base_url}/v1/
// Auth: X-Api-Key header on every request

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::VariableRequest;
use crate::transport::TransportConfig;

/// Header carrying the static credential.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Status code and raw body of a completed HTTP exchange.
///
/// The body is returned untouched whatever the status, so callers can
/// surface server error text verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }

    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }
}

/// Async client for the Foundation HTTP API.
///
/// Stateless apart from the underlying connection pool: no caching and no
/// status interpretation happen here.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL, API key, and transport config.
    ///
    /// Injects `X-Api-Key` as a sensitive default header on every request.
    pub fn new(
        base_url: &Url,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut key_value = HeaderValue::from_str(api_key.expose_secret())
            .map_err(|e| Error::InvalidApiKey(e.to_string()))?;
        key_value.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key_value);

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url),
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &Url, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: normalize_base_url(base_url),
        }
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// `GET /v1/environment`
    pub async fn environment(&self) -> Result<RawResponse, Error> {
        self.get("v1/environment").await
    }

    /// `GET /v1/configuration`
    pub async fn configuration(&self) -> Result<RawResponse, Error> {
        self.get("v1/configuration").await
    }

    /// `POST /v1/variable` with `{name, uid?}`.
    pub async fn variable(&self, request: &VariableRequest<'_>) -> Result<RawResponse, Error> {
        self.post("v1/variable", request).await
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get(&self, path: &str) -> Result<RawResponse, Error> {
        let url = self.base_url.join(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        read_response(resp).await
    }

    async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<RawResponse, Error> {
        let url = self.base_url.join(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        read_response(resp).await
    }
}

async fn read_response(resp: reqwest::Response) -> Result<RawResponse, Error> {
    let status = resp.status();
    let body = resp.text().await?;
    debug!(status = status.as_u16(), len = body.len(), "response received");
    Ok(RawResponse { status, body })
}

/// Ensure the base path ends with `/` so relative joins append instead of
/// replacing the last segment (`https://host/api` + `v1/x` -> `/api/v1/x`).
fn normalize_base_url(raw: &Url) -> Url {
    let mut url = raw.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    url
}
