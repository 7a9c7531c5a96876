// Async HTTP client for the lead-capture backend.
//
// Base path: {api_url}/api/
// Auth: `Authorization: Bearer <token>` read from a `TokenSource` right
// before each request is dispatched.

use std::sync::Arc;

use reqwest::Method;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::auth::TokenSource;
use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types;

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// ── Query parameters for the leads listing ───────────────────────────

/// Optional filters for `GET /leads`. Absent values are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadQuery {
    pub form_id: Option<String>,
    /// Inclusive lower bound, `YYYY-MM-DD`.
    pub start_date: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD`.
    pub end_date: Option<String>,
}

impl LeadQuery {
    fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(ref id) = self.form_id {
            params.push(("formId", id.clone()));
        }
        if let Some(ref start) = self.start_date {
            params.push(("startDate", start.clone()));
        }
        if let Some(ref end) = self.end_date {
            params.push(("endDate", end.clone()));
        }
        params
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the lead-capture backend.
///
/// One instance is built at startup with the backend root URL and a
/// [`TokenSource`]; it is cheap to clone and safe to share between
/// concurrently pending requests. The client performs no retries.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenSource>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client for `api_url` (the backend root, e.g.
    /// `http://localhost:5002`). Requests go to `{api_url}/api/...`.
    pub fn new(
        api_url: &str,
        transport: &TransportConfig,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(api_url, http, tokens)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(
        api_url: &str,
        http: reqwest::Client,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(api_url)?;
        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    /// Append `/api/` unless the URL already ends with it.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/api") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/api/"));
        }

        Ok(url)
    }

    /// The resolved API base (always ends with `/api/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append each of `segments` as one path segment. A `/` inside a
    /// segment (an id, say) is percent-encoded rather than splitting it.
    fn url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── Generic entry point ──────────────────────────────────────────

    /// Send `method path` with an optional JSON body and query params,
    /// decoding a JSON response into `T`.
    ///
    /// The bearer token is read from the token source immediately before
    /// dispatch. Non-2xx responses become [`Error::Api`], undecodable
    /// bodies become [`Error::Deserialization`].
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let resp = self.send(method, &route(path), body, params).await?;
        Self::handle_response(resp).await
    }

    /// Like [`request`](Self::request) for status-only endpoints.
    pub async fn request_empty(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<(), Error> {
        let resp = self.send(method, &route(path), body, &[]).await?;
        Self::handle_empty(resp).await
    }

    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&Value>,
        params: &[(&str, String)],
    ) -> Result<reqwest::Response, Error> {
        let url = self.url(segments)?;
        if params.is_empty() {
            debug!("{method} {url}");
        } else {
            debug!("{method} {url} params={params:?}");
        }

        let mut builder = self.http.request(method, url);
        if !params.is_empty() {
            builder = builder.query(params);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        if let Some(token) = self.tokens.bearer_token() {
            builder = builder.bearer_auth(token.expose_secret());
        }

        Ok(builder.send().await?)
    }

    // ── Typed verbs ──────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, Error> {
        self.get_with_params(segments, &[]).await
    }

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let resp = self.send(Method::GET, segments, None, params).await?;
        Self::handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, Error> {
        let body = encode_body(body)?;
        let resp = self.send(Method::POST, segments, Some(&body), &[]).await?;
        Self::handle_response(resp).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, Error> {
        let body = encode_body(body)?;
        let resp = self.send(Method::PUT, segments, Some(&body), &[]).await?;
        Self::handle_response(resp).await
    }

    async fn delete(&self, segments: &[&str]) -> Result<(), Error> {
        let resp = self.send(Method::DELETE, segments, None, &[]).await?;
        Self::handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        let message = serde_json::from_str::<ErrorResponse>(&raw)
            .ok()
            .and_then(|err| err.error.or(err.message))
            .unwrap_or_else(|| {
                if raw.is_empty() {
                    status.to_string()
                } else {
                    raw.chars().take(200).collect()
                }
            });

        Error::Api {
            status: status.as_u16(),
            message,
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Auth ─────────────────────────────────────────────────────────

    pub async fn signup(&self, body: &types::SignupRequest) -> Result<types::AuthResponse, Error> {
        self.post(&["auth", "signup"], body).await
    }

    pub async fn login(&self, body: &types::LoginRequest) -> Result<types::AuthResponse, Error> {
        self.post(&["auth", "login"], body).await
    }

    // ── Websites ─────────────────────────────────────────────────────

    pub async fn list_websites(&self) -> Result<types::WebsitesEnvelope, Error> {
        self.get(&["websites"]).await
    }

    pub async fn create_website(
        &self,
        body: &types::CreateWebsiteBody,
    ) -> Result<types::WebsiteResponse, Error> {
        self.post(&["websites"], body).await
    }

    pub async fn update_website(
        &self,
        website_id: &str,
        body: &types::UpdateWebsiteBody,
    ) -> Result<types::WebsiteResponse, Error> {
        self.put(&["websites", website_id], body).await
    }

    pub async fn delete_website(&self, website_id: &str) -> Result<(), Error> {
        self.delete(&["websites", website_id]).await
    }

    // ── Forms ────────────────────────────────────────────────────────

    pub async fn detect_forms(
        &self,
        body: &types::DetectFormsBody,
    ) -> Result<types::DetectedFormsEnvelope, Error> {
        self.post(&["forms", "detect"], body).await
    }

    pub async fn create_form(
        &self,
        body: &types::CreateFormBody,
    ) -> Result<types::FormResponse, Error> {
        self.post(&["forms"], body).await
    }

    pub async fn list_forms_by_website(
        &self,
        website_id: &str,
    ) -> Result<types::FormsEnvelope, Error> {
        self.get(&["forms", "website", website_id]).await
    }

    pub async fn get_snippet(&self, form_id: &str) -> Result<types::SnippetEnvelope, Error> {
        self.get(&["forms", form_id, "snippet"]).await
    }

    pub async fn delete_form(&self, form_id: &str) -> Result<(), Error> {
        self.delete(&["forms", form_id]).await
    }

    // ── Leads ────────────────────────────────────────────────────────

    pub async fn list_leads(&self, query: &LeadQuery) -> Result<types::LeadsEnvelope, Error> {
        self.get_with_params(&["leads"], &query.to_params()).await
    }

    pub async fn list_leads_by_form(&self, form_id: &str) -> Result<types::LeadsEnvelope, Error> {
        self.get(&["leads", "form", form_id]).await
    }

    // ── Analytics ────────────────────────────────────────────────────

    pub async fn leads_per_form(
        &self,
    ) -> Result<types::DataEnvelope<types::LeadsPerFormEntry>, Error> {
        self.get(&["analytics", "leads-per-form"]).await
    }

    pub async fn leads_per_day(
        &self,
        days: u32,
    ) -> Result<types::DataEnvelope<types::LeadsPerDayEntry>, Error> {
        self.get_with_params(&["analytics", "leads-per-day"], &[("days", days.to_string())])
            .await
    }
}

/// Split a `/`-separated route into its segments.
fn route(path: &str) -> Vec<&str> {
    path.trim_matches('/').split('/').collect()
}

fn encode_body<B: Serialize>(body: &B) -> Result<Value, Error> {
    serde_json::to_value(body).map_err(|e| Error::Deserialization {
        message: format!("failed to encode request body: {e}"),
        body: String::new(),
    })
}
