use crate::captcha::CaptchaSolver;
use crate::config::Endpoints;
use crate::session::Form;
use crate::{HarvestError, Result};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ORIGIN, REFERER};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Cookie the server issues on session establishment
const SESSION_COOKIE: &str = "JSESSION";

/// Marker embedded in a PDF-link response that carries a challenge instead of
/// an output file
const CHALLENGE_MARKER: &str = "securimage_show";

/// One authenticated session against the portal API
///
/// Owned exclusively by one worker for the lifetime of one crawl task.
/// `initialize` swaps in a fresh cookie jar; `request` transparently handles
/// token rotation, embedded challenges, and expiry-driven token refresh
/// before a response is returned to the caller.
pub struct SessionClient {
    http: Client,
    endpoints: Endpoints,
    solver: CaptchaSolver,
    token: Option<String>,
    refresh_attempts: u32,
    timeout: Duration,
}

impl SessionClient {
    pub fn new(
        endpoints: Endpoints,
        solver: CaptchaSolver,
        refresh_attempts: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let http = build_session_client(&endpoints.root, timeout)?;
        Ok(Self {
            http,
            endpoints,
            solver,
            token: None,
            refresh_attempts,
            timeout,
        })
    }

    /// Establishes a fresh anonymous session
    ///
    /// Discards all prior cookies and the current token, then fetches the
    /// search page so the server issues a new session cookie. Fails with
    /// `SessionInit` if the cookie does not arrive on that one request.
    pub async fn initialize(&mut self) -> Result<()> {
        self.http = build_session_client(&self.endpoints.root, self.timeout)?;
        self.token = None;

        let response = self
            .http
            .get(self.endpoints.search_home.clone())
            .send()
            .await?;

        let has_session = response.cookies().any(|c| c.name() == SESSION_COOKIE);
        if !has_session {
            return Err(HarvestError::SessionInit);
        }

        tracing::debug!("Session established against {}", self.endpoints.root);
        Ok(())
    }

    /// Current authorization token, if the server has issued one
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Issues one authenticated API call, resolving server-side signals
    ///
    /// The current token is injected into the form before each attempt. A
    /// response that signals expiry triggers a token refresh cycle and a
    /// retry of the original call, up to the configured ceiling; past the
    /// ceiling the call fails with `SessionExpired` instead of looping.
    pub async fn request(&mut self, url: &Url, form: &mut Form) -> Result<Value> {
        for attempt in 0..=self.refresh_attempts {
            form.set("app_token", self.token.clone().unwrap_or_default());

            let response = self.http.post(url.clone()).form(form).send().await?;
            let body = parse_json_body(response).await?;
            self.capture_token(&body);

            if has_embedded_challenge(&body) {
                return self.resolve_embedded_challenge(form).await;
            }

            if !signals_expiry(&body) {
                return Ok(body);
            }

            if attempt == self.refresh_attempts {
                break;
            }

            tracing::debug!(
                "Server signalled session expiry, refreshing token ({}/{})",
                attempt + 1,
                self.refresh_attempts
            );
            self.refresh_token().await?;
        }

        Err(HarvestError::SessionExpired {
            attempts: self.refresh_attempts,
        })
    }

    /// Plain GET through this session (challenge images, PDF payloads)
    pub async fn fetch_bytes(&self, url: &Url) -> Result<Bytes> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| HarvestError::Http {
                url: url.to_string(),
                source,
            })?;
        Ok(response.bytes().await?)
    }

    /// Runs one token refresh cycle: solve a challenge, post the answer to
    /// the token endpoint, capture the issued token.
    pub async fn refresh_token(&mut self) -> Result<()> {
        let answer = self.solver.solve(&self.http).await?;

        let mut form = Form::new();
        form.set("captcha", answer.to_string())
            .set("search_opt", "PHRASE")
            .set("ajax_req", "true");
        if let Some(token) = &self.token {
            form.set("app_token", token.clone());
        }

        let response = self
            .http
            .post(self.endpoints.token.clone())
            .form(&form)
            .send()
            .await?;
        let body = parse_json_body(response).await?;
        self.capture_token(&body);

        if self.token.is_none() {
            tracing::warn!("Token endpoint responded without an app_token");
        }
        Ok(())
    }

    /// A PDF-link response came back as a challenge: solve it and reissue the
    /// call to the solved-challenge endpoint, returning that final response.
    async fn resolve_embedded_challenge(&mut self, form: &mut Form) -> Result<Value> {
        tracing::debug!("PDF-link response embedded a challenge, solving");
        let answer = self.solver.solve(&self.http).await?;

        form.set("captcha1", answer.to_string());
        form.set("app_token", self.token.clone().unwrap_or_default());

        let response = self
            .http
            .post(self.endpoints.pdf_link_solved.clone())
            .form(form)
            .send()
            .await?;
        let body = parse_json_body(response).await?;
        self.capture_token(&body);
        Ok(body)
    }

    fn capture_token(&mut self, body: &Value) {
        if let Some(token) = body.get("app_token").and_then(Value::as_str) {
            self.token = Some(token.to_string());
        }
    }
}

/// Builds the underlying HTTP client with a fresh cookie jar
fn build_session_client(root: &Url, timeout: Duration) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/javascript, */*; q=0.01"),
    );
    headers.insert(
        "X-Requested-With",
        HeaderValue::from_static("XMLHttpRequest"),
    );
    if let Ok(origin) = HeaderValue::from_str(root.as_str().trim_end_matches('/')) {
        headers.insert(ORIGIN, origin.clone());
        headers.insert(REFERER, origin);
    }

    let client = Client::builder()
        .user_agent("Mozilla/5.0")
        .default_headers(headers)
        .cookie_store(true)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()?;
    Ok(client)
}

/// Parses a response body as JSON; non-JSON bodies collapse to an empty
/// object so signal probing stays uniform.
async fn parse_json_body(response: reqwest::Response) -> Result<Value> {
    let text = response.text().await?;
    Ok(serde_json::from_str(&text).unwrap_or_else(|_| Value::Object(Default::default())))
}

fn has_embedded_challenge(body: &Value) -> bool {
    body.get("filename")
        .and_then(Value::as_str)
        .map_or(false, |f| f.contains(CHALLENGE_MARKER))
}

fn signals_expiry(body: &Value) -> bool {
    let expired = body.get("session_expire").and_then(Value::as_str) == Some("Y");
    expired || body.get("errormsg").is_some()
}
