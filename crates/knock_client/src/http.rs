use std::time::Duration;

use knock_logging::{knock_debug, knock_warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{ApiError, Credentials, ErrorKind};

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Applies to JSON and upload requests. The job stream has no timeout.
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Authenticated request function shared by every endpoint.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    settings: ClientSettings,
    credentials: Credentials,
}

impl ApiClient {
    pub fn new(settings: ClientSettings, credentials: Credentials) -> Result<Self, ApiError> {
        reqwest::Url::parse(&settings.base_url)
            .map_err(|err| ApiError::new(ErrorKind::InvalidUrl, err.to_string()))?;
        // No client-wide timeout: it would also cut the long-lived job stream.
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| ApiError::new(ErrorKind::Network, err.to_string()))?;
        Ok(Self {
            http,
            settings,
            credentials,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    /// Attaches the bearer credential as a header, never as a query parameter.
    pub(crate) fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials.get() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub(crate) fn raw_get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.http.get(self.url(path)))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.http.get(self.url(path)).header(ACCEPT, "application/json");
        self.send_json(request).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body)
            .map_err(|err| ApiError::new(ErrorKind::Decode, err.to_string()))?;
        let request = self
            .http
            .post(self.url(path))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(payload);
        self.send_json(request).await
    }

    /// POST without a request body.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self
            .http
            .post(self.url(path))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        self.send_json(request).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self
            .http
            .delete(self.url(path))
            .header(ACCEPT, "application/json");
        self.send_json(request).await
    }

    /// Multipart upload; reqwest sets the boundary content type.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, ApiError> {
        let request = self.http.post(self.url(path)).multipart(form);
        self.send_json(request).await
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self
            .authorize(request)
            .timeout(self.settings.request_timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = self.check_status(response).await?;
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        serde_json::from_slice(&bytes).map_err(|err| ApiError::new(ErrorKind::Decode, err.to_string()))
    }

    /// Turns a 401 into a discarded credential and every other non-2xx into an error.
    pub(crate) async fn check_status(&self, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            knock_warn!("{} rejected the credential; discarding it", response.url().path());
            self.credentials.clear();
            return Err(ApiError::new(ErrorKind::Unauthorized, "Unauthorized"));
        }
        if status.is_success() {
            return Ok(response);
        }

        let fallback = status
            .canonical_reason()
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| status.to_string());
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|body| body.message)
            .unwrap_or(fallback);
        knock_debug!("request failed with {}: {}", status, message);
        Err(ApiError::new(ErrorKind::HttpStatus(status.as_u16()), message))
    }
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::new(ErrorKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ApiError::new(ErrorKind::Decode, err.to_string());
    }
    ApiError::new(ErrorKind::Network, err.to_string())
}
