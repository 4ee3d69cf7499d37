//! Collaborator endpoints used by the sibling dashboard screens.
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use knock_logging::knock_info;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use thiserror::Error;

use crate::http::map_reqwest_error;
use crate::{ApiClient, ApiError};

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GmailConnectResponse {
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    Openai,
    Anthropic,
    Grok,
}

impl AiProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            AiProvider::Openai => "openai",
            AiProvider::Anthropic => "anthropic",
            AiProvider::Grok => "grok",
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown AI provider {0:?}; expected openai, anthropic or grok")]
pub struct UnknownProvider(pub String);

impl FromStr for AiProvider {
    type Err = UnknownProvider;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "openai" => Ok(AiProvider::Openai),
            "anthropic" => Ok(AiProvider::Anthropic),
            "grok" => Ok(AiProvider::Grok),
            _ => Err(UnknownProvider(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiKeyRecord {
    pub provider: AiProvider,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Supported providers next to the keys the user already stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiKeyOverview {
    pub providers: Vec<AiProvider>,
    pub keys: Vec<AiKeyRecord>,
}

impl AiKeyOverview {
    /// Providers that have no stored key yet.
    pub fn available(&self) -> Vec<AiProvider> {
        self.providers
            .iter()
            .copied()
            .filter(|provider| !self.keys.iter().any(|key| key.provider == *provider))
            .collect()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveAiKeyRequest<'a> {
    provider: AiProvider,
    api_key: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SaveKeyResponse {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImportResponse {
    pub imported: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyEmail {
    pub id: String,
    pub email: String,
    pub company_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecipientStatus {
    Pending,
    Sent,
    Failed,
}

impl RecipientStatus {
    pub fn label(self) -> &'static str {
        match self {
            RecipientStatus::Pending => "PENDING",
            RecipientStatus::Sent => "SENT",
            RecipientStatus::Failed => "FAILED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub id: String,
    pub company_email_id: String,
    pub status: RecipientStatus,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub job_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub company_email: CompanyEmail,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentEmail {
    pub id: String,
    pub job_id: String,
    pub recipient_email: String,
    pub subject: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResumeUploadResponse {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeLink {
    pub id: String,
    pub shared_url: String,
}

/// A file to send as the `file` field of a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Reads `path` into memory, naming the part after the file.
    pub fn from_path(path: &Path, content_type: &str) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self {
            file_name,
            content_type: content_type.to_string(),
            bytes,
        })
    }

    fn into_form(self) -> Result<Form, ApiError> {
        let part = Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.content_type)
            .map_err(map_reqwest_error)?;
        Ok(Form::new().part("file", part))
    }
}

impl ApiClient {
    /// Signs in and keeps the issued token for later requests.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        self.authenticate("/auth/login", email, password).await
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        self.authenticate("/auth/register", email, password).await
    }

    async fn authenticate(
        &self,
        path: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        let response: AuthResponse = self.post(path, &AuthRequest { email, password }).await?;
        self.credentials().set(response.access_token.clone());
        knock_info!("signed in via {}", path);
        Ok(response)
    }

    /// Returns the Gmail OAuth consent URL.
    pub async fn gmail_connect_url(&self) -> Result<String, ApiError> {
        let response: GmailConnectResponse = self.get("/integrations/gmail/connect").await?;
        Ok(response.url)
    }

    pub async fn ai_providers(&self) -> Result<Vec<AiProvider>, ApiError> {
        self.get("/ai/providers").await
    }

    pub async fn ai_keys(&self) -> Result<Vec<AiKeyRecord>, ApiError> {
        self.get("/ai/keys").await
    }

    pub async fn ai_key_overview(&self) -> Result<AiKeyOverview, ApiError> {
        let (providers, keys) = futures_util::try_join!(self.ai_providers(), self.ai_keys())?;
        Ok(AiKeyOverview { providers, keys })
    }

    pub async fn save_ai_key(
        &self,
        provider: AiProvider,
        api_key: &str,
    ) -> Result<SaveKeyResponse, ApiError> {
        self.post("/ai/key", &SaveAiKeyRequest { provider, api_key })
            .await
    }

    pub async fn delete_ai_key(&self, provider: AiProvider) -> Result<SaveKeyResponse, ApiError> {
        self.delete(&format!("/ai/keys/{}", provider.as_str())).await
    }

    pub async fn recipients(&self) -> Result<Vec<Recipient>, ApiError> {
        self.get("/recipients").await
    }

    /// Uploads a CSV of recipients.
    pub async fn import_recipients(&self, file: UploadFile) -> Result<ImportResponse, ApiError> {
        let response: ImportResponse = self.upload("/recipients/import", file.into_form()?).await?;
        knock_info!("imported {} recipients", response.imported);
        Ok(response)
    }

    pub async fn upload_resume(&self, file: UploadFile) -> Result<ResumeUploadResponse, ApiError> {
        self.upload("/users/resume", file.into_form()?).await
    }

    pub async fn resume_links(&self) -> Result<Vec<ResumeLink>, ApiError> {
        self.get("/users/resume-links").await
    }

    pub async fn sent_emails(&self) -> Result<Vec<SentEmail>, ApiError> {
        self.get("/emails/sent").await
    }
}
