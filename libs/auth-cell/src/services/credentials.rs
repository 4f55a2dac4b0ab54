// =====================================================================================
// CREDENTIAL VERIFIER - EXTERNAL IDENTITY AUTHORITY
// =====================================================================================

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use crate::models::VerifiedIdentity;
use shared_config::AppConfig;

/// Opaque credential authority. `verify_credentials` answers only whether the
/// pair is valid (returning the verified identity when it is); every policy
/// decision around throttling and lockout stays in the session manager.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<VerifiedIdentity>, CredentialError>;

    async fn change_password(
        &self,
        username: &str,
        new_password: &str,
    ) -> Result<bool, CredentialError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("identity provider error: {0}")]
    Provider(String),
}

pub struct HttpCredentialVerifier {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    valid: bool,
    user_id: Option<String>,
    role: Option<shared_models::Role>,
}

#[derive(Debug, Deserialize)]
struct PasswordUpdateResponse {
    updated: bool,
}

impl HttpCredentialVerifier {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.identity_provider_url.clone(),
            api_key: config.identity_provider_api_key.clone(),
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", value);
        }
        headers
    }
}

#[async_trait]
impl CredentialVerifier for HttpCredentialVerifier {
    async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<VerifiedIdentity>, CredentialError> {
        let url = format!("{}/v1/credentials/verify", self.base_url);
        debug!("verifying credentials against {}", url);

        let response = self
            .client
            .post(&url)
            .headers(self.headers())
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .map_err(|e| CredentialError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            error!("identity provider error ({})", status);
            return Err(CredentialError::Provider(format!(
                "verification request failed with status {}",
                status
            )));
        }

        let body: VerifyResponse = response
            .json()
            .await
            .map_err(|e| CredentialError::Provider(e.to_string()))?;

        if !body.valid {
            return Ok(None);
        }

        match (body.user_id, body.role) {
            (Some(user_id), Some(role)) => Ok(Some(VerifiedIdentity { user_id, role })),
            _ => Err(CredentialError::Provider(
                "identity provider returned a valid verdict without an identity".to_string(),
            )),
        }
    }

    async fn change_password(
        &self,
        username: &str,
        new_password: &str,
    ) -> Result<bool, CredentialError> {
        let url = format!("{}/v1/credentials/password", self.base_url);

        let response = self
            .client
            .post(&url)
            .headers(self.headers())
            .json(&json!({ "username": username, "new_password": new_password }))
            .send()
            .await
            .map_err(|e| CredentialError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            error!("identity provider error ({})", status);
            return Err(CredentialError::Provider(format!(
                "password update failed with status {}",
                status
            )));
        }

        let body: PasswordUpdateResponse = response
            .json()
            .await
            .map_err(|e| CredentialError::Provider(e.to_string()))?;

        Ok(body.updated)
    }
}
