//! `AuthProvider` over a GoTrue-compatible REST API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::profile::UserType;
use crate::services::{AuthProvider, AuthSession};

pub struct GoTrueAuth {
    http: Client,
    base_url: String,
    anon_key: String,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

/// Both the token grant and sign-up reply with this shape; sign-up omits
/// the token (and may return the bare user) when email confirmation is pending.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    user: Option<AuthUser>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.error_description.or(self.msg).or(self.message)
    }
}

impl GoTrueAuth {
    pub fn new(base_url: String, anon_key: String) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            base_url,
            anon_key,
        })
    }

    fn post(&self, route: &str) -> RequestBuilder {
        let url = format!("{}/auth/v1{}", self.base_url.trim_end_matches('/'), route);
        self.http.post(url).header("apikey", &self.anon_key)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, AppError> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Auth service unreachable: {e}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = rejection_message(&body);
        if status.is_server_error() {
            warn!("Auth service returned {status}: {body}");
            return Err(AppError::Internal(anyhow::anyhow!(
                "Auth service error ({status}): {message}"
            )));
        }
        Err(AppError::Auth(message))
    }
}

fn rejection_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| "Authentication failed".to_string())
}

fn session_from(token: TokenResponse) -> Option<AuthSession> {
    let access_token = token.access_token?;
    let user = token.user?;
    Some(AuthSession {
        access_token,
        user_id: user.id,
        email: user.email,
    })
}

#[async_trait]
impl AuthProvider for GoTrueAuth {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        user_type: UserType,
    ) -> Result<Option<AuthSession>, AppError> {
        let request = self.post("/signup").json(&json!({
            "email": email,
            "password": password,
            "data": { "user_type": user_type.as_str() },
        }));
        let response = self.send(request).await?;
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Malformed sign-up response: {e}")))?;

        let session = session_from(token);
        info!(
            "Sign-up for {email} as {}: {}",
            user_type.as_str(),
            if session.is_some() { "session issued" } else { "confirmation pending" }
        );
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        let request = self
            .post("/token?grant_type=password")
            .json(&json!({ "email": email, "password": password }));
        let response = self.send(request).await?;
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Malformed sign-in response: {e}")))?;

        session_from(token)
            .ok_or_else(|| AppError::Auth("Sign-in did not return a session".to_string()))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        let request = self.post("/logout").bearer_auth(access_token);
        self.send(request).await?;
        Ok(())
    }
}
