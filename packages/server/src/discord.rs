use reqwest::Client;
use serde::Deserialize;

use crate::config::DiscordConfig;
use crate::error::AppError;

const AUTHORIZE_URL: &str = "https://discord.com/api/oauth2/authorize";
const TOKEN_URL: &str = "https://discord.com/api/oauth2/token";
const USER_URL: &str = "https://discord.com/api/users/@me";

/// Identity tuple returned by Discord after a successful login.
/// Exactly what the login upsert consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordProfile {
    pub id: String,
    pub username: String,
    pub discriminator: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Discord OAuth collaborator: code-for-token exchange and profile fetch.
pub struct DiscordClient {
    http: Client,
    config: DiscordConfig,
}

impl DiscordClient {
    pub fn new(config: DiscordConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    pub fn authorize_url(&self) -> String {
        format!(
            "{AUTHORIZE_URL}?client_id={}&response_type=code&scope=identify&redirect_uri={}",
            self.config.client_id, self.config.redirect_uri
        )
    }

    pub async fn exchange_code(&self, code: &str) -> Result<String, AppError> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let res = self
            .http
            .post(TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Discord token exchange failed: {e}")))?;

        if !res.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Discord token exchange failed with status {}",
                res.status()
            )));
        }

        let token: TokenResponse = res
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Discord token response malformed: {e}")))?;

        Ok(token.access_token)
    }

    pub async fn fetch_profile(&self, access_token: &str) -> Result<DiscordProfile, AppError> {
        let res = self
            .http
            .get(USER_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Discord user fetch failed: {e}")))?;

        if !res.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Discord user fetch failed with status {}",
                res.status()
            )));
        }

        res.json()
            .await
            .map_err(|e| AppError::Upstream(format!("Discord user response malformed: {e}")))
    }
}
