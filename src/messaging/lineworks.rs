use super::content::Content;
use crate::config::BotConfig;
use crate::error::Error;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use url::Url;

/// Delivers content to the configured chat channel
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_to_channel(&self, content: &Content) -> Result<()>;
}

/// Service account assertion for the token endpoint
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    iss: String,
    sub: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Serialize)]
struct MessageRequest<'a> {
    content: &'a Content,
}

/// LINE WORKS bot API client
pub struct LineWorksBot {
    config: BotConfig,
    key: EncodingKey,
    client: reqwest::Client,
}

impl LineWorksBot {
    /// Create a client, loading the service account key
    pub fn new(config: &BotConfig) -> Result<Self> {
        let pem = std::fs::read(&config.private_key_path).map_err(|e| {
            Error::Config(format!(
                "Failed to read bot private key {}: {}",
                config.private_key_path.display(),
                e
            ))
        })?;
        let key = EncodingKey::from_rsa_pem(&pem)
            .map_err(|e| Error::Config(format!("Invalid bot private key: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config: config.clone(),
            key,
            client,
        })
    }

    fn assertion(&self) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            iss: self.config.client_id.clone(),
            sub: self.config.service_account.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(60)).timestamp(),
        };

        let token = encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| Error::Authentication(format!("Failed to sign JWT assertion: {}", e)))?;
        Ok(token)
    }

    /// Exchange a fresh assertion for an access token
    async fn access_token(&self) -> Result<String> {
        let assertion = self.assertion()?;
        let response = self
            .client
            .post(&self.config.auth_url)
            .form(&[
                ("assertion", assertion.as_str()),
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("scope", "bot"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Authentication(format!("Token request failed ({}): {}", status, body)).into());
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    fn channel_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.config.api_base)
            .map_err(|e| Error::Config(format!("Invalid bot api_base: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config("bot api_base cannot be a base URL".to_string()))?
            .pop_if_empty()
            .extend([
                "bots",
                self.config.bot_id.as_str(),
                "channels",
                self.config.channel_id.as_str(),
                "messages",
            ]);
        Ok(url)
    }
}

#[async_trait]
impl ChatTransport for LineWorksBot {
    async fn send_to_channel(&self, content: &Content) -> Result<()> {
        let token = self.access_token().await?;
        let url = self.channel_url()?;
        debug!("Sending {} message to {}", content.kind(), url);

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&MessageRequest { content })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transport(format!("Channel send failed ({}): {}", status, body)).into());
        }

        info!("Sent {} message to channel {}", content.kind(), self.config.channel_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_a_config_error() {
        let config = BotConfig {
            private_key_path: "/nonexistent/key.pem".into(),
            ..BotConfig::default()
        };
        let err = LineWorksBot::new(&config).err().unwrap();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Config(_))));
    }

    #[test]
    fn message_request_wraps_content() {
        let content = Content::text("hello");
        let value = serde_json::to_value(MessageRequest { content: &content }).unwrap();
        assert_eq!(value["content"]["type"], "text");
        assert_eq!(value["content"]["text"], "hello");
    }
}
