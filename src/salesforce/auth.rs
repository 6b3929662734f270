use std::collections::HashMap;

use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::{AppError, Result};

/// Connected-app credentials stored in the shop's credentials metaobject.
#[derive(Clone)]
pub struct SalesforceCredentials {
    pub instance_url: String,
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for SalesforceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceCredentials")
            .field("instance_url", &self.instance_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl SalesforceCredentials {
    /// Build from metaobject fields. Every key must be present and non-empty,
    /// and the instance URL must be an https URL.
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| {
            fields
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| AppError::MissingCredentials(format!("metaobject field {} is empty", key)))
        };

        let instance_url = get("instance_url")?;
        require_https(&instance_url)?;

        Ok(Self {
            instance_url: instance_url.trim_end_matches('/').to_string(),
            client_id: get("client_id")?,
            client_secret: get("client_secret")?,
        })
    }
}

fn require_https(url: &str) -> Result<()> {
    let parsed = Url::parse(url)
        .map_err(|e| AppError::MissingCredentials(format!("invalid instance_url: {}", e)))?;
    if parsed.scheme() != "https" || parsed.host_str().is_none() {
        return Err(AppError::MissingCredentials(
            "instance_url must be an https URL".into(),
        ));
    }
    Ok(())
}

/// A bearer token plus the instance it is valid for.
#[derive(Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub instance_url: String,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"[REDACTED]")
            .field("instance_url", &self.instance_url)
            .finish()
    }
}

/// OAuth2 client-credentials exchange against `<instance_url>/services/oauth2/token`.
pub async fn exchange_client_credentials(
    client: &Client,
    credentials: &SalesforceCredentials,
) -> Result<AccessToken> {
    let response = client
        .post(format!("{}/services/oauth2/token", credentials.instance_url))
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
        ])
        .send()
        .await
        .map_err(|e| {
            tracing::error!("Error getting access token: {}", e);
            AppError::from(e)
        })?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        tracing::error!("Error getting access token: HTTP {} {}", status, body);
        return Err(AppError::Upstream {
            object: "OAuth token".to_string(),
            status,
            body,
        });
    }

    let token: AccessToken = response.json().await?;
    require_https(&token.instance_url)?;
    Ok(token)
}
