//! HTTP client for the ledger API.

use anyhow::{anyhow, Context, Result};
use dayledger::core::{DayKey, EntryDraft, MergeMode};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct SessionReply {
    token: String,
}

#[derive(Debug, Deserialize)]
pub struct RangeReply {
    pub min: DayKey,
    pub max: DayKey,
    pub dates: Vec<DayKey>,
}

#[derive(Debug, Deserialize)]
struct ErrorReply {
    error: String,
}

/// Authenticated client. Cheap to clone; loads run on their own tasks.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    /// Logs in (or registers first) and returns a client carrying the bearer
    /// token.
    pub async fn connect(
        server: &str,
        username: &str,
        password: &str,
        register: bool,
    ) -> Result<Self> {
        let http = reqwest::Client::new();
        let base_url = server.trim_end_matches('/').to_string();
        let path = if register {
            "/api/auth/register"
        } else {
            "/api/auth/login"
        };

        let response = http
            .post(format!("{base_url}{path}"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .with_context(|| format!("Failed to reach {base_url}"))?;
        let session: SessionReply = Self::decode(response).await?;

        Ok(Self {
            http,
            base_url,
            token: session.token,
        })
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return response.json().await.context("Malformed server response");
        }
        let message = response
            .json::<ErrorReply>()
            .await
            .map(|e| e.error)
            .unwrap_or_else(|_| status.to_string());
        Err(anyhow!("{message}"))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// The day's fields. An absent day comes back as the empty draft; a
    /// stored one carries extra fields the draft shape ignores.
    pub async fn day(&self, date: DayKey) -> Result<EntryDraft> {
        let response = self
            .http
            .get(self.url(&format!("/api/days/{date}")))
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Failed to load day")?;
        Self::decode(response).await
    }

    pub async fn save_day(&self, date: DayKey, draft: &EntryDraft, mode: MergeMode) -> Result<()> {
        let body = json!({
            "date": date,
            "notes": draft.notes,
            "spent_items": draft.spent_items,
            "mode": mode,
        });
        let response = self
            .http
            .post(self.url("/api/days"))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .context("Failed to save day")?;
        Self::decode::<serde_json::Value>(response).await?;
        Ok(())
    }

    pub async fn delete_day(&self, date: DayKey) -> Result<()> {
        let response = self
            .http
            .delete(self.url(&format!("/api/days/{date}")))
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Failed to delete day")?;
        Self::decode::<serde_json::Value>(response).await?;
        Ok(())
    }

    pub async fn range(&self) -> Result<RangeReply> {
        let response = self
            .http
            .get(self.url("/api/days/range"))
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Failed to load date range")?;
        Self::decode(response).await
    }
}
