use crate::domain::ports::RiskVerifier;
use crate::domain::risk::{RiskRequest, RiskVerdict};
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerificationBody<'a> {
    recaptcha_token: &'a str,
    action: &'static str,
    user_data: &'a Map<String, Value>,
}

/// Bot-mitigation verifier backed by a remote endpoint.
#[derive(Debug, Clone)]
pub struct HttpRiskVerifier {
    inner: reqwest::Client,
    endpoint: Url,
}

impl HttpRiskVerifier {
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            CheckoutError::Config(format!("invalid risk endpoint {}: {}", endpoint, e))
        })?;
        Ok(Self {
            inner: reqwest::Client::new(),
            endpoint,
        })
    }
}

#[async_trait]
impl RiskVerifier for HttpRiskVerifier {
    async fn verify(&self, request: &RiskRequest) -> Result<RiskVerdict> {
        let body = VerificationBody {
            recaptcha_token: &request.token,
            action: request.action.as_str(),
            user_data: &request.context,
        };
        debug!(action = %request.action, endpoint = %self.endpoint, "verifying request");
        let response = self
            .inner
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return Ok(serde_json::from_str(&text)?);
        }

        // Refusals carry `{success: false, reason}`; keep the reason when present.
        let verdict = serde_json::from_str::<RiskVerdict>(&text)
            .ok()
            .and_then(|v| v.reason)
            .map(RiskVerdict::failed)
            .unwrap_or_else(|| {
                RiskVerdict::failed(format!("verification endpoint returned HTTP {}", status))
            });
        warn!(%status, reason = ?verdict.reason, "risk verification refused");
        Ok(verdict)
    }
}
