use crate::application::checkout::Collaborators;
use crate::domain::ports::{
    AlertSinkRef, CustomerDirectoryRef, PaymentGatewayRef, RiskVerifierRef,
};
use crate::domain::risk::{DEFAULT_SCORE_THRESHOLD, RiskPolicy};
use crate::error::{CheckoutError, Result};
use crate::infrastructure::http::BackendClient;
use crate::infrastructure::in_memory::InMemoryCustomerDirectory;
use crate::infrastructure::risk::HttpRiskVerifier;
use crate::infrastructure::simulated::{SimulatedGateway, SimulatedRiskVerifier};
use clap::{Args, ValueEnum};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Which payment backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum GatewayMode {
    Backend,
    #[default]
    Simulated,
}

/// The one risk-verification endpoint used for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum VerificationEndpoint {
    Backend,
    #[default]
    Simulated,
}

/// Runtime configuration, from flags or the environment.
#[derive(Debug, Clone, Args)]
pub struct CheckoutConfig {
    /// Base URL of the payment backend
    #[arg(long, env = "API_BASE_URL")]
    pub api_base_url: Option<String>,

    /// Payment API key
    #[arg(long, env = "API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    /// Gateway API key
    #[arg(long, env = "X_API_KEY", default_value = "", hide_env_values = true)]
    pub x_api_key: String,

    /// Ask the backend to run its own Luhn check
    #[arg(long, env = "USE_LUHN_VALIDATION")]
    pub use_luhn_validation: bool,

    #[arg(long, env = "GATEWAY", value_enum, default_value_t = GatewayMode::Simulated)]
    pub gateway: GatewayMode,

    #[arg(
        long,
        env = "RISK_ENDPOINT",
        value_enum,
        default_value_t = VerificationEndpoint::Simulated
    )]
    pub risk_endpoint: VerificationEndpoint,

    /// URL of the risk-verification endpoint when `--risk-endpoint backend`
    #[arg(long, env = "RISK_URL")]
    pub risk_url: Option<String>,

    /// Minimum verification score admitted, between 0 and 1
    #[arg(long, env = "RISK_SCORE_THRESHOLD", default_value_t = DEFAULT_SCORE_THRESHOLD)]
    pub risk_score_threshold: f64,

    /// Seconds an alert stays visible
    #[arg(long, env = "ALERT_TTL_SECS", default_value_t = 5)]
    pub alert_ttl_secs: u64,
}

impl CheckoutConfig {
    pub fn validate(&self) -> Result<()> {
        if self.gateway == GatewayMode::Backend && self.api_base_url.is_none() {
            return Err(CheckoutError::Config(
                "API_BASE_URL is required with the backend gateway".to_string(),
            ));
        }
        if self.risk_endpoint == VerificationEndpoint::Backend && self.risk_url.is_none() {
            return Err(CheckoutError::Config(
                "RISK_URL is required with the backend risk endpoint".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.risk_score_threshold) {
            return Err(CheckoutError::Config(format!(
                "risk score threshold must be between 0 and 1, got {}",
                self.risk_score_threshold
            )));
        }
        Ok(())
    }

    pub fn risk_policy(&self) -> RiskPolicy {
        RiskPolicy::new(self.risk_score_threshold)
    }

    pub fn alert_ttl(&self) -> Duration {
        Duration::from_secs(self.alert_ttl_secs)
    }

    /// Builds the collaborators named by this configuration.
    pub fn collaborators(&self, alerts: AlertSinkRef) -> Result<Collaborators> {
        self.validate()?;

        let (gateway, directory) = match self.gateway {
            GatewayMode::Backend => {
                let base_url = self.api_base_url.as_deref().unwrap_or_default();
                let client = Arc::new(
                    BackendClient::new(base_url, &self.api_key, &self.x_api_key)?
                        .with_luhn_validation(self.use_luhn_validation),
                );
                let gateway: PaymentGatewayRef = client.clone();
                let directory: CustomerDirectoryRef = client;
                (gateway, directory)
            }
            GatewayMode::Simulated => {
                let gateway: PaymentGatewayRef = Arc::new(SimulatedGateway::new());
                let directory: CustomerDirectoryRef = Arc::new(InMemoryCustomerDirectory::new());
                (gateway, directory)
            }
        };

        let verifier: RiskVerifierRef = match self.risk_endpoint {
            VerificationEndpoint::Backend => {
                let url = self.risk_url.as_deref().unwrap_or_default();
                Arc::new(HttpRiskVerifier::new(url)?)
            }
            VerificationEndpoint::Simulated => Arc::new(SimulatedRiskVerifier::default()),
        };

        info!(
            gateway = ?self.gateway,
            risk_endpoint = ?self.risk_endpoint,
            "collaborators configured"
        );
        Ok(Collaborators {
            gateway,
            directory,
            verifier,
            alerts,
        })
    }
}
