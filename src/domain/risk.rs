//! Bot-mitigation verdicts and the policy applied to them before any
//! sensitive action is attempted.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskAction {
    SelectDistributionCenter,
    SubmitCardPayment,
}

impl RiskAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SelectDistributionCenter => "select_cd_info",
            Self::SubmitCardPayment => "submit_card_payment",
        }
    }
}

impl fmt::Display for RiskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A verification request: the client token plus non-sensitive context.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskRequest {
    pub token: String,
    pub action: RiskAction,
    pub context: Map<String, Value>,
}

impl RiskRequest {
    pub fn new(token: impl Into<String>, action: RiskAction) -> Self {
        Self {
            token: token.into(),
            action,
            context: Map::new(),
        }
    }

    pub fn with_context(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskVerdict {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl RiskVerdict {
    pub fn passed(score: f64) -> Self {
        Self {
            success: true,
            score: Some(score),
            reason: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            score: None,
            reason: Some(reason.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskPolicy {
    pub score_threshold: f64,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            score_threshold: DEFAULT_SCORE_THRESHOLD,
        }
    }
}

impl RiskPolicy {
    pub fn new(score_threshold: f64) -> Self {
        Self { score_threshold }
    }

    /// Admits a verdict or returns the reason it is refused.
    ///
    /// A successful verdict without a score is admitted.
    pub fn evaluate(&self, verdict: &RiskVerdict) -> Result<(), String> {
        if !verdict.success {
            return Err(verdict
                .reason
                .clone()
                .unwrap_or_else(|| "verification failed".to_string()));
        }
        match verdict.score {
            Some(score) if score < self.score_threshold => Err(format!(
                "score too low: got {}, required {}",
                score, self.score_threshold
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_hard_stops_on_failure() {
        let policy = RiskPolicy::default();
        assert_eq!(
            policy.evaluate(&RiskVerdict::failed("Invalid token")),
            Err("Invalid token".to_string())
        );
        assert_eq!(
            policy.evaluate(&RiskVerdict::default()),
            Err("verification failed".to_string())
        );
    }

    #[test]
    fn test_policy_threshold() {
        let policy = RiskPolicy::new(0.7);
        assert!(policy.evaluate(&RiskVerdict::passed(0.9)).is_ok());
        assert!(policy.evaluate(&RiskVerdict::passed(0.7)).is_ok());
        assert!(policy.evaluate(&RiskVerdict::passed(0.3)).is_err());
        let unscored = RiskVerdict {
            success: true,
            score: None,
            reason: None,
        };
        assert!(policy.evaluate(&unscored).is_ok());
    }

    #[test]
    fn test_request_context() {
        let request = RiskRequest::new("tok", RiskAction::SubmitCardPayment)
            .with_context("amount", "100")
            .with_context("step", 3);
        assert_eq!(request.action.as_str(), "submit_card_payment");
        assert_eq!(request.context.len(), 2);
        assert_eq!(request.context["step"], 3);
    }
}
