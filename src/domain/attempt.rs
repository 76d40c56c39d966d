use crate::domain::reply::BackendReply;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptOutcome {
    Success,
    Failure,
}

/// Where a single payment attempt stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentPhase {
    #[default]
    Idle,
    Submitting,
    AwaitingStrongAuth,
    Completed(AttemptOutcome),
}

impl PaymentPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::AwaitingStrongAuth => "awaiting_strong_auth",
            Self::Completed(AttemptOutcome::Success) => "completed_success",
            Self::Completed(AttemptOutcome::Failure) => "completed_failure",
        }
    }
}

impl fmt::Display for PaymentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PaymentPhase {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// State of the attempt started by the latest submit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PaymentAttemptState {
    pub phase: PaymentPhase,
    /// Correlates the strong-auth round trip with the submission.
    pub attempt_id: Option<String>,
    /// HTML document to render for the cardholder's bank, set while awaiting strong auth.
    pub strong_auth_payload: Option<String>,
}

/// Successful body of a payment submission, as sent by the backend.
///
/// The correlation fields are optional on the wire; a body without them is a
/// malformed success and never reaches the strong-auth step.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub payment_url: Option<String>,
    #[serde(default)]
    pub final_links: Vec<String>,
}

impl ChallengeResponse {
    /// Returns the challenge only when both the attempt id and the document are present.
    pub fn into_challenge(self) -> Option<StrongAuthChallenge> {
        let attempt_id = self.request_id.filter(|s| !s.is_empty())?;
        let html = self.html.filter(|s| !s.is_empty())?;
        Some(StrongAuthChallenge {
            attempt_id,
            html,
            payment_url: self.payment_url,
            final_links: self.final_links,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrongAuthChallenge {
    pub attempt_id: String,
    pub html: String,
    pub payment_url: Option<String>,
    pub final_links: Vec<String>,
}

/// Order confirmation returned once strong authentication succeeded.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    pub authorization_code: String,
    #[serde(default)]
    pub transaction_identifier: String,
    #[serde(default)]
    pub total_amount: Decimal,
    #[serde(default)]
    pub card_brand: String,
    #[serde(default)]
    pub response_message: String,
    #[serde(default)]
    pub order_identifier: String,
}

pub type SubmitResponse = BackendReply<ChallengeResponse>;
pub type ConfirmResponse = BackendReply<Confirmation>;
