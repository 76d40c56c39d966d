//! In-process stand-ins for the payment backend and the risk verifier,
//! selected with `endpoint = simulated`.
//!
//! Responses can be scripted per call; once a script runs out the gateway
//! approves everything.

use crate::domain::attempt::{ChallengeResponse, ConfirmResponse, Confirmation, SubmitResponse};
use crate::domain::form::CardFields;
use crate::domain::ports::{PaymentGateway, RiskVerifier};
use crate::domain::reply::{BackendError, BackendReply};
use crate::domain::risk::{RiskRequest, RiskVerdict};
use crate::error::{CheckoutError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Scripted answer to one `submit` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulatedSubmit {
    Challenge { attempt_id: String, html: String },
    Reject(BackendError),
    /// A success body without the correlation fields.
    Malformed,
    /// The backend cannot be reached.
    Unreachable,
}

/// Scripted answer to one `confirm` call.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulatedConfirm {
    Approve(Confirmation),
    Reject(BackendError),
    Unreachable,
}

#[derive(Debug, Default)]
pub struct SimulatedGateway {
    submits: Mutex<VecDeque<SimulatedSubmit>>,
    confirms: Mutex<VecDeque<SimulatedConfirm>>,
    submit_calls: AtomicUsize,
    confirm_calls: AtomicUsize,
}

impl SimulatedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_submit(&self, script: SimulatedSubmit) {
        lock(&self.submits).push_back(script);
    }

    pub fn push_confirm(&self, script: SimulatedConfirm) {
        lock(&self.confirms).push_back(script);
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn confirm_calls(&self) -> usize {
        self.confirm_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn submit(&self, fields: &CardFields, _risk_token: &str) -> Result<SubmitResponse> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        let script = lock(&self.submits).pop_front();
        let script = script.unwrap_or_else(|| {
            let attempt_id = uuid::Uuid::new_v4().to_string();
            SimulatedSubmit::Challenge {
                html: challenge_document(&attempt_id),
                attempt_id,
            }
        });
        debug!(customer = %fields.customer_code, ?script, "simulated submit");

        match script {
            SimulatedSubmit::Challenge { attempt_id, html } => {
                Ok(BackendReply::Ok(ChallengeResponse {
                    payment_url: Some(format!("https://simulated.invalid/pay/{}", attempt_id)),
                    request_id: Some(attempt_id),
                    html: Some(html),
                    final_links: Vec::new(),
                }))
            }
            SimulatedSubmit::Reject(err) => Ok(BackendReply::Rejected(err)),
            SimulatedSubmit::Malformed => Ok(BackendReply::Ok(ChallengeResponse::default())),
            SimulatedSubmit::Unreachable => Err(unreachable_backend()),
        }
    }

    async fn confirm(&self, attempt_id: &str) -> Result<ConfirmResponse> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        let script = lock(&self.confirms).pop_front();
        match script {
            Some(SimulatedConfirm::Approve(confirmation)) => Ok(BackendReply::Ok(confirmation)),
            Some(SimulatedConfirm::Reject(err)) => Ok(BackendReply::Rejected(err)),
            Some(SimulatedConfirm::Unreachable) => Err(unreachable_backend()),
            None => Ok(BackendReply::Ok(Confirmation {
                authorization_code: format!(
                    "SIM{}",
                    attempt_id.chars().take(6).collect::<String>()
                ),
                transaction_identifier: attempt_id.to_string(),
                response_message: "Approved".to_string(),
                order_identifier: attempt_id.to_string(),
                ..Confirmation::default()
            })),
        }
    }
}

/// Risk verifier that answers every request with a fixed verdict.
#[derive(Debug, Clone)]
pub struct SimulatedRiskVerifier {
    verdict: RiskVerdict,
}

impl SimulatedRiskVerifier {
    pub fn new(score: f64) -> Self {
        Self {
            verdict: RiskVerdict::passed(score),
        }
    }

    pub fn with_verdict(verdict: RiskVerdict) -> Self {
        Self { verdict }
    }
}

impl Default for SimulatedRiskVerifier {
    fn default() -> Self {
        Self::new(0.9)
    }
}

#[async_trait]
impl RiskVerifier for SimulatedRiskVerifier {
    async fn verify(&self, request: &RiskRequest) -> Result<RiskVerdict> {
        debug!(action = %request.action, "simulated risk verification");
        Ok(self.verdict.clone())
    }
}

fn challenge_document(attempt_id: &str) -> String {
    format!(
        "<html><body><p>Simulated strong authentication for {}</p></body></html>",
        attempt_id
    )
}

fn unreachable_backend() -> CheckoutError {
    CheckoutError::Io(io::Error::new(
        io::ErrorKind::ConnectionRefused,
        "simulated backend unreachable",
    ))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
