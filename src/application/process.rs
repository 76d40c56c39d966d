use crate::domain::attempt::{AttemptOutcome, PaymentAttemptState, PaymentPhase};
use crate::domain::form::CardFields;
use crate::domain::ports::{AlertSinkRef, PaymentGatewayRef};
use crate::domain::reply::BackendReply;
use tokio::sync::watch;
use tracing::{error, info, warn};

pub const INVALID_RESPONSE_TITLE: &str = "Invalid server response";
pub const INVALID_RESPONSE_MESSAGE: &str = "No valid response was received from the server";
pub const CONNECTION_ERROR_TITLE: &str = "Connection error";
pub const CONNECTION_ERROR_MESSAGE: &str =
    "An error occurred while processing the payment. Please try again.";
pub const STRONG_AUTH_FAILED: &str =
    "Strong authentication failed. Please try again or use another card.";

/// What `start_payment` tells its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The attempt was refused or never reached the backend; the user must resubmit.
    Failed,
    /// The backend answered without the strong-auth correlation fields.
    InvalidResponse,
    /// The strong-auth document is ready to be shown.
    AwaitingStrongAuth,
}

impl StartOutcome {
    pub fn is_failed(self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// Drives one payment attempt from submission to completion.
///
/// The phase is published on a watch channel so a UI can observe
/// `Submitting` while a submission is in flight.
pub struct PaymentProcess {
    gateway: PaymentGatewayRef,
    alerts: AlertSinkRef,
    phase: watch::Sender<PaymentPhase>,
    attempt_id: Option<String>,
    strong_auth_payload: Option<String>,
    payment_error: Option<String>,
    paying: bool,
}

impl PaymentProcess {
    pub fn new(gateway: PaymentGatewayRef, alerts: AlertSinkRef) -> Self {
        let (phase, _) = watch::channel(PaymentPhase::Idle);
        Self {
            gateway,
            alerts,
            phase,
            attempt_id: None,
            strong_auth_payload: None,
            payment_error: None,
            paying: false,
        }
    }

    pub fn phase(&self) -> PaymentPhase {
        *self.phase.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<PaymentPhase> {
        self.phase.subscribe()
    }

    pub fn attempt(&self) -> PaymentAttemptState {
        PaymentAttemptState {
            phase: self.phase(),
            attempt_id: self.attempt_id.clone(),
            strong_auth_payload: self.strong_auth_payload.clone(),
        }
    }

    pub fn attempt_id(&self) -> Option<&str> {
        self.attempt_id.as_deref()
    }

    pub fn strong_auth_payload(&self) -> Option<&str> {
        self.strong_auth_payload.as_deref()
    }

    pub fn payment_error(&self) -> Option<&str> {
        self.payment_error.as_deref()
    }

    /// Whether the session has moved on to the result screen.
    pub fn is_paying(&self) -> bool {
        self.paying
    }

    pub fn is_strong_auth_visible(&self) -> bool {
        self.phase() == PaymentPhase::AwaitingStrongAuth
    }

    /// Submits the fields to the payment backend.
    ///
    /// Every exit path leaves the phase out of `Submitting`. Backend and
    /// transport failures end up as a user alert and never escape.
    pub async fn start_payment(&mut self, fields: &CardFields, risk_token: &str) -> StartOutcome {
        self.payment_error = None;
        self.attempt_id = None;
        self.strong_auth_payload = None;
        self.set_phase(PaymentPhase::Submitting);
        let _submitting = SubmittingGuard(&self.phase);

        let (phase, outcome) = match self.gateway.submit(fields, risk_token).await {
            Ok(BackendReply::Rejected(err)) => {
                info!(title = %err.title, "payment rejected by backend");
                self.alerts.show_error(&err.title, &err.message);
                (PaymentPhase::Idle, StartOutcome::Failed)
            }
            Ok(BackendReply::Ok(response)) => match response.into_challenge() {
                Some(challenge) => {
                    info!(attempt_id = %challenge.attempt_id, "awaiting strong authentication");
                    self.attempt_id = Some(challenge.attempt_id);
                    self.strong_auth_payload = Some(challenge.html);
                    (
                        PaymentPhase::AwaitingStrongAuth,
                        StartOutcome::AwaitingStrongAuth,
                    )
                }
                None => {
                    warn!("payment accepted without strong-auth correlation fields");
                    self.alerts
                        .show_error(INVALID_RESPONSE_TITLE, INVALID_RESPONSE_MESSAGE);
                    (PaymentPhase::Idle, StartOutcome::InvalidResponse)
                }
            },
            Err(e) => {
                error!(error = %e, "payment submission failed");
                self.alerts
                    .show_error(CONNECTION_ERROR_TITLE, CONNECTION_ERROR_MESSAGE);
                (PaymentPhase::Idle, StartOutcome::Failed)
            }
        };

        self.set_phase(phase);
        outcome
    }

    /// The user dismissed the strong-auth document; the attempt is no longer tracked.
    pub fn close_strong_auth_modal(&mut self) {
        if self.phase() == PaymentPhase::AwaitingStrongAuth {
            info!(attempt_id = ?self.attempt_id, "strong authentication dismissed");
            self.set_phase(PaymentPhase::Idle);
        }
    }

    /// Records the terminal strong-auth result.
    ///
    /// A failure both sets the retry message and moves the session to the
    /// result screen.
    pub fn handle_attempt_completion(&mut self, success: bool) {
        if success {
            info!(attempt_id = ?self.attempt_id, "payment completed");
            self.payment_error = None;
            self.set_phase(PaymentPhase::Completed(AttemptOutcome::Success));
        } else {
            warn!(attempt_id = ?self.attempt_id, "strong authentication failed");
            self.payment_error = Some(STRONG_AUTH_FAILED.to_string());
            self.set_phase(PaymentPhase::Completed(AttemptOutcome::Failure));
        }
        self.paying = true;
    }

    fn set_phase(&self, phase: PaymentPhase) {
        self.phase.send_replace(phase);
    }
}

/// Returns a `Submitting` phase to `Idle` when a submission is abandoned
/// before the backend answers.
struct SubmittingGuard<'a>(&'a watch::Sender<PaymentPhase>);

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.0.send_if_modified(|phase| {
            if *phase == PaymentPhase::Submitting {
                warn!("payment submission abandoned");
                *phase = PaymentPhase::Idle;
                true
            } else {
                false
            }
        });
    }
}
