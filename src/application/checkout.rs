use crate::application::form::PaymentForm;
use crate::application::process::{CONNECTION_ERROR_TITLE, PaymentProcess, StartOutcome};
use crate::application::strong_auth::StrongAuthBridge;
use crate::domain::attempt::{Confirmation, PaymentPhase};
use crate::domain::customer::CustomerProfile;
use crate::domain::form::{Amount, CardFields, FieldName, WizardStep};
use crate::domain::ports::{AlertSinkRef, CustomerDirectoryRef, PaymentGatewayRef, RiskVerifierRef};
use crate::domain::receipt::Receipt;
use crate::domain::reply::BackendReply;
use crate::domain::risk::{RiskAction, RiskPolicy, RiskRequest};
use crate::domain::strong_auth::BridgeMessage;
use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

pub const RISK_REJECTED_TITLE: &str = "Verification failed";
pub const RISK_UNREACHABLE_REASON: &str = "Network error during verification";
pub const LOOKUP_CONNECTION_MESSAGE: &str =
    "Could not reach the server to look up the customer. Please try again.";

/// The external services a checkout session talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub gateway: PaymentGatewayRef,
    pub directory: CustomerDirectoryRef,
    pub verifier: RiskVerifierRef,
    pub alerts: AlertSinkRef,
}

impl Collaborators {
    /// Identity confirmation: verifies the request and looks the customer up.
    ///
    /// Refusals and failures are shown as alerts and yield `None`.
    pub async fn identify_customer(
        &self,
        policy: &RiskPolicy,
        risk_token: &str,
        phone: &str,
        center_id: i64,
    ) -> Option<CustomerProfile> {
        let request = RiskRequest::new(risk_token, RiskAction::SelectDistributionCenter)
            .with_context("distributionCenter", center_id);
        if let Err(reason) = self.verify(policy, &request).await {
            self.alerts.show_error(RISK_REJECTED_TITLE, &reason);
            return None;
        }

        match self.directory.lookup(phone, center_id).await {
            Ok(BackendReply::Ok(profile)) => {
                info!(customer = %profile.customer_code, center_id, "customer identified");
                Some(profile)
            }
            Ok(BackendReply::Rejected(err)) => {
                info!(title = %err.title, center_id, "customer lookup rejected");
                self.alerts.show_error(&err.title, &err.message);
                None
            }
            Err(e) => {
                error!(error = %e, "customer lookup failed");
                self.alerts
                    .show_error(CONNECTION_ERROR_TITLE, LOOKUP_CONNECTION_MESSAGE);
                None
            }
        }
    }

    async fn verify(&self, policy: &RiskPolicy, request: &RiskRequest) -> Result<(), String> {
        let verdict = match self.verifier.verify(request).await {
            Ok(verdict) => verdict,
            Err(e) => {
                error!(error = %e, action = %request.action, "risk verification unreachable");
                return Err(RISK_UNREACHABLE_REASON.to_string());
            }
        };
        policy.evaluate(&verdict).inspect_err(|reason| {
            warn!(action = %request.action, %reason, "risk verification rejected");
        })
    }
}

/// Result of a submit click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutSubmit {
    /// The form is not on the card step or is not valid.
    NotReady,
    /// Risk verification refused the request; nothing was sent.
    RiskRejected(String),
    Started(StartOutcome),
}

/// One checkout session, from the wizard to the receipt.
pub struct Checkout {
    form: PaymentForm,
    process: PaymentProcess,
    bridge: StrongAuthBridge,
    collaborators: Collaborators,
    policy: RiskPolicy,
    confirmation: Option<Confirmation>,
    receipt: Option<Receipt>,
}

impl Checkout {
    pub fn new(collaborators: Collaborators, policy: RiskPolicy, fields: CardFields) -> Self {
        Self {
            form: PaymentForm::new(fields),
            process: PaymentProcess::new(
                collaborators.gateway.clone(),
                collaborators.alerts.clone(),
            ),
            bridge: StrongAuthBridge::new(collaborators.gateway.clone()),
            collaborators,
            policy,
            confirmation: None,
            receipt: None,
        }
    }

    /// Starts a session seeded from an identified customer.
    pub fn for_customer(
        collaborators: Collaborators,
        policy: RiskPolicy,
        customer: &CustomerProfile,
    ) -> Self {
        Self::new(collaborators, policy, CardFields::for_customer(customer))
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.form = self.form.with_today(today);
        self
    }

    pub fn form(&self) -> &PaymentForm {
        &self.form
    }

    pub fn process(&self) -> &PaymentProcess {
        &self.process
    }

    pub fn confirmation(&self) -> Option<&Confirmation> {
        self.confirmation.as_ref()
    }

    pub fn receipt(&self) -> Option<&Receipt> {
        self.receipt.as_ref()
    }

    pub fn update_field(&mut self, name: FieldName, raw: &str) -> bool {
        self.form.update_field(name, raw)
    }

    pub fn go_to_next_step(&mut self) {
        self.form.go_to_next_step();
    }

    pub fn go_to_previous_step(&mut self) {
        self.form.go_to_previous_step();
    }

    /// Verifies the request, then starts a payment attempt.
    ///
    /// A refused verification is a hard stop: the gateway is never called.
    pub async fn submit(&mut self, risk_token: &str) -> CheckoutSubmit {
        if self.form.step() != WizardStep::CardDetails || !self.form.is_form_valid() {
            debug!(step = self.form.step().number(), "submit ignored, form not ready");
            return CheckoutSubmit::NotReady;
        }
        let amount = match Amount::try_from(self.form.fields().amount) {
            Ok(amount) => amount,
            Err(e) => {
                debug!(error = %e, "submit ignored, amount not payable");
                return CheckoutSubmit::NotReady;
            }
        };

        let fields = self.form.fields();
        let request = RiskRequest::new(risk_token, RiskAction::SubmitCardPayment)
            .with_context("customerCode", fields.customer_code.as_str())
            .with_context("distributionCenter", fields.distribution_center_code.as_str())
            .with_context("amount", amount.value().to_string())
            .with_context("cardBrand", self.form.card_brand().as_str());
        if let Err(reason) = self.collaborators.verify(&self.policy, &request).await {
            self.collaborators
                .alerts
                .show_error(RISK_REJECTED_TITLE, &reason);
            return CheckoutSubmit::RiskRejected(reason);
        }

        self.confirmation = None;
        self.receipt = None;
        let outcome = self
            .process
            .start_payment(self.form.fields(), risk_token)
            .await;
        CheckoutSubmit::Started(outcome)
    }

    /// Feeds a message posted by the strong-auth document.
    ///
    /// Returns the attempt's outcome once a terminal message resolves it.
    /// Messages arriving when no attempt awaits strong auth are ignored.
    pub async fn handle_strong_auth_message(&mut self, message: &BridgeMessage) -> Option<bool> {
        if self.process.phase() != PaymentPhase::AwaitingStrongAuth {
            debug!(phase = %self.process.phase(), "strong-auth message ignored");
            return None;
        }
        let attempt_id = self.process.attempt_id()?.to_string();
        let result = self.bridge.resolve(&attempt_id, message).await?;

        if result.success
            && let Some(confirmation) = result.confirmation
        {
            let receipt = Receipt::new(self.form.fields(), self.form.card_brand(), &confirmation);
            info!(
                %attempt_id,
                brand = %receipt.card_brand,
                last_four = %receipt.last_four_digits,
                "receipt ready"
            );
            self.receipt = Some(receipt);
            self.confirmation = Some(confirmation);
        }
        self.process.handle_attempt_completion(result.success);
        Some(result.success)
    }

    pub fn close_strong_auth(&mut self) {
        self.process.close_strong_auth_modal();
    }
}
