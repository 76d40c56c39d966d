use super::alert::{Alert, AlertKind};
use super::attempt::{ConfirmResponse, SubmitResponse};
use super::customer::{CenterList, CustomerLookup};
use super::form::CardFields;
use super::risk::{RiskRequest, RiskVerdict};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// The external payment backend.
///
/// `Err` means the backend could not be reached or answered with something
/// unreadable; a `BackendReply::Rejected` is a structured refusal.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Submits the session's fields; sensitive card data is encrypted before it leaves.
    async fn submit(&self, fields: &CardFields, risk_token: &str) -> Result<SubmitResponse>;
    /// Confirms the order once strong authentication succeeded.
    async fn confirm(&self, attempt_id: &str) -> Result<ConfirmResponse>;
}

#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn lookup(&self, phone: &str, center_id: i64) -> Result<CustomerLookup>;
    async fn centers(&self) -> Result<CenterList>;
}

#[async_trait]
pub trait RiskVerifier: Send + Sync {
    async fn verify(&self, request: &RiskRequest) -> Result<RiskVerdict>;
}

/// Fire-and-forget user notification channel.
pub trait AlertSink: Send + Sync {
    fn show(&self, alert: Alert);
    fn close(&self);

    fn show_error(&self, title: &str, message: &str) {
        self.show(Alert::new(AlertKind::Error, title, message));
    }

    fn show_success(&self, title: &str, message: &str) {
        self.show(Alert::new(AlertKind::Success, title, message));
    }

    fn show_warning(&self, title: &str, message: &str) {
        self.show(Alert::new(AlertKind::Warning, title, message));
    }

    fn show_info(&self, title: &str, message: &str) {
        self.show(Alert::new(AlertKind::Info, title, message));
    }
}

pub type PaymentGatewayRef = Arc<dyn PaymentGateway>;
pub type CustomerDirectoryRef = Arc<dyn CustomerDirectory>;
pub type RiskVerifierRef = Arc<dyn RiskVerifier>;
pub type AlertSinkRef = Arc<dyn AlertSink>;
