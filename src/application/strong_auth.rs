use crate::domain::attempt::Confirmation;
use crate::domain::ports::PaymentGatewayRef;
use crate::domain::reply::BackendReply;
use crate::domain::strong_auth::{BridgeMessage, SUCCESS_KEY};
use tracing::{error, info, warn};

const STATUS_SUCCESS: &str = "success";

/// Terminal result of one strong-authentication round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct StrongAuthResult {
    pub success: bool,
    pub confirmation: Option<Confirmation>,
}

impl StrongAuthResult {
    fn failed() -> Self {
        Self {
            success: false,
            confirmation: None,
        }
    }

    fn confirmed(confirmation: Confirmation) -> Self {
        Self {
            success: true,
            confirmation: Some(confirmation),
        }
    }
}

/// Turns messages posted by the strong-auth document into exactly one outcome.
pub struct StrongAuthBridge {
    gateway: PaymentGatewayRef,
}

impl StrongAuthBridge {
    pub fn new(gateway: PaymentGatewayRef) -> Self {
        Self { gateway }
    }

    /// Resolves a posted message for `attempt_id`.
    ///
    /// Returns `None` for messages that do not end the attempt. A `Success`
    /// key confirms the order with the backend before reporting success.
    pub async fn resolve(
        &self,
        attempt_id: &str,
        message: &BridgeMessage,
    ) -> Option<StrongAuthResult> {
        if !message.is_terminal() {
            return None;
        }

        let result = match message {
            BridgeMessage::Status(status) if status.status == STATUS_SUCCESS => {
                StrongAuthResult::confirmed(Confirmation {
                    authorization_code: status.confirmation_number.clone(),
                    transaction_identifier: attempt_id.to_string(),
                    ..Confirmation::default()
                })
            }
            BridgeMessage::Status(status) => {
                warn!(%attempt_id, status = %status.status, "strong authentication declined");
                StrongAuthResult::failed()
            }
            BridgeMessage::Response(response) if response.payload.key == SUCCESS_KEY => {
                self.confirm(attempt_id).await
            }
            BridgeMessage::Response(response) => {
                warn!(%attempt_id, key = %response.payload.key, "strong authentication declined");
                StrongAuthResult::failed()
            }
        };
        Some(result)
    }

    async fn confirm(&self, attempt_id: &str) -> StrongAuthResult {
        match self.gateway.confirm(attempt_id).await {
            Ok(BackendReply::Ok(confirmation)) => {
                info!(%attempt_id, "order confirmed");
                StrongAuthResult::confirmed(confirmation)
            }
            Ok(BackendReply::Rejected(err)) => {
                warn!(%attempt_id, title = %err.title, "order confirmation rejected");
                StrongAuthResult::failed()
            }
            Err(e) => {
                error!(%attempt_id, error = %e, "order confirmation failed");
                StrongAuthResult::failed()
            }
        }
    }
}
