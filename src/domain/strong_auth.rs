use serde::{Deserialize, Serialize};

/// Key carried by a `RESPONSE` message when the bank approved the cardholder.
pub const SUCCESS_KEY: &str = "Success";
const RESPONSE_TYPE: &str = "RESPONSE";

/// Terminal message posted by the strong-authentication document.
///
/// The document is foreign markup with no tag field, so the two known shapes
/// are told apart by their fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BridgeMessage {
    Status(StatusMessage),
    Response(ResponseMessage),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMessage {
    pub status: String,
    #[serde(default)]
    pub confirmation_number: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: ResponsePayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePayload {
    pub key: String,
}

impl BridgeMessage {
    /// Parses a posted message; anything that is not one of the known shapes is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    pub fn response(key: impl Into<String>) -> Self {
        Self::Response(ResponseMessage {
            kind: RESPONSE_TYPE.to_string(),
            payload: ResponsePayload { key: key.into() },
        })
    }

    /// Whether this message ends the attempt.
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Status(_) => true,
            Self::Response(msg) => msg.kind == RESPONSE_TYPE,
        }
    }
}
