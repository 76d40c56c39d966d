use serde::{Deserialize, Serialize};

/// Structured error returned by the payment backend, shown verbatim to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendError {
    pub title: String,
    pub message: String,
}

impl BackendError {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Outcome of a backend call that reached the server.
///
/// Transport failures are reported through `Result::Err` instead, so callers
/// always see three distinct cases.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendReply<T> {
    Ok(T),
    Rejected(BackendError),
}

impl<T> BackendReply<T> {
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> BackendReply<U> {
        match self {
            Self::Ok(value) => BackendReply::Ok(f(value)),
            Self::Rejected(err) => BackendReply::Rejected(err),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}
