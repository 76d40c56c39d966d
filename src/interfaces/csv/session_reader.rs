use crate::error::{CheckoutError, Result};
use serde::Deserialize;
use std::io::Read;

/// What a scripted session row does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionAction {
    /// `identify,<center id>,<phone>`: looks the customer up and restarts the session for them.
    Identify,
    /// `set,<field>,<raw value>`.
    Set,
    Next,
    Back,
    /// `submit,,<risk token>`.
    Submit,
    /// `auth,,<message>`: a JSON message posted by the strong-auth document, or a bare key.
    Auth,
    Close,
}

/// One row of a session script.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionEvent {
    pub action: SessionAction,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl SessionEvent {
    pub fn field(&self) -> Result<&str> {
        self.field.as_deref().ok_or_else(|| {
            CheckoutError::Validation(format!("`{:?}` row needs a field", self.action))
        })
    }

    pub fn value_or_empty(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }
}

/// Reads session events from a CSV source with an `action,field,value` header.
///
/// Whitespace around cells is trimmed and short rows are accepted.
pub struct SessionScriptReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> SessionScriptReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes events; a bad row yields an error and reading continues.
    pub fn events(self) -> impl Iterator<Item = Result<SessionEvent>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(CheckoutError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_valid_stream() {
        let data = "action, field, value\nnext\nset, name, Test User\nsubmit,, token-1\nclose";
        let reader = SessionScriptReader::new(data.as_bytes());
        let events: Vec<SessionEvent> = reader.events().map(|e| e.unwrap()).collect();

        assert_eq!(events.len(), 4);
        assert_eq!(events[0].action, SessionAction::Next);
        assert_eq!(events[0].field, None);
        assert_eq!(events[1].field().unwrap(), "name");
        assert_eq!(events[1].value_or_empty(), "Test User");
        assert_eq!(events[2].field, None);
        assert_eq!(events[2].value_or_empty(), "token-1");
    }

    #[test]
    fn test_reader_quoted_message() {
        let data = "action,field,value\nauth,,\"{\"\"type\"\":\"\"RESPONSE\"\",\"\"payload\"\":{\"\"key\"\":\"\"Success\"\"}}\"";
        let events: Vec<Result<SessionEvent>> = SessionScriptReader::new(data.as_bytes())
            .events()
            .collect();
        let event = events[0].as_ref().unwrap();
        assert_eq!(event.action, SessionAction::Auth);
        assert!(event.value_or_empty().starts_with("{\"type\""));
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = "action,field,value\nfly,name,x\nnext";
        let results: Vec<Result<SessionEvent>> =
            SessionScriptReader::new(data.as_bytes()).events().collect();

        assert!(results[0].is_err());
        assert!(results[1].is_ok());
    }

    #[test]
    fn test_set_without_field() {
        let data = "action,field,value\nset";
        let event = SessionScriptReader::new(data.as_bytes())
            .events()
            .next()
            .unwrap()
            .unwrap();
        assert!(matches!(event.field(), Err(CheckoutError::Validation(_))));
    }
}
