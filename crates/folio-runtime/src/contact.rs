#![forbid(unsafe_code)]

//! Contact form relay.
//!
//! [`ContactForm`] holds the two form fields and the submission status. A
//! submit produces a [`RelayRequest`] (a JSON `POST` to the relay endpoint)
//! which the host performs and reports back through [`ContactForm::resolve`].
//! Unlike the view counter, failures here are shown to the visitor.

use std::fmt;

use serde::Deserialize;
use tracing::debug;

use crate::config::ContactConfig;

pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";
pub const NETWORK_FAILURE: &str = "Network error. Please try again.";

/// Where the form is in its submit cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContactStatus {
    #[default]
    Idle,
    Sending,
    Sent,
    /// Failed with the message to show.
    Failed(String),
}

/// Why a relay call failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// Non-2xx answer; `body` is whatever the relay returned.
    Status { status: u16, body: String },
    /// No answer at all, with the platform message if any.
    Transport(Option<String>),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status { status, .. } => write!(f, "relay answered HTTP {status}"),
            Self::Transport(Some(msg)) => write!(f, "relay unreachable: {msg}"),
            Self::Transport(None) => write!(f, "relay unreachable"),
        }
    }
}

impl std::error::Error for RelayError {}

impl RelayError {
    /// Message shown under the form.
    #[must_use]
    pub fn user_message(&self) -> String {
        #[derive(Deserialize)]
        struct ErrorBody {
            error: Option<String>,
        }

        match self {
            Self::Status { body, .. } => serde_json::from_str::<ErrorBody>(body)
                .ok()
                .and_then(|b| b.error)
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
            Self::Transport(msg) => msg
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(NETWORK_FAILURE)
                .to_string(),
        }
    }
}

/// Local validation failures; nothing was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactRejection {
    /// A submission is already in flight.
    Busy,
    MissingEmail,
    MissingMessage,
}

impl fmt::Display for ContactRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => f.write_str("a message is already being sent"),
            Self::MissingEmail => f.write_str("email is required"),
            Self::MissingMessage => f.write_str("message is required"),
        }
    }
}

impl std::error::Error for ContactRejection {}

/// One `POST` the host must perform.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayRequest {
    pub url: String,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: String,
}

/// Contact form state machine.
#[derive(Debug, Clone)]
pub struct ContactForm {
    endpoint: String,
    pub email: String,
    pub message: String,
    status: ContactStatus,
}

impl ContactForm {
    #[must_use]
    pub fn new(config: &ContactConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            email: String::new(),
            message: String::new(),
            status: ContactStatus::Idle,
        }
    }

    #[must_use]
    pub fn status(&self) -> &ContactStatus {
        &self.status
    }

    /// Validate and build the relay request; moves to `Sending`.
    pub fn submit(&mut self) -> Result<RelayRequest, ContactRejection> {
        if self.status == ContactStatus::Sending {
            return Err(ContactRejection::Busy);
        }
        if self.email.trim().is_empty() {
            return Err(ContactRejection::MissingEmail);
        }
        if self.message.trim().is_empty() {
            return Err(ContactRejection::MissingMessage);
        }
        self.status = ContactStatus::Sending;
        let body = serde_json::json!({
            "email": self.email,
            "message": self.message,
        });
        debug!(target: "folio.contact", endpoint = %self.endpoint, "submitting contact form");
        Ok(RelayRequest {
            url: self.endpoint.clone(),
            headers: vec![
                ("Content-Type", "application/json"),
                ("Accept", "application/json"),
            ],
            body: body.to_string(),
        })
    }

    /// Apply the relay outcome. Ignored unless a submission is in flight.
    pub fn resolve(&mut self, result: Result<(), RelayError>) {
        if self.status != ContactStatus::Sending {
            return;
        }
        match result {
            Ok(()) => {
                debug!(target: "folio.contact", "contact form sent");
                self.email.clear();
                self.message.clear();
                self.status = ContactStatus::Sent;
            }
            Err(err) => {
                debug!(target: "folio.contact", error = %err, "contact form failed");
                self.status = ContactStatus::Failed(err.user_message());
            }
        }
    }

    /// `"Sending…"` while in flight, `"Send"` otherwise.
    #[must_use]
    pub fn button_label(&self) -> &'static str {
        if self.status == ContactStatus::Sending {
            "Sending\u{2026}"
        } else {
            "Send"
        }
    }

    #[must_use]
    pub fn failure_message(&self) -> Option<&str> {
        match &self.status {
            ContactStatus::Failed(message) => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn filled() -> ContactForm {
        let mut form = ContactForm::new(&ContactConfig {
            endpoint: "https://relay.test/f/x".into(),
        });
        form.email = "me@example.com".into();
        form.message = "Hello \"there\"".into();
        form
    }

    #[test]
    fn submit_builds_json_post() {
        let mut form = filled();
        let request = form.submit().unwrap();
        assert_eq!(request.url, "https://relay.test/f/x");
        assert!(request.headers.contains(&("Accept", "application/json")));
        let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(body["email"], "me@example.com");
        assert_eq!(body["message"], "Hello \"there\"");
        assert_eq!(form.button_label(), "Sending\u{2026}");
        assert_eq!(form.submit(), Err(ContactRejection::Busy));
    }

    #[test]
    fn success_clears_fields() {
        let mut form = filled();
        form.submit().unwrap();
        form.resolve(Ok(()));
        assert_eq!(form.status(), &ContactStatus::Sent);
        assert!(form.email.is_empty() && form.message.is_empty());
        assert_eq!(form.button_label(), "Send");
    }

    #[test]
    fn failure_messages() {
        let cases = [
            (
                RelayError::Status { status: 422, body: r#"{"error":"Email is invalid"}"#.into() },
                "Email is invalid",
            ),
            (
                RelayError::Status { status: 500, body: "<html>".into() },
                GENERIC_FAILURE,
            ),
            (RelayError::Transport(Some("Failed to fetch".into())), "Failed to fetch"),
            (RelayError::Transport(None), NETWORK_FAILURE),
        ];
        for (err, expected) in cases {
            let mut form = filled();
            form.submit().unwrap();
            form.resolve(Err(err));
            assert_eq!(form.failure_message(), Some(expected));
            assert_eq!(form.email, "me@example.com");
        }
    }

    #[test]
    fn empty_fields_rejected_locally() {
        let mut form = ContactForm::new(&ContactConfig::default());
        assert_eq!(form.submit(), Err(ContactRejection::MissingEmail));
        form.email = "a@b.c".into();
        assert_eq!(form.submit(), Err(ContactRejection::MissingMessage));
        assert_eq!(form.status(), &ContactStatus::Idle);
    }
}
