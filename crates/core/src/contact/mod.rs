//! Contacting a listing agent on behalf of a housing seeker.
//!
//! The core crate owns the request/outcome model, the message templates and
//! the [`ContactDispatcher`] seam. Network transports live in the server.

pub mod templates;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::listing::{Listing, ListingId};
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactMethod {
    Call,
    Sms,
    #[default]
    Email,
}

impl ContactMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Sms => "sms",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for ContactMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactMethod {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "call" | "phone" => Ok(Self::Call),
            "sms" | "text" => Ok(Self::Sms),
            "email" | "" => Ok(Self::Email),
            other => Err(DomainError::InvariantViolation(format!(
                "unsupported contact method `{other}` (expected call|sms|email)"
            ))),
        }
    }
}

fn default_language() -> String {
    "English".to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContactRequest {
    pub listing_id: ListingId,
    pub requester_name: String,
    pub requester_phone: String,
    #[serde(default)]
    pub requester_email: Option<String>,
    #[serde(default = "default_language")]
    pub preferred_language: String,
    #[serde(default)]
    pub method: ContactMethod,
}

impl ContactRequest {
    pub fn new(
        listing_id: ListingId,
        requester_name: impl Into<String>,
        requester_phone: impl Into<String>,
    ) -> Self {
        Self {
            listing_id,
            requester_name: requester_name.into(),
            requester_phone: requester_phone.into(),
            requester_email: None,
            preferred_language: default_language(),
            method: ContactMethod::default(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.requester_email = Some(email.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.preferred_language = language.into();
        self
    }

    pub fn with_method(mut self, method: ContactMethod) -> Self {
        self.method = method;
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.requester_name.trim().is_empty() {
            return Err(DomainError::InvariantViolation("requester_name is required".to_string()));
        }
        if self.requester_phone.trim().is_empty() {
            return Err(DomainError::InvariantViolation(
                "requester_phone is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of one dispatch attempt. Transport failures are reported here,
/// never raised.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContactOutcome {
    pub fn delivered(reference: Option<String>) -> Self {
        Self { success: true, reference, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { success: false, reference: None, error: Some(error.into()) }
    }
}

#[async_trait]
pub trait ContactDispatcher: Send + Sync {
    async fn attempt_contact(&self, listing: &Listing, request: &ContactRequest)
        -> ContactOutcome;
}

/// Dispatcher used when no outbound channel is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnconfiguredDispatcher;

#[async_trait]
impl ContactDispatcher for UnconfiguredDispatcher {
    async fn attempt_contact(
        &self,
        _listing: &Listing,
        request: &ContactRequest,
    ) -> ContactOutcome {
        ContactOutcome::failed(format!(
            "{} contact is not configured; set the contact.* settings to enable it",
            request.method
        ))
    }
}
