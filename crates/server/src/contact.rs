//! Outbound agent contact over Twilio (calls, SMS) and Brevo (email).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use homefinder_core::config::ContactConfig;
use homefinder_core::contact::templates::{
    call_script, email_message, sms_body, twiml, TemplateError,
};
use homefinder_core::contact::{ContactDispatcher, ContactMethod, ContactOutcome, ContactRequest};
use homefinder_core::domain::listing::Listing;

const TWILIO_BASE_URL: &str = "https://api.twilio.com";
const BREVO_EMAIL_ENDPOINT: &str = "https://api.brevo.com/v3/smtp/email";

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{0} contact is not configured")]
    NotConfigured(ContactMethod),
    #[error("request to {provider} failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} rejected the request with status {status}: {body}")]
    Rejected { provider: &'static str, status: u16, body: String },
    #[error(transparent)]
    Template(#[from] TemplateError),
}

#[derive(Clone)]
struct TwilioChannel {
    base_url: String,
    account_sid: String,
    auth_token: SecretString,
    from_number: String,
}

#[derive(Clone)]
struct EmailChannel {
    endpoint: String,
    api_key: SecretString,
    sender: String,
    sender_name: String,
}

#[derive(Deserialize)]
struct TwilioResource {
    sid: String,
}

#[derive(Deserialize)]
struct BrevoAccepted {
    #[serde(rename = "messageId")]
    message_id: String,
}

/// Dispatcher backed by the configured providers. Every attempt is bounded
/// by the contact timeout.
#[derive(Clone)]
pub struct ChannelDispatcher {
    client: Client,
    timeout: Duration,
    twilio: Option<TwilioChannel>,
    email: Option<EmailChannel>,
}

impl ChannelDispatcher {
    /// Returns `None` when no channel has credentials.
    pub fn from_config(config: &ContactConfig) -> Option<Self> {
        let twilio = match (
            &config.twilio_account_sid,
            &config.twilio_auth_token,
            &config.twilio_from_number,
        ) {
            (Some(account_sid), Some(auth_token), Some(from_number)) => Some(TwilioChannel {
                base_url: TWILIO_BASE_URL.to_string(),
                account_sid: account_sid.clone(),
                auth_token: auth_token.clone(),
                from_number: from_number.clone(),
            }),
            _ => None,
        };
        let email = match (&config.email_api_key, &config.email_sender) {
            (Some(api_key), Some(sender)) => Some(EmailChannel {
                endpoint: BREVO_EMAIL_ENDPOINT.to_string(),
                api_key: api_key.clone(),
                sender: sender.clone(),
                sender_name: config.email_sender_name.clone(),
            }),
            _ => None,
        };

        if twilio.is_none() && email.is_none() {
            return None;
        }

        Some(Self {
            client: Client::new(),
            timeout: Duration::from_secs(config.timeout_secs),
            twilio,
            email,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_twilio_base_url(mut self, base_url: impl Into<String>) -> Self {
        if let Some(twilio) = self.twilio.as_mut() {
            twilio.base_url = base_url.into();
        }
        self
    }

    pub fn with_email_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        if let Some(email) = self.email.as_mut() {
            email.endpoint = endpoint.into();
        }
        self
    }

    pub fn channels(&self) -> Vec<&'static str> {
        let mut channels = Vec::new();
        if self.twilio.is_some() {
            channels.extend(["call", "sms"]);
        }
        if self.email.is_some() {
            channels.push("email");
        }
        channels
    }

    async fn dispatch(
        &self,
        listing: &Listing,
        request: &ContactRequest,
    ) -> Result<Option<String>, DispatchError> {
        match request.method {
            ContactMethod::Call => {
                let twilio =
                    self.twilio.as_ref().ok_or(DispatchError::NotConfigured(request.method))?;
                let document = twiml(&call_script(listing, request)?)?;
                self.post_twilio(
                    twilio,
                    "Calls.json",
                    &[
                        ("To", listing.agent_phone.as_str()),
                        ("From", twilio.from_number.as_str()),
                        ("Twiml", document.as_str()),
                    ],
                )
                .await
            }
            ContactMethod::Sms => {
                let twilio =
                    self.twilio.as_ref().ok_or(DispatchError::NotConfigured(request.method))?;
                let body = sms_body(listing, request)?;
                self.post_twilio(
                    twilio,
                    "Messages.json",
                    &[
                        ("Body", body.as_str()),
                        ("From", twilio.from_number.as_str()),
                        ("To", listing.agent_phone.as_str()),
                    ],
                )
                .await
            }
            ContactMethod::Email => {
                let email =
                    self.email.as_ref().ok_or(DispatchError::NotConfigured(request.method))?;
                self.send_email(email, listing, request).await
            }
        }
    }

    async fn post_twilio(
        &self,
        twilio: &TwilioChannel,
        resource: &str,
        form: &[(&str, &str)],
    ) -> Result<Option<String>, DispatchError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/{resource}",
            twilio.base_url.trim_end_matches('/'),
            twilio.account_sid
        );
        debug!(event_name = "contact.twilio.request", resource, "posting to twilio");

        let response = self
            .client
            .post(&url)
            .basic_auth(&twilio.account_sid, Some(twilio.auth_token.expose_secret()))
            .form(form)
            .send()
            .await
            .map_err(|source| DispatchError::Transport { provider: "twilio", source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Rejected { provider: "twilio", status: status.as_u16(), body });
        }

        Ok(response.json::<TwilioResource>().await.ok().map(|resource| resource.sid))
    }

    async fn send_email(
        &self,
        email: &EmailChannel,
        listing: &Listing,
        request: &ContactRequest,
    ) -> Result<Option<String>, DispatchError> {
        let message = email_message(listing, request)?;
        let mut payload = json!({
            "sender": { "name": email.sender_name, "email": email.sender },
            "to": [{ "email": listing.agent_email, "name": listing.agent_name }],
            "subject": message.subject,
            "textContent": message.body,
        });
        if let Some(reply_to) =
            request.requester_email.as_deref().map(str::trim).filter(|value| !value.is_empty())
        {
            payload["replyTo"] = json!({ "email": reply_to, "name": request.requester_name.trim() });
        }
        debug!(event_name = "contact.email.request", "posting to brevo");

        let response = self
            .client
            .post(&email.endpoint)
            .header("api-key", email.api_key.expose_secret())
            .header("accept", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|source| DispatchError::Transport { provider: "brevo", source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DispatchError::Rejected { provider: "brevo", status: status.as_u16(), body });
        }

        Ok(response.json::<BrevoAccepted>().await.ok().map(|accepted| accepted.message_id))
    }
}

#[async_trait]
impl ContactDispatcher for ChannelDispatcher {
    async fn attempt_contact(&self, listing: &Listing, request: &ContactRequest) -> ContactOutcome {
        match tokio::time::timeout(self.timeout, self.dispatch(listing, request)).await {
            Ok(Ok(reference)) => ContactOutcome::delivered(reference),
            Ok(Err(error)) => ContactOutcome::failed(error.to_string()),
            Err(_) => ContactOutcome::failed(format!(
                "{} contact timed out after {}s",
                request.method,
                self.timeout.as_secs_f32()
            )),
        }
    }
}
