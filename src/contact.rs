//! Contact form submission
//!
//! Collects every field of the form into the JSON body posted to the form
//! endpoint, checks the fields a reply depends on, and holds the button
//! states shown while the request is in flight.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{FxError, Result};

/// Form field that real visitors leave empty
pub const HONEYPOT_FIELD: &str = "_gotcha";

/// Payload posted to the contact endpoint: every text field, by name
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ContactSubmission {
    fields: BTreeMap<String, String>,
}

impl ContactSubmission {
    /// Build from `(name, value)` pairs in form order, trimming values
    ///
    /// A repeated name keeps its last value. The honeypot is kept so
    /// [`is_spam`](Self::is_spam) can see it, but never serialized.
    pub fn from_fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(name, value)| (name.into(), value.as_ref().trim().to_string()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Whether a bot filled the honeypot field
    pub fn is_spam(&self) -> bool {
        self.get(HONEYPOT_FIELD).is_some_and(|v| !v.is_empty())
    }

    /// Reply address and message must be usable; everything else is optional
    pub fn validate(&self) -> Result<()> {
        if !self.get("email").is_some_and(looks_like_email) {
            return Err(FxError::InvalidSubmission("email address looks wrong"));
        }
        if self.get("message").is_none_or(str::is_empty) {
            return Err(FxError::InvalidSubmission("message is required"));
        }
        Ok(())
    }

    /// Validated JSON body, without the honeypot
    pub fn to_json(&self) -> Result<String> {
        self.validate()?;
        let mut fields = self.fields.clone();
        fields.remove(HONEYPOT_FIELD);
        Ok(serde_json::to_string(&fields)?)
    }
}

/// Cheap shape check: one `@`, something before it, a dot in the domain
pub fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

/// Submit button state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitState {
    #[default]
    Idle,
    Sending,
    Sent,
}

impl SubmitState {
    /// Label shown on the submit button; Idle keeps the page's own label
    pub fn button_label(&self) -> Option<&'static str> {
        match self {
            SubmitState::Idle => None,
            SubmitState::Sending => Some("Sending…"),
            SubmitState::Sent => Some("Sent!"),
        }
    }

    pub fn button_disabled(&self) -> bool {
        !matches!(self, SubmitState::Idle)
    }

    /// State once the confirmation has been on screen long enough
    pub fn after_feedback(self) -> Self {
        match self {
            SubmitState::Sent => SubmitState::Idle,
            other => other,
        }
    }
}

/// Alert shown when the endpoint can't be reached
pub fn failure_message(fallback_email: &str) -> String {
    format!(
        "Sorry, your message couldn't be sent. Please email me directly at {}.",
        fallback_email
    )
}

/// Alert shown when the form is filled in wrong
pub fn invalid_message(reason: &str) -> String {
    format!("Please check the form: {}.", reason)
}
