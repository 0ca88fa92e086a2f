//! Configured allowlist of addresses and domains.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::domain::ports::{AccessGate, AccessGateError};
use crate::domain::{AccessDecision, EmailAddress};

const DENIED_REASON: &str = "This email address is not authorised to use the onboarding tool.";

/// Invalid allowlist entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid access allowlist entry `{entry}`")]
pub struct AllowlistEntryError {
    /// The rejected entry as configured.
    pub entry: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    Address(EmailAddress),
    Domain(String),
}

/// Grants listed addresses and addresses under listed `@domain` entries.
///
/// An empty allowlist grants every well-formed address.
#[derive(Debug, Clone, Default)]
pub struct AllowlistAccessGate {
    entries: Vec<Entry>,
}

impl AllowlistAccessGate {
    /// Build the gate from raw entries, ignoring blanks.
    ///
    /// # Examples
    /// ```
    /// use pixel_onboarding::outbound::access_gate::AllowlistAccessGate;
    ///
    /// let gate = AllowlistAccessGate::new(["owner@shop.example", "@agency.example"]).unwrap();
    /// assert!(!gate.is_open());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`AllowlistEntryError`] for entries that are neither an email
    /// address nor `@` followed by a domain.
    pub fn new<I, S>(entries: I) -> Result<Self, AllowlistEntryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .filter_map(|raw| {
                let trimmed = raw.as_ref().trim();
                (!trimmed.is_empty()).then(|| parse_entry(trimmed))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// Whether every address is granted.
    pub fn is_open(&self) -> bool {
        self.entries.is_empty()
    }

    fn grants(&self, email: &EmailAddress) -> bool {
        self.is_open()
            || self.entries.iter().any(|entry| match entry {
                Entry::Address(address) => address == email,
                Entry::Domain(domain) => email.domain() == domain,
            })
    }
}

fn parse_entry(raw: &str) -> Result<Entry, AllowlistEntryError> {
    let invalid = || AllowlistEntryError {
        entry: raw.to_owned(),
    };
    match raw.strip_prefix('@') {
        Some(domain) => {
            // Reuse address validation for the domain part.
            EmailAddress::parse(&format!("x@{domain}"))
                .map(|probe| Entry::Domain(probe.domain().to_owned()))
                .map_err(|_| invalid())
        }
        None => EmailAddress::parse(raw)
            .map(Entry::Address)
            .map_err(|_| invalid()),
    }
}

#[async_trait]
impl AccessGate for AllowlistAccessGate {
    async fn verify(&self, email: &EmailAddress) -> Result<AccessDecision, AccessGateError> {
        let granted = self.grants(email);
        debug!(domain = email.domain(), granted, "allowlist evaluated");
        Ok(if granted {
            AccessDecision::Granted
        } else {
            AccessDecision::Denied {
                reason: DENIED_REASON.to_owned(),
            }
        })
    }
}
