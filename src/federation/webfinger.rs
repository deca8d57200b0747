//! WebFinger protocol implementation
//!
//! Maps `acct:` identifiers to the canonical actor link.

use serde::{Deserialize, Serialize};

use crate::data::Actor;
use crate::error::AppError;

/// A parsed `acct:` resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcctResource {
    pub username: String,
    /// Domain part, absent for bare `acct:user`
    pub domain: Option<String>,
}

/// Parse `acct:user@domain` (or bare `acct:user`)
///
/// # Errors
/// `Validation` when the scheme is missing, the user part is empty or
/// more than one `@` is present.
pub fn parse_acct_resource(resource: &str) -> Result<AcctResource, AppError> {
    let acct = resource
        .trim()
        .strip_prefix("acct:")
        .ok_or_else(|| AppError::Validation("Invalid WebFinger request".to_string()))?;

    let mut parts = acct.split('@');
    let username = parts.next().unwrap_or_default();
    let domain = parts.next();

    if parts.next().is_some() || username.is_empty() || domain.is_some_and(str::is_empty) {
        return Err(AppError::Validation("Invalid WebFinger request".to_string()));
    }

    Ok(AcctResource {
        username: username.to_string(),
        domain: domain.map(str::to_string),
    })
}

/// WebFinger JRD response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebFingerResponse {
    pub subject: String,
    pub links: Vec<WebFingerLink>,
}

/// WebFinger link
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebFingerLink {
    pub rel: String,
    #[serde(rename = "type")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// Generate WebFinger response for a local actor.
///
/// # Arguments
/// * `actor` - Local actor
/// * `domain` - Instance domain used in the subject
pub fn generate_webfinger_response(actor: &Actor, domain: &str) -> WebFingerResponse {
    WebFingerResponse {
        subject: format!("acct:{}@{}", actor.username, domain),
        links: vec![WebFingerLink {
            rel: "self".to_string(),
            link_type: Some("application/activity+json".to_string()),
            href: Some(actor.actor_url()),
        }],
    }
}
