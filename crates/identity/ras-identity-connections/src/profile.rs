//! Normalization of the OpenSocial `@me/@self` profile.

use crate::config::STRATEGY_NAME;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Prefix of every person id the provider issues; the rest is the user id.
pub const PROFILE_ID_PREFIX: &str = "urn:lsid:lconn.ibm.com:profiles.person:";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Invalid profile JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Profile is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Profile id '{0}' does not carry the expected person prefix")]
    MalformedId(String),
}

/// Canonical profile handed to the verify callback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    /// Always [`STRATEGY_NAME`].
    pub provider: String,
    /// Opaque OpenSocial id, e.g. `urn:lsid:lconn.ibm.com:profiles.person:20000000`.
    pub id: String,
    /// `id` with [`PROFILE_ID_PREFIX`] removed.
    pub user_id: String,
    pub display_name: Option<String>,
    /// Copied verbatim; absent when the provider sent none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emails: Option<Vec<Value>>,
    /// Response body as received.
    #[serde(skip)]
    pub raw: String,
    #[serde(skip)]
    pub json: Value,
}

#[derive(Deserialize)]
struct ProfileDocument {
    entry: Option<ProfileEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileEntry {
    id: Option<String>,
    display_name: Option<String>,
    emails: Option<Vec<Value>>,
}

impl Profile {
    /// Parse a profile response body.
    pub fn parse(body: &str) -> Result<Self, ProfileError> {
        let json: Value = serde_json::from_str(body)?;
        Self::normalize(json, body.to_string())
    }

    /// Normalize an already parsed profile document.
    pub fn from_json(json: Value) -> Result<Self, ProfileError> {
        let raw = json.to_string();
        Self::normalize(json, raw)
    }

    /// Strip [`PROFILE_ID_PREFIX`] from a person id.
    pub fn user_id_from(id: &str) -> Result<&str, ProfileError> {
        id.strip_prefix(PROFILE_ID_PREFIX)
            .filter(|user_id| !user_id.is_empty())
            .ok_or_else(|| ProfileError::MalformedId(id.to_string()))
    }

    fn normalize(json: Value, raw: String) -> Result<Self, ProfileError> {
        let document = ProfileDocument::deserialize(&json)?;
        let entry = document.entry.ok_or(ProfileError::MissingField("entry"))?;
        let id = entry.id.ok_or(ProfileError::MissingField("entry.id"))?;
        let user_id = Self::user_id_from(&id)?.to_string();

        Ok(Self {
            provider: STRATEGY_NAME.to_string(),
            id,
            user_id,
            display_name: entry.display_name,
            emails: entry.emails,
            raw,
            json,
        })
    }
}
