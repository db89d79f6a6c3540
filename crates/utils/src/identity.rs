//! Typed caller identity, validated at the HTTP boundary.
//!
//! Requests may carry an operator profile in the `x-profile` header. The
//! payload is parsed into an explicit variant here and never passed around
//! as untyped JSON.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid profile payload: {0}")]
    InvalidProfile(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Operator,
}

/// Operator profile attached to a request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Who is making the request.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", content = "profile", rename_all = "lowercase")]
pub enum Identity {
    Unauthenticated,
    Profile(Profile),
}

impl Identity {
    /// Parse an identity from the raw header value, if any.
    pub fn from_header(raw: Option<&str>) -> Result<Self, IdentityError> {
        match raw {
            None => Ok(Self::Unauthenticated),
            Some(payload) => Ok(Self::Profile(serde_json::from_str(payload)?)),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Profile(_))
    }

    /// Name suitable for audit log lines.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Unauthenticated => "anonymous",
            Self::Profile(profile) => &profile.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_header_is_unauthenticated() {
        let identity = Identity::from_header(None).unwrap();
        assert_eq!(identity, Identity::Unauthenticated);
        assert!(!identity.is_authenticated());
        assert_eq!(identity.display_name(), "anonymous");
    }

    #[test]
    fn valid_profile_parses() {
        let raw = format!(
            r#"{{"id":"{}","name":"Ana","email":"ana@example.com","role":"operator"}}"#,
            Uuid::new_v4()
        );
        let identity = Identity::from_header(Some(&raw)).unwrap();
        assert!(identity.is_authenticated());
        assert_eq!(identity.display_name(), "Ana");
    }

    #[test]
    fn malformed_profile_is_rejected() {
        assert!(Identity::from_header(Some("{not json")).is_err());
    }
}
