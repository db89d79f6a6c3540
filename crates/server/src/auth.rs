use axum::{extract::FromRequestParts, http::request::Parts};
use utils::identity::Identity;

use crate::error::ApiError;

/// Extracts the typed caller identity from the `x-profile` header.
///
/// Absent header means an unauthenticated caller; a malformed profile is a
/// bad request, never silently trusted.
pub struct CurrentUser(pub Identity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("x-profile")
            .and_then(|value| value.to_str().ok());
        let identity =
            Identity::from_header(raw).map_err(|e| ApiError::BadRequest(e.to_string()))?;
        Ok(CurrentUser(identity))
    }
}
