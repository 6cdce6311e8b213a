//! Admin session extractor for Axum handlers.

use crate::ApiError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use tutorhub_core::{AnalyticsError, UserRole};

/// The caller resolved from the request's credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminPrincipal {
    /// Stable identifier of the caller (user id, token name, ...).
    pub subject: String,
    pub role: UserRole,
}

impl AdminPrincipal {
    pub fn new(subject: impl Into<String>, role: UserRole) -> Self {
        Self {
            subject: subject.into(),
            role,
        }
    }

    /// The principal used when the admin guard is disabled.
    pub fn anonymous() -> Self {
        Self::new("anonymous", UserRole::Admin)
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Extractor for requests made with admin privilege.
///
/// Rejects with 401 when no credentials were resolved by [`AdminLayer`],
/// and with 403 when the caller is not an admin. Both rejections use the
/// standard failure envelope.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(admin: AdminSession) -> String {
///     format!("Hello, {}!", admin.principal.subject)
/// }
/// ```
///
/// [`AdminLayer`]: crate::AdminLayer
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub principal: AdminPrincipal,
}

impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = parts
            .extensions
            .get::<AdminPrincipal>()
            .cloned()
            .ok_or(AnalyticsError::Unauthorized)?;

        if !principal.is_admin() {
            return Err(AnalyticsError::Forbidden.into());
        }

        Ok(AdminSession { principal })
    }
}
