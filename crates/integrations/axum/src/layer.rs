//! Admin guard middleware layer for Axum.
//!
//! The layer resolves the bearer token (if any) to an [`AdminPrincipal`]
//! and stores it in the request extensions; handlers that require admin
//! access take an [`AdminSession`] extractor. Missing or unknown tokens are
//! left for the extractor to reject. A failing authenticator ends the
//! request here with its own error.
//!
//! [`AdminSession`]: crate::AdminSession

use crate::ApiError;
use crate::extractor::AdminPrincipal;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderValue, Request, Response};
use axum::response::IntoResponse;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tutorhub_core::{AnalyticsResult, UserRole};

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Resolves a bearer token to the user it belongs to.
///
/// Session and user management live outside analytics; implement this
/// over whatever issues admin credentials.
#[async_trait]
pub trait AdminAuthenticator: Send + Sync {
    /// Returns `None` when the token is unknown.
    async fn authenticate(&self, token: &str) -> AnalyticsResult<Option<AdminPrincipal>>;
}

/// Authenticator accepting a fixed set of admin API tokens.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthenticator {
    tokens: HashSet<String>,
}

impl StaticTokenAuthenticator {
    pub fn new<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl AdminAuthenticator for StaticTokenAuthenticator {
    async fn authenticate(&self, token: &str) -> AnalyticsResult<Option<AdminPrincipal>> {
        Ok(self
            .tokens
            .contains(token)
            .then(|| AdminPrincipal::new("api-token", UserRole::Admin)))
    }
}

/// Layer that resolves admin credentials for the wrapped routes.
#[derive(Clone)]
pub struct AdminLayer {
    authenticator: Option<Arc<dyn AdminAuthenticator>>,
}

impl AdminLayer {
    /// Creates a layer resolving tokens with `authenticator`.
    pub fn new(authenticator: Arc<dyn AdminAuthenticator>) -> Self {
        Self {
            authenticator: Some(authenticator),
        }
    }

    /// Creates a layer that treats every request as an admin.
    ///
    /// Only meant for local development and tests.
    pub fn open() -> Self {
        Self {
            authenticator: None,
        }
    }
}

impl<S> Layer<S> for AdminLayer {
    type Service = AdminMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AdminMiddleware {
            inner,
            authenticator: self.authenticator.clone(),
        }
    }
}

/// Middleware service that resolves admin principals.
#[derive(Clone)]
pub struct AdminMiddleware<S> {
    inner: S,
    authenticator: Option<Arc<dyn AdminAuthenticator>>,
}

impl<S> Service<Request<Body>> for AdminMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let authenticator = self.authenticator.clone();
        // Take the service that was driven to readiness.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let request_id = extract_request_id(&req)
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

            let rejection = match (&authenticator, extract_bearer_token(&req)) {
                (None, _) => {
                    req.extensions_mut().insert(AdminPrincipal::anonymous());
                    None
                }
                (Some(auth), Some(token)) => match auth.authenticate(&token).await {
                    Ok(Some(principal)) => {
                        tracing::debug!(
                            request_id = %request_id,
                            subject = %principal.subject,
                            "admin credentials resolved"
                        );
                        req.extensions_mut().insert(principal);
                        None
                    }
                    Ok(None) => {
                        tracing::debug!(request_id = %request_id, "unknown bearer token");
                        None
                    }
                    Err(err) => {
                        tracing::error!(request_id = %request_id, error = %err, "authenticator failed");
                        Some(ApiError::new("Failed to verify admin credentials", err))
                    }
                },
                (Some(_), None) => None,
            };

            let mut response = match rejection {
                Some(error) => error.into_response(),
                None => inner.call(req).await?,
            };
            if let Ok(value) = HeaderValue::from_str(&request_id) {
                response.headers_mut().insert(REQUEST_ID_HEADER, value);
            }
            Ok(response)
        })
    }
}

/// Extracts bearer token from Authorization header.
fn extract_bearer_token(req: &Request<Body>) -> Option<String> {
    req.headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn extract_request_id(req: &Request<Body>) -> Option<String> {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        let req = Request::builder()
            .header("authorization", "Bearer admin_token_123")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_bearer_token(&req), Some("admin_token_123".to_string()));
    }

    #[test]
    fn test_non_bearer_scheme_ignored() {
        let req = Request::builder()
            .header("authorization", "Basic YWRtaW46YWRtaW4=")
            .body(Body::empty())
            .unwrap();

        assert!(extract_bearer_token(&req).is_none());
    }

    #[test]
    fn test_request_id_passthrough() {
        let req = Request::builder()
            .header(REQUEST_ID_HEADER, "abc-123")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_request_id(&req).as_deref(), Some("abc-123"));
    }

    #[tokio::test]
    async fn test_static_tokens() {
        let auth = StaticTokenAuthenticator::new(["s3cret"]);

        let principal = auth.authenticate("s3cret").await.unwrap().unwrap();
        assert!(principal.is_admin());
        assert!(auth.authenticate("guess").await.unwrap().is_none());
    }
}
