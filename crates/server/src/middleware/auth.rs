//! Authentication and permission extractors.
//!
//! The caller's identity is a [`CurrentUser`] stored in the session under
//! [`session_keys::CURRENT_USER`]. Handlers declare what they need:
//!
//! - [`RequireAuth`] - any logged-in caller
//! - [`RequirePermission<P>`] - a caller holding permission `P::NAME`

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::{AppError, set_sentry_user};
use crate::models::{CurrentUser, session_keys};

/// A named permission checked by [`RequirePermission`].
pub trait Permission {
    /// Permission name as granted in the session identity.
    const NAME: &'static str;
}

/// Administrative access to every address (`address.add`).
#[derive(Debug, Clone, Copy)]
pub struct AddressAdmin;

impl Permission for AddressAdmin {
    const NAME: &'static str = "address.add";
}

async fn current_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Extractor that requires a logged-in caller.
///
/// Rejects with 401 when the session carries no identity.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)
            .await
            .ok_or_else(|| AppError::Unauthorized("Login required".to_string()))?;

        set_sentry_user(&user);
        Ok(Self(user))
    }
}

/// Extractor that requires a caller holding permission `P`.
///
/// Rejects with 401 when not logged in and 403 when the permission is
/// missing.
///
/// # Example
///
/// ```rust,ignore
/// async fn admin_handler(
///     RequirePermission(user, _): RequirePermission<AddressAdmin>,
/// ) -> impl IntoResponse {
///     format!("Hello admin {}!", user.id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequirePermission<P>(pub CurrentUser, pub PhantomData<P>);

impl<S, P> FromRequestParts<S> for RequirePermission<P>
where
    S: Send + Sync,
    P: Permission + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;

        if !user.has_permission(P::NAME) {
            tracing::warn!(user_id = %user.id, permission = P::NAME, "Permission denied");
            return Err(AppError::Forbidden(P::NAME.to_string()));
        }

        Ok(Self(user, PhantomData))
    }
}

/// Helper to set the current user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;
    use tower_sessions::MemoryStore;

    use addressbook_core::{DomainCode, UserId};

    use super::*;

    async fn parts_with(user: Option<&CurrentUser>) -> Parts {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        if let Some(user) = user {
            set_current_user(&session, user).await.unwrap();
        }
        let (mut parts, ()) = Request::new(()).into_parts();
        parts.extensions.insert(session);
        parts
    }

    fn user(permissions: &[&str]) -> CurrentUser {
        CurrentUser {
            id: UserId::new("u1"),
            domain: DomainCode::new("acme"),
            permissions: permissions.iter().map(ToString::to_string).collect(),
        }
    }

    #[tokio::test]
    async fn test_require_auth_without_session_is_unauthorized() {
        let (mut parts, ()) = Request::new(()).into_parts();
        let err = RequireAuth::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_require_auth_reads_session_user() {
        let expected = user(&[]);
        let mut parts = parts_with(Some(&expected)).await;
        let RequireAuth(found) = RequireAuth::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(found, expected);
    }

    #[tokio::test]
    async fn test_require_permission_rejects_missing_permission() {
        let mut parts = parts_with(Some(&user(&["address.view"]))).await;
        let err = RequirePermission::<AddressAdmin>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_require_permission_rejects_anonymous() {
        let mut parts = parts_with(None).await;
        let err = RequirePermission::<AddressAdmin>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_require_permission_accepts_granted_user() {
        let mut parts = parts_with(Some(&user(&["address.add"]))).await;
        let RequirePermission(found, _) =
            RequirePermission::<AddressAdmin>::from_request_parts(&mut parts, &())
                .await
                .unwrap();
        assert_eq!(found.id, UserId::new("u1"));
    }
}
