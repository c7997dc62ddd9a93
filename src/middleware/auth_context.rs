use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use axum_extra::extract::CookieJar;
use headers::{Authorization, HeaderMapExt, authorization::Bearer};

use crate::auth::SESSION_COOKIE;
use crate::error::ApiError;
use crate::models::{AppState, CurrentUser, UserRole};
use crate::services::account_service;

/// The signed-in user behind a request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: CurrentUser,
}

impl AuthContext {
    pub fn ensure_admin(&self) -> Result<(), ApiError> {
        if self.user.role == UserRole::Admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "FORBIDDEN",
                "Only admins can do this".into(),
            ))
        }
    }

    /// Admins and doctors.
    pub fn ensure_staff(&self) -> Result<(), ApiError> {
        match self.user.role {
            UserRole::Admin | UserRole::Doctor => Ok(()),
            UserRole::Patient => Err(ApiError::Forbidden(
                "FORBIDDEN",
                "Only clinic staff can view the dashboard".into(),
            )),
        }
    }
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            let token = session_token(&parts.headers).ok_or_else(ApiError::not_signed_in)?;

            let user = account_service::current_user(state, Some(&token))
                .await
                .ok_or_else(ApiError::not_signed_in)?;

            Ok(AuthContext { user })
        }
    }
}

/// Session token from the `auth-token` cookie, falling back to
/// `Authorization: Bearer`.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(c) = jar.get(SESSION_COOKIE) {
        return Some(c.value().to_string());
    }

    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|authz| authz.token().to_string())
}
