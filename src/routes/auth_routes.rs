use axum::{
    Form, Json, Router,
    extract::State,
    http::HeaderMap,
    response::Redirect,
    routing::{get, post},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};

use crate::{
    auth::SESSION_COOKIE,
    error::ActionError,
    middleware::auth_context::session_token,
    models::{ActionResponse, ApiOk, AppState, CurrentUser, SignInForm, SignUpForm},
    services::account_service::{self, IssuedSession},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(sign_up))
        .route("/sign-in", post(sign_in))
        .route("/sign-out", post(sign_out))
        .route("/me", get(me))
}

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.cookie_secure)
        .max_age(time::Duration::hours(state.session_ttl_hours))
        .build()
}

fn with_session(
    state: &AppState,
    jar: CookieJar,
    issued: IssuedSession,
) -> (CookieJar, Json<ActionResponse>) {
    (
        jar.add(session_cookie(state, issued.token)),
        Json(ActionResponse::ok()),
    )
}

pub async fn sign_up(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignUpForm>,
) -> Result<(CookieJar, Json<ActionResponse>), ActionError> {
    let issued = account_service::sign_up(&state, &form).await?;
    Ok(with_session(&state, jar, issued))
}

pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignInForm>,
) -> Result<(CookieJar, Json<ActionResponse>), ActionError> {
    let issued = account_service::sign_in(&state, &form).await?;
    Ok(with_session(&state, jar, issued))
}

pub async fn sign_out(jar: CookieJar) -> (CookieJar, Redirect) {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Redirect::to("/"),
    )
}

/// The current user, or `null` when there is no valid session.
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<ApiOk<Option<CurrentUser>>> {
    let token = session_token(&headers);
    let user = account_service::current_user(&state, token.as_deref()).await;
    Json(ApiOk { data: user })
}
