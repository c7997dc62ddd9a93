use crate::{
    auth::{decode_session_token, hash_password, issue_session_token, verify_password},
    error::ActionError,
    models::{AppState, CurrentUser, NewUser, SignInForm, SignUpForm, User, UserRole},
    store::StoreError,
    validation::{validate_sign_in, validate_sign_up},
};

/// A freshly signed session for `user`.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub user: CurrentUser,
    pub token: String,
}

fn issue_for(state: &AppState, user: &User) -> Result<IssuedSession, ActionError> {
    let token = issue_session_token(
        &state.jwt_secret,
        user.id,
        &user.email,
        user.role,
        state.session_ttl_hours,
    )
    .map_err(ActionError::Unexpected)?;

    Ok(IssuedSession {
        user: CurrentUser::from(user),
        token,
    })
}

pub async fn sign_up(state: &AppState, form: &SignUpForm) -> Result<IssuedSession, ActionError> {
    let valid = validate_sign_up(form)?;

    if valid.role == UserRole::Admin && !state.allow_admin_signup {
        return Err(ActionError::Validation(
            "Admin accounts cannot be created through sign-up".into(),
        ));
    }

    if state.store.find_user_by_email(&valid.email).await?.is_some() {
        tracing::info!(email = %valid.email, "sign-up rejected: email already registered");
        return Err(ActionError::UserExists);
    }

    let password_hash = hash_password(&valid.password).map_err(ActionError::Unexpected)?;

    let user = state
        .store
        .insert_user(NewUser {
            email: valid.email,
            password_hash,
            first_name: valid.first_name,
            last_name: valid.last_name,
            phone: Some(valid.phone),
            role: valid.role,
            ..Default::default()
        })
        .await
        .map_err(|e| match e {
            // lost a race with a concurrent sign-up for the same email
            StoreError::Conflict(_) => ActionError::UserExists,
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, role = %user.role, "user signed up");
    issue_for(state, &user)
}

pub async fn sign_in(state: &AppState, form: &SignInForm) -> Result<IssuedSession, ActionError> {
    let valid = validate_sign_in(form)?;

    let Some(user) = state.store.find_user_by_email(&valid.email).await? else {
        tracing::warn!("sign-in failed: unknown email");
        return Err(ActionError::InvalidCredentials);
    };

    if !verify_password(&valid.password, &user.password_hash) {
        tracing::warn!(user_id = %user.id, "sign-in failed: bad password");
        return Err(ActionError::InvalidCredentials);
    }

    tracing::info!(user_id = %user.id, "user signed in");
    issue_for(state, &user)
}

/// Resolve a session token to the reduced user projection. Fails closed:
/// a bad signature, an expired token, a vanished user or a store error
/// all yield `None`.
pub async fn current_user(state: &AppState, token: Option<&str>) -> Option<CurrentUser> {
    let claims = decode_session_token(&state.jwt_secret, token?)?;

    match state.store.find_user_by_id(claims.sub).await {
        Ok(user) => user.as_ref().map(CurrentUser::from),
        Err(e) => {
            tracing::error!(error = %e, "session user lookup failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::state_with_memory_store;

    fn form(email: &str) -> SignUpForm {
        SignUpForm {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            phone: "5551234567".into(),
            role: "PATIENT".into(),
            password: "password1".into(),
            confirm_password: "password1".into(),
        }
    }

    #[tokio::test]
    async fn sign_up_stores_a_hash_and_issues_a_session() {
        let state = state_with_memory_store();
        let issued = sign_up(&state, &form("a@b.com")).await.unwrap();

        let stored = state.store.find_user_by_email("a@b.com").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "password1");
        assert!(verify_password("password1", &stored.password_hash));

        let me = current_user(&state, Some(&issued.token)).await.unwrap();
        assert_eq!(me.id, stored.id);
        assert_eq!(me.role, UserRole::Patient);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_without_a_second_record() {
        let state = state_with_memory_store();
        sign_up(&state, &form("a@b.com")).await.unwrap();

        let err = sign_up(&state, &form("a@b.com")).await.unwrap_err();
        assert!(matches!(err, ActionError::UserExists));
        assert_eq!(err.to_string(), "User already exists with this email");
        assert_eq!(state.store.count_users_by_role(UserRole::Patient).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn mismatched_passwords_fail_validation() {
        let state = state_with_memory_store();
        let mut f = form("a@b.com");
        f.confirm_password = "password2".into();

        let err = sign_up(&state, &f).await.unwrap_err();
        assert_eq!(err.to_string(), "Passwords don't match");
        assert!(state.store.find_user_by_email("a@b.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn admin_sign_up_is_gated() {
        let mut state = state_with_memory_store();
        let mut f = form("root@b.com");
        f.role = "admin".into();
        assert!(matches!(
            sign_up(&state, &f).await.unwrap_err(),
            ActionError::Validation(_)
        ));

        state.allow_admin_signup = true;
        let issued = sign_up(&state, &f).await.unwrap();
        assert_eq!(issued.user.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn sign_in_checks_the_stored_hash() {
        let state = state_with_memory_store();
        sign_up(&state, &form("a@b.com")).await.unwrap();

        let ok = sign_in(
            &state,
            &SignInForm {
                email: "a@b.com".into(),
                password: "password1".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(ok.user.email, "a@b.com");

        for (email, password) in [("a@b.com", "wrong-pass"), ("nobody@b.com", "password1")] {
            let err = sign_in(
                &state,
                &SignInForm {
                    email: email.into(),
                    password: password.into(),
                },
            )
            .await
            .unwrap_err();
            assert_eq!(err.to_string(), "Invalid email or password");
        }
    }

    #[tokio::test]
    async fn current_user_fails_closed() {
        let state = state_with_memory_store();
        assert!(current_user(&state, None).await.is_none());
        assert!(current_user(&state, Some("garbage")).await.is_none());

        // valid signature, but the user does not exist
        let token = issue_session_token(
            &state.jwt_secret,
            uuid::Uuid::new_v4(),
            "ghost@b.com",
            UserRole::Patient,
            1,
        )
        .unwrap();
        assert!(current_user(&state, Some(&token)).await.is_none());
    }
}
