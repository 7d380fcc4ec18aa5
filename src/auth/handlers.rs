use axum::{
    extract::{FromRef, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde_json::json;
use tracing::{error, info, instrument, warn};

use crate::{
    admin::audit::{self, AuditAction},
    auth::{
        dto::{
            AuthResponse, ChangePasswordRequest, GoogleCallback, LoginRequest, MessageResponse,
            PublicUser, SignupRequest, SignupResponse, UpdateProfileRequest,
        },
        extractors::AuthUser,
        jwt::JwtKeys,
        oauth,
        password::{check_account_password, hash_password, PasswordCheck},
        repo::is_unique_violation,
        repo_types::User,
    },
    error::{AppError, AppResult},
    extract::ValidatedJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup/local", put(signup))
        .route("/auth/login", post(login))
        .route("/auth/signup/google", get(google_start))
        .route("/auth/signup/google/callback", get(google_callback))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(get_me))
        .route("/auth/profile", patch(update_profile))
        .route("/auth/password", patch(change_password))
        .route("/auth/account", delete(delete_account))
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn email_taken(email: &str) -> AppError {
    AppError::Conflict {
        message: "Email already registered".into(),
        data: Some(json!({ "code": "EMAIL_EXISTS", "email": email })),
    }
}

fn auth_response(state: &AppState, user: &User) -> AppResult<AuthResponse> {
    let keys = JwtKeys::from_ref(state);
    let token = keys.sign(user).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        AppError::Internal(e)
    })?;
    Ok(AuthResponse {
        token,
        user_id: user.id,
        email: user.email.clone(),
        is_admin: user.is_admin,
    })
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<SignupRequest>,
) -> AppResult<(StatusCode, Json<SignupResponse>)> {
    let email = normalize_email(&payload.email);

    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!(%email, "email already registered");
        return Err(email_taken(&email));
    }

    let hash = hash_password(&payload.password)?;
    let user = match User::create_local(&state.db, payload.name.trim(), &email, &hash).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => return Err(email_taken(&email)),
        Err(e) => {
            error!(error = %e, "create user failed");
            return Err(e.into());
        }
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created!",
            user_id: user.id,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = normalize_email(&payload.email);

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        warn!(%email, "login unknown email");
        return Err(AppError::Unauthorized(
            "A user with this email could not be found".into(),
        ));
    };

    match check_account_password(user.password_hash.as_deref(), &payload.password)? {
        PasswordCheck::Match => {}
        PasswordCheck::NoLocalPassword => {
            warn!(user_id = %user.id, "password login on google account");
            return Err(AppError::Unauthorized("Please sign in using Google".into()));
        }
        PasswordCheck::Mismatch => {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AppError::Unauthorized("Wrong password!".into()));
        }
    }

    if user.is_admin {
        let logged =
            audit::record_on_pool(&state.db, user.id, AuditAction::Login, None, json!({})).await;
        if let Err(e) = logged {
            error!(error = %e, user_id = %user.id, "audit login failed");
        }
    }

    info!(user_id = %user.id, "user logged in");
    Ok(Json(auth_response(&state, &user)?))
}

/// Starts the Google authorization-code flow.
#[instrument(skip(state))]
pub async fn google_start(State(state): State<AppState>) -> AppResult<Response> {
    let nonce = oauth::new_state();
    let url = state.identity.authorize_url(&nonce)?;
    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, url),
            (header::SET_COOKIE, oauth::state_cookie(&nonce)),
        ],
    )
        .into_response())
}

#[instrument(skip(state, headers, params))]
pub async fn google_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<GoogleCallback>,
) -> AppResult<Response> {
    if let Some(reason) = params.error {
        warn!(%reason, "google sign-in refused");
        return Err(AppError::Unauthorized("Google sign-in was cancelled".into()));
    }

    let expected = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(oauth::state_from_cookie_header);
    match (expected, params.state.as_deref()) {
        (Some(a), Some(b)) if a == b => {}
        _ => {
            warn!("oauth state mismatch");
            return Err(AppError::Unauthorized("Invalid OAuth state".into()));
        }
    }

    let code = params
        .code
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".into()))?;

    let profile = state.identity.fetch_profile(&code).await.map_err(|e| {
        error!(error = ?e, "google profile fetch failed");
        AppError::Unauthorized("Google authentication failed".into())
    })?;
    if !profile.email_verified {
        return Err(AppError::Unauthorized("Google email is not verified".into()));
    }

    let email = normalize_email(&profile.email);
    let user = match User::find_by_email(&state.db, &email).await? {
        Some(u) => u,
        None => {
            let u = User::create_google(&state.db, &profile.display_name(), &email, &profile.sub)
                .await?;
            info!(user_id = %u.id, "user registered via google");
            u
        }
    };

    let body = auth_response(&state, &user)?;
    info!(user_id = %user.id, "user logged in via google");
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, oauth::clear_state_cookie())],
        Json(body),
    )
        .into_response())
}

async fn load_user(state: &AppState, user_id: uuid::Uuid) -> AppResult<User> {
    User::find_by_id(&state.db, user_id).await?.ok_or_else(|| {
        warn!(%user_id, "token for missing user");
        AppError::NotFound("User not found".into())
    })
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<PublicUser>> {
    Ok(Json(load_user(&state, user_id).await?.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let email = payload.email.as_deref().map(normalize_email);
    if let Some(email) = email.as_deref() {
        if let Some(existing) = User::find_by_email(&state.db, email).await? {
            if existing.id != user_id {
                return Err(AppError::Conflict {
                    message: "Email already in use".into(),
                    data: None,
                });
            }
        }
    }

    let name = payload.name.as_deref().map(str::trim);
    let user = match User::update_profile(&state.db, user_id, name, email.as_deref()).await {
        Ok(u) => u,
        Err(sqlx::Error::RowNotFound) => return Err(AppError::NotFound("User not found".into())),
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::Conflict {
                message: "Email already in use".into(),
                data: None,
            })
        }
        Err(e) => return Err(e.into()),
    };

    info!(%user_id, "profile updated");
    Ok(Json(json!({
        "message": "Profile updated",
        "user": { "name": user.name, "email": user.email },
    })))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let user = load_user(&state, user_id).await?;

    match check_account_password(user.password_hash.as_deref(), &payload.current_password)? {
        PasswordCheck::Match => {}
        PasswordCheck::NoLocalPassword => {
            return Err(AppError::Forbidden {
                message: "Google-authenticated users cannot change password".into(),
                data: None,
            })
        }
        PasswordCheck::Mismatch => {
            warn!(%user_id, "change password with wrong current password");
            return Err(AppError::Unauthorized("Current password is incorrect".into()));
        }
    }

    let new_hash = hash_password(&payload.new_password)?;
    User::set_password(&state.db, user_id, &new_hash).await?;
    info!(%user_id, "password changed");
    Ok(Json(MessageResponse {
        message: "Password updated successfully",
    }))
}

#[instrument(skip(state))]
pub async fn delete_account(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<MessageResponse>> {
    if !User::delete(&state.db, user_id).await? {
        return Err(AppError::NotFound("User not found".into()));
    }
    info!(%user_id, "account deleted");
    Ok(Json(MessageResponse {
        message: "Account deleted successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn duplicate_email_carries_code() {
        match email_taken("a@b.co") {
            AppError::Conflict { data: Some(d), .. } => {
                assert_eq!(d["code"], "EMAIL_EXISTS");
                assert_eq!(d["email"], "a@b.co");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
