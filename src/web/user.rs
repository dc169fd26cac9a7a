use crate::db::{self, DbUser, Gender};
use crate::domain::password;
use crate::error::{self, ApiError};
use crate::middleware::RateLimiter;
use crate::state::SharedState;
use crate::web::session::{self, UserSession};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString},
    Argon2, PasswordVerifier,
};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

static REGISTER_RATE_LIMITER: Lazy<RateLimiter> = Lazy::new(|| RateLimiter::new(10, 60));
static TOKEN_RATE_LIMITER: Lazy<RateLimiter> = Lazy::new(|| RateLimiter::new(5, 60));

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", post(register))
        .route("/token", post(token))
        .route("/me", get(me).patch(update_me))
        .with_state(state)
}

#[derive(Deserialize)]
struct RegisterRequest {
    email: Option<String>,
    password: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    gender: Option<String>,
}

#[derive(Deserialize)]
struct TokenRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Serialize)]
struct TokenResponse {
    token: String,
}

#[derive(Deserialize)]
struct UpdateProfileRequest {
    email: Option<String>,
    password: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    gender: Option<String>,
}

#[derive(Serialize)]
struct UserResponse {
    id: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    gender: Gender,
    is_staff: bool,
    is_family: bool,
    created_at: DateTime<Utc>,
}

impl From<DbUser> for UserResponse {
    fn from(user: DbUser) -> Self {
        UserResponse {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            gender: user.gender,
            is_staff: user.is_staff,
            is_family: user.is_family,
            created_at: user.created_at,
        }
    }
}

async fn register(
    headers: HeaderMap,
    State(state): State<SharedState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let ip = client_ip(&headers);
    if !REGISTER_RATE_LIMITER.check(&ip).await {
        tracing::warn!("Registration rate limit exceeded for IP: {}", ip);
        return Err(ApiError::validation("too many registration attempts"));
    }

    let email = normalize_email(payload.email.as_deref())
        .ok_or_else(|| ApiError::validation("a valid email address is required"))?;
    let first_name = required_name(payload.first_name.as_deref(), "first_name")?;
    let last_name = required_name(payload.last_name.as_deref(), "last_name")?;
    let gender = parse_gender(payload.gender.as_deref())?;

    let password = payload
        .password
        .as_deref()
        .ok_or_else(|| ApiError::validation("password is required"))?;
    password::validate(password).map_err(|e| ApiError::validation(e.to_string()))?;

    let hash = hash_password(password)?;

    let user = db::insert_user(&state.pool, &email, &hash, &first_name, &last_name, gender)
        .await
        .map_err(|e| {
            if error::is_unique_violation(&e) {
                ApiError::validation("a user with this email already exists")
            } else {
                e.into()
            }
        })?;

    tracing::info!("Registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(user.into())))
}

async fn token(
    headers: HeaderMap,
    State(state): State<SharedState>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let ip = client_ip(&headers);
    if !TOKEN_RATE_LIMITER.check(&ip).await {
        tracing::warn!("Token rate limit exceeded for IP: {}", ip);
        return Err(ApiError::validation("too many authentication attempts"));
    }

    // Bad credentials answer 400, and every failure path answers the same
    // way, so callers cannot probe which emails are registered.
    let credential_error = || ApiError::validation("unable to authenticate with provided credentials");

    let email = normalize_email(payload.email.as_deref()).ok_or_else(credential_error)?;
    let password = payload.password.as_deref().ok_or_else(credential_error)?;

    let user = db::find_user_by_email(&state.pool, &email)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(credential_error)?;

    let parsed_hash = PasswordHash::new(&user.hash).map_err(|_| credential_error())?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| credential_error())?;

    let token = session::sign_session(user.id, &state.session_key)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))?;

    Ok(Json(TokenResponse { token }))
}

async fn me(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = db::find_user_by_id(&state.pool, user_id)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    Ok(Json(user.into()))
}

async fn update_me(
    UserSession(user_id): UserSession,
    State(state): State<SharedState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let current = db::find_user_by_id(&state.pool, user_id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    let email = match payload.email.as_deref() {
        Some(raw) => normalize_email(Some(raw))
            .ok_or_else(|| ApiError::validation("a valid email address is required"))?,
        None => current.email.clone(),
    };
    let first_name = match payload.first_name.as_deref() {
        Some(raw) => required_name(Some(raw), "first_name")?,
        None => current.first_name.clone(),
    };
    let last_name = match payload.last_name.as_deref() {
        Some(raw) => required_name(Some(raw), "last_name")?,
        None => current.last_name.clone(),
    };
    let gender = match payload.gender.as_deref() {
        Some(raw) => parse_gender(Some(raw))?,
        None => current.gender,
    };

    let hash = match payload.password.as_deref() {
        Some(password) => {
            password::validate(password).map_err(|e| ApiError::validation(e.to_string()))?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    let user = db::update_user(
        &state.pool,
        user_id,
        &email,
        &first_name,
        &last_name,
        gender,
        hash.as_deref(),
    )
    .await
    .map_err(|e| {
        if error::is_unique_violation(&e) {
            ApiError::validation("a user with this email already exists")
        } else {
            e.into()
        }
    })?;

    Ok(Json(user.into()))
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("failed to hash password: {e}")))
}

fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .unwrap_or("unknown")
        .trim()
        .to_string()
}

fn normalize_email(raw: Option<&str>) -> Option<String> {
    let email = raw?.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return None;
    }
    if email.chars().any(char::is_whitespace) {
        return None;
    }
    Some(email)
}

fn required_name(raw: Option<&str>, field: &str) -> Result<String, ApiError> {
    raw.map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::validation(format!("{field} must not be blank")))
}

fn parse_gender(raw: Option<&str>) -> Result<Gender, ApiError> {
    raw.and_then(|value| Gender::try_from(value).ok())
        .ok_or_else(|| ApiError::validation("gender must be one of male, female or other"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_and_lowercases_email() {
        assert_eq!(
            normalize_email(Some("  User@Example.COM ")),
            Some("user@example.com".to_string())
        );
    }

    #[test]
    fn rejects_email_without_domain_dot() {
        assert_eq!(normalize_email(Some("user@localhost")), None);
        assert_eq!(normalize_email(Some("not-an-email")), None);
        assert_eq!(normalize_email(None), None);
    }

    #[test]
    fn parses_known_genders_only() {
        assert_eq!(parse_gender(Some("male")).unwrap(), Gender::Male);
        assert_eq!(parse_gender(Some(" Female ")).unwrap(), Gender::Female);
        assert!(parse_gender(Some("男性")).is_err());
        assert!(parse_gender(Some("")).is_err());
        assert!(parse_gender(None).is_err());
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(required_name(Some("  "), "first_name").is_err());
        assert!(required_name(None, "last_name").is_err());
        assert_eq!(
            required_name(Some(" Taro "), "first_name").unwrap(),
            "Taro"
        );
    }
}
