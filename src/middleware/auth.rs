use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::{validate_jwt, AuthError, Claims};
use crate::database::models::User;
use crate::error::ApiError;
use crate::services::UserService;

/// Authorization schemes accepted in front of the token
const SCHEMES: [&str; 2] = ["Token", "Bearer"];

/// Caller resolved from a valid, unrevoked token
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub user: User,
    pub token: String,
    pub claims: Claims,
}

impl CurrentUser {
    pub fn id(&self) -> i64 {
        self.user.id
    }
}

/// Resolves the optional caller for every request.
///
/// No `Authorization` header means an anonymous request. A header that is
/// present but malformed, expired, revoked, or names an inactive user is
/// rejected with 401 even on public endpoints.
pub async fn authenticate(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, ApiError> {
    if let Some(token) = extract_token(request.headers())? {
        let current = resolve(&state, token).await?;
        request.extensions_mut().insert(current);
    }
    Ok(next.run(request).await)
}

async fn resolve(state: &AppState, token: String) -> Result<CurrentUser, ApiError> {
    let claims = validate_jwt(&token).map_err(|e| {
        tracing::debug!("Rejected token: {}", e);
        ApiError::from(e)
    })?;

    let users = UserService::new(state.pool.clone());
    if users.is_revoked(&token).await? {
        return Err(AuthError::Revoked.into());
    }

    match users.find(claims.sub).await? {
        Some(user) if user.is_active => Ok(CurrentUser { user, token, claims }),
        Some(_) => Err(ApiError::unauthorized("User inactive or deleted.")),
        None => Err(ApiError::unauthorized("Invalid token.")),
    }
}

/// Token from `Authorization: Token <jwt>` or `Authorization: Bearer <jwt>`
fn extract_token(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| ApiError::unauthorized("Invalid token header. Token string should not contain invalid characters."))?;

    let mut parts = value.split_whitespace();
    let (Some(scheme), token, rest) = (parts.next(), parts.next(), parts.next()) else {
        return Ok(None);
    };
    if !SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme)) {
        // Some other scheme; treat as anonymous
        return Ok(None);
    }

    match (token, rest) {
        (Some(token), None) => Ok(Some(token.to_string())),
        (None, _) => Err(ApiError::unauthorized("Invalid token header. No credentials provided.")),
        (Some(_), Some(_)) => Err(ApiError::unauthorized(
            "Invalid token header. Token string should not contain spaces.",
        )),
    }
}

/// Extractor for endpoints that need a logged-in caller; 401 otherwise
#[derive(Clone, Debug)]
pub struct AuthUser(pub CurrentUser);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .map(AuthUser)
            .ok_or_else(ApiError::not_authenticated)
    }
}

/// Extractor for endpoints open to everyone that still personalise for a known caller
#[derive(Clone, Debug)]
pub struct MaybeAuthUser(pub Option<CurrentUser>);

impl MaybeAuthUser {
    pub fn id(&self) -> Option<i64> {
        self.0.as_ref().map(CurrentUser::id)
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for MaybeAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(parts.extensions.get::<CurrentUser>().cloned()))
    }
}
