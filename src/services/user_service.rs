use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use validator::{Validate, ValidationError};

use crate::api::format::UserView;
use crate::api::validation::{
    check_text, validate_username, FieldErrors, MAX_EMAIL_LENGTH, MAX_PASSWORD_LENGTH, MAX_PERSON_NAME_LENGTH,
};
use crate::auth::{self, hash_password, verify_password, Claims};
use crate::database::models::{User, UserRow};
use crate::database::query_builder::QueryBuilder;
use crate::database::{Repository, Table};
use crate::error::ApiError;
use crate::filter::{FilterWhere, PageRequest, SqlParam, UserFilter};

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

/// Registration data that passed presence and length checks
#[derive(Debug, Validate)]
pub struct NewUser {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(custom(function = "username_rule"))]
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub is_superuser: bool,
}

fn username_rule(username: &str) -> Result<(), ValidationError> {
    validate_username(username).map_err(|message| {
        let mut error = ValidationError::new("invalid_username");
        error.message = Some(message.into());
        error
    })
}

impl RegisterRequest {
    pub fn into_new_user(self) -> Result<NewUser, ApiError> {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "email", self.email.as_deref(), Some(MAX_EMAIL_LENGTH));
        check_text(&mut errors, "username", self.username.as_deref(), Some(MAX_PERSON_NAME_LENGTH));
        check_text(&mut errors, "first_name", self.first_name.as_deref(), Some(MAX_PERSON_NAME_LENGTH));
        check_text(&mut errors, "last_name", self.last_name.as_deref(), Some(MAX_PERSON_NAME_LENGTH));
        check_text(&mut errors, "password", self.password.as_deref(), Some(MAX_PASSWORD_LENGTH));

        let new_user = NewUser {
            email: self.email.unwrap_or_default().trim().to_string(),
            username: self.username.unwrap_or_default().trim().to_string(),
            first_name: self.first_name.unwrap_or_default().trim().to_string(),
            last_name: self.last_name.unwrap_or_default().trim().to_string(),
            password: self.password.unwrap_or_default(),
            is_superuser: false,
        };

        if let Err(invalid) = new_user.validate() {
            let mut format_errors = FieldErrors::from(invalid);
            // Presence problems already reported for these fields
            for field in ["email", "username"] {
                if errors.contains(field) {
                    format_errors.remove(field);
                }
            }
            errors.merge(format_errors);
        }

        errors.into_result()?;
        Ok(new_user)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SetPasswordRequest {
    pub new_password: Option<String>,
    pub current_password: Option<String>,
}

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Paginated user listing; `filter` may narrow it to authors the viewer follows
    pub async fn list(
        &self,
        viewer: Option<i64>,
        filter: &UserFilter,
        page: &PageRequest,
    ) -> Result<(Vec<UserView>, i64), ApiError> {
        let count = QueryBuilder::new("1", UserRow::SOURCE)
            .filter(&filter.to_where(viewer, 0))
            .count(&self.pool)
            .await?;
        page.ensure_in_range(count)?;

        let conditions = filter.to_where(viewer, 1);
        let rows: Vec<UserRow> = QueryBuilder::new(UserRow::COLUMNS, UserRow::SOURCE)
            .leading(vec![SqlParam::OptionalInt(viewer)])
            .filter(&conditions)
            .order(UserRow::ORDER_BY)
            .page(page.limit, page.offset())
            .select_all(&self.pool)
            .await?;

        let users = rows.iter().map(|row| UserView::new(&row.user, row.is_subscribed)).collect();
        Ok((users, count))
    }

    /// Profile as seen by `viewer`
    pub async fn get(&self, viewer: Option<i64>, id: i64) -> Result<UserView, ApiError> {
        let mut conditions = FilterWhere::new(1);
        conditions.eq("u.id", SqlParam::Int(id));
        let row: Option<UserRow> = QueryBuilder::new(UserRow::COLUMNS, UserRow::SOURCE)
            .leading(vec![SqlParam::OptionalInt(viewer)])
            .filter(&conditions)
            .select_optional(&self.pool)
            .await?;

        row.map(|row| UserView::new(&row.user, row.is_subscribed))
            .ok_or_else(|| ApiError::not_found("User not found."))
    }

    pub async fn find(&self, id: i64) -> Result<Option<User>, ApiError> {
        Ok(Repository::<User>::new(self.pool.clone()).select_optional(id).await?)
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<User, ApiError> {
        let new_user = request.into_new_user()?;
        self.create(new_user).await
    }

    /// Insert a validated user, reporting taken emails and usernames as field errors
    pub async fn create(&self, new_user: NewUser) -> Result<User, ApiError> {
        let (email_taken, username_taken): (bool, bool) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(email) = LOWER($1)), \
                    EXISTS (SELECT 1 FROM users WHERE username = $2)",
        )
        .bind(&new_user.email)
        .bind(&new_user.username)
        .fetch_one(&self.pool)
        .await?;

        let mut errors = FieldErrors::new();
        if email_taken {
            errors.add("email", "A user with that email already exists.");
        }
        if username_taken {
            errors.add("username", "A user with that username already exists.");
        }
        errors.into_result()?;

        let password_hash = hash_password(&new_user.password)?;
        let sql = format!(
            "INSERT INTO users (email, username, first_name, last_name, password_hash, is_superuser) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            User::COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&new_user.email)
            .bind(&new_user.username)
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .bind(&password_hash)
            .bind(new_user.is_superuser)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                let e = crate::database::DatabaseError::from(e);
                if e.is_unique_violation() {
                    ApiError::non_field("A user with these credentials already exists.")
                } else {
                    e.into()
                }
            })?;

        info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Exchange email and password for a token
    pub async fn login(&self, request: LoginRequest) -> Result<String, ApiError> {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "email", request.email.as_deref(), None);
        check_text(&mut errors, "password", request.password.as_deref(), None);
        errors.into_result()?;

        let email = request.email.unwrap_or_default();
        let password = request.password.unwrap_or_default();
        let sql = format!("SELECT {} FROM users WHERE LOWER(email) = LOWER($1)", User::COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;

        let user = match user {
            Some(user) if user.is_active && verify_password(&password, &user.password_hash)? => user,
            _ => {
                tracing::warn!("Failed login attempt for {}", email.trim());
                return Err(ApiError::non_field("Unable to log in with provided credentials."));
            }
        };

        let token = auth::generate_jwt(&Claims::new(user.id))?;
        info!("User {} logged in", user.id);
        Ok(token)
    }

    /// Revoke a token until its natural expiry
    pub async fn logout(&self, token: &str, claims: &Claims) -> Result<(), ApiError> {
        sqlx::query(
            "INSERT INTO revoked_tokens (token_hash, expires_at) VALUES ($1, $2) \
             ON CONFLICT (token_hash) DO NOTHING",
        )
        .bind(auth::token_fingerprint(token))
        .bind(claims.expires_at())
        .execute(&self.pool)
        .await?;
        info!("User {} logged out", claims.sub);
        Ok(())
    }

    pub async fn is_revoked(&self, token: &str) -> Result<bool, ApiError> {
        let (revoked,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE token_hash = $1)")
                .bind(auth::token_fingerprint(token))
                .fetch_one(&self.pool)
                .await?;
        Ok(revoked)
    }

    pub async fn set_password(&self, user: &User, request: SetPasswordRequest) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        check_text(&mut errors, "new_password", request.new_password.as_deref(), Some(MAX_PASSWORD_LENGTH));
        check_text(&mut errors, "current_password", request.current_password.as_deref(), None);
        errors.into_result()?;

        let current = request.current_password.unwrap_or_default();
        if !verify_password(&current, &user.password_hash)? {
            return Err(ApiError::bad_request("Current password is incorrect."));
        }

        let password_hash = hash_password(&request.new_password.unwrap_or_default())?;
        sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(user.id)
            .execute(&self.pool)
            .await?;
        info!("User {} changed password", user.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterRequest {
        RegisterRequest {
            email: Some("anna@example.com".into()),
            username: Some("anna".into()),
            first_name: Some("Anna".into()),
            last_name: Some("Cook".into()),
            password: Some("s3cret-pass".into()),
        }
    }

    fn field_errors(err: ApiError) -> FieldErrors {
        match err {
            ApiError::ValidationError(errors) => errors,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn valid_registration_is_trimmed() {
        let mut req = request();
        req.username = Some("  anna ".into());
        let user = req.into_new_user().unwrap();
        assert_eq!(user.username, "anna");
        assert!(!user.is_superuser);
    }

    #[test]
    fn missing_fields_are_required() {
        let errors = field_errors(RegisterRequest::default().into_new_user().unwrap_err());
        for field in ["email", "username", "first_name", "last_name", "password"] {
            assert_eq!(errors.get(field), Some(&[crate::api::validation::REQUIRED.to_string()][..]), "{}", field);
        }
    }

    #[test]
    fn format_rules_apply() {
        let mut req = request();
        req.email = Some("not-an-email".into());
        req.username = Some("me".into());
        let errors = field_errors(req.into_new_user().unwrap_err());
        assert!(errors.contains("email"));
        assert!(errors.contains("username"));
        assert!(!errors.contains("password"));
    }

    #[test]
    fn overlong_names_are_rejected() {
        let mut req = request();
        req.first_name = Some("x".repeat(151));
        let errors = field_errors(req.into_new_user().unwrap_err());
        assert!(errors.contains("first_name"));
    }
}
