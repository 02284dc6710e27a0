//! User model, session claims and signup/login payloads

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{AppError, SignupValidity};

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{3,30}$").expect("valid username pattern"));

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Patron,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Patron => "patron",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "patron" => Ok(Role::Patron),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

// Stored as TEXT, constrained by a CHECK in the schema
impl sqlx::Type<Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Role {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// User as stored in the credential store
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Validated signup input handed to the credential store
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Signup request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    /// 3-30 characters, letters, digits and underscore
    #[validate(required, regex(path = *USERNAME_RE))]
    pub username: Option<String>,
    #[validate(required, regex(path = *EMAIL_RE))]
    pub email: Option<String>,
    /// At least 8 characters
    #[validate(required, length(min = 8))]
    pub password: Option<String>,
    /// Requested role ("admin" requires an invite code)
    pub role: Option<String>,
    pub admin_invite_code: Option<String>,
}

impl SignupRequest {
    /// Per-field validity flags for this payload
    pub fn validity(&self) -> SignupValidity {
        match self.validate() {
            Ok(()) => SignupValidity {
                username_valid: true,
                email_valid: true,
                password_valid: true,
            },
            Err(errors) => {
                let fields = errors.field_errors();
                SignupValidity {
                    username_valid: !fields.contains_key("username"),
                    email_valid: !fields.contains_key("email"),
                    password_valid: !fields.contains_key("password"),
                }
            }
        }
    }

    pub fn wants_admin(&self) -> bool {
        self.role.as_deref() == Some(Role::Admin.as_str())
    }
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Username or email address
    pub username_or_email: Option<String>,
    pub password: Option<String>,
}

/// Signup and login response
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// Current user response
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: User,
}

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub id: i32,
    pub username: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }

    /// Require the caller to be `user_id` or an admin
    pub fn require_self_or_admin(&self, user_id: i32) -> Result<(), AppError> {
        if self.id == user_id || self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Cannot access another user's checkouts".to_string()))
        }
    }
}
