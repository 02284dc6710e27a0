//! Signup, login and password handling

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    error::{AppError, AppResult},
    models::user::{LoginRequest, NewUser, Role, SignupRequest, User, UserClaims},
    repository::Repository,
};

use super::tokens::TokenService;

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    tokens: TokenService,
    admin_invite_code: Option<String>,
}

impl AuthService {
    pub fn new(repository: Repository, tokens: TokenService, admin_invite_code: Option<String>) -> Self {
        Self {
            repository,
            tokens,
            admin_invite_code: admin_invite_code.filter(|code| !code.is_empty()),
        }
    }

    /// Register a new user and return it with a session token
    pub async fn signup(&self, request: SignupRequest) -> AppResult<(User, String)> {
        let validity = request.validity();
        if !(validity.username_valid && validity.email_valid && validity.password_valid) {
            tracing::warn!(?validity, "Signup validation failed");
            return Err(AppError::InvalidSignup(validity));
        }

        let role = if request.wants_admin() {
            self.authorize_admin_signup(request.admin_invite_code.as_deref())?;
            Role::Admin
        } else {
            Role::Patron
        };

        let new_user = NewUser {
            username: request.username.unwrap_or_default(),
            email: request.email.unwrap_or_default(),
            password: request.password.unwrap_or_default(),
            role,
        };

        let password_hash = hash_password(new_user.password.clone()).await?;

        // The row is only committed once a token could be issued for it
        let mut tx = self.repository.pool.begin().await?;
        let user = self
            .repository
            .users
            .create(&mut tx, &new_user, &password_hash)
            .await?;
        let token = self.tokens.issue(&user)?;
        tx.commit().await?;

        tracing::info!(user_id = user.id, role = %user.role, "User signed up");
        Ok((user, token))
    }

    /// Authenticate by username or email and return the user with a session token
    pub async fn login(&self, request: LoginRequest) -> AppResult<(User, String)> {
        let (identity, password) = match (request.username_or_email, request.password) {
            (Some(identity), Some(password)) => (identity, password),
            _ => return Err(AppError::Validation("Invalid input".to_string())),
        };

        let user = match self.repository.users.find_by_identity(&identity).await? {
            Some(user) => user,
            None => {
                tracing::warn!("Login failed: unknown user");
                return Err(AppError::Authentication("Invalid credentials".to_string()));
            }
        };

        if !verify_password(password, user.password_hash.clone()).await? {
            tracing::warn!(user_id = user.id, "Login failed: password mismatch");
            return Err(AppError::Authentication("Invalid credentials".to_string()));
        }

        let token = self.tokens.issue(&user)?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok((user, token))
    }

    /// Verify a bearer token
    pub fn verify_token(&self, token: &str) -> AppResult<UserClaims> {
        self.tokens.verify(token)
    }

    /// Load the user behind verified claims
    pub async fn current_user(&self, claims: &UserClaims) -> AppResult<User> {
        self.repository.users.get_by_id(claims.id).await
    }

    /// Admin signup is only possible with the configured invite code
    fn authorize_admin_signup(&self, invite_code: Option<&str>) -> AppResult<()> {
        let Some(required) = self.admin_invite_code.as_deref() else {
            tracing::warn!("Admin signup requested but no invite code is configured");
            return Err(AppError::Authorization("Admin signup is disabled.".to_string()));
        };

        if invite_code != Some(required) {
            tracing::warn!("Admin signup with invalid invite code");
            return Err(AppError::Authorization("Invalid admin invite code.".to_string()));
        }

        Ok(())
    }
}

/// Hash a password with Argon2id on the blocking pool
pub async fn hash_password(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || hash_password_blocking(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
}

/// Check a password against a stored hash on the blocking pool
pub async fn verify_password(password: String, stored_hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || verify_password_blocking(&password, &stored_hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))
}

/// Hash a password using Argon2 with a random salt
pub fn hash_password_blocking(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// A malformed stored hash never verifies
pub fn verify_password_blocking(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
