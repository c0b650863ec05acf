use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use validator::Validate;

use super::models::{
    LoginRequest, LoginResponse, NewUser, RegisterRequest, Role, User, UserView, normalize_email,
};
use super::password::PasswordHasher;
use super::store::UserStore;
use super::token::TokenIssuer;
use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};

/// Who may end up with the admin role at registration
#[derive(Debug, Clone, Default)]
pub struct RegistrationPolicy {
    /// Honor `role: "admin"` in the request body
    pub allow_role_on_register: bool,
    /// Normalized emails that always register as admin
    pub admin_emails: Vec<String>,
}

impl RegistrationPolicy {
    pub fn from_config(auth: &AuthConfig) -> Self {
        Self {
            allow_role_on_register: auth.allow_role_on_register,
            admin_emails: auth
                .admin_emails
                .iter()
                .map(|e| normalize_email(e))
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// `email` must already be normalized
    pub fn role_for(&self, email: &str, requested: Option<Role>) -> AppResult<Role> {
        if self.admin_emails.iter().any(|e| e == email) {
            return Ok(Role::Admin);
        }
        match requested.unwrap_or_default() {
            Role::Admin if !self.allow_role_on_register => Err(AppError::Forbidden(
                "admin role cannot be requested at registration".to_string(),
            )),
            role => Ok(role),
        }
    }
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    tokens: Arc<TokenIssuer>,
    policy: RegistrationPolicy,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<TokenIssuer>,
        policy: RegistrationPolicy,
    ) -> Self {
        Self {
            users,
            hasher: PasswordHasher::new(),
            tokens,
            policy,
        }
    }

    /// Register a new user
    pub async fn register(&self, mut req: RegisterRequest) -> AppResult<User> {
        req.email = normalize_email(&req.email);
        req.validate()?;

        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("name must not be empty".to_string()));
        }
        let email = req.email;
        let role = self.policy.role_for(&email, req.role)?;
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::DuplicateEmail);
        }

        let password_hash = self.hash_password(req.password).await?;
        let user = self
            .users
            .create(NewUser {
                name,
                email,
                password_hash,
                role,
                created_at: Utc::now().trunc_subsecs(6),
            })
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(user)
    }

    /// Look up `email` and check `password` against the stored hash.
    ///
    /// Unknown email and wrong password fail differently here; callers
    /// facing clients should collapse both.
    ///
    /// An unknown email still pays for one full hash verification.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> AppResult<User> {
        let user = self.users.find_by_email(&normalize_email(email)).await?;

        let hasher = self.hasher.clone();
        let password = password.to_string();
        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
        let matches = tokio::task::spawn_blocking(move || match stored_hash {
            Some(hash) => hasher.verify(&password, &hash),
            None => hasher.verify_dummy(&password),
        })
        .await
        .map_err(|e| AppError::Internal(format!("password check task failed: {}", e)))??;

        match user {
            None => Err(AppError::NotFound("user".to_string())),
            Some(user) if matches => Ok(user),
            Some(_) => Err(AppError::BadPassword),
        }
    }

    /// Login user and issue JWT
    pub async fn login(&self, req: LoginRequest) -> AppResult<LoginResponse> {
        req.validate()?;

        let user = match self.verify_credentials(&req.email, &req.password).await {
            Ok(user) => user,
            Err(AppError::NotFound(_) | AppError::BadPassword) => {
                tracing::warn!("Login failed: invalid credentials");
                return Err(AppError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        let token = self.tokens.issue(&user)?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok(LoginResponse {
            token,
            user: UserView::from(&user),
        })
    }

    async fn hash_password(&self, password: String) -> AppResult<String> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("password hashing task failed: {}", e)))?
    }
}
