use super::{
    auth::{hash_password, verify_password},
    tokens::{AccessClaims, TokenManager, TokenPair},
    user_models::{
        CreateUserRequest, NewUser, RegisterRequest, UpdateUserRequest, User, UserRole,
        UserUpdate,
    },
    UserStore,
};
use crate::config::AdminConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::sqlite_persistence::is_constraint_violation;
use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, warn};

const MIN_NAME_LENGTH: usize = 3;
const MIN_PASSWORD_LENGTH: usize = 6;
const DEFAULT_ADMIN_NAME: &str = "Administrator";

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

fn validate_email(email: &str) -> ServiceResult<()> {
    if !EMAIL_REGEX.is_match(email) {
        return Err(ServiceError::BadRequest("Invalid email address".to_string()));
    }
    Ok(())
}

fn validate_password(password: &str) -> ServiceResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ServiceError::BadRequest(format!(
            "Password must be {} or more characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

fn validate_name(name: &str) -> ServiceResult<()> {
    if name.trim().chars().count() < MIN_NAME_LENGTH {
        return Err(ServiceError::BadRequest(format!(
            "Name must be {} or more characters long",
            MIN_NAME_LENGTH
        )));
    }
    Ok(())
}

fn email_taken(err: anyhow::Error) -> ServiceError {
    if is_constraint_violation(&err) {
        ServiceError::Conflict("Email is already registered".to_string())
    } else {
        ServiceError::Internal(err)
    }
}

fn invalid_credentials() -> ServiceError {
    ServiceError::Unauthorized("Invalid email or password".to_string())
}

/// Accounts, credentials and token lifecycle.
#[derive(Clone)]
pub struct UserManager {
    user_store: Arc<dyn UserStore>,
    tokens: TokenManager,
}

impl UserManager {
    pub fn new(user_store: Arc<dyn UserStore>, tokens: TokenManager) -> Self {
        Self { user_store, tokens }
    }

    pub fn register(&self, request: RegisterRequest) -> ServiceResult<TokenPair> {
        validate_name(&request.name)?;
        validate_email(&request.email)?;
        validate_password(&request.password)?;

        let user = self
            .user_store
            .create_user(&NewUser {
                name: request.name.trim().to_string(),
                email: request.email,
                password_hash: hash_password(&request.password)?,
                image_url: request.image_url,
                active: true,
                verified: false,
                role: UserRole::User,
                created_by: None,
            })
            .map_err(email_taken)?;
        info!("Registered user {} ({})", user.id, user.email);

        Ok(self.tokens.issue_token_pair(&user)?)
    }

    pub fn login(&self, email: &str, password: &str) -> ServiceResult<TokenPair> {
        let user = self
            .user_store
            .get_user_by_email(email)?
            .ok_or_else(invalid_credentials)?;

        if !verify_password(password, &user.password_hash)? {
            debug!("Wrong password for user {}", user.id);
            return Err(invalid_credentials());
        }
        if !user.can_authenticate() {
            return Err(ServiceError::Unauthorized("Account is inactive".to_string()));
        }

        Ok(self.tokens.issue_token_pair(&user)?)
    }

    /// Exchanges a refresh token for a new pair. The user is read again so
    /// the new access token reflects its current role and status.
    pub fn refresh(&self, refresh_token: &str) -> ServiceResult<TokenPair> {
        let claims = self.tokens.verify_refresh(refresh_token)?;

        let user = self
            .user_store
            .get_user(claims.user_id)?
            .ok_or_else(ServiceError::unauthorized)?;
        if !user.can_authenticate() {
            warn!("Refresh attempt for inactive user {}", user.id);
            return Err(ServiceError::unauthorized());
        }

        Ok(self.tokens.issue_token_pair(&user)?)
    }

    /// Verifies an access token and returns its claims. No storage access.
    pub fn authenticate(&self, access_token: &str) -> ServiceResult<AccessClaims> {
        Ok(self.tokens.verify_access(access_token)?)
    }

    pub fn list_users(&self) -> ServiceResult<Vec<User>> {
        Ok(self.user_store.list_users()?)
    }

    pub fn get_user(&self, user_id: i64) -> ServiceResult<User> {
        self.user_store
            .get_user(user_id)?
            .ok_or_else(|| ServiceError::not_found("User"))
    }

    pub fn create_user(&self, request: CreateUserRequest, created_by: i64) -> ServiceResult<User> {
        validate_name(&request.name)?;
        validate_email(&request.email)?;
        validate_password(&request.password)?;

        let user = self
            .user_store
            .create_user(&NewUser {
                name: request.name.trim().to_string(),
                email: request.email,
                password_hash: hash_password(&request.password)?,
                image_url: request.image_url,
                active: request.active.unwrap_or(true),
                verified: request.verified.unwrap_or(false),
                role: request.role.unwrap_or_default(),
                created_by: Some(created_by),
            })
            .map_err(email_taken)?;
        info!("User {} created user {}", created_by, user.id);
        Ok(user)
    }

    /// Applies a partial update on behalf of `actor`. Only admins may change
    /// role, active or verified flags.
    pub fn update_user(
        &self,
        user_id: i64,
        request: UpdateUserRequest,
        actor: &AccessClaims,
    ) -> ServiceResult<User> {
        if request.changes_privileges() && actor.role != UserRole::Admin {
            return Err(ServiceError::Forbidden(
                "Only admins can change role, active or verified".to_string(),
            ));
        }
        if let Some(name) = &request.name {
            validate_name(name)?;
        }
        if let Some(email) = &request.email {
            validate_email(email)?;
        }
        let password_hash = match &request.password {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let update = UserUpdate {
            name: request.name.map(|name| name.trim().to_string()),
            email: request.email,
            password_hash,
            image_url: request.image_url,
            active: request.active,
            verified: request.verified,
            role: request.role,
        };
        if update.is_empty() {
            return self.get_user(user_id);
        }

        self.user_store
            .update_user(user_id, &update, Some(actor.user_id))
            .map_err(email_taken)?
            .ok_or_else(|| ServiceError::not_found("User"))
    }

    pub fn delete_user(&self, user_id: i64, deleted_by: i64) -> ServiceResult<()> {
        if !self.user_store.soft_delete_user(user_id, Some(deleted_by))? {
            return Err(ServiceError::not_found("User"));
        }
        info!("User {} deleted user {}", deleted_by, user_id);
        Ok(())
    }

    /// Makes sure the configured administrator exists and has the admin role.
    pub fn ensure_admin(&self, admin: &AdminConfig) -> Result<()> {
        match self.user_store.get_user_by_email(&admin.email)? {
            Some(user) if user.role == UserRole::Admin => {
                debug!("Admin {} already present", admin.email);
            }
            Some(user) => {
                info!("Promoting {} to admin", admin.email);
                self.user_store.update_user(
                    user.id,
                    &UserUpdate {
                        role: Some(UserRole::Admin),
                        ..Default::default()
                    },
                    None,
                )?;
            }
            None => {
                info!("Creating admin user {}", admin.email);
                self.user_store.create_user(&NewUser {
                    name: admin
                        .name
                        .clone()
                        .unwrap_or_else(|| DEFAULT_ADMIN_NAME.to_string()),
                    email: admin.email.clone(),
                    password_hash: hash_password(&admin.password)?,
                    image_url: None,
                    active: true,
                    verified: true,
                    role: UserRole::Admin,
                    created_by: None,
                })?;
            }
        }
        Ok(())
    }
}
