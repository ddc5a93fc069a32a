pub mod auth;
pub mod duration;
mod sqlite_user_store;
pub mod tokens;
mod user_manager;
pub mod user_models;
mod user_store;

pub use sqlite_user_store::SqliteUserStore;
pub use tokens::{AccessClaims, RefreshClaims, TokenError, TokenKind, TokenManager, TokenPair};
pub use user_manager::UserManager;
pub use user_models::{
    CreateUserRequest, LoginRequest, RegisterRequest, UpdateUserRequest, User, UserRole,
};
pub use user_store::UserStore;

#[cfg(any(test, feature = "mock"))]
pub use user_store::MockUserStore;

use crate::error::ServiceError;

impl From<TokenError> for ServiceError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(e) => ServiceError::Internal(e.into()),
            TokenError::Expired => ServiceError::Unauthorized("Token expired".to_string()),
            _ => ServiceError::Unauthorized("Invalid token".to_string()),
        }
    }
}
