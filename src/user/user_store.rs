use super::user_models::{NewUser, User, UserUpdate};
use anyhow::Result;

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait UserStore: Send + Sync {
    /// Inserts a new user and returns it with its generated id.
    /// Fails with a constraint violation if the email is already taken.
    fn create_user(&self, user: &NewUser) -> Result<User>;

    /// Returns the user with the given id.
    /// Returns Ok(None) if the user does not exist or was soft-deleted.
    fn get_user(&self, user_id: i64) -> Result<Option<User>>;

    /// Returns the user with the given email, soft-deleted users excluded.
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Returns all users that were not soft-deleted, ordered by id.
    fn list_users(&self) -> Result<Vec<User>>;

    /// Applies the non-empty fields of `update` and stamps `updated_by`.
    /// Returns Ok(None) if the user does not exist.
    fn update_user(
        &self,
        user_id: i64,
        update: &UserUpdate,
        updated_by: Option<i64>,
    ) -> Result<Option<User>>;

    /// Marks the user as deleted and inactive.
    /// Returns false if the user does not exist or was already deleted.
    fn soft_delete_user(&self, user_id: i64, deleted_by: Option<i64>) -> Result<bool>;
}
