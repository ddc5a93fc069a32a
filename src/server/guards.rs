//! Access policies checked once a [`Session`] has been extracted.
//!
//! Session extraction fails with `Unauthorized` before any handler runs, so a
//! guard only ever sees authenticated callers and fails with `Forbidden`.
//! [`AdminSession`] and [`UserSubject`] run their guard as extractors, ahead
//! of the body and query extractors, so callers without access get 403 even
//! when the rest of the request is malformed.

use super::session::Session;
use super::state::ServerState;
use crate::error::{ServiceError, ServiceResult};
use crate::user::UserRole;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Caller role equals the given one. Roles are not hierarchical.
    Role(UserRole),
    /// Caller is the subject of the request.
    Owner,
    RoleOrOwner(UserRole),
}

impl Guard {
    pub const ADMIN: Guard = Guard::Role(UserRole::Admin);
    pub const ADMIN_OR_OWNER: Guard = Guard::RoleOrOwner(UserRole::Admin);

    pub fn allows(&self, session: &Session, subject_id: Option<i64>) -> bool {
        let is_owner = || subject_id == Some(session.user_id());
        match self {
            Guard::Role(role) => session.role() == *role,
            Guard::Owner => is_owner(),
            Guard::RoleOrOwner(role) => session.role() == *role || is_owner(),
        }
    }

    pub fn check(&self, session: &Session, subject_id: Option<i64>) -> ServiceResult<()> {
        if self.allows(session, subject_id) {
            return Ok(());
        }
        debug!(
            "{:?} denied user {} on subject {:?}",
            self,
            session.user_id(),
            subject_id
        );
        Err(ServiceError::forbidden())
    }
}

/// Session of an admin.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Session);

impl FromRequestParts<ServerState> for AdminSession {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, ctx).await?;
        Guard::ADMIN.check(&session, None)?;
        Ok(AdminSession(session))
    }
}

/// The user addressed by `{id}` in the path, with a caller allowed to act on
/// it: an admin, or the user itself.
#[derive(Debug, Clone)]
pub struct UserSubject {
    pub session: Session,
    pub id: i64,
}

impl FromRequestParts<ServerState> for UserSubject {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, ctx).await?;
        let Path(raw) = Path::<String>::from_request_parts(parts, ctx)
            .await
            .map_err(|rejection| ServiceError::BadRequest(rejection.body_text()))?;
        // An id that does not parse cannot belong to the caller.
        let id = raw.parse::<i64>().ok();
        Guard::ADMIN_OR_OWNER.check(&session, id)?;
        let id = id.ok_or_else(|| ServiceError::BadRequest(format!("Invalid user id: {}", raw)))?;
        Ok(UserSubject { session, id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::{AccessClaims, TokenKind};

    fn session(user_id: i64, role: UserRole) -> Session {
        Session {
            claims: AccessClaims {
                user_id,
                name: "someone".to_string(),
                email: "someone@example.com".to_string(),
                role,
                iat: 0,
                exp: 0,
                typ: TokenKind::Access,
            },
        }
    }

    #[test]
    fn role_guard_is_an_exact_match() {
        assert!(Guard::ADMIN.allows(&session(1, UserRole::Admin), None));
        assert!(!Guard::ADMIN.allows(&session(1, UserRole::User), None));
        assert!(!Guard::Role(UserRole::User).allows(&session(1, UserRole::Admin), None));
    }

    #[test]
    fn owner_guard_compares_subject_and_caller() {
        let user = session(7, UserRole::User);
        assert!(Guard::Owner.allows(&user, Some(7)));
        assert!(!Guard::Owner.allows(&user, Some(8)));
        assert!(!Guard::Owner.allows(&user, None));
        assert!(!Guard::Owner.allows(&session(1, UserRole::Admin), Some(7)));
    }

    #[test]
    fn role_or_owner_passes_on_either() {
        assert!(Guard::ADMIN_OR_OWNER.allows(&session(1, UserRole::Admin), Some(7)));
        assert!(Guard::ADMIN_OR_OWNER.allows(&session(7, UserRole::User), Some(7)));
        assert!(!Guard::ADMIN_OR_OWNER.allows(&session(8, UserRole::User), Some(7)));
    }

    #[test]
    fn failed_check_is_forbidden() {
        let result = Guard::ADMIN.check(&session(1, UserRole::User), None);
        assert!(matches!(result, Err(ServiceError::Forbidden(_))));
        assert!(Guard::ADMIN.check(&session(1, UserRole::Admin), None).is_ok());
    }
}
