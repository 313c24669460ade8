//! Authorization guard outcome and the pure steps of the guard contract.
//!
//! The HTTP layer performs the I/O (token decoding, user lookup) and feeds
//! the results through these functions, ending with a [`Guard`] value that is
//! either `Authorized` with the caller's [`Identity`] or `Rejected` with a
//! [`Rejection`] reason.

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

/// The resolved caller of a protected operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: DbId,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// What an operation demands of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Any active, authenticated user.
    Authenticated,
    /// Only callers whose resolved role is `admin`.
    Admin,
}

/// Why the guard refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// No `Authorization` header at all.
    MissingCredential,
    /// Header present but not of the form `Bearer <token>`.
    MalformedCredential,
    /// Bad signature, malformed token, or expired.
    InvalidToken,
    /// The token names a user that no longer exists or is deactivated.
    UnknownOrInactiveUser,
    /// Authenticated, but the operation is admin-only.
    AdminRequired,
}

impl Rejection {
    pub fn message(self) -> &'static str {
        match self {
            Rejection::MissingCredential => "Authentication token not provided",
            Rejection::MalformedCredential => {
                "Invalid Authorization format. Expected: Bearer <token>"
            }
            Rejection::InvalidToken => "Invalid or expired token",
            Rejection::UnknownOrInactiveUser => "User not found or inactive",
            Rejection::AdminRequired => "Access denied. Administrator permission required",
        }
    }
}

impl From<Rejection> for CoreError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::AdminRequired => CoreError::Forbidden(rejection.message().into()),
            _ => CoreError::Unauthorized(rejection.message().into()),
        }
    }
}

/// Final outcome of the guard for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    Authorized(Identity),
    Rejected(Rejection),
}

impl Guard {
    pub fn into_result(self) -> Result<Identity, CoreError> {
        match self {
            Guard::Authorized(identity) => Ok(identity),
            Guard::Rejected(rejection) => Err(rejection.into()),
        }
    }
}

/// Step 1: pull the token out of a raw `Authorization` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, Rejection> {
    let header = header.ok_or(Rejection::MissingCredential)?;
    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(Rejection::MalformedCredential)?;
    if token.is_empty() {
        return Err(Rejection::MalformedCredential);
    }
    Ok(token)
}

/// Steps 3 and 4: given the user record the token resolved to (if any),
/// decide the outcome for the requested access level.
///
/// `resolved` is `(user_id, role, is_active)` as currently persisted. The
/// role used for the admin check is the persisted one, not the one baked
/// into the token at login time.
pub fn admit(resolved: Option<(DbId, Role, bool)>, access: Access) -> Guard {
    let Some((user_id, role, is_active)) = resolved else {
        return Guard::Rejected(Rejection::UnknownOrInactiveUser);
    };
    if !is_active {
        return Guard::Rejected(Rejection::UnknownOrInactiveUser);
    }
    if access == Access::Admin && !role.is_admin() {
        return Guard::Rejected(Rejection::AdminRequired);
    }
    Guard::Authorized(Identity { user_id, role })
}
