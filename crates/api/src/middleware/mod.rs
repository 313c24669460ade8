//! Authorization guard extractors.
//!
//! - [`auth::AuthUser`] -- any active, authenticated user.
//! - [`rbac::RequireAdmin`] -- requires the stored role to be `admin`.

pub mod auth;
pub mod rbac;
