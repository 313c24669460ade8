//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A create DTO for inserts
//! - An update DTO (all `Option` fields) for patches

pub mod department;
pub mod employee;
pub mod feedback;
pub mod sheets_settings;
pub mod user;

/// Outcome of a delete request on an entity that falls back to
/// deactivation once feedback references it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Nothing referenced the row; it is gone.
    Deleted,
    /// Feedback exists; the row was marked inactive instead.
    Deactivated,
    NotFound,
}
