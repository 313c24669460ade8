//! Domain rules for the feedback tracker. No I/O lives here.

pub mod department;
pub mod employee;
pub mod error;
pub mod export;
pub mod feedback;
pub mod guard;
pub mod roles;
pub mod types;
