//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod department_repo;
pub mod employee_repo;
pub mod feedback_repo;
pub mod sheets_settings_repo;
pub mod user_repo;

pub use department_repo::DepartmentRepo;
pub use employee_repo::EmployeeRepo;
pub use feedback_repo::FeedbackRepo;
pub use sheets_settings_repo::SheetsSettingsRepo;
pub use user_repo::UserRepo;
