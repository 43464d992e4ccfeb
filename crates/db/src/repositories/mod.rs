//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod asset_repo;
pub mod asset_request_repo;
pub mod employee_repo;
pub mod notification_repo;

pub use asset_repo::AssetRepo;
pub use asset_request_repo::AssetRequestRepo;
pub use employee_repo::EmployeeRepo;
pub use notification_repo::NotificationRepo;
