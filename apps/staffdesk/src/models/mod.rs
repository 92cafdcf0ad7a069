pub mod application;
pub mod department;
pub mod document;
pub mod employee;
pub mod id;
pub mod user;

pub use application::{ApplicationRole, ApplicationStatus, JobApplication};
pub use department::Department;
pub use document::{DocumentCategory, DocumentRecord, FileRef};
pub use employee::{Employee, EmployeeStatus};
pub use id::RecordId;
pub use user::{AuthUser, UserRole};
