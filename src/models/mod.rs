// src/models/mod.rs

pub mod employee;
pub mod organization;

// Re-exports

pub use employee::{Employee, EmployeeId, EmployeeStatus, NewEmployee, OptionalField};
pub use organization::OrgColumns;
