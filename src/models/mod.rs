//! Record types for the three collections.

mod employee;
mod room;
mod student;

pub use employee::{Employee, MaritalStatus};
pub use room::Room;
pub use student::Student;
