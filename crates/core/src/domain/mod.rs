pub mod claim;
pub mod employee;
pub mod notification;
