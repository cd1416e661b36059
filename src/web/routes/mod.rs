pub mod activities;
pub mod admin;
pub mod deposits;
pub mod enrollments;
pub mod workshops;
