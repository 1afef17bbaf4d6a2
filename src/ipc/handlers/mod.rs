pub mod activities;
pub mod assignments;
pub mod backup;
pub mod core;
pub mod courses;
pub mod files;
pub mod grades;
pub mod reports;
pub mod settings;
pub mod students;
