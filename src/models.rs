pub mod auth;
pub mod dashboard;
pub mod sales;
pub mod settings;
