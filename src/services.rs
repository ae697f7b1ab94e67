pub mod auth;
pub mod dashboard_service;
