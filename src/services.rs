pub mod access;
pub mod auth;
pub mod company_service;
pub mod mailer;
pub mod panel_service;
pub mod summary_service;
pub mod telemetry_service;
