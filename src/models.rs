pub mod auth;
pub mod company;
pub mod measurement;
pub mod newsletter;
pub mod panel;
pub mod summary;
