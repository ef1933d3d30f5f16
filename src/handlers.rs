pub mod auth;
pub mod companies;
pub mod measurements;
pub mod newsletter;
pub mod panels;
