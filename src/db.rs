pub mod user_repo;
pub use user_repo::UserRepository;
pub mod company_repo;
pub use company_repo::CompanyRepository;
pub mod branch_repo;
pub use branch_repo::BranchRepository;
pub mod panel_repo;
pub use panel_repo::PanelRepository;
pub mod measurement_repo;
pub use measurement_repo::MeasurementRepository;
pub mod newsletter_repo;
pub use newsletter_repo::NewsletterRepository;
