pub mod auth_provider;
pub mod billing_provider;
pub mod email_sender;
