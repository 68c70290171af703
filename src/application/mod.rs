pub mod analytics;
pub mod app_error;
pub mod email_templates;
pub mod jwt;
pub mod notifications;
pub mod ports;
pub mod use_cases;
pub mod validators;
