pub mod billing_event;
pub mod payment;
pub mod subscription;
