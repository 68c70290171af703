//! Test utilities for use case and HTTP-level testing.
//!
//! This module provides:
//! - Test data factories for subscriptions, sessions and signed webhook bodies
//! - In-memory repository implementations that enforce the same unique keys as the schema
//! - A recording email sender
//! - `TestAppStateBuilder` for building an `AppState` over those mocks

mod app_state_builder;
mod auth_mocks;
mod billing_mocks;
mod email_mocks;
mod factories;

pub use app_state_builder::*;
pub use auth_mocks::*;
pub use billing_mocks::*;
pub use email_mocks::*;
pub use factories::*;
