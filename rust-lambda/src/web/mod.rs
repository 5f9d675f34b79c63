//! Local web server surface.
//!
//! Serves the same contact handler as the Lambda entry point over plain HTTP,
//! for local development and non-serverless deployments.

pub mod handlers;

pub use handlers::{contact_form, health, router, AppState, HealthResponse};
