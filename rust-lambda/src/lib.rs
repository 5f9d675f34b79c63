//! Contact form - serverless contact form backend.
//!
//! This library provides the request pipeline shared by the two binaries:
//! - `contact-form-lambda`: Lambda entry point behind an API Gateway proxy
//! - `contact-form-web`: plain HTTP server for local runs
//!
//! ## Architecture
//!
//! ```text
//! Request → normalize → validate → verify (optional) → notify → Response
//! ```

pub mod bootstrap;
pub mod challenge;
pub mod config;
pub mod error;
pub mod form;
pub mod handler;
pub mod lambda;
pub mod notify;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use error::ContactError;
pub use form::{InboundRequest, NormalizedFields, ValidatedMessage};
pub use handler::{ContactHandler, HandlerResponse};
pub use notify::{NotificationResult, Notifier};
