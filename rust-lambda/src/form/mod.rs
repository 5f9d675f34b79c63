//! Form handling: request normalization and field validation.
//!
//! ```text
//! InboundRequest → normalize() → NormalizedFields → validate() → ValidatedMessage
//! ```

pub mod normalize;
pub mod types;
pub mod validate;

pub use normalize::{body_format, normalize, BodyFormat};
pub use types::{InboundRequest, NormalizedFields, ValidatedMessage};
pub use validate::{validate, REQUIRED_FIELDS};
