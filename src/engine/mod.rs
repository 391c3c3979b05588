//! Schema-driven form engine
//!
//! Pure interpretation of question steps: path resolution, parameter
//! templates, response mapping, dependency gating, validation and the
//! per-form session state machine. Nothing here performs I/O.

pub mod dependency;
pub mod mapper;
pub mod path;
pub mod session;
pub mod template;
pub mod validation;

pub use dependency::is_disabled;
pub use mapper::{map_response_to_options, try_map_response_to_options, MappingError};
pub use path::{resolve, PathSegment, PropertyPath};
pub use session::{
    EnrichmentOutcome, EnrichmentRequest, EnrichmentTicket, FieldStatus, FormSession, SessionError,
};
pub use template::resolve_params;
pub use validation::{validate, validate_field, ValidationReport};
