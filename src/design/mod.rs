//! Breakwater design workflow.
//!
//! Collects design parameters for the selected breakwater type, assembles
//! them into a typed request and hands that to the external engineering
//! service, which returns a cross-section plot and text reports.

pub mod assembler;
pub mod error;
pub mod facade;
pub mod form;
pub mod models;
mod routes;
pub mod schema;
pub mod service;

pub use error::{ConfigurationError, DesignError, ValidationError, ValidationErrors};
pub use form::{DesignSession, FieldValue, FormState};
pub use models::{BreakwaterType, DesignRequest, DesignResult};
pub(crate) use routes::error_status;
pub use routes::router;
pub use service::{EngineeringService, HttpEngineeringService};
