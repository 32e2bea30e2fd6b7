//! Error taxonomy for the design workflow.

use std::time::Duration;

use super::service::ServiceError;

/// The selected breakwater type or unit kind is not one this front end knows.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("unknown breakwater type '{0}'")]
    UnknownBreakwaterType(String),
    #[error("unknown armour unit '{0}'")]
    UnknownArmourUnit(String),
}

/// A single field-level problem found before anything is sent to the
/// engineering service.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },
    #[error("{field} must be a number, got '{raw}'")]
    NotANumber { field: &'static str, raw: String },
    #[error("{field} must be greater than zero (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{field} must be a whole number of at least 1 (got {value})")]
    NotACount { field: &'static str, value: f64 },
    #[error("select a value for {field}")]
    UnresolvedSelection { field: &'static str },
    #[error("'{value}' is not an available option for {field}")]
    UnknownChoice { field: &'static str, value: String },
    #[error("caisson draft ({draft} m) must not exceed the water depth ({depth} m)")]
    DraftExceedsDepth { draft: f64, depth: f64 },
}

impl ValidationError {
    /// Name of the form field the message belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Missing { field }
            | Self::NotANumber { field, .. }
            | Self::NotPositive { field, .. }
            | Self::Negative { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::NotACount { field, .. }
            | Self::UnresolvedSelection { field }
            | Self::UnknownChoice { field, .. } => field,
            Self::DraftExceedsDepth { .. } => super::schema::names::D,
        }
    }
}

/// Every validation problem of one submission, in catalogue order.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}", join_messages(.0))]
pub struct ValidationErrors(pub Vec<ValidationError>);

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// First message reported for `field`, if any.
    pub fn for_field(&self, field: &str) -> Option<&ValidationError> {
        self.0.iter().find(|e| e.field() == field)
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self(vec![error])
    }
}

/// Anything that can stop a "Design" action from producing a result.
#[derive(Debug, thiserror::Error)]
pub enum DesignError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("invalid design input: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("design calculation failed: {0}")]
    Execution(#[from] ServiceError),
    #[error("design calculation did not finish within {} s", .0.as_secs())]
    Timeout(Duration),
    #[error("could not display the design result: {0}")]
    Presentation(String),
    #[error("design request could not be encoded: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl From<ValidationError> for DesignError {
    fn from(error: ValidationError) -> Self {
        Self::Validation(error.into())
    }
}

impl DesignError {
    /// Stable discriminator used in JSON error bodies.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration_error",
            Self::Validation(_) => "validation_error",
            Self::Execution(_) | Self::Timeout(_) => "design_execution_error",
            Self::Presentation(_) => "presentation_error",
            Self::Encoding(_) => "encoding_error",
        }
    }

    /// Whether the error was detected locally, before the engineering
    /// service was contacted.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_error_points_at_draft_field() {
        let error = ValidationError::DraftExceedsDepth { draft: 16.0, depth: 15.0 };
        assert_eq!(error.field(), "d");
    }

    #[test]
    fn test_errors_join_messages() {
        let errors = ValidationErrors(vec![
            ValidationError::Missing { field: "Hm0" },
            ValidationError::NotPositive { field: "rho", value: 0.0 },
        ]);
        assert_eq!(
            errors.to_string(),
            "Hm0 is required; rho must be greater than zero (got 0)"
        );
        assert!(errors.for_field("rho").is_some());
        assert!(errors.for_field("h").is_none());
    }

    #[test]
    fn test_error_types() {
        let local: DesignError = ValidationError::Missing { field: "h" }.into();
        assert_eq!(local.error_type(), "validation_error");
        assert!(local.is_local());

        let timeout = DesignError::Timeout(Duration::from_secs(30));
        assert_eq!(timeout.error_type(), "design_execution_error");
        assert!(!timeout.is_local());
        assert_eq!(timeout.to_string(), "design calculation did not finish within 30 s");
    }
}
