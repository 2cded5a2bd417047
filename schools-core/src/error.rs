use thiserror::Error;

/// One or more field-level rule violations.
///
/// Carries every violated rule in check order, never just the first one.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("validation failed: {}", .errors.join("; "))]
pub struct ValidationFailure {
    pub errors: Vec<String>,
}

impl ValidationFailure {
    pub fn new(errors: Vec<String>) -> Self {
        Self { errors }
    }
}
