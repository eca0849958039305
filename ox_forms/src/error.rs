use std::path::PathBuf;

use thiserror::Error;

use crate::schema::FieldType;
use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("duplicate field name '{0}'")]
    DuplicateFieldName(String),
    #[error("field with an empty name in '{0}'")]
    EmptyFieldName(String),
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("cannot write '{path}': {message}")]
    InvalidPath { path: String, message: String },
    #[error("failed to bind record: {0}")]
    Binding(String),
    #[error("field '{0}' is not a list")]
    NotAList(String),
    #[error("list '{name}': {message}")]
    ListBounds { name: String, message: String },
    #[error("list '{name}' has no item at index {index}")]
    ListIndex { name: String, index: usize },
    #[error("no renderer registered for field type '{0}'")]
    UnregisteredFieldType(FieldType),
    #[error("no renderer registered for component '{0}'")]
    UnregisteredComponent(String),
    #[error("validation failed for {} field(s)", .0.len())]
    Validation(Vec<ValidationError>),
    #[error("form is not a wizard")]
    NotAWizard,
    #[error("step {0} does not exist")]
    StepOutOfRange(usize),
    #[error("form has been unmounted")]
    Unmounted,
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read configuration: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    ParseError(String),
    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),
}

impl FormError {
    /// Validation errors carried by this error, if any.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            FormError::Validation(errors) => errors,
            _ => &[],
        }
    }
}
