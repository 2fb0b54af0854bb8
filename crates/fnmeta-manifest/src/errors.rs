use std::io;
use thiserror::Error;

/// Errors that can occur while emitting, loading or resolving function metadata
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("At least one binding must be declared in a Function.")]
    NoBindings,

    #[error("Bindings must declare a direction and type.")]
    MissingDirectionOrType,

    #[error("Invalid DataType for a binding: {0}")]
    InvalidDataType(String),

    #[error("Binding '{0}' is declared more than once")]
    DuplicateBinding(String),

    #[error("Metadata provider '{name}' failed: {message}")]
    Provider { name: String, message: String },
}
