use thiserror::Error;

/// Result type alias for generation steps
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Errors that abort a generation run.
///
/// Every variant carries enough context (method or operation name, directive text,
/// offending type) to locate and fix the annotation that caused it. None of them is
/// recoverable: the run stops and nothing is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("method `{method}`: malformed directive `{line}`: {reason}")]
    DirectiveSyntax {
        method: String,
        line: String,
        reason: String,
    },

    #[error("method `{method}` has no `@http(op)` route directive")]
    MissingRouteAnnotation { method: String },

    #[error("method `{method}`: placeholder `{{{placeholder}}}` appears more than once in `{pattern}`")]
    DuplicatePlaceholder {
        method: String,
        pattern: String,
        placeholder: String,
    },

    #[error("method `{method}`: placeholder `{{{placeholder}}}` in `{pattern}` has no matching parameter")]
    UnboundPlaceholder {
        method: String,
        pattern: String,
        placeholder: String,
    },

    #[error("method `{method}`: parameter `{param}` has conflicting locations: {reason}")]
    AmbiguousLocation {
        method: String,
        param: String,
        reason: String,
    },

    #[error("method `{method}`: directive `{line}` refers to unknown parameter `{param}`")]
    UnknownParameter {
        method: String,
        param: String,
        line: String,
    },

    #[error("operation `{operation}` refers to undefined codec `{codec}`")]
    UnknownCodec { operation: String, codec: String },

    #[error("operation `{operation}`: parameter `{param}` of type `{ty}` cannot be carried in the {location}")]
    UnsupportedType {
        operation: String,
        param: String,
        ty: String,
        location: String,
    },

    #[error("route {verb} {pattern} is declared by both `{first}` and `{second}`")]
    DuplicateRoute {
        verb: String,
        pattern: String,
        first: String,
        second: String,
    },

    #[error("trait `{name}` not found in {source_path}")]
    TraitNotFound { name: String, source_path: String },

    #[error("method `{method}`: unsupported signature: {reason}")]
    UnsupportedSignature { method: String, reason: String },

    #[error("test fixture for `{test}`: {reason}")]
    Fixture { test: String, reason: String },

    #[error("template `{template}` failed to render: {message}")]
    Template { template: String, message: String },
}

impl GenerationError {
    /// Name of the method or operation the error points at, if any.
    pub fn operation(&self) -> Option<&str> {
        match self {
            GenerationError::DirectiveSyntax { method, .. }
            | GenerationError::MissingRouteAnnotation { method }
            | GenerationError::DuplicatePlaceholder { method, .. }
            | GenerationError::UnboundPlaceholder { method, .. }
            | GenerationError::AmbiguousLocation { method, .. }
            | GenerationError::UnknownParameter { method, .. }
            | GenerationError::UnsupportedSignature { method, .. } => Some(method),
            GenerationError::UnknownCodec { operation, .. }
            | GenerationError::UnsupportedType { operation, .. } => Some(operation),
            GenerationError::DuplicateRoute { second, .. } => Some(second),
            GenerationError::Fixture { test, .. } => Some(test),
            GenerationError::TraitNotFound { .. } | GenerationError::Template { .. } => None,
        }
    }
}
