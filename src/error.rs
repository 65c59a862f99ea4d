use crate::type_tag::TypeTag;

/// Errors that can occur when using a [`StrTree`](crate::StrTree) or a
/// [`Registry`](crate::Registry)
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// The key is absent, or present only as a path to other keys
    #[error("Key not found in tree: {0:?}")]
    NotFound(String),
    /// Attempted to access a payload with a type that doesn't match what was stored
    #[error("Type mismatch for the requested key")]
    TypeMismatch,
    /// A payload tag has no codec in the registry
    #[error("No codec registered for type tag {0}")]
    UnregisteredType(TypeTag),
    /// The byte stream is truncated or corrupt
    #[error("Malformed stream at byte {offset}: {reason}")]
    MalformedStream { offset: usize, reason: String },
    /// A codec could not be added to the registry
    #[error("Invalid codec registration: {0}")]
    InvalidRegistration(String),
    /// A codec failed while marshaling a payload
    #[error("Codec failure: {0}")]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors reported by [`Codec`](crate::Codec) implementations
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error(transparent)]
    Postcard(#[from] postcard::Error),
    /// A wrapper codec was handed a payload of another kind
    #[error("expected {expected} payload, found {found}")]
    WrongKind {
        expected: &'static str,
        found: &'static str,
    },
    #[error("{0}")]
    Custom(String),
}
