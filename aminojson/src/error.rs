//! Error types shared across the encoder pipeline.
//!
//! Any failure aborts the whole encode: [`Encoder::marshal`](crate::Encoder::marshal)
//! writes into a private buffer and only exposes bytes after the entire
//! message has been rendered, so callers never observe partial output.

/// The error returned when a message cannot be rendered as Amino JSON.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// The schema uses a construct the encoder does not support, such as a
    /// map field while map encoding is disabled, or a floating point field.
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// The schema or message value violates an invariant the canonical
    /// encoding depends on, such as a oneof member without the naming
    /// annotations needed to derive its wrapper, or an unset nested message
    /// field that is marked as always included.
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// A `google.protobuf.Any` payload references a type neither resolver
    /// knows about.
    #[error("Failed to resolve message type '{0}'")]
    TypeResolutionFailure(String),

    /// A value could not be rendered as a JSON literal.
    #[error("Failed to encode value: {0}")]
    Encoding(String),

    /// An underlying JSON primitive write failed.
    #[error("Failed to encode JSON value: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing to the output sink failed.
    #[error("Failed to write encoded output: {0}")]
    Io(#[from] std::io::Error),

    /// The packed bytes of a `google.protobuf.Any` could not be decoded
    /// against the resolved descriptor.
    #[error("Failed to decode embedded message: {0}")]
    Decode(#[from] prost::DecodeError),
}
