//! # Type resolution
//!
//! The seam between the encoder and whatever registry knows how to map a
//! `google.protobuf.Any` type URL back to a message descriptor. The encoder
//! consults an optional primary resolver, then an optional fallback, and
//! finally the descriptor pool the enclosing message was defined in.

use prost_reflect::{DescriptorPool, MessageDescriptor};

/// Resolves `google.protobuf.Any` type URLs to message descriptors.
pub trait TypeResolver: Send + Sync {
    /// Returns the descriptor for `type_url`, or `None` if this resolver
    /// does not know the type.
    ///
    /// Type URLs use the canonical `/fully.qualified.Name` form; the leading
    /// slash is optional.
    fn resolve_message_by_url(&self, type_url: &str) -> Option<MessageDescriptor>;
}

impl TypeResolver for DescriptorPool {
    fn resolve_message_by_url(&self, type_url: &str) -> Option<MessageDescriptor> {
        self.get_message_by_name(type_url.trim_start_matches('/'))
    }
}
