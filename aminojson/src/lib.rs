//! # Amino JSON
//!
//! `aminojson` serializes dynamic protobuf messages into the canonical Amino
//! JSON byte representation used as the deterministic signing payload of
//! legacy transactions. The output is hashed and signed, so it must be
//! byte-for-byte reproducible across independent implementations: field
//! ordering, name casing, numeric formatting and null handling are all pinned
//! down by the encoder rather than left to a general-purpose JSON library.
//!
//! ## Key Components
//!
//! * **[`Encoder`]:** The main entry point. It walks a message's schema via
//!   `prost-reflect` descriptors and writes JSON directly into an output
//!   buffer, without building an intermediate value tree.
//! * **[`EncoderOptions`]:** The immutable configuration used to create an
//!   encoder: indentation, field sorting, enum representation, envelope
//!   naming, map support and the resolvers used for `google.protobuf.Any`.
//! * **Extension registries:** Four function tables (scalar, field, message
//!   and type encoders) seeded with built-ins and extendable through the
//!   `define_*_encoding` methods. Each registration returns a new encoder
//!   value, so configurations can be layered and shared freely across
//!   threads.
//!
//! ## Schema annotations
//!
//! Custom encodings are selected by protobuf extension options on the
//! message or field descriptors (`amino.name`, `amino.message_encoding`,
//! `amino.encoding`, `amino.field_name`, `amino.dont_omitempty`,
//! `amino.oneof_name` and `cosmos_proto.scalar`). The annotations are
//! resolved from the descriptor pool the message belongs to; pools that do
//! not define those extensions simply produce un-annotated output.
//!
//! ## Re-exports
//!
//! This crate re-exports `prost` and `prost-reflect` to ensure that
//! consumers use compatible versions of these underlying dependencies.

pub mod encoder;
pub mod error;
pub mod resolver;

mod indent;
mod options;
mod wellknown;

pub use encoder::{Encoder, EncoderOptions, FieldEncoderFn, MessageEncoderFn};
pub use error::EncodeError;
pub use resolver::TypeResolver;

// Re-exports
pub use prost;
pub use prost_reflect;
