//! # Amino JSON Fixtures
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide annotated
//! descriptor pools for testing the `aminojson` encoder. It is not intended
//! for production use.
//!
//! Amino behavior is driven by custom options (`amino.*`,
//! `cosmos_proto.*`), and `prost-types` cannot carry extension values, so a
//! descriptor set produced by protoc would normally be required. Instead,
//! [`SchemaBuilder`] assembles the `FileDescriptorSet` as a
//! `prost_reflect::DynamicMessage`, injects the option extensions directly,
//! and decodes the encoded set into a ready-to-use `DescriptorPool`, with no
//! protoc involved.

pub mod builder;
pub mod extensions;

pub use builder::{FieldSpec, MapKind, MessageSpec, SchemaBuilder};
