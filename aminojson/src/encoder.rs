//! # Amino JSON encoder
//!
//! The orchestrator of the encoding pipeline. An [`Encoder`] is built once
//! from [`EncoderOptions`], seeds its four extension registries with the
//! built-in encoders, and can then serialize any number of messages
//! concurrently: it holds no mutable state and every `marshal` call owns its
//! private output buffer.
//!
//! Encoding a message is a recursive descent over its schema:
//!
//! 1. the envelope step decides whether the body is wrapped in
//!    `{"type":...,"value":...}`,
//! 2. the message step resolves whole-message overrides (by type name, then
//!    by `amino.message_encoding`) or falls back to default object encoding
//!    with its ordering, omission and oneof-wrapping rules,
//! 3. the value step dispatches each field to a primitive writer, a list or
//!    map strategy, or back into step 1 for nested messages.

use crate::error::EncodeError;
use crate::indent;
use crate::options;
use crate::resolver::TypeResolver;
use crate::wellknown;
use base64::prelude::*;
use prost_reflect::{
    DescriptorPool, DynamicMessage, FieldDescriptor, Kind, MapKey, MessageDescriptor,
    OneofDescriptor, ReflectMessage, Value,
};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::Arc;

/// A function that encodes a single field value as a complete JSON value.
///
/// Registered under a `cosmos_proto.scalar` or `amino.encoding` key. The
/// function receives the raw field value and must write syntactically
/// complete JSON; the field's key has already been written by the caller.
pub type FieldEncoderFn = fn(&Encoder, &Value, &mut dyn Write) -> Result<(), EncodeError>;

/// A function that encodes a whole message as a complete JSON value.
///
/// Registered under an `amino.message_encoding` key or a fully-qualified
/// type name. When one matches it fully owns the message's rendering.
pub type MessageEncoderFn = fn(&Encoder, &DynamicMessage, &mut dyn Write) -> Result<(), EncodeError>;

/// Options for creating a new [`Encoder`].
#[derive(Clone, Default)]
pub struct EncoderOptions {
    /// Indentation applied to the final output. It can only be composed of
    /// space or tab characters. `None` produces compact JSON.
    pub indent: Option<String>,
    /// When set, fields are emitted in schema declaration order instead of
    /// sorted by display name.
    pub do_not_sort_fields: bool,
    /// When set, enums are encoded as strings instead of integers.
    /// Caution: enabling this option produces different sign bytes.
    pub enums_as_string: bool,
    /// When set, the type URL is used instead of the amino name in message
    /// envelopes. Useful when producing JSON for non-signing purposes such
    /// as JSON-RPC.
    pub amino_name_as_type_url: bool,
    /// When set, map fields are encoded as JSON objects. They are rejected
    /// by default because legacy Amino has no canonical map form.
    pub marshal_mappings: bool,
    /// Resolves message types by type URL when encoding `Any` payloads.
    pub type_resolver: Option<Arc<dyn TypeResolver>>,
    /// Consulted when `type_resolver` cannot locate a type.
    pub file_resolver: Option<Arc<dyn TypeResolver>>,
}

/// A JSON encoder following the Amino JSON encoding rules for protobuf
/// messages.
///
/// The encoder is immutable once built and cheap to clone; the
/// `define_*_encoding` methods consume it and return an extended copy, so a
/// base configuration can be shared and layered without locks.
#[derive(Clone)]
pub struct Encoder {
    // maps cosmos_proto.scalar -> field encoder
    scalar_encoders: HashMap<String, FieldEncoderFn>,
    // maps amino.message_encoding -> message encoder
    message_encoders: HashMap<String, MessageEncoderFn>,
    // maps amino.encoding -> field encoder
    field_encoders: HashMap<String, FieldEncoderFn>,
    // maps fully-qualified type name -> message encoder
    type_encoders: HashMap<String, MessageEncoderFn>,
    type_resolver: Option<Arc<dyn TypeResolver>>,
    file_resolver: Option<Arc<dyn TypeResolver>>,
    indent: Option<String>,
    do_not_sort_fields: bool,
    enums_as_string: bool,
    amino_name_as_type_url: bool,
    marshal_mappings: bool,
}

impl Encoder {
    /// Returns a new `Encoder` with the built-in scalar, field, message and
    /// type encoders registered.
    pub fn new(options: EncoderOptions) -> Self {
        Encoder {
            scalar_encoders: HashMap::from([
                ("cosmos.Dec".to_string(), wellknown::cosmos_dec as FieldEncoderFn),
                ("cosmos.Int".to_string(), wellknown::cosmos_int as FieldEncoderFn),
            ]),
            message_encoders: HashMap::from([
                ("key_field".to_string(), wellknown::key_field as MessageEncoderFn),
                (
                    "module_account".to_string(),
                    wellknown::module_account as MessageEncoderFn,
                ),
                (
                    "threshold_string".to_string(),
                    wellknown::threshold_string as MessageEncoderFn,
                ),
            ]),
            field_encoders: HashMap::from([
                (
                    "legacy_coins".to_string(),
                    wellknown::null_slice_as_empty as FieldEncoderFn,
                ),
                ("inline_json".to_string(), wellknown::inline_json as FieldEncoderFn),
            ]),
            type_encoders: HashMap::from([
                (
                    "google.protobuf.Timestamp".to_string(),
                    wellknown::timestamp as MessageEncoderFn,
                ),
                (
                    "google.protobuf.Duration".to_string(),
                    wellknown::duration as MessageEncoderFn,
                ),
                ("google.protobuf.Any".to_string(), wellknown::any as MessageEncoderFn),
            ]),
            type_resolver: options.type_resolver,
            file_resolver: options.file_resolver,
            indent: options.indent,
            do_not_sort_fields: options.do_not_sort_fields,
            enums_as_string: options.enums_as_string,
            amino_name_as_type_url: options.amino_name_as_type_url,
            marshal_mappings: options.marshal_mappings,
        }
    }

    /// Registers a custom encoding for fields annotated with
    /// `(cosmos_proto.scalar) = "<name>"`, replacing any previous encoder
    /// registered under the same name.
    pub fn define_scalar_encoding(mut self, name: &str, encoder: FieldEncoderFn) -> Self {
        self.scalar_encoders.insert(name.to_string(), encoder);
        self
    }

    /// Registers a custom encoding for fields annotated with
    /// `(amino.encoding) = "<name>"`, replacing any previous encoder
    /// registered under the same name.
    pub fn define_field_encoding(mut self, name: &str, encoder: FieldEncoderFn) -> Self {
        self.field_encoders.insert(name.to_string(), encoder);
        self
    }

    /// Registers a custom encoding for message types annotated with
    /// `(amino.message_encoding) = "<name>"`, replacing any previous encoder
    /// registered under the same name.
    pub fn define_message_encoding(mut self, name: &str, encoder: MessageEncoderFn) -> Self {
        self.message_encoders.insert(name.to_string(), encoder);
        self
    }

    /// Registers a custom encoding for all messages of the given
    /// fully-qualified type name, replacing any previous encoder registered
    /// under the same name.
    pub fn define_type_encoding(mut self, type_name: &str, encoder: MessageEncoderFn) -> Self {
        self.type_encoders.insert(type_name.to_string(), encoder);
        self
    }

    /// Serializes a message to canonical Amino JSON.
    ///
    /// The returned bytes are a complete UTF-8 JSON document with no
    /// trailing newline. On error no output is returned: encoding happens in
    /// a private buffer, so callers never observe partial documents.
    pub fn marshal(&self, message: &DynamicMessage) -> Result<Vec<u8>, EncodeError> {
        let mut buf = Vec::new();
        self.begin_marshal(message, &mut buf, false)?;

        match &self.indent {
            Some(indent) => Ok(indent::reindent(&buf, indent)),
            None => Ok(buf),
        }
    }

    /// Encodes a message, wrapping the body in `{"type":...,"value":...}`
    /// when a display name applies.
    ///
    /// At the root and for `Any` payloads (`is_any`), the name is the
    /// message's `amino.name` or its type URL depending on configuration; a
    /// message with neither stays unwrapped.
    pub(crate) fn begin_marshal(
        &self,
        message: &DynamicMessage,
        writer: &mut dyn Write,
        is_any: bool,
    ) -> Result<(), EncodeError> {
        let descriptor = message.descriptor();
        let amino_name = options::message_amino_name(&descriptor);

        let wrapper = if is_any {
            if self.amino_name_as_type_url {
                Some(type_url(&descriptor))
            } else {
                Some(amino_name.unwrap_or_else(|| type_url(&descriptor)))
            }
        } else if amino_name.is_some() {
            // The type URL replaces the display name, but never makes an
            // unnamed message named.
            if self.amino_name_as_type_url {
                Some(type_url(&descriptor))
            } else {
                amino_name
            }
        } else {
            None
        };

        if let Some(name) = &wrapper {
            writer.write_all(b"{\"type\":")?;
            serde_json::to_writer(&mut *writer, name)?;
            writer.write_all(b",\"value\":")?;
        }

        self.marshal_message(message, writer)?;

        if wrapper.is_some() {
            writer.write_all(b"}")?;
        }

        Ok(())
    }

    /// Renders a message body, honoring whole-message overrides.
    fn marshal_message(
        &self,
        message: &DynamicMessage,
        writer: &mut dyn Write,
    ) -> Result<(), EncodeError> {
        let descriptor = message.descriptor();

        // A type encoder keyed by the fully-qualified name owns the whole
        // message; well-known types are handled here.
        if let Some(encoder) = self.type_encoders.get(descriptor.full_name()) {
            return encoder(self, message, writer);
        }

        if let Some(name) = options::message_encoding(&descriptor) {
            if let Some(encoder) = self.message_encoders.get(&name) {
                return encoder(self, message, writer);
            }
        }

        self.marshal_object(message, writer)
    }

    /// Default object encoding: ordering, omission and oneof wrapping.
    fn marshal_object(
        &self,
        message: &DynamicMessage,
        writer: &mut dyn Write,
    ) -> Result<(), EncodeError> {
        let descriptor = message.descriptor();
        let pool = descriptor.parent_pool().clone();

        let mut entries = Vec::new();
        for field in descriptor.fields() {
            let name = options::field_display_name(&field, &pool);
            let oneof = field.containing_oneof();
            let (oneof_wrapper, oneof_tag) = match &oneof {
                Some(_) => options::oneof_names(&field, &pool)?,
                None => (String::new(), String::new()),
            };
            entries.push(FieldEntry {
                field,
                name,
                oneof,
                oneof_wrapper,
                oneof_tag,
            });
        }

        // Oneof members sort under their group's wrapper name so all
        // alternatives collate to the group's position. Display names are
        // unique within a message, so the order is total; the sort is stable
        // so members of one group keep declaration order.
        if !self.do_not_sort_fields {
            entries.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));
        }

        writer.write_all(b"{")?;

        let mut first = true;
        let mut empty_oneofs_written: HashSet<String> = HashSet::new();

        for entry in &entries {
            let field = &entry.field;
            let value = message.get_field(field);
            let has = message.has_field(field);
            let is_oneof = entry.oneof.is_some();
            let mut write_nil = false;
            let mut name = entry.name.as_str();

            if !has {
                if self.group_is_unset(message, entry.oneof.as_ref())
                    && !empty_oneofs_written.contains(&entry.oneof_wrapper)
                {
                    // Exactly one null per unset group, under the wrapper name.
                    name = entry.oneof_wrapper.as_str();
                    write_nil = true;
                    empty_oneofs_written.insert(entry.oneof_wrapper.clone());
                } else if options::omit_empty(field, &pool) {
                    continue;
                } else if matches!(field.kind(), Kind::Message(_))
                    && !field.is_list()
                    && !field.is_map()
                {
                    return Err(EncodeError::SchemaViolation(format!(
                        "cannot encode unset message field '{name}' marked dont_omitempty"
                    )));
                }
            }

            if !first {
                writer.write_all(b",")?;
            }

            if is_oneof && !write_nil {
                serde_json::to_writer(&mut *writer, &entry.oneof_wrapper)?;
                writer.write_all(b":{\"type\":")?;
                serde_json::to_writer(&mut *writer, &entry.oneof_tag)?;
                writer.write_all(b",\"value\":{")?;
            }

            serde_json::to_writer(&mut *writer, name)?;
            writer.write_all(b":")?;

            if let Some(encoder) = self.field_encoder_for(field, &pool) {
                encoder(self, value.as_ref(), writer)?;
            } else if write_nil {
                writer.write_all(b"null")?;
            } else if !has && (field.is_list() || field.is_map()) {
                // An unset collection renders as null, unlike an empty one.
                writer.write_all(b"null")?;
            } else {
                self.marshal_value(value.as_ref(), Some(field), writer)?;
            }

            if is_oneof && !write_nil {
                writer.write_all(b"}}")?;
            }

            first = false;
        }

        writer.write_all(b"}")?;
        Ok(())
    }

    fn group_is_unset(&self, message: &DynamicMessage, oneof: Option<&OneofDescriptor>) -> bool {
        oneof.is_some_and(|group| group.fields().all(|member| !message.has_field(&member)))
    }

    fn field_encoder_for(
        &self,
        field: &FieldDescriptor,
        pool: &DescriptorPool,
    ) -> Option<FieldEncoderFn> {
        // Scalar encoders are checked before amino.encoding encoders.
        if let Some(scalar) = options::field_scalar(field, pool) {
            if let Some(encoder) = self.scalar_encoders.get(&scalar) {
                return Some(*encoder);
            }
        }
        if let Some(encoding) = options::field_encoding(field, pool) {
            if let Some(encoder) = self.field_encoders.get(&encoding) {
                return Some(*encoder);
            }
        }
        None
    }

    /// Renders a single value according to its declared kind.
    pub(crate) fn marshal_value(
        &self,
        value: &Value,
        field: Option<&FieldDescriptor>,
        writer: &mut dyn Write,
    ) -> Result<(), EncodeError> {
        match value {
            Value::Message(message) => self.marshal_message(message, writer),

            Value::Map(map) => {
                if !self.marshal_mappings {
                    return Err(EncodeError::UnsupportedFeature(
                        "maps are not supported".to_string(),
                    ));
                }
                let mut object = serde_json::Map::new();
                for (key, entry) in map {
                    object.insert(map_key_string(key), generic_json_value(entry)?);
                }
                serde_json::to_writer(&mut *writer, &serde_json::Value::Object(object))?;
                Ok(())
            }

            Value::List(values) => self.marshal_list(values, field, writer),

            Value::String(s) => Ok(serde_json::to_writer(&mut *writer, s)?),
            Value::Bool(b) => Ok(serde_json::to_writer(&mut *writer, b)?),
            Value::I32(n) => Ok(serde_json::to_writer(&mut *writer, n)?),
            Value::U32(n) => Ok(serde_json::to_writer(&mut *writer, n)?),

            Value::Bytes(bytes) => {
                write!(writer, "\"{}\"", BASE64_STANDARD.encode(bytes))?;
                Ok(())
            }

            Value::EnumNumber(number) => {
                if self.enums_as_string {
                    if let Some(Kind::Enum(enum_descriptor)) = field.map(FieldDescriptor::kind) {
                        if let Some(value_descriptor) =
                            enum_descriptor.values().find(|v| v.number() == *number)
                        {
                            write!(writer, "\"{}\"", value_descriptor.name())?;
                            return Ok(());
                        }
                    }
                }
                // Unresolvable values always fall back to numeric form.
                serde_json::to_writer(&mut *writer, number)?;
                Ok(())
            }

            // 64-bit integers are always quoted: JSON number precision
            // cannot represent the full range across implementations.
            Value::I64(n) => {
                write!(writer, "\"{n}\"")?;
                Ok(())
            }
            Value::U64(n) => {
                write!(writer, "\"{n}\"")?;
                Ok(())
            }

            Value::F32(_) | Value::F64(_) => Err(EncodeError::UnsupportedFeature(
                "floating point fields cannot be encoded deterministically".to_string(),
            )),
        }
    }

    /// Renders a repeated field as a JSON array, dispatching each element
    /// against the field's element kind.
    pub(crate) fn marshal_list(
        &self,
        values: &[Value],
        field: Option<&FieldDescriptor>,
        writer: &mut dyn Write,
    ) -> Result<(), EncodeError> {
        writer.write_all(b"[")?;
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                writer.write_all(b",")?;
            }
            self.marshal_value(value, field, writer)?;
        }
        writer.write_all(b"]")?;
        Ok(())
    }

    /// Resolves an `Any` type URL via the primary resolver, the fallback
    /// resolver, and finally the pool the enclosing message belongs to.
    pub(crate) fn resolve_any_type(
        &self,
        type_url: &str,
        own_pool: &DescriptorPool,
    ) -> Result<MessageDescriptor, EncodeError> {
        if let Some(resolver) = &self.type_resolver {
            if let Some(descriptor) = resolver.resolve_message_by_url(type_url) {
                return Ok(descriptor);
            }
        }
        if let Some(resolver) = &self.file_resolver {
            if let Some(descriptor) = resolver.resolve_message_by_url(type_url) {
                return Ok(descriptor);
            }
        }
        own_pool
            .resolve_message_by_url(type_url)
            .ok_or_else(|| EncodeError::TypeResolutionFailure(type_url.to_string()))
    }
}

struct FieldEntry {
    field: FieldDescriptor,
    name: String,
    oneof: Option<OneofDescriptor>,
    oneof_wrapper: String,
    oneof_tag: String,
}

impl FieldEntry {
    fn sort_key(&self) -> &str {
        if self.oneof.is_some() {
            &self.oneof_wrapper
        } else {
            &self.name
        }
    }
}

fn type_url(descriptor: &MessageDescriptor) -> String {
    format!("/{}", descriptor.full_name())
}

fn map_key_string(key: &MapKey) -> String {
    match key {
        MapKey::Bool(b) => b.to_string(),
        MapKey::I32(n) => n.to_string(),
        MapKey::I64(n) => n.to_string(),
        MapKey::U32(n) => n.to_string(),
        MapKey::U64(n) => n.to_string(),
        MapKey::String(s) => s.clone(),
    }
}

/// Schema-unaware conversion used for map values.
fn generic_json_value(value: &Value) -> Result<serde_json::Value, EncodeError> {
    Ok(match value {
        Value::Bool(b) => (*b).into(),
        Value::I32(n) => (*n).into(),
        Value::I64(n) => (*n).into(),
        Value::U32(n) => (*n).into(),
        Value::U64(n) => (*n).into(),
        Value::EnumNumber(n) => (*n).into(),
        Value::String(s) => s.as_str().into(),
        Value::Bytes(bytes) => BASE64_STANDARD.encode(bytes).into(),
        Value::F32(n) => float_json_value(f64::from(*n))?,
        Value::F64(n) => float_json_value(*n)?,
        Value::Message(_) | Value::List(_) | Value::Map(_) => {
            return Err(EncodeError::UnsupportedFeature(
                "schema-typed values are not supported inside mappings".to_string(),
            ));
        }
    })
}

fn float_json_value(value: f64) -> Result<serde_json::Value, EncodeError> {
    serde_json::Number::from_f64(value)
        .map(serde_json::Value::Number)
        .ok_or_else(|| EncodeError::Encoding(format!("non-finite floating point value {value}")))
}
