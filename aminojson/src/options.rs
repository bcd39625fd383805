//! Resolution of the `amino.*` and `cosmos_proto.*` extension options that
//! drive the canonical encoding: display names, omission rules, oneof
//! naming and the keys used to select custom encoders.
//!
//! The extensions are looked up by full name in the descriptor pool the
//! annotated descriptor belongs to. A pool that does not define them yields
//! no annotations, which leaves every lookup on its default path.

use crate::error::EncodeError;
use prost_reflect::{
    DescriptorPool, DynamicMessage, FieldDescriptor, Kind, MessageDescriptor, Value,
};

const MESSAGE_NAME: &str = "amino.name";
const MESSAGE_ENCODING: &str = "amino.message_encoding";
const FIELD_ENCODING: &str = "amino.encoding";
const FIELD_NAME: &str = "amino.field_name";
const DONT_OMITEMPTY: &str = "amino.dont_omitempty";
const ONEOF_NAME: &str = "amino.oneof_name";
const SCALAR: &str = "cosmos_proto.scalar";

fn string_extension(options: &DynamicMessage, pool: &DescriptorPool, name: &str) -> Option<String> {
    let extension = pool.get_extension_by_name(name)?;
    if !options.has_extension(&extension) {
        return None;
    }
    match options.get_extension(&extension).as_ref() {
        Value::String(value) => Some(value.clone()),
        _ => None,
    }
}

fn bool_extension(options: &DynamicMessage, pool: &DescriptorPool, name: &str) -> Option<bool> {
    let extension = pool.get_extension_by_name(name)?;
    if !options.has_extension(&extension) {
        return None;
    }
    match options.get_extension(&extension).as_ref() {
        Value::Bool(value) => Some(*value),
        _ => None,
    }
}

/// Returns the registered short display name (`amino.name`) of a message
/// type, used as the `"type"` tag of its envelope.
pub(crate) fn message_amino_name(descriptor: &MessageDescriptor) -> Option<String> {
    let pool = descriptor.parent_pool().clone();
    string_extension(&descriptor.options(), &pool, MESSAGE_NAME)
}

/// Returns the `amino.message_encoding` key selecting a whole-message
/// encoder, if the message type carries one.
pub(crate) fn message_encoding(descriptor: &MessageDescriptor) -> Option<String> {
    let pool = descriptor.parent_pool().clone();
    string_extension(&descriptor.options(), &pool, MESSAGE_ENCODING)
}

/// Returns the JSON key for a field: the `amino.field_name` override when
/// present, the schema's declared name otherwise.
pub(crate) fn field_display_name(field: &FieldDescriptor, pool: &DescriptorPool) -> String {
    string_extension(&field.options(), pool, FIELD_NAME).unwrap_or_else(|| field.name().to_string())
}

/// Whether an unset field is omitted from the output. Fields default to
/// omission; `amino.dont_omitempty = true` forces inclusion.
pub(crate) fn omit_empty(field: &FieldDescriptor, pool: &DescriptorPool) -> bool {
    !bool_extension(&field.options(), pool, DONT_OMITEMPTY).unwrap_or(false)
}

/// Returns the `cosmos_proto.scalar` key selecting a scalar encoder.
pub(crate) fn field_scalar(field: &FieldDescriptor, pool: &DescriptorPool) -> Option<String> {
    string_extension(&field.options(), pool, SCALAR)
}

/// Returns the `amino.encoding` key selecting a per-field encoder.
pub(crate) fn field_encoding(field: &FieldDescriptor, pool: &DescriptorPool) -> Option<String> {
    string_extension(&field.options(), pool, FIELD_ENCODING)
}

/// Derives the wrapper name and type tag for a oneof member.
///
/// The wrapper name comes from the `amino.oneof_name` option on the member
/// field, and the type tag from the `amino.name` of the member's message
/// type. Both are required: without them the canonical
/// `{"<wrapper>":{"type":...,"value":...}}` shape cannot be produced.
pub(crate) fn oneof_names(
    field: &FieldDescriptor,
    pool: &DescriptorPool,
) -> Result<(String, String), EncodeError> {
    let wrapper = string_extension(&field.options(), pool, ONEOF_NAME).ok_or_else(|| {
        EncodeError::SchemaViolation(format!(
            "oneof member '{}' must carry the amino.oneof_name option",
            field.name()
        ))
    })?;

    let Kind::Message(member_type) = field.kind() else {
        return Err(EncodeError::SchemaViolation(format!(
            "oneof member '{}' must be a message to derive its type tag",
            field.name()
        )));
    };

    let tag = message_amino_name(&member_type).ok_or_else(|| {
        EncodeError::SchemaViolation(format!(
            "message '{}' used as oneof member '{}' has no amino.name",
            member_type.full_name(),
            field.name()
        ))
    })?;

    Ok((wrapper, tag))
}
