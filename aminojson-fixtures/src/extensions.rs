//! Hand-built descriptors for the `amino` and `cosmos_proto` extension
//! files, matching the option names and field numbers the encoder resolves
//! at runtime.

use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{FieldDescriptorProto, FileDescriptorProto};

const MESSAGE_OPTIONS: &str = ".google.protobuf.MessageOptions";
const FIELD_OPTIONS: &str = ".google.protobuf.FieldOptions";

/// The `amino/amino.proto` file: message and field options controlling the
/// legacy JSON representation.
pub fn amino_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("amino/amino.proto".to_string()),
        package: Some("amino".to_string()),
        dependency: vec!["google/protobuf/descriptor.proto".to_string()],
        extension: vec![
            extension("name", 11110001, Type::String, MESSAGE_OPTIONS),
            extension("message_encoding", 11110002, Type::String, MESSAGE_OPTIONS),
            extension("encoding", 11110003, Type::String, FIELD_OPTIONS),
            extension("field_name", 11110004, Type::String, FIELD_OPTIONS),
            extension("dont_omitempty", 11110005, Type::Bool, FIELD_OPTIONS),
            extension("oneof_name", 11110006, Type::String, FIELD_OPTIONS),
        ],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}

/// The `cosmos_proto/cosmos.proto` file, reduced to the `scalar` field
/// option used to select scalar encoders.
pub fn cosmos_proto_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("cosmos_proto/cosmos.proto".to_string()),
        package: Some("cosmos_proto".to_string()),
        dependency: vec!["google/protobuf/descriptor.proto".to_string()],
        extension: vec![extension("scalar", 93002, Type::String, FIELD_OPTIONS)],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}

fn extension(name: &str, number: i32, r#type: Type, extendee: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(r#type as i32),
        extendee: Some(extendee.to_string()),
        ..Default::default()
    }
}
