//! A small schema-authoring API producing annotated descriptor pools.
//!
//! The builder works in three steps:
//!
//! 1. the schema is rendered as a plain `prost_types::FileDescriptorProto`
//!    (no custom options yet),
//! 2. the file is transcoded into a `DynamicMessage` against a bootstrap
//!    pool that knows the `amino`/`cosmos_proto` extensions, and the option
//!    values are injected with `set_extension`,
//! 3. everything (descriptor.proto, the needed well-known types, the
//!    extension files and the generated file) is packed into one
//!    `FileDescriptorSet` and decoded into the final `DescriptorPool`.

use crate::extensions;
use prost::Message as _;
use prost_reflect::{DescriptorPool, DynamicMessage, MessageDescriptor, ReflectMessage, Value};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, MessageOptions, OneofDescriptorProto,
};

/// Builds a `DescriptorPool` for one schema file.
pub struct SchemaBuilder {
    file_name: String,
    package: String,
    messages: Vec<MessageSpec>,
    enums: Vec<EnumSpec>,
}

/// A message declaration with its amino annotations.
pub struct MessageSpec {
    name: String,
    amino_name: Option<String>,
    message_encoding: Option<String>,
    oneofs: Vec<String>,
    fields: Vec<FieldSpec>,
}

/// A field declaration with its amino/cosmos_proto annotations.
pub struct FieldSpec {
    name: String,
    number: i32,
    kind: FieldKind,
    repeated: bool,
    oneof_index: Option<i32>,
    scalar: Option<String>,
    encoding: Option<String>,
    field_name: Option<String>,
    oneof_name: Option<String>,
    dont_omitempty: bool,
}

enum FieldKind {
    String,
    Bool,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Bytes,
    Double,
    Message(String),
    Enum(String),
    Map(MapKind, MapKind),
}

/// Key/value kinds supported for map fields.
#[derive(Clone, Copy)]
pub enum MapKind {
    String,
    Bool,
    Int32,
    Int64,
    Uint32,
    Uint64,
}

struct EnumSpec {
    name: String,
    values: Vec<(String, i32)>,
}

impl SchemaBuilder {
    pub fn new(file_name: &str, package: &str) -> Self {
        SchemaBuilder {
            file_name: file_name.to_string(),
            package: package.to_string(),
            messages: Vec::new(),
            enums: Vec::new(),
        }
    }

    pub fn message(mut self, spec: MessageSpec) -> Self {
        self.messages.push(spec);
        self
    }

    pub fn enumeration(mut self, name: &str, values: &[(&str, i32)]) -> Self {
        self.enums.push(EnumSpec {
            name: name.to_string(),
            values: values
                .iter()
                .map(|(name, number)| (name.to_string(), *number))
                .collect(),
        });
        self
    }

    /// Builds the final pool. Panics on invalid schemas: this is test
    /// support, and a broken fixture should fail loudly.
    pub fn build(self) -> DescriptorPool {
        let mut bootstrap = DescriptorPool::global();
        bootstrap
            .add_file_descriptor_proto(extensions::amino_file())
            .expect("amino extension file is valid");
        bootstrap
            .add_file_descriptor_proto(extensions::cosmos_proto_file())
            .expect("cosmos_proto extension file is valid");

        let file_descriptor = bootstrap
            .get_message_by_name("google.protobuf.FileDescriptorProto")
            .expect("descriptor.proto is in the global pool");

        let mut file_dyn = DynamicMessage::decode(
            file_descriptor.clone(),
            self.file_descriptor_proto().encode_to_vec().as_slice(),
        )
        .expect("generated file descriptor is decodable");
        self.apply_annotations(&mut file_dyn, &bootstrap);

        let set_descriptor = bootstrap
            .get_message_by_name("google.protobuf.FileDescriptorSet")
            .expect("descriptor.proto is in the global pool");
        let mut set = DynamicMessage::new(set_descriptor);

        let mut files = Vec::new();
        for name in [
            "google/protobuf/descriptor.proto",
            "google/protobuf/timestamp.proto",
            "google/protobuf/duration.proto",
            "google/protobuf/any.proto",
        ] {
            let file = bootstrap
                .get_file_by_name(name)
                .expect("well-known file is in the global pool");
            files.push(decode_file(
                &file_descriptor,
                &file.file_descriptor_proto().encode_to_vec(),
            ));
        }
        files.push(decode_file(
            &file_descriptor,
            &extensions::amino_file().encode_to_vec(),
        ));
        files.push(decode_file(
            &file_descriptor,
            &extensions::cosmos_proto_file().encode_to_vec(),
        ));
        files.push(Value::Message(file_dyn));
        set.set_field_by_name("file", Value::List(files));

        DescriptorPool::decode(set.encode_to_vec().as_slice())
            .expect("generated descriptor set is valid")
    }

    fn file_descriptor_proto(&self) -> FileDescriptorProto {
        FileDescriptorProto {
            name: Some(self.file_name.clone()),
            package: Some(self.package.clone()),
            dependency: vec![
                "amino/amino.proto".to_string(),
                "cosmos_proto/cosmos.proto".to_string(),
                "google/protobuf/timestamp.proto".to_string(),
                "google/protobuf/duration.proto".to_string(),
                "google/protobuf/any.proto".to_string(),
            ],
            message_type: self
                .messages
                .iter()
                .map(|m| m.descriptor_proto(&self.package))
                .collect(),
            enum_type: self.enums.iter().map(EnumSpec::descriptor_proto).collect(),
            syntax: Some("proto3".to_string()),
            ..Default::default()
        }
    }

    fn apply_annotations(&self, file_dyn: &mut DynamicMessage, pool: &DescriptorPool) {
        let messages_field = file_dyn
            .descriptor()
            .get_field_by_name("message_type")
            .expect("FileDescriptorProto has a message_type field");
        let mut messages = file_dyn.get_field(&messages_field).into_owned();
        if let Value::List(items) = &mut messages {
            for (item, spec) in items.iter_mut().zip(&self.messages) {
                if let Value::Message(message_dyn) = item {
                    spec.apply_annotations(message_dyn, pool);
                }
            }
        }
        file_dyn.set_field(&messages_field, messages);
    }
}

impl MessageSpec {
    pub fn new(name: &str) -> Self {
        MessageSpec {
            name: name.to_string(),
            amino_name: None,
            message_encoding: None,
            oneofs: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Sets the `amino.name` option (the envelope type tag).
    pub fn amino_name(mut self, name: &str) -> Self {
        self.amino_name = Some(name.to_string());
        self
    }

    /// Sets the `amino.message_encoding` option.
    pub fn message_encoding(mut self, encoding: &str) -> Self {
        self.message_encoding = Some(encoding.to_string());
        self
    }

    /// Declares a oneof group; members reference it by index via
    /// [`FieldSpec::oneof_index`].
    pub fn oneof(mut self, name: &str) -> Self {
        self.oneofs.push(name.to_string());
        self
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    fn descriptor_proto(&self, package: &str) -> DescriptorProto {
        let mut nested = Vec::new();
        let fields = self
            .fields
            .iter()
            .map(|f| f.descriptor_proto(package, &self.name, &mut nested))
            .collect();
        DescriptorProto {
            name: Some(self.name.clone()),
            field: fields,
            nested_type: nested,
            oneof_decl: self
                .oneofs
                .iter()
                .map(|name| OneofDescriptorProto {
                    name: Some(name.clone()),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    fn apply_annotations(&self, message_dyn: &mut DynamicMessage, pool: &DescriptorPool) {
        if self.amino_name.is_some() || self.message_encoding.is_some() {
            let options_descriptor = pool
                .get_message_by_name("google.protobuf.MessageOptions")
                .expect("descriptor.proto is in the bootstrap pool");
            let mut options = DynamicMessage::new(options_descriptor);
            if let Some(name) = &self.amino_name {
                set_string_extension(&mut options, pool, "amino.name", name);
            }
            if let Some(encoding) = &self.message_encoding {
                set_string_extension(&mut options, pool, "amino.message_encoding", encoding);
            }
            message_dyn.set_field_by_name("options", Value::Message(options));
        }

        let fields_field = message_dyn
            .descriptor()
            .get_field_by_name("field")
            .expect("DescriptorProto has a field field");
        let mut fields = message_dyn.get_field(&fields_field).into_owned();
        if let Value::List(items) = &mut fields {
            for (item, spec) in items.iter_mut().zip(&self.fields) {
                if let Value::Message(field_dyn) = item {
                    spec.apply_annotations(field_dyn, pool);
                }
            }
        }
        message_dyn.set_field(&fields_field, fields);
    }
}

impl FieldSpec {
    pub fn string(name: &str, number: i32) -> Self {
        Self::new(name, number, FieldKind::String)
    }

    pub fn boolean(name: &str, number: i32) -> Self {
        Self::new(name, number, FieldKind::Bool)
    }

    pub fn int32(name: &str, number: i32) -> Self {
        Self::new(name, number, FieldKind::Int32)
    }

    pub fn int64(name: &str, number: i32) -> Self {
        Self::new(name, number, FieldKind::Int64)
    }

    pub fn uint32(name: &str, number: i32) -> Self {
        Self::new(name, number, FieldKind::Uint32)
    }

    pub fn uint64(name: &str, number: i32) -> Self {
        Self::new(name, number, FieldKind::Uint64)
    }

    pub fn bytes(name: &str, number: i32) -> Self {
        Self::new(name, number, FieldKind::Bytes)
    }

    pub fn double(name: &str, number: i32) -> Self {
        Self::new(name, number, FieldKind::Double)
    }

    /// A message-typed field; `type_name` is fully qualified without the
    /// leading dot, e.g. `test.Coin` or `google.protobuf.Timestamp`.
    pub fn message(name: &str, number: i32, type_name: &str) -> Self {
        Self::new(name, number, FieldKind::Message(type_name.to_string()))
    }

    /// An enum-typed field; `type_name` is fully qualified without the
    /// leading dot.
    pub fn enumeration(name: &str, number: i32, type_name: &str) -> Self {
        Self::new(name, number, FieldKind::Enum(type_name.to_string()))
    }

    pub fn map(name: &str, number: i32, key: MapKind, value: MapKind) -> Self {
        Self::new(name, number, FieldKind::Map(key, value))
    }

    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    /// Places the field in the oneof declared at `index` on its message.
    pub fn oneof_index(mut self, index: i32) -> Self {
        self.oneof_index = Some(index);
        self
    }

    /// Sets the `amino.oneof_name` option (the group's wrapper name).
    pub fn oneof_name(mut self, name: &str) -> Self {
        self.oneof_name = Some(name.to_string());
        self
    }

    /// Sets the `cosmos_proto.scalar` option.
    pub fn scalar(mut self, name: &str) -> Self {
        self.scalar = Some(name.to_string());
        self
    }

    /// Sets the `amino.encoding` option.
    pub fn encoding(mut self, name: &str) -> Self {
        self.encoding = Some(name.to_string());
        self
    }

    /// Sets the `amino.field_name` option (the JSON key override).
    pub fn rename(mut self, name: &str) -> Self {
        self.field_name = Some(name.to_string());
        self
    }

    /// Sets `amino.dont_omitempty = true`.
    pub fn dont_omitempty(mut self) -> Self {
        self.dont_omitempty = true;
        self
    }

    fn new(name: &str, number: i32, kind: FieldKind) -> Self {
        FieldSpec {
            name: name.to_string(),
            number,
            kind,
            repeated: false,
            oneof_index: None,
            scalar: None,
            encoding: None,
            field_name: None,
            oneof_name: None,
            dont_omitempty: false,
        }
    }

    fn descriptor_proto(
        &self,
        package: &str,
        message_name: &str,
        nested: &mut Vec<DescriptorProto>,
    ) -> FieldDescriptorProto {
        let label = if self.repeated {
            Label::Repeated
        } else {
            Label::Optional
        };
        let (r#type, type_name, label) = match &self.kind {
            FieldKind::String => (Type::String, None, label),
            FieldKind::Bool => (Type::Bool, None, label),
            FieldKind::Int32 => (Type::Int32, None, label),
            FieldKind::Int64 => (Type::Int64, None, label),
            FieldKind::Uint32 => (Type::Uint32, None, label),
            FieldKind::Uint64 => (Type::Uint64, None, label),
            FieldKind::Bytes => (Type::Bytes, None, label),
            FieldKind::Double => (Type::Double, None, label),
            FieldKind::Message(name) => (Type::Message, Some(format!(".{name}")), label),
            FieldKind::Enum(name) => (Type::Enum, Some(format!(".{name}")), label),
            FieldKind::Map(key, value) => {
                let entry_name = map_entry_name(&self.name);
                nested.push(DescriptorProto {
                    name: Some(entry_name.clone()),
                    field: vec![key.entry_field("key", 1), value.entry_field("value", 2)],
                    options: Some(MessageOptions {
                        map_entry: Some(true),
                        ..Default::default()
                    }),
                    ..Default::default()
                });
                (
                    Type::Message,
                    Some(format!(".{package}.{message_name}.{entry_name}")),
                    Label::Repeated,
                )
            }
        };

        FieldDescriptorProto {
            name: Some(self.name.clone()),
            number: Some(self.number),
            label: Some(label as i32),
            r#type: Some(r#type as i32),
            type_name,
            oneof_index: self.oneof_index,
            ..Default::default()
        }
    }

    fn apply_annotations(&self, field_dyn: &mut DynamicMessage, pool: &DescriptorPool) {
        if self.scalar.is_none()
            && self.encoding.is_none()
            && self.field_name.is_none()
            && self.oneof_name.is_none()
            && !self.dont_omitempty
        {
            return;
        }

        let options_descriptor = pool
            .get_message_by_name("google.protobuf.FieldOptions")
            .expect("descriptor.proto is in the bootstrap pool");
        let mut options = DynamicMessage::new(options_descriptor);
        if let Some(scalar) = &self.scalar {
            set_string_extension(&mut options, pool, "cosmos_proto.scalar", scalar);
        }
        if let Some(encoding) = &self.encoding {
            set_string_extension(&mut options, pool, "amino.encoding", encoding);
        }
        if let Some(name) = &self.field_name {
            set_string_extension(&mut options, pool, "amino.field_name", name);
        }
        if let Some(wrapper) = &self.oneof_name {
            set_string_extension(&mut options, pool, "amino.oneof_name", wrapper);
        }
        if self.dont_omitempty {
            let extension = pool
                .get_extension_by_name("amino.dont_omitempty")
                .expect("extension is registered in the bootstrap pool");
            options.set_extension(&extension, Value::Bool(true));
        }
        field_dyn.set_field_by_name("options", Value::Message(options));
    }
}

impl MapKind {
    fn entry_field(self, name: &str, number: i32) -> FieldDescriptorProto {
        let r#type = match self {
            MapKind::String => Type::String,
            MapKind::Bool => Type::Bool,
            MapKind::Int32 => Type::Int32,
            MapKind::Int64 => Type::Int64,
            MapKind::Uint32 => Type::Uint32,
            MapKind::Uint64 => Type::Uint64,
        };
        FieldDescriptorProto {
            name: Some(name.to_string()),
            number: Some(number),
            label: Some(Label::Optional as i32),
            r#type: Some(r#type as i32),
            ..Default::default()
        }
    }
}

impl EnumSpec {
    fn descriptor_proto(&self) -> EnumDescriptorProto {
        EnumDescriptorProto {
            name: Some(self.name.clone()),
            value: self
                .values
                .iter()
                .map(|(name, number)| EnumValueDescriptorProto {
                    name: Some(name.clone()),
                    number: Some(*number),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }
}

fn set_string_extension(
    options: &mut DynamicMessage,
    pool: &DescriptorPool,
    name: &str,
    value: &str,
) {
    let extension = pool
        .get_extension_by_name(name)
        .expect("extension is registered in the bootstrap pool");
    options.set_extension(&extension, Value::String(value.to_string()));
}

fn decode_file(descriptor: &MessageDescriptor, bytes: &[u8]) -> Value {
    Value::Message(
        DynamicMessage::decode(descriptor.clone(), bytes).expect("file descriptor is decodable"),
    )
}

fn map_entry_name(field_name: &str) -> String {
    let mut out = String::new();
    let mut upper_next = true;
    for c in field_name.chars() {
        if c == '_' {
            upper_next = true;
            continue;
        }
        if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out.push_str("Entry");
    out
}
